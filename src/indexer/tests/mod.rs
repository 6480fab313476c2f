//! Unit tests for the indexer module.

mod indexer_tests;

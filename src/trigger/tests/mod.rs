//! Unit tests for the repository trigger.

//! Unit tests for the keyed store.

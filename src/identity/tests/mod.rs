//! Unit tests for the identity gate and user services.

mod users_tests;

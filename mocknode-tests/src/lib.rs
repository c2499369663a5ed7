//! Scenario tests driving the scan engine against the mock node client.
//! See the `tests/` directory.

//! Integration tests for lull live under `tests/`.

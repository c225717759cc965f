//! Integration tests for the host controllers, run against both variants

mod scenarios;

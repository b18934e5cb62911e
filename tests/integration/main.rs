//! Integration tests for the keyword crawler
//!
//! These tests use wiremock to create mock HTTP sites and drive the full
//! crawl cycle end-to-end, plus the HTTP API on top of the job registry.

mod api_tests;
mod crawl_tests;

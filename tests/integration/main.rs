//! End-to-end crawl tests against a mock HTTP server

mod crawl_tests;
mod support;

//! # minuta
//!
//! Library half of the `minuta` binary: configuration, CLI commands and the
//! HTTP JSON API. Split out so integration tests can drive the router.

pub mod api;
pub mod cli;
pub mod config;

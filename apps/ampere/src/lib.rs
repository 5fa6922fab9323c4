//! # ampere
//!
//! The Ampere binary crate as a library: CLI, HTTP API and configuration.
//! Integration tests drive the router through `ampere::api`.

pub mod api;
pub mod cli;
pub mod config;

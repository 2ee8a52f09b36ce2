#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Wire models and configuration shared by the Agent Portal client crates.

/// Client configuration loading.
pub mod config;
/// Request and response payloads for the Agent Portal API.
pub mod models;

//! # SnapVault Web Server Library
//!
//! Core of the SnapVault photo gallery server, split out of the binary so
//! integration tests can build the router directly.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Session cookie handling
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

//! # SnapVault Shared Library
//!
//! This crate contains the types, storage access and credential primitives
//! used by the SnapVault web server.
//!
//! ## Module Organization
//!
//! - `auth`: Token generation/hashing, password hashing, current-user propagation
//! - `models`: Database models (users, sessions, password resets, galleries)
//! - `db`: Connection pool and migrations
//! - `email`: Outbound email (SMTP and log-only mailers)
//! - `error`: Errors of the credential token lifecycle

pub mod auth;
pub mod db;
pub mod email;
pub mod error;
pub mod models;

/// Current version of the SnapVault shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # MusicStream Common Library
//!
//! Shared code for the MusicStream workspace:
//! - Configuration loading and root folder resolution
//! - Database initialization, migrations and row models
//! - Password hashing and session token generation
//! - Common error type

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

//! Application configuration, loaded from environment variables.
//!
//! - [`cors`]: allowed origins for the admin panel frontend
//! - [`database`]: PostgreSQL connection pool initialization
//! - [`jwt`]: token signing secret and validity window

pub mod cors;
pub mod database;
pub mod jwt;

//! API handlers for all routes
//!
//! This module contains the HTTP handlers for all API endpoints.

pub mod admin;
pub mod filter_options;
pub mod query;
pub mod research;

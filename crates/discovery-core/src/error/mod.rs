//! # Error Handling Framework
//!
//! This module provides a comprehensive error handling system for the discovery
//! service. It implements structured error management with:
//!
//! ## Core Features
//!
//! - **Structured Error Types**: Categorized error codes for consistent handling
//! - **Rich Context**: Request context and error metadata for debugging
//! - **Severity Classification**: Error categorization for appropriate responses
//! - **Metrics Integration**: Error tracking and monitoring capabilities
//!
//! ## Error Categories
//!
//! - **System**: Startup and process-level failures (configuration, unreachable dependencies).
//! - **Database**: Relational store errors during hydration.
//! - **ExternalService**: Search-engine and language-model unavailability.
//! - **ModelOutput**: Malformed or schema-violating language-model responses.
//! - **Vocabulary**: Canonicalization misses against the segment vocabulary.
//! - **Client**: Malformed request bodies, surfaced as 4xx.
//! - **Cache**: Explanation-cache failures.
//!
//! Most of these categories never escape the pipeline as an `Error` value at all:
//! per the error-handling design, each pipeline stage catches broadly and returns a
//! neutral fallback (empty filters, null thesis-context, rule-based explanation).
//! This type exists for the genuinely unrecoverable cases — startup configuration
//! failures and relational-store outages during hydration — and for HTTP-boundary
//! client-input validation.
//!
//! ## Usage Examples
//!
//! ```rust
//! use discovery_core::error::{Error, ErrorCode, Result};
//!
//! fn validate_size(size: i64) -> Result<()> {
//!     if size <= 0 {
//!         return Err(Error::validation("size must be positive"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod context;
pub mod framework;
pub mod metrics;

pub use codes::ErrorCode;
pub use context::{ErrorContext, RequestContext};
pub use framework::{Error, ErrorCategory, ErrorSeverity, Result};
pub use metrics::ErrorMetrics;

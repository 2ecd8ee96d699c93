//! Business directory collaborators.
//!
//! The pipeline needs two fetches per run: one business's metadata and its
//! most relevant reviews. [`BusinessDirectory`] is that contract; the wire
//! format behind it is a backend concern. The bundled implementation talks
//! to Yelp Fusion (feature `yelp`), and tests substitute in-memory doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use gavel_core::{BusinessMetadata, Review};

#[cfg(feature = "yelp")]
mod yelp;

#[cfg(feature = "yelp")]
pub use yelp::{YelpDirectory, YELP_API_KEY_ENV};

/// Opaque identifier of one business in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusinessId(String);

impl BusinessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusinessId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Errors from directory backends.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("business not found: {0}")]
    NotFound(BusinessId),

    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Directory not configured: {0}")]
    NotConfigured(String),
}

/// Contract for fetching one business's evidence inputs.
///
/// Both calls are blocking, cancellable operations with a per-call timeout
/// enforced by the implementation; a timed-out call surfaces as an error,
/// never as a silently empty result.
#[async_trait]
pub trait BusinessDirectory: Send + Sync {
    /// Fetch descriptive metadata for a business.
    async fn fetch_metadata(&self, id: &BusinessId) -> Result<BusinessMetadata, DirectoryError>;

    /// Fetch up to `limit` reviews in relevance order. May return fewer,
    /// including none.
    async fn fetch_reviews(
        &self,
        id: &BusinessId,
        limit: u32,
    ) -> Result<Vec<Review>, DirectoryError>;

    /// Backend name for logs and metrics.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_id_display() {
        let id = BusinessId::new("harbor-noodle-house-oakland");
        assert_eq!(id.to_string(), "harbor-noodle-house-oakland");
        assert_eq!(id.as_str(), "harbor-noodle-house-oakland");
    }

    #[test]
    fn test_not_found_names_the_business() {
        let err = DirectoryError::NotFound(BusinessId::new("missing-biz"));
        assert!(err.to_string().contains("missing-biz"));
    }
}

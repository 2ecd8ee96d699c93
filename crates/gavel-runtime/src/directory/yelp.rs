//! Yelp Fusion directory implementation.
//!
//! Fetches business details and reviews from the Fusion v3 endpoints with
//! bearer auth. Field mapping follows what the API actually returns: price
//! arrives as a run of dollar signs, the address as parts plus an optional
//! pre-formatted display form.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use gavel_core::{BusinessMetadata, PriceLevel, Review};

use super::{BusinessDirectory, BusinessId, DirectoryError};
use crate::providers::secrets::ApiCredential;

/// Environment variable name for the Yelp API key.
pub const YELP_API_KEY_ENV: &str = "YELP_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.yelp.com/v3";

/// Yelp Fusion business directory.
pub struct YelpDirectory {
    credential: ApiCredential,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for YelpDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YelpDirectory")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl YelpDirectory {
    /// Create a new directory client from a raw key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                crate::providers::CredentialSource::Programmatic,
                "Yelp API key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Create from the `YELP_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, DirectoryError> {
        let credential = ApiCredential::from_env(YELP_API_KEY_ENV, "Yelp API key")
            .map_err(|e| DirectoryError::NotConfigured(e.to_string()))?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        })
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn get_client(&self) -> &reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(|| {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client")
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        id: &BusinessId,
    ) -> Result<T, DirectoryError> {
        let response = self
            .get_client()
            .get(url)
            .bearer_auth(self.credential.expose())
            .header("accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DirectoryError::Timeout(self.timeout)
                } else {
                    DirectoryError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == 404 {
            return Err(DirectoryError::NotFound(id.clone()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DirectoryError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::ParseError(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct YelpBusiness {
    name: String,
    #[serde(default)]
    rating: f32,
    price: Option<String>,
    #[serde(default)]
    categories: Vec<YelpCategory>,
    location: Option<YelpLocation>,
}

#[derive(Debug, Deserialize)]
struct YelpCategory {
    title: String,
}

#[derive(Debug, Deserialize, Default)]
struct YelpLocation {
    #[serde(default)]
    display_address: Vec<String>,
    address1: Option<String>,
    address2: Option<String>,
    address3: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
}

impl YelpLocation {
    /// Prefer the pre-formatted display address; otherwise assemble from
    /// street parts then city parts, skipping blanks.
    fn formatted(&self) -> String {
        if !self.display_address.is_empty() {
            return self.display_address.join(", ");
        }
        let parts = [
            &self.address1,
            &self.address2,
            &self.address3,
            &self.city,
            &self.state,
            &self.zip_code,
            &self.country,
        ];
        parts
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct YelpReviewsResponse {
    #[serde(default)]
    reviews: Vec<YelpReview>,
}

#[derive(Debug, Deserialize)]
struct YelpReview {
    #[serde(default)]
    rating: f32,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl BusinessDirectory for YelpDirectory {
    async fn fetch_metadata(&self, id: &BusinessId) -> Result<BusinessMetadata, DirectoryError> {
        let url = format!("{}/businesses/{}", self.base_url, id);
        let business: YelpBusiness = self.get_json(url, id).await?;

        Ok(BusinessMetadata {
            name: business.name,
            rating: business.rating,
            price_level: business
                .price
                .as_deref()
                .map(PriceLevel::from_dollar_signs)
                .unwrap_or(PriceLevel::Unknown),
            categories: business.categories.into_iter().map(|c| c.title).collect(),
            address: business.location.unwrap_or_default().formatted(),
        })
    }

    async fn fetch_reviews(
        &self,
        id: &BusinessId,
        limit: u32,
    ) -> Result<Vec<Review>, DirectoryError> {
        let url = format!(
            "{}/businesses/{}/reviews?limit={}&sort_by=yelp_sort",
            self.base_url, id, limit
        );
        let body: YelpReviewsResponse = self.get_json(url, id).await?;

        Ok(body
            .reviews
            .into_iter()
            .map(|r| Review::new(r.rating, r.text))
            .collect())
    }

    fn name(&self) -> &str {
        "yelp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_prefers_display_address() {
        let location = YelpLocation {
            display_address: vec!["12 Pier Ave".to_string(), "Oakland, CA 94607".to_string()],
            address1: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(location.formatted(), "12 Pier Ave, Oakland, CA 94607");
    }

    #[test]
    fn test_location_assembled_from_parts() {
        let location = YelpLocation {
            address1: Some("12 Pier Ave".to_string()),
            address2: Some("".to_string()),
            city: Some("Oakland".to_string()),
            state: Some("CA".to_string()),
            zip_code: Some("94607".to_string()),
            country: Some("US".to_string()),
            ..Default::default()
        };
        assert_eq!(location.formatted(), "12 Pier Ave, Oakland, CA, 94607, US");
    }

    #[test]
    fn test_business_parsing_maps_price_and_categories() {
        let raw = serde_json::json!({
            "name": "Harbor Noodle House",
            "rating": 4.3,
            "price": "$$",
            "categories": [
                { "alias": "noodles", "title": "Noodles" },
                { "alias": "seafood", "title": "Seafood" }
            ],
            "location": { "display_address": ["12 Pier Ave", "Oakland, CA 94607"] }
        });

        let business: YelpBusiness = serde_json::from_value(raw).unwrap();
        assert_eq!(business.name, "Harbor Noodle House");
        assert_eq!(
            business.price.as_deref().map(PriceLevel::from_dollar_signs),
            Some(PriceLevel::Moderate)
        );
        assert_eq!(business.categories.len(), 2);
    }

    #[test]
    fn test_reviews_parsing_tolerates_missing_fields() {
        let raw = serde_json::json!({
            "reviews": [
                { "rating": 5.0, "text": "Delicious." },
                { "rating": 2.0 }
            ]
        });
        let body: YelpReviewsResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(body.reviews.len(), 2);
        assert_eq!(body.reviews[1].text, "");
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret = "yelp-super-secret-key";
        let directory = YelpDirectory::new(secret);
        let debug_output = format!("{:?}", directory);
        assert!(!debug_output.contains(secret));
        assert!(debug_output.contains("[REDACTED]"));
    }
}

//! Catalog client: product lookups against the commerce API.
//!
//! Products are cached with `moka` (5-minute TTL). The wire payload carries
//! years of accumulated field aliases; [`ProductPayload::normalize`] is the
//! single place those are resolved.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Deserialize;
use spindle_core::{Price, ProductId, ProductKind};
use tracing::{debug, instrument};

use super::{ApiError, error_for_response};
use crate::config::CommerceApiConfig;
use crate::models::Product;

/// Cache TTL for catalog reads.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Filter for product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub kind: Option<ProductKind>,
    pub rush_eligible: Option<bool>,
}

/// Client for the catalog side of the commerce API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Cache<ProductId, Product>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CommerceApiConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_key: config.api_key.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or a
    /// transport/parse error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let url = format!("{}/products/{id}", self.inner.base_url);
        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(&self.inner.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let payload: ProductPayload = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let product = payload.normalize();

        self.inner.cache.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Fetch the current catalog state for a set of products, skipping the
    /// cache - the submission pipeline needs live stock numbers.
    ///
    /// Missing products are simply absent from the result; the caller
    /// decides whether that blocks.
    ///
    /// # Errors
    ///
    /// Returns a transport/parse error. A 404 on an individual product is
    /// not an error here.
    #[instrument(skip(self, ids))]
    pub async fn get_products_fresh(
        &self,
        ids: impl IntoIterator<Item = ProductId>,
    ) -> Result<Vec<Product>, ApiError> {
        let mut products = Vec::new();
        for id in ids {
            let url = format!("{}/products/{id}", self.inner.base_url);
            let response = self
                .inner
                .client
                .get(&url)
                .bearer_auth(&self.inner.api_key)
                .send()
                .await?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                continue;
            }
            if !response.status().is_success() {
                return Err(error_for_response(response).await);
            }

            let payload: ProductPayload = response
                .json()
                .await
                .map_err(|e| ApiError::Parse(e.to_string()))?;
            let product = payload.normalize();
            // Keep the cache current while we're at it
            self.inner.cache.insert(product.id, product.clone()).await;
            products.push(product);
        }
        Ok(products)
    }

    /// List products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns a transport/parse error.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let mut url = format!("{}/products", self.inner.base_url);
        let mut params = Vec::new();
        if let Some(kind) = filter.kind {
            params.push(format!("kind={kind}"));
        }
        if let Some(rush) = filter.rush_eligible {
            params.push(format!("rush_eligible={rush}"));
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(&self.inner.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_for_response(response).await);
        }

        let payloads: Vec<ProductPayload> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(payloads.into_iter().map(ProductPayload::normalize).collect())
    }
}

// =============================================================================
// Wire Payload
// =============================================================================

/// Raw product payload as the commerce API sends it.
///
/// Older records use `product_id`/`quantity`/`rush_order_supported`; newer
/// ones `id`/`available`/`rush_eligible`. The credit is split across
/// kind-specific fields. Normalization happens here, once, instead of at
/// every call site.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    #[serde(alias = "product_id")]
    pub id: i64,
    pub title: String,
    pub price: i64,
    #[serde(default, alias = "quantity")]
    pub available: u32,
    #[serde(alias = "type")]
    pub kind: ProductKind,
    #[serde(default)]
    pub rush_eligible: Option<bool>,
    #[serde(default)]
    pub rush_order_supported: Option<bool>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default, alias = "weight")]
    pub weight_kg: Option<f32>,
    #[serde(default)]
    pub dimensions: Option<String>,
}

impl ProductPayload {
    /// Resolve field fallbacks into the normalized [`Product`].
    #[must_use]
    pub fn normalize(self) -> Product {
        let rush_eligible = self
            .rush_eligible
            .or(self.rush_order_supported)
            .unwrap_or(false);
        let credit = match self.kind {
            ProductKind::Book => self.author.or(self.artist),
            ProductKind::Cd | ProductKind::Lp => self.artist.or(self.author),
            ProductKind::Dvd => self.director,
        };
        Product {
            id: ProductId::new(self.id),
            title: self.title,
            price: Price::new(self.price),
            available: self.available,
            kind: self.kind,
            rush_eligible,
            credit,
            weight_kg: self.weight_kg,
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_legacy_field_names() {
        let payload: ProductPayload = serde_json::from_str(
            r#"{
                "product_id": 7,
                "title": "Kind of Blue",
                "price": 450000,
                "quantity": 12,
                "type": "lp",
                "rush_order_supported": true,
                "artist": "Miles Davis",
                "weight": 0.3
            }"#,
        )
        .unwrap();
        let product = payload.normalize();
        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.available, 12);
        assert!(product.rush_eligible);
        assert_eq!(product.credit.as_deref(), Some("Miles Davis"));
        assert_eq!(product.kind, ProductKind::Lp);
    }

    #[test]
    fn test_normalize_modern_field_names() {
        let payload: ProductPayload = serde_json::from_str(
            r#"{
                "id": 3,
                "title": "The Master and Margarita",
                "price": 150000,
                "available": 4,
                "kind": "book",
                "rush_eligible": false,
                "author": "Mikhail Bulgakov"
            }"#,
        )
        .unwrap();
        let product = payload.normalize();
        assert_eq!(product.id, ProductId::new(3));
        assert!(!product.rush_eligible);
        assert_eq!(product.credit.as_deref(), Some("Mikhail Bulgakov"));
    }

    #[test]
    fn test_normalize_credit_prefers_kind_specific_field() {
        let payload: ProductPayload = serde_json::from_str(
            r#"{
                "id": 9,
                "title": "Odd Record",
                "price": 90000,
                "available": 1,
                "kind": "cd",
                "author": "Wrong Field",
                "artist": "Right Field"
            }"#,
        )
        .unwrap();
        assert_eq!(payload.normalize().credit.as_deref(), Some("Right Field"));
    }

    #[test]
    fn test_normalize_rush_defaults_false() {
        let payload: ProductPayload = serde_json::from_str(
            r#"{"id": 1, "title": "X", "price": 1000, "available": 1, "kind": "dvd"}"#,
        )
        .unwrap();
        assert!(!payload.normalize().rush_eligible);
    }
}

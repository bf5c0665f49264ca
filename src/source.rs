//! Upstream catalog access.
//!
//! The feed is a paginated search endpoint: pages are requested from index 0
//! upward and an empty `products` array marks the end of the data.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::CatalogRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog response malformed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Paginated catalog reader driven by the reconciler.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Vec<CatalogRecord>, SourceError>;
}

/// One page of the upstream search response.
#[derive(Debug, Deserialize)]
struct CatalogPage {
    products: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    code: i64,
    name: String,
    price: PriceField,
}

#[derive(Debug, Deserialize)]
struct PriceField {
    value: i64,
}

impl CatalogEntry {
    /// The feed packs name and description into one field: the first word is
    /// the name, the remainder the description (empty when absent).
    fn into_record(self) -> CatalogRecord {
        let (name, description) = match self.name.split_once(' ') {
            Some((name, rest)) => (name.to_string(), rest.to_string()),
            None => (self.name, String::new()),
        };
        CatalogRecord {
            id: self.code,
            name,
            description,
            price: self.price.value,
        }
    }
}

pub struct HttpCatalogSource {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl HttpCatalogSource {
    pub fn new(base_url: String, page_size: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            page_size,
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_page(&self, page: u32) -> Result<Vec<CatalogRecord>, SourceError> {
        let body = self
            .client
            .get(&self.base_url)
            .query(&[("pageSize", self.page_size), ("currentPage", page)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let page_data: CatalogPage = serde_json::from_str(&body)?;
        Ok(page_data
            .products
            .into_iter()
            .map(CatalogEntry::into_record)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_catalog_page() {
        let body = r#"{
            "products": [
                { "code": 101, "name": "Roller 250mm fur", "price": { "value": 350 } },
                { "code": 102, "name": "Brush", "price": { "value": 90 } }
            ]
        }"#;
        let page: CatalogPage = serde_json::from_str(body).unwrap();
        let records: Vec<CatalogRecord> =
            page.products.into_iter().map(CatalogEntry::into_record).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 101);
        assert_eq!(records[0].name, "Roller");
        assert_eq!(records[0].description, "250mm fur");
        assert_eq!(records[0].price, 350);
        // Single-word names leave the description empty.
        assert_eq!(records[1].name, "Brush");
        assert_eq!(records[1].description, "");
    }

    #[test]
    fn empty_products_array_is_the_end_marker() {
        let page: CatalogPage = serde_json::from_str(r#"{ "products": [] }"#).unwrap();
        assert!(page.products.is_empty());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = serde_json::from_str::<CatalogPage>("not json").unwrap_err();
        let err = SourceError::from(err);
        assert!(matches!(err, SourceError::Decode(_)));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product row as persisted. `id` is the stable identity assigned by the
/// upstream catalog and never changes after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
}

/// One entry as fetched from the upstream catalog. Schema-identical to
/// [`Product`], kept as its own type so fetch results and store rows cannot
/// be mixed up at a seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
}

impl From<CatalogRecord> for Product {
    fn from(record: CatalogRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            price: record.price,
        }
    }
}

/// Partial update body for `PUT /products/{id}`. Only supplied fields are
/// merged into the stored row; `id` is not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
}

impl ProductPatch {
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
    }
}

/// Closed set of notifications broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Create,
    Update,
    Delete,
    ParserComplete,
}

/// Wire envelope broadcast to every subscriber. Transient: serialized once
/// per broadcast, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    pub product: Option<Product>,
    pub details: Option<serde_json::Value>,
}

/// Counters for one reconciliation cycle. Wrapped into the `parser_complete`
/// event's details and discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub created: u64,
    pub updated: u64,
}

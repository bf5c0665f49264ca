//! Catalog reconciliation: one fetch-all-pages-and-upsert pass.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::models::{CatalogRecord, CycleSummary, EventKind, Product};
use crate::notify::Notifier;
use crate::source::{CatalogSource, SourceError};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("catalog fetch failed on page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: SourceError,
    },

    #[error("store operation failed for record {id}: {source}")]
    Store {
        id: i64,
        #[source]
        source: StoreError,
    },

    #[error("cycle cancelled by shutdown")]
    Cancelled,
}

pub struct Reconciler {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn RecordStore>,
    notifier: Notifier,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn RecordStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
        }
    }

    /// Run one reconciliation cycle.
    ///
    /// Walks catalog pages from 0 until an empty page, upserting each record
    /// and emitting a per-record `create`/`update` event in classification
    /// order; a final `parser_complete` event carries the summary. A fetch or
    /// store failure aborts the cycle; records upserted before the failure
    /// stay committed and no `parser_complete` is emitted.
    ///
    /// `shutdown` is checked between records: the in-flight record's commit
    /// finishes, the rest of the cycle is abandoned.
    pub async fn run_cycle(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<CycleSummary, CycleError> {
        let mut summary = CycleSummary::default();
        let mut page = 0u32;

        loop {
            if *shutdown.borrow() {
                return Err(CycleError::Cancelled);
            }
            let records = self
                .source
                .fetch_page(page)
                .await
                .map_err(|source| CycleError::Fetch { page, source })?;
            if records.is_empty() {
                break;
            }
            for record in records {
                if *shutdown.borrow() {
                    return Err(CycleError::Cancelled);
                }
                self.upsert(record, &mut summary).await?;
            }
            page += 1;
        }

        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            pages = page,
            "reconciliation pass applied"
        );
        self.notifier
            .notify(
                EventKind::ParserComplete,
                None,
                Some(serde_json::json!({
                    "created": summary.created,
                    "updated": summary.updated,
                })),
            )
            .await;

        Ok(summary)
    }

    async fn upsert(
        &self,
        record: CatalogRecord,
        summary: &mut CycleSummary,
    ) -> Result<(), CycleError> {
        let id = record.id;
        let existing = self
            .store
            .get(id)
            .await
            .map_err(|source| CycleError::Store { id, source })?;
        let product = Product::from(record);

        match existing {
            Some(_) => {
                self.store
                    .update(product.clone())
                    .await
                    .map_err(|source| CycleError::Store { id, source })?;
                summary.updated += 1;
                self.notifier.notify(EventKind::Update, Some(product), None).await;
            }
            None => {
                self.store
                    .insert(product.clone())
                    .await
                    .map_err(|source| CycleError::Store { id, source })?;
                summary.created += 1;
                self.notifier.notify(EventKind::Create, Some(product), None).await;
            }
        }
        Ok(())
    }
}

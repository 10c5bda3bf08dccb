//! # Draft Repository
//!
//! Loads and persists the single draft document.

use tally_core::document::{draft_to_json, parse_draft};
use tally_core::{DraftDefaults, DraftTicket};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::kv::KeyValueStore;

/// Repository for the draft document.
#[derive(Debug, Clone)]
pub struct DraftRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> DraftRepository<S> {
    /// Creates a repository owning `key` in `store`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        DraftRepository {
            store,
            key: key.into(),
        }
    }

    /// Loads the draft to resume an interrupted session.
    ///
    /// An absent, closed or unreadable document yields the empty draft. An
    /// unreadable draft is logged and dropped rather than blocking the
    /// billing screen; it is overwritten on the next edit.
    pub async fn load(&self, defaults: &DraftDefaults) -> StoreResult<DraftTicket> {
        let Some(json) = self.store.get(&self.key).await? else {
            debug!(key = %self.key, "No stored draft");
            return Ok(DraftTicket::empty(defaults));
        };

        match parse_draft(&json, defaults) {
            Ok(draft) => {
                debug!(
                    key = %self.key,
                    open = draft.is_open(),
                    expenses = draft.expenses.len(),
                    "Loaded draft"
                );
                Ok(draft)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored draft is unreadable; starting empty");
                Ok(DraftTicket::empty(defaults))
            }
        }
    }

    /// Writes the full draft.
    pub async fn persist(&self, draft: &DraftTicket) -> StoreResult<()> {
        let json = draft_to_json(draft)?;
        self.store.set(&self.key, &json).await?;

        debug!(key = %self.key, status = draft.status.code(), "Persisted draft");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use tally_core::DraftField;

    fn repo(store: &MemoryStore) -> DraftRepository<MemoryStore> {
        DraftRepository::new(store.clone(), "currentInvoice")
    }

    #[tokio::test]
    async fn test_missing_draft_is_empty() {
        let store = MemoryStore::new();
        let draft = repo(&store).load(&DraftDefaults::default()).await.unwrap();
        assert_eq!(draft, DraftTicket::default());
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let store = MemoryStore::new();
        let repo = repo(&store);

        let mut draft = DraftTicket::default();
        draft.set_field(DraftField::InvoiceName, "Mudanza");
        draft.add_expense("Transporte", "200.50").unwrap();
        repo.persist(&draft).await.unwrap();

        let loaded = repo.load(&DraftDefaults::default()).await.unwrap();
        assert_eq!(loaded.invoice_name, "Mudanza");
        assert_eq!(loaded.expenses, draft.expenses);
        assert_eq!(loaded.invoice_number, draft.invoice_number);
    }

    #[tokio::test]
    async fn test_persist_is_idempotent() {
        let store = MemoryStore::new();
        let repo = repo(&store);
        store
            .set(
                "currentInvoice",
                r#"{"status":1,"expenses":[{"name":"Flores","amount":100}],"finalPrice":"150","invoiceName":"Boda"}"#,
            )
            .await
            .unwrap();

        let first = repo.load(&DraftDefaults::default()).await.unwrap();
        repo.persist(&first).await.unwrap();
        let once = store.get("currentInvoice").await.unwrap();

        let second = repo.load(&DraftDefaults::default()).await.unwrap();
        repo.persist(&second).await.unwrap();
        let twice = store.get("currentInvoice").await.unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_unreadable_draft_is_empty() {
        let store = MemoryStore::new();
        store.set("currentInvoice", "{broken").await.unwrap();

        let draft = repo(&store).load(&DraftDefaults::default()).await.unwrap();
        assert!(!draft.is_open());
    }
}

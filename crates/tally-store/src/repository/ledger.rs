//! # Ledger Repository
//!
//! Read-modify-write access to the ledger document.
//!
//! ## Append Cycle
//! ```text
//! append(invoice)
//!      │
//!      ├── still open? → Err(OpenRecord), nothing read or written
//!      │
//!      ▼
//! get("invoices") ──► parse (absent / null → empty) ──► push ──► set("invoices")
//! ```
//!
//! The cycle is not atomic: two overlapping appends can lose one write
//! (last write wins). Callers run one operation at a time.

use tally_core::document::{ledger_to_json, parse_ledger};
use tally_core::{CoreError, Invoice, Ledger};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::kv::KeyValueStore;

/// Repository for the ledger document.
#[derive(Debug, Clone)]
pub struct LedgerRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> LedgerRepository<S> {
    /// Creates a repository owning `key` in `store`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        LedgerRepository {
            store,
            key: key.into(),
        }
    }

    /// Loads the whole ledger. A missing document is an empty ledger.
    ///
    /// ## Errors
    /// - `Corrupt` when the stored text is not a ledger document
    /// - `Storage` when the read fails
    pub async fn list(&self) -> StoreResult<Ledger> {
        let ledger = match self.store.get(&self.key).await? {
            Some(json) => parse_ledger(&json).map_err(|e| StoreError::corrupt(&self.key, e))?,
            None => Ledger::default(),
        };

        debug!(key = %self.key, count = ledger.len(), "Loaded ledger");
        Ok(ledger)
    }

    /// Loads only the closed records.
    pub async fn list_closed(&self) -> StoreResult<Vec<Invoice>> {
        let ledger = self.list().await?;
        Ok(ledger.into_iter().filter(Invoice::is_closed).collect())
    }

    /// Number of records in the ledger.
    pub async fn len(&self) -> StoreResult<usize> {
        Ok(self.list().await?.len())
    }

    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.list().await?.is_empty())
    }

    /// Returns the record at `index`.
    pub async fn get(&self, index: usize) -> StoreResult<Invoice> {
        self.list()
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| StoreError::not_found("Invoice", index.to_string()))
    }

    /// Appends a closed invoice and rewrites the document.
    ///
    /// ## Returns
    /// The new ledger length.
    ///
    /// ## Errors
    /// - `Core(OpenRecord)` when the invoice is still open
    pub async fn append(&self, invoice: &Invoice) -> StoreResult<usize> {
        if !invoice.is_closed() {
            return Err(CoreError::OpenRecord {
                invoice: invoice.label().to_string(),
            }
            .into());
        }

        let mut ledger = self.list().await?;
        ledger.push(invoice.clone());
        self.save(&ledger).await?;

        debug!(
            key = %self.key,
            invoice = %invoice.label(),
            count = ledger.len(),
            "Appended invoice"
        );
        Ok(ledger.len())
    }

    /// Removes the record at `index` and rewrites the document.
    ///
    /// ## Errors
    /// - `NotFound` when `index` is past the end; nothing is written
    pub async fn delete_at(&self, index: usize) -> StoreResult<Invoice> {
        let mut ledger = self.list().await?;
        let removed = ledger
            .remove(index)
            .ok_or_else(|| StoreError::not_found("Invoice", index.to_string()))?;
        self.save(&ledger).await?;

        debug!(
            key = %self.key,
            index,
            invoice = %removed.label(),
            count = ledger.len(),
            "Deleted invoice"
        );
        Ok(removed)
    }

    async fn save(&self, ledger: &Ledger) -> StoreResult<()> {
        let json = ledger_to_json(ledger)?;
        self.store.set(&self.key, &json).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::tests::FailingStore;
    use crate::kv::MemoryStore;
    use chrono::Utc;
    use tally_core::{DraftField, DraftTicket, RecordStatus};

    fn repo(store: &MemoryStore) -> LedgerRepository<MemoryStore> {
        LedgerRepository::new(store.clone(), "invoices")
    }

    fn invoice(name: &str) -> Invoice {
        let mut draft = DraftTicket::default();
        draft.set_field(DraftField::InvoiceName, name);
        draft.set_field(DraftField::ClientName, "Ana");
        draft.add_expense("Transporte", "10").unwrap();
        draft.close(Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let store = MemoryStore::new();
        let repo = repo(&store);

        assert!(repo.list().await.unwrap().is_empty());
        assert_eq!(repo.len().await.unwrap(), 0);
        // Listing never writes
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_null_document_is_empty() {
        let store = MemoryStore::new();
        store.set("invoices", "null").await.unwrap();
        assert!(repo(&store).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document() {
        let store = MemoryStore::new();
        store.set("invoices", "{oops").await.unwrap();

        let err = repo(&store).list().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        // Appending must not overwrite what could not be read
        assert!(repo(&store).append(&invoice("a")).await.is_err());
        assert_eq!(store.get("invoices").await.unwrap().as_deref(), Some("{oops"));
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let store = MemoryStore::new();
        let repo = repo(&store);

        assert_eq!(repo.append(&invoice("a")).await.unwrap(), 1);
        assert_eq!(repo.append(&invoice("b")).await.unwrap(), 2);

        assert_eq!(repo.get(1).await.unwrap().invoice_name, "b");
        assert!(matches!(
            repo.get(2).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_append_rejects_open_record() {
        let store = MemoryStore::new();
        let repo = repo(&store);

        let mut open = invoice("a");
        open.status = RecordStatus::Open;

        let err = repo.append(&open).await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::OpenRecord { .. })));
        assert_eq!(repo.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_at() {
        let store = MemoryStore::new();
        let repo = repo(&store);
        for name in ["a", "b", "c"] {
            repo.append(&invoice(name)).await.unwrap();
        }
        let target = repo.get(1).await.unwrap();

        let removed = repo.delete_at(1).await.unwrap();
        assert_eq!(removed, target);

        let remaining = repo.list().await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|inv| *inv != target));
        let names: Vec<&str> = remaining.iter().map(|i| i.invoice_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_delete_out_of_bounds() {
        let store = MemoryStore::new();
        let repo = repo(&store);
        repo.append(&invoice("a")).await.unwrap();
        let before = store.get("invoices").await.unwrap();

        let err = repo.delete_at(1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(repo.len().await.unwrap(), 1);
        assert_eq!(store.get("invoices").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_list_closed_skips_open_legacy_records() {
        let store = MemoryStore::new();
        store
            .set(
                "invoices",
                r#"[{"invoiceName":"a","expenses":[],"finalPrice":5,"currentInvoice":0},{"invoiceName":"b","expenses":[],"finalPrice":5,"currentInvoice":1},{"invoiceName":"c","expenses":[],"finalPrice":5}]"#,
            )
            .await
            .unwrap();

        let closed = repo(&store).list_closed().await.unwrap();
        let names: Vec<&str> = closed.iter().map(|i| i.invoice_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_document() {
        let store = FailingStore::new();
        let repo = LedgerRepository::new(store.clone(), "invoices");
        repo.append(&invoice("a")).await.unwrap();

        store.fail_writes(true);
        assert!(matches!(
            repo.append(&invoice("b")).await.unwrap_err(),
            StoreError::Storage(_)
        ));

        store.fail_writes(false);
        assert_eq!(repo.len().await.unwrap(), 1);
        assert!(store.inner().get("invoices").await.unwrap().is_some());
    }
}

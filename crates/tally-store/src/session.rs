//! # Session
//!
//! The one owner of the in-progress draft, handed to the UI layer.
//!
//! ## Auto-Save
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mutation Cycle                                     │
//! │                                                                         │
//! │  session.add_expense("Comida", "99.50")                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. clone the current draft                                             │
//! │  2. apply the edit to the clone ──── invalid? → Err, nothing changed    │
//! │  3. persist the clone ────────────── write failed? → Err, nothing       │
//! │       │                                                  changed        │
//! │       ▼                                                                 │
//! │  4. swap the clone in                                                   │
//! │                                                                         │
//! │  When an operation returns Ok, the stored draft already matches         │
//! │  what `draft()` shows.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit
//! ```text
//! draft.close(now) ──► ledger.append(invoice) ──► persist(empty draft) ──► swap
//!   (validation)         (read-modify-write)        (reset)
//! ```
//! If the reset write fails after the append succeeded, the invoice is in
//! the ledger and the error is returned with the old draft still in
//! memory. Committing again would append a duplicate, so callers should
//! reload the session instead.

use chrono::{DateTime, Utc};
use tally_core::validation::ValidationResult;
use tally_core::{
    DashboardSummary, DraftDefaults, DraftField, DraftTicket, ExpenseItem, Invoice, Ledger,
};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::export::{Artifact, ExportError, InvoiceExporter};
use crate::kv::KeyValueStore;
use crate::repository::{DraftRepository, LedgerRepository};

/// Owns the draft and both document repositories.
///
/// ## Example
/// ```rust,ignore
/// let store = MemoryStore::new();
/// let mut session = Session::open(store, &StoreConfig::default()).await?;
///
/// session.set_field(DraftField::InvoiceName, "Mudanza").await?;
/// session.set_field(DraftField::ClientName, "Ana").await?;
/// session.add_expense("Transporte", "200.50").await?;
/// let invoice = session.commit().await?;
/// ```
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    drafts: DraftRepository<S>,
    ledger: LedgerRepository<S>,
    defaults: DraftDefaults,
    draft: DraftTicket,
}

impl<S: KeyValueStore + Clone> Session<S> {
    /// Opens a session, resuming the stored draft if one is open.
    pub async fn open(store: S, config: &StoreConfig) -> StoreResult<Self> {
        let drafts = DraftRepository::new(store.clone(), config.draft_key.clone());
        let ledger = LedgerRepository::new(store.clone(), config.ledger_key.clone());
        let defaults = config.draft_defaults.clone();
        let draft = drafts.load(&defaults).await?;

        info!(
            draft_key = %config.draft_key,
            ledger_key = %config.ledger_key,
            resumed = draft.is_open(),
            "Session opened"
        );

        Ok(Session {
            store,
            drafts,
            ledger,
            defaults,
            draft,
        })
    }

    /// The current draft, exactly as last persisted.
    pub fn draft(&self) -> &DraftTicket {
        &self.draft
    }

    /// Applies `edit` to a copy of the draft, persists it, then swaps it in.
    async fn apply<T, F>(&mut self, edit: F) -> StoreResult<T>
    where
        F: FnOnce(&mut DraftTicket) -> ValidationResult<T>,
    {
        let mut next = self.draft.clone();
        let out = edit(&mut next)?;
        self.drafts.persist(&next).await?;
        self.draft = next;
        Ok(out)
    }

    // -------------------------------------------------------------------------
    // Draft edits
    // -------------------------------------------------------------------------

    /// Adds an expense and persists the draft.
    pub async fn add_expense(
        &mut self,
        description: &str,
        amount_text: &str,
    ) -> StoreResult<ExpenseItem> {
        let item = self
            .apply(|draft| draft.add_expense(description, amount_text))
            .await?;

        debug!(id = %item.id, amount = %item.amount, "Expense added");
        Ok(item)
    }

    /// Removes an expense. An unknown id is a no-op and writes nothing.
    pub async fn remove_expense(&mut self, id: &str) -> StoreResult<bool> {
        if !self.draft.expenses.iter().any(|e| e.id == id) {
            return Ok(false);
        }
        self.apply(|draft| Ok(draft.remove_expense(id))).await
    }

    /// Assigns a text field and persists the draft.
    pub async fn set_field(&mut self, field: DraftField, value: &str) -> StoreResult<()> {
        self.apply(|draft| {
            draft.set_field(field, value);
            Ok(())
        })
        .await
    }

    /// Toggles "no expenses" and persists the draft.
    pub async fn set_no_expenses(&mut self, no_expenses: bool) -> StoreResult<()> {
        self.apply(|draft| {
            draft.set_no_expenses(no_expenses);
            Ok(())
        })
        .await
    }

    /// Sets the invoice date and persists the draft.
    pub async fn set_date(&mut self, date: DateTime<Utc>) -> StoreResult<()> {
        self.apply(|draft| {
            draft.set_date(date);
            Ok(())
        })
        .await
    }

    /// Writes the current draft as is.
    pub async fn persist(&self) -> StoreResult<()> {
        self.drafts.persist(&self.draft).await
    }

    /// Closes the draft into the ledger and resets it.
    ///
    /// ## Errors
    /// - `Validation` naming the first failing field; nothing is written
    /// - `Storage` when the append or the reset write fails
    pub async fn commit(&mut self) -> StoreResult<Invoice> {
        let invoice = self.draft.close(Utc::now())?;

        let count = self.ledger.append(&invoice).await?;

        let reset = DraftTicket::empty(&self.defaults);
        self.drafts.persist(&reset).await?;
        self.draft = reset;

        info!(
            invoice = %invoice.label(),
            total = %invoice.total(),
            ledger_count = count,
            "Invoice committed"
        );
        Ok(invoice)
    }

    // -------------------------------------------------------------------------
    // Ledger reads & deletes
    // -------------------------------------------------------------------------

    /// The whole ledger, in append order.
    pub async fn ledger(&self) -> StoreResult<Ledger> {
        self.ledger.list().await
    }

    pub async fn closed_invoices(&self) -> StoreResult<Vec<Invoice>> {
        self.ledger.list_closed().await
    }

    /// Deletes the record at `index`. Confirmation is the caller's job.
    pub async fn delete_invoice(&self, index: usize) -> StoreResult<Invoice> {
        let removed = self.ledger.delete_at(index).await?;
        info!(index, invoice = %removed.label(), "Invoice deleted");
        Ok(removed)
    }

    /// Dashboard figures over the closed records.
    pub async fn dashboard(&self) -> StoreResult<DashboardSummary> {
        Ok(self.ledger.list().await?.dashboard())
    }

    /// Renders the record at `index` through `exporter`.
    pub async fn export(
        &self,
        index: usize,
        exporter: &dyn InvoiceExporter,
    ) -> Result<Artifact, ExportError> {
        let invoice = self.ledger.get(index).await?;
        exporter.render(&invoice, index)
    }

    /// Clears the whole store, settings included, and resets the draft.
    pub async fn wipe_all(&mut self) -> StoreResult<()> {
        self.store.clear().await?;
        self.draft = DraftTicket::empty(&self.defaults);
        info!("All stored data wiped");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

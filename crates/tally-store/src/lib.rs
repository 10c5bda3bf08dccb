//! # tally-store: Storage Layer for Tally
//!
//! Persists the draft and the ledger as JSON documents in a key-value
//! store, and owns the single in-progress draft through [`Session`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Data Flow                                │
//! │                                                                         │
//! │  UI event (add expense, save invoice, delete, share)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tally-store (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Session     │    │ Repositories  │    │   Export     │  │   │
//! │  │   │ (session.rs)  │───►│ LedgerRepo    │    │ Text / HTML  │  │   │
//! │  │   │ owns draft    │    │ DraftRepo     │    │ renderers    │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  │                     ┌──────────▼──────────┐                     │   │
//! │  │                     │   KeyValueStore     │                     │   │
//! │  │                     │ MemoryStore │ Sqlite│                     │   │
//! │  │                     └─────────────────────┘                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`kv`] - The key-value store trait and the in-memory adapter
//! - [`pool`] - SQLite pool and the durable adapter
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - Ledger and draft document repositories
//! - [`session`] - Draft owner with auto-save and commit
//! - [`export`] - Share artifact renderers
//! - [`config`] - Configuration from the environment
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_store::{Session, SqliteStore, StoreConfig};
//! use tally_core::DraftField;
//!
//! let config = StoreConfig::from_env();
//! let store = SqliteStore::connect(config.db_config()).await?;
//! let mut session = Session::open(store, &config).await?;
//!
//! session.set_field(DraftField::InvoiceName, "Mudanza").await?;
//! session.add_expense("Transporte", "200.50").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod export;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use export::{Artifact, ExportError, HtmlExporter, InvoiceExporter, TextExporter};
pub use kv::{KeyValueStore, MemoryStore};
pub use pool::{DbConfig, SqliteStore};
pub use repository::{DraftRepository, LedgerRepository};
pub use session::Session;

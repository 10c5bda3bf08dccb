//! # Repository Module
//!
//! Document repositories over a [`KeyValueStore`](crate::kv::KeyValueStore).
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Session                                                                │
//! │       │                                                                 │
//! │       ├── LedgerRepository ── key "invoices" ──────┐                   │
//! │       │   list / list_closed / append / delete_at   │                   │
//! │       │                                             ▼                   │
//! │       └── DraftRepository ── key "currentInvoice" ─► KeyValueStore     │
//! │           load / persist                                                │
//! │                                                                         │
//! │  Each repository exclusively owns its key. Documents are read and       │
//! │  written whole; there is no partial update.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`LedgerRepository`] - The append-only list of closed invoices
//! - [`DraftRepository`] - The single in-progress draft

pub mod draft;
pub mod ledger;

pub use draft::DraftRepository;
pub use ledger::LedgerRepository;

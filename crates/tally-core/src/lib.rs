//! # tally-core: Pure Invoicing Logic for Tally
//!
//! This crate holds everything Tally knows about invoices, expenses and
//! profit, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                       UI layer (screens)                        │   │
//! │  │    Billing form ──► History ──► Dashboard ──► Share             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tally-store (Session, repositories)                │   │
//! │  │    auto-save draft, append/delete ledger, export artifacts      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   draft   │  │ document  │  │   │
//! │  │   │  Invoice  │  │   Money   │  │DraftTicket│  │ wire fmt  │  │   │
//! │  │   │  Ledger   │  │   calc    │  │ aggregate │  │ validation│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ExpenseItem, Invoice, Pricing, Ledger)
//! - [`money`] - Decimal-backed Money with lenient text parsing
//! - [`calc`] - Subtotal, tax, total, profit and margin
//! - [`draft`] - The in-progress DraftTicket and its commit rules
//! - [`aggregate`] - Dashboard totals and chart series
//! - [`document`] - Stored JSON documents and their normalization
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{DraftField, DraftTicket};
//!
//! let mut draft = DraftTicket::default();
//! draft.set_field(DraftField::InvoiceName, "Mudanza");
//! draft.set_field(DraftField::ClientName, "Ana");
//! draft.add_expense("Transporte", "200.50").unwrap();
//! draft.add_expense("Comida", "99.50").unwrap();
//!
//! assert_eq!(draft.subtotal().to_fixed(2), "300.00");
//! assert_eq!(draft.tax().to_fixed(2), "30.00");
//! assert_eq!(draft.total().to_fixed(2), "330.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod calc;
pub mod document;
pub mod draft;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregate::{DashboardSummary, GlobalTotals, SeriesPoint};
pub use calc::{InvoiceProfit, Margin};
pub use draft::{DraftDefaults, DraftField, DraftPricing, DraftStatus, DraftTicket, Workflow};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate percent a new rate-computed draft starts with.
pub const DEFAULT_TAX_RATE: &str = "10";

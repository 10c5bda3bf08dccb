//! # Domain Types
//!
//! Core domain types shared by the draft, the ledger and the dashboard.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ExpenseItem    │   │    Invoice      │   │     Pricing     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  invoice_name   │   │  Priced         │       │
//! │  │  description    │   │  client_name    │   │   final_price   │       │
//! │  │  amount         │   │  invoice_number │   │  RateComputed   │       │
//! │  └─────────────────┘   │  expenses[]     │   │   tax_rate      │       │
//! │                        │  pricing        │   │   subtotal/tax  │       │
//! │  ┌─────────────────┐   │  status         │   │   total         │       │
//! │  │  RecordStatus   │   └─────────────────┘   └─────────────────┘       │
//! │  │  Closed | Open  │                                                    │
//! │  └─────────────────┘   Ledger = ordered Vec<Invoice>                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Historical Shapes
//! Stored invoices come in two shapes: a *priced* record that carries the
//! amount actually charged (`finalPrice`), and a *rate-computed* record with
//! `taxRate`, `subtotal`, `tax` and `total`. Both are normalized once, on
//! load, into [`Invoice`] with a [`Pricing`] tag (see [`crate::document`]).

use std::slice;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::calc;
use crate::money::Money;

// =============================================================================
// Expense Item
// =============================================================================

/// Which key an expense label was stored under.
///
/// The rate-computed workflow writes `description`, the priced workflow
/// writes `name`; the original key is kept so rewrites don't reshape data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelKey {
    #[default]
    Description,
    Name,
}

/// How an expense looked on the wire before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpenseWire {
    /// The id was generated on load; it is not written back.
    pub synthetic_id: bool,
    pub label: LabelKey,
}

/// A single expense line of an invoice.
///
/// Immutable once added; the only edit is removal from the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItem {
    /// Opaque id, unique within its parent invoice.
    pub id: String,

    /// What the money was spent on (non-empty after trim).
    pub description: String,

    /// Amount spent (>= 0).
    pub amount: Money,

    #[serde(skip)]
    pub(crate) wire: ExpenseWire,
}

impl ExpenseItem {
    /// Creates an expense with a freshly generated id.
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        ExpenseItem {
            id: new_expense_id(),
            description: description.into(),
            amount,
            wire: ExpenseWire::default(),
        }
    }

    /// True when the id was synthesized for a legacy record on load.
    pub fn has_synthetic_id(&self) -> bool {
        self.wire.synthetic_id
    }
}

/// Generates a unique expense id.
pub fn new_expense_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Record Status
// =============================================================================

/// Whether a ledger record is finished.
///
/// Only closed records are ever appended; `Open` exists so that legacy
/// documents carrying a non-zero `currentInvoice` marker can be recognised
/// and filtered out instead of silently counted as history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Closed,
    Open,
}

// =============================================================================
// Pricing
// =============================================================================

/// How the charged amount of an invoice was determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Pricing {
    /// The user typed the price charged to the client.
    #[serde(rename_all = "camelCase")]
    Priced { final_price: Money },

    /// Total derived from expenses plus a tax rate.
    #[serde(rename_all = "camelCase")]
    RateComputed {
        /// Tax rate percent exactly as typed (e.g. `"10"`).
        tax_rate: String,
        subtotal: Money,
        tax: Money,
        total: Money,
    },
}

// =============================================================================
// Invoice
// =============================================================================

/// A closed invoice in the ledger.
///
/// Immutable once appended. There is no public constructor: invoices are
/// produced by [`DraftTicket::close`](crate::draft::DraftTicket::close) or
/// by normalizing a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_name: String,

    /// Empty for legacy priced records, which had no client field.
    pub client_name: String,

    /// `INV-dddd`; not guaranteed unique. Absent on legacy priced records.
    pub invoice_number: Option<String>,

    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,

    pub expenses: Vec<ExpenseItem>,

    pub pricing: Pricing,

    pub status: RecordStatus,

    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,

    /// The stored document carried an explicit `currentInvoice` marker.
    #[serde(skip)]
    pub(crate) status_marked: bool,
}

impl Invoice {
    /// Sum of all expense amounts.
    pub fn expense_sum(&self) -> Money {
        calc::expense_sum(&self.expenses)
    }

    /// Subtotal before tax. Priced records have no stored subtotal, so the
    /// expense sum stands in.
    pub fn subtotal(&self) -> Money {
        match &self.pricing {
            Pricing::Priced { .. } => self.expense_sum(),
            Pricing::RateComputed { subtotal, .. } => *subtotal,
        }
    }

    /// Tax amount; zero for priced records.
    pub fn tax(&self) -> Money {
        match &self.pricing {
            Pricing::Priced { .. } => Money::zero(),
            Pricing::RateComputed { tax, .. } => *tax,
        }
    }

    /// Total billed: `finalPrice` for priced records, the tax-inclusive
    /// total for rate-computed ones.
    pub fn total(&self) -> Money {
        match &self.pricing {
            Pricing::Priced { final_price } => *final_price,
            Pricing::RateComputed { total, .. } => *total,
        }
    }

    /// The amount actually charged to the client.
    #[inline]
    pub fn charged_amount(&self) -> Money {
        self.total()
    }

    /// The tax rate text, for rate-computed records.
    pub fn tax_rate(&self) -> Option<&str> {
        match &self.pricing {
            Pricing::Priced { .. } => None,
            Pricing::RateComputed { tax_rate, .. } => Some(tax_rate),
        }
    }

    /// Checks if this record is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.status == RecordStatus::Closed
    }

    /// Label used by history lists and chart axes: the invoice number, or
    /// the invoice name for records that never had one.
    pub fn label(&self) -> &str {
        self.invoice_number
            .as_deref()
            .unwrap_or(self.invoice_name.as_str())
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// The ordered collection of closed invoices, oldest first.
///
/// Position is the only record identifier besides `invoice_number`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    invoices: Vec<Invoice>,
}

impl Ledger {
    pub fn new(invoices: Vec<Invoice>) -> Self {
        Ledger { invoices }
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Invoice> {
        self.invoices.get(index)
    }

    /// Iterates records in append order.
    pub fn iter(&self) -> slice::Iter<'_, Invoice> {
        self.invoices.iter()
    }

    /// Iterates only records that are closed.
    pub fn closed(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.iter().filter(|inv| inv.is_closed())
    }

    /// Appends at the end.
    pub fn push(&mut self, invoice: Invoice) {
        self.invoices.push(invoice);
    }

    /// Removes the record at `index`, or returns `None` when out of bounds.
    pub fn remove(&mut self, index: usize) -> Option<Invoice> {
        if index >= self.invoices.len() {
            return None;
        }
        Some(self.invoices.remove(index))
    }

    pub fn into_inner(self) -> Vec<Invoice> {
        self.invoices
    }
}

impl IntoIterator for Ledger {
    type Item = Invoice;
    type IntoIter = std::vec::IntoIter<Invoice>;

    fn into_iter(self) -> Self::IntoIter {
        self.invoices.into_iter()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Invoice;
    type IntoIter = slice::Iter<'a, Invoice>;

    fn into_iter(self) -> Self::IntoIter {
        self.invoices.iter()
    }
}

impl FromIterator<Invoice> for Ledger {
    fn from_iter<I: IntoIterator<Item = Invoice>>(iter: I) -> Self {
        Ledger::new(iter.into_iter().collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn expense(description: &str, amount: &str) -> ExpenseItem {
        ExpenseItem::new(description, Money::parse_or_zero(amount))
    }

    pub(crate) fn rate_invoice(client: &str, number: &str, expenses: &[&str], total: &str) -> Invoice {
        let expenses: Vec<ExpenseItem> = expenses.iter().map(|a| expense("item", a)).collect();
        let subtotal = calc::expense_sum(&expenses);
        let total = Money::parse_or_zero(total);
        Invoice {
            invoice_name: format!("Invoice {}", number),
            client_name: client.to_string(),
            invoice_number: Some(number.to_string()),
            date: None,
            expenses,
            pricing: Pricing::RateComputed {
                tax_rate: "10".to_string(),
                subtotal,
                tax: total - subtotal,
                total,
            },
            status: RecordStatus::Closed,
            created_at: None,
            status_marked: false,
        }
    }

    pub(crate) fn priced_invoice(name: &str, expenses: &[&str], final_price: &str) -> Invoice {
        Invoice {
            invoice_name: name.to_string(),
            client_name: String::new(),
            invoice_number: None,
            date: None,
            expenses: expenses.iter().map(|a| expense("item", a)).collect(),
            pricing: Pricing::Priced {
                final_price: Money::parse_or_zero(final_price),
            },
            status: RecordStatus::Closed,
            created_at: None,
            status_marked: true,
        }
    }

    #[test]
    fn test_expense_ids_are_unique() {
        let a = expense("Transporte", "200.50");
        let b = expense("Transporte", "200.50");
        assert_ne!(a.id, b.id);
        assert!(!a.has_synthetic_id());
    }

    #[test]
    fn test_rate_invoice_figures() {
        let inv = rate_invoice("A", "INV-1000", &["200.50", "99.50"], "330");
        assert_eq!(inv.subtotal(), Money::from(300));
        assert_eq!(inv.tax(), Money::from(30));
        assert_eq!(inv.total(), Money::from(330));
        assert_eq!(inv.tax_rate(), Some("10"));
        assert_eq!(inv.label(), "INV-1000");
    }

    #[test]
    fn test_priced_invoice_figures() {
        let inv = priced_invoice("Boda", &["40", "60"], "150");
        assert_eq!(inv.subtotal(), Money::from(100));
        assert!(inv.tax().is_zero());
        assert_eq!(inv.total(), Money::from(150));
        assert_eq!(inv.charged_amount(), Money::from(150));
        assert_eq!(inv.tax_rate(), None);
        assert_eq!(inv.label(), "Boda");
    }

    #[test]
    fn test_ledger_closed_filter() {
        let mut open = priced_invoice("draft", &[], "1");
        open.status = RecordStatus::Open;
        let ledger: Ledger = vec![priced_invoice("a", &[], "1"), open, priced_invoice("b", &[], "2")]
            .into_iter()
            .collect();

        assert_eq!(ledger.len(), 3);
        let names: Vec<&str> = ledger.closed().map(|i| i.invoice_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_pricing_serializes_tagged() {
        let pricing = Pricing::Priced {
            final_price: Money::from(150),
        };
        let json = serde_json::to_string(&pricing).unwrap();
        assert_eq!(json, r#"{"kind":"priced","finalPrice":150}"#);
    }
}

//! # Draft Ticket
//!
//! The single in-progress invoice.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Draft Lifecycle                                   │
//! │                                                                         │
//! │  EMPTY ──first edit──► OPEN ──edits──► OPEN ──close()──► Invoice        │
//! │    ▲                   (invoice number              │                   │
//! │    │                    and date assigned)          │                   │
//! │    └────────────────── reset after commit ◄─────────┘                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module is pure: it validates and mutates the ticket in memory.
//! Persisting after every mutation is the job of `tally_store::Session`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calc::{self, Margin};
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{ExpenseItem, Invoice, LabelKey, Pricing, RecordStatus};
use crate::validation::{
    validate_amount_text, validate_charged_amount, validate_description, validate_required,
    ValidationResult, INVOICE_NUMBER_PREFIX,
};
use crate::DEFAULT_TAX_RATE;

// =============================================================================
// Status & Workflow
// =============================================================================

/// Whether a draft holds anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    #[default]
    Empty,
    Open,
}

impl DraftStatus {
    /// Numeric code used by the stored draft document (`0` / `1`).
    pub fn code(&self) -> i64 {
        match self {
            DraftStatus::Empty => 0,
            DraftStatus::Open => 1,
        }
    }

    /// Any code other than `1` reads as empty.
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            DraftStatus::Open
        } else {
            DraftStatus::Empty
        }
    }
}

/// Which charged-amount variant a draft uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// The user types the final price; profit is price minus expenses.
    Priced,
    /// Total is computed from expenses and a tax rate.
    #[default]
    RateComputed,
}

impl FromStr for Workflow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priced" | "price" => Ok(Workflow::Priced),
            "rate" | "rate_computed" | "tax" => Ok(Workflow::RateComputed),
            other => Err(ValidationError::InvalidFormat {
                field: "workflow".to_string(),
                reason: format!("unknown workflow '{}'", other),
            }),
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workflow::Priced => f.write_str("priced"),
            Workflow::RateComputed => f.write_str("rate"),
        }
    }
}

/// The charged-amount input of a draft, exactly as typed.
///
/// `finalPrice` and `taxRate` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "text", rename_all = "camelCase")]
pub enum DraftPricing {
    FinalPrice(String),
    TaxRate(String),
}

impl DraftPricing {
    pub fn workflow(&self) -> Workflow {
        match self {
            DraftPricing::FinalPrice(_) => Workflow::Priced,
            DraftPricing::TaxRate(_) => Workflow::RateComputed,
        }
    }
}

/// What a freshly reset draft looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDefaults {
    pub workflow: Workflow,
    /// Initial tax rate text for rate-computed drafts.
    pub tax_rate: String,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        DraftDefaults {
            workflow: Workflow::default(),
            tax_rate: DEFAULT_TAX_RATE.to_string(),
        }
    }
}

impl DraftDefaults {
    pub fn pricing(&self) -> DraftPricing {
        match self.workflow {
            Workflow::Priced => DraftPricing::FinalPrice(String::new()),
            Workflow::RateComputed => DraftPricing::TaxRate(self.tax_rate.clone()),
        }
    }
}

/// Fields assignable through [`DraftTicket::set_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    InvoiceName,
    ClientName,
    FinalPrice,
    TaxRate,
}

/// Timestamps are stored with millisecond precision.
fn stored_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

/// Generates a human-facing invoice number, `INV-1000` to `INV-9999`.
///
/// Not unique: two drafts can draw the same number.
pub fn generate_invoice_number() -> String {
    let n: u16 = rand::thread_rng().gen_range(1000..=9999);
    format!("{}{}", INVOICE_NUMBER_PREFIX, n)
}

// =============================================================================
// Draft Ticket
// =============================================================================

/// The invoice being edited.
///
/// ## Invariants
/// - `status == Empty` implies every field is at its default
/// - `invoice_number` is assigned when the draft first opens
/// - `no_expenses == true` implies `expenses` is empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftTicket {
    pub status: DraftStatus,
    pub invoice_name: String,
    pub client_name: String,
    pub invoice_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    pub expenses: Vec<ExpenseItem>,
    pub pricing: DraftPricing,
    pub no_expenses: bool,
}

impl Default for DraftTicket {
    fn default() -> Self {
        DraftTicket::empty(&DraftDefaults::default())
    }
}

impl DraftTicket {
    /// Creates an empty draft.
    pub fn empty(defaults: &DraftDefaults) -> Self {
        DraftTicket {
            status: DraftStatus::Empty,
            invoice_name: String::new(),
            client_name: String::new(),
            invoice_number: None,
            date: None,
            expenses: Vec::new(),
            pricing: defaults.pricing(),
            no_expenses: false,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == DraftStatus::Open
    }

    pub fn workflow(&self) -> Workflow {
        self.pricing.workflow()
    }

    /// Marks the draft as open, assigning number and date on first edit.
    fn touch(&mut self) {
        if self.status == DraftStatus::Empty {
            self.status = DraftStatus::Open;
        }
        if self.invoice_number.is_none() {
            self.invoice_number = Some(generate_invoice_number());
        }
        if self.date.is_none() {
            self.date = Some(stored_precision(Utc::now()));
        }
    }

    /// Appends an expense.
    ///
    /// ## Errors
    /// - `Required { field: "description" }` for a blank description
    /// - `MustBePositive { field: "amount" }` when the amount is not a number
    ///   greater than zero
    ///
    /// ## User Workflow
    /// ```text
    /// "Transporte" + "200.50"
    ///      │
    ///      ▼
    /// add_expense() ← THIS FUNCTION
    ///      │
    ///      ├── invalid? → Err, draft untouched
    ///      └── OK → item appended, "no expenses" cleared, status OPEN
    /// ```
    pub fn add_expense(
        &mut self,
        description: &str,
        amount_text: &str,
    ) -> ValidationResult<ExpenseItem> {
        let description = validate_description(description)?;
        let amount = validate_amount_text(amount_text)?;

        let mut item = ExpenseItem::new(description, amount);
        if self.workflow() == Workflow::Priced {
            item.wire.label = LabelKey::Name;
        }
        self.expenses.push(item.clone());
        self.no_expenses = false;
        self.touch();

        Ok(item)
    }

    /// Removes the expense with `id`. Returns whether anything was removed;
    /// an unknown id is not an error.
    pub fn remove_expense(&mut self, id: &str) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|e| e.id != id);
        self.expenses.len() != before
    }

    /// Plain assignment; nothing is validated until [`close`](Self::close).
    ///
    /// Setting `FinalPrice` or `TaxRate` also switches the draft to that
    /// workflow, since the two inputs are mutually exclusive.
    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::InvoiceName => self.invoice_name = value,
            DraftField::ClientName => self.client_name = value,
            DraftField::FinalPrice => self.pricing = DraftPricing::FinalPrice(value),
            DraftField::TaxRate => self.pricing = DraftPricing::TaxRate(value),
        }
        self.touch();
    }

    /// Toggles the explicit "no expenses" flag. Turning it on drops any
    /// expenses already entered.
    pub fn set_no_expenses(&mut self, no_expenses: bool) {
        self.no_expenses = no_expenses;
        if no_expenses {
            self.expenses.clear();
        }
        self.touch();
    }

    /// Sets the invoice date.
    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.touch();
        self.date = Some(stored_precision(date));
    }

    // -------------------------------------------------------------------------
    // Derived figures
    // -------------------------------------------------------------------------

    pub fn subtotal(&self) -> Money {
        calc::subtotal(&self.expenses, self.no_expenses)
    }

    /// Tax for rate-computed drafts; zero for priced drafts.
    pub fn tax(&self) -> Money {
        match &self.pricing {
            DraftPricing::TaxRate(rate) => calc::tax(self.subtotal(), rate),
            DraftPricing::FinalPrice(_) => Money::zero(),
        }
    }

    /// Computed total, or the typed final price.
    pub fn total(&self) -> Money {
        match &self.pricing {
            DraftPricing::TaxRate(_) => calc::total(self.subtotal(), self.tax()),
            DraftPricing::FinalPrice(price) => Money::parse_or_zero(price),
        }
    }

    #[inline]
    pub fn charged_amount(&self) -> Money {
        self.total()
    }

    pub fn profit(&self) -> Money {
        calc::profit(self.charged_amount(), self.subtotal())
    }

    pub fn margin(&self) -> Margin {
        calc::profit_margin_percent(self.profit(), self.subtotal())
    }

    // -------------------------------------------------------------------------
    // Close
    // -------------------------------------------------------------------------

    /// Validates the draft and snapshots it into a closed [`Invoice`].
    ///
    /// The draft itself is not modified; resetting it after the ledger
    /// append is the caller's job.
    ///
    /// ## Rules
    /// 1. `invoiceName` must not be blank
    /// 2. `clientName` must not be blank (rate-computed workflow only)
    /// 3. at least one expense, unless "no expenses" is set
    /// 4. the charged amount (`finalPrice` or computed `total`) must be > 0
    pub fn close(&self, now: DateTime<Utc>) -> ValidationResult<Invoice> {
        let now = stored_precision(now);
        let invoice_name = validate_required("invoiceName", &self.invoice_name)?;

        let client_name = match self.workflow() {
            Workflow::RateComputed => validate_required("clientName", &self.client_name)?,
            Workflow::Priced => self.client_name.trim().to_string(),
        };

        if self.expenses.is_empty() && !self.no_expenses {
            return Err(ValidationError::Required {
                field: "expenses".to_string(),
            });
        }

        let pricing = match &self.pricing {
            DraftPricing::FinalPrice(price) => Pricing::Priced {
                final_price: validate_charged_amount("finalPrice", Money::parse_or_zero(price))?,
            },
            DraftPricing::TaxRate(rate) => {
                let subtotal = self.subtotal();
                let tax = calc::tax(subtotal, rate);
                Pricing::RateComputed {
                    tax_rate: rate.clone(),
                    subtotal,
                    tax,
                    total: validate_charged_amount("total", calc::total(subtotal, tax))?,
                }
            }
        };

        let expenses = if self.no_expenses {
            Vec::new()
        } else {
            self.expenses.clone()
        };

        let status_marked = matches!(pricing, Pricing::Priced { .. });

        Ok(Invoice {
            invoice_name,
            client_name,
            invoice_number: Some(
                self.invoice_number
                    .clone()
                    .unwrap_or_else(generate_invoice_number),
            ),
            date: Some(self.date.unwrap_or(now)),
            expenses,
            pricing,
            status: RecordStatus::Closed,
            created_at: Some(now),
            status_marked,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

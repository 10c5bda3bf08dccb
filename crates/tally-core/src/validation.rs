//! # Validation Module
//!
//! Input validation for draft edits and commits.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form                                                      │
//! │  ├── Disables "save" while fields are empty                            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── add_expense: description + amount                                 │
//! │  └── commit: names, expenses, charged amount                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger store                                                 │
//! │  └── Rejects records that are not closed                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_amount_text, validate_description};
//!
//! assert_eq!(validate_description("  Comida ").unwrap(), "Comida");
//! assert!(validate_amount_text("0").is_err());
//! assert!(validate_amount_text("99.50").is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Prefix of every generated invoice number.
pub const INVOICE_NUMBER_PREFIX: &str = "INV-";

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a text field is not blank.
///
/// ## Returns
/// The trimmed value.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(value.to_string())
}

/// Validates an expense description (non-empty after trim).
pub fn validate_description(description: &str) -> ValidationResult<String> {
    validate_required("description", description)
}

/// Validates an invoice number of the form `INV-` followed by 4 ASCII digits.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_invoice_number;
///
/// assert!(validate_invoice_number("INV-4821").is_ok());
/// assert!(validate_invoice_number("INV-48").is_err());
/// ```
pub fn validate_invoice_number(number: &str) -> ValidationResult<()> {
    let digits = number.strip_prefix(INVOICE_NUMBER_PREFIX);

    match digits {
        Some(d) if d.len() == 4 && d.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "invoiceNumber".to_string(),
            reason: format!("expected {}dddd", INVOICE_NUMBER_PREFIX),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the amount text of a new expense.
///
/// ## Rules
/// - Must start with a number
/// - Must be strictly positive
///
/// ## User Workflow
/// ```text
/// User types amount: "200.50"
///      │
///      ▼
/// validate_amount_text("200.50") ← THIS FUNCTION
///      │
///      ├── not a number? → Error: "amount must be positive"
///      ├── <= 0?         → Error: "amount must be positive"
///      └── OK → ExpenseItem appended to the draft
/// ```
pub fn validate_amount_text(amount_text: &str) -> ValidationResult<Money> {
    match Money::parse(amount_text) {
        Some(amount) if amount.is_positive() => Ok(amount),
        _ => Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }),
    }
}

/// Validates that a charged amount is strictly positive.
pub fn validate_charged_amount(field: &str, amount: Money) -> ValidationResult<Money> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

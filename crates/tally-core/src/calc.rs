//! # Financial Calculator
//!
//! Pure functions deriving subtotal, tax, total, profit and margin.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  expenses[] ──► subtotal ──┬──► tax(subtotal, "10") ──► total           │
//! │  (0 when "no expenses")    │                             │              │
//! │                            │                             ▼              │
//! │                            └────────► profit = charged − expense sum    │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                              margin = profit / subtotal × 100           │
//! │                              (Margin::Undefined when subtotal = 0)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Profit Definition
//! There is one profit definition: `charged − expense sum`. The charged
//! amount is `finalPrice` for priced invoices and the tax-inclusive `total`
//! for rate-computed ones, so in the rate workflow tax counts toward
//! profit. The dashboard series uses the same definition.
//!
//! All outputs are finite: text that does not parse reads as zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{ExpenseItem, Invoice};

/// Sum of `amount` over all items.
pub fn expense_sum(expenses: &[ExpenseItem]) -> Money {
    expenses.iter().map(|e| e.amount).sum()
}

/// Subtotal of a set of expenses; zero when the "no expenses" flag is set,
/// regardless of what the list still holds.
///
/// ## Example
/// ```rust
/// use tally_core::calc;
/// use tally_core::{ExpenseItem, Money};
///
/// let expenses = vec![
///     ExpenseItem::new("Transporte", Money::parse_or_zero("200.50")),
///     ExpenseItem::new("Comida", Money::parse_or_zero("99.50")),
/// ];
/// assert_eq!(calc::subtotal(&expenses, false), Money::from(300));
/// assert!(calc::subtotal(&expenses, true).is_zero());
/// ```
pub fn subtotal(expenses: &[ExpenseItem], no_expenses: bool) -> Money {
    if no_expenses {
        return Money::zero();
    }
    expense_sum(expenses)
}

/// Reads a tax rate percent from text; unparsable text is a zero rate.
pub fn parse_rate(tax_rate_percent: &str) -> Decimal {
    Money::parse_or_zero(tax_rate_percent).amount()
}

/// `subtotal × rate / 100`.
pub fn tax(subtotal: Money, tax_rate_percent: &str) -> Money {
    subtotal.percent(parse_rate(tax_rate_percent))
}

/// `subtotal + tax`.
#[inline]
pub fn total(subtotal: Money, tax: Money) -> Money {
    subtotal + tax
}

/// `charged − subtotal`; negative means a loss.
#[inline]
pub fn profit(charged_amount: Money, subtotal: Money) -> Money {
    charged_amount - subtotal
}

// =============================================================================
// Margin
// =============================================================================

/// Profit as a percentage of the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "camelCase")]
pub enum Margin {
    Percent(Decimal),
    /// The subtotal is zero, so a margin has no meaning.
    Undefined,
}

impl Margin {
    pub fn percent(&self) -> Option<Decimal> {
        match self {
            Margin::Percent(p) => Some(*p),
            Margin::Undefined => None,
        }
    }

    /// Formats the margin with two decimals; `Undefined` renders as `0.00`,
    /// which is what history screens show for expense-free invoices.
    pub fn to_fixed(&self) -> String {
        Money::new(self.percent().unwrap_or_default()).to_fixed(2)
    }
}

/// `profit / subtotal × 100`, or [`Margin::Undefined`] for a zero subtotal.
pub fn profit_margin_percent(profit: Money, subtotal: Money) -> Margin {
    if subtotal.is_zero() {
        return Margin::Undefined;
    }
    profit
        .amount()
        .checked_div(subtotal.amount())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(Margin::Percent)
        .unwrap_or(Margin::Undefined)
}

// =============================================================================
// Invoice Profit
// =============================================================================

/// Profit figures of a single closed invoice, as history and export show them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceProfit {
    pub expense_sum: Money,
    pub charged: Money,
    pub profit: Money,
    pub margin: Margin,
}

impl InvoiceProfit {
    pub fn is_loss(&self) -> bool {
        self.profit.is_negative()
    }
}

/// Computes expense sum, charged amount, profit and margin for an invoice.
pub fn invoice_profit(invoice: &Invoice) -> InvoiceProfit {
    let expense_sum = invoice.expense_sum();
    let charged = invoice.charged_amount();
    let profit = profit(charged, expense_sum);

    InvoiceProfit {
        expense_sum,
        charged,
        profit,
        margin: profit_margin_percent(profit, expense_sum),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::{expense, priced_invoice, rate_invoice};

    fn m(text: &str) -> Money {
        Money::parse_or_zero(text)
    }

    #[test]
    fn test_subtotal_sums_amounts() {
        let items = vec![expense("a", "1.10"), expense("b", "2.20"), expense("c", "3.30")];
        assert_eq!(subtotal(&items, false), m("6.60"));
        assert!(subtotal(&[], false).is_zero());
    }

    #[test]
    fn test_no_expenses_flag_zeroes_subtotal() {
        let items = vec![expense("a", "50")];
        assert!(subtotal(&items, true).is_zero());
    }

    #[test]
    fn test_tax_and_total_example() {
        let items = vec![expense("Transporte", "200.50"), expense("Comida", "99.50")];
        let s = subtotal(&items, false);
        let t = tax(s, "10");

        assert_eq!(s.to_fixed(2), "300.00");
        assert_eq!(t.to_fixed(2), "30.00");
        assert_eq!(total(s, t).to_fixed(2), "330.00");
    }

    #[test]
    fn test_unparsable_rate_is_zero() {
        assert!(tax(m("300"), "abc").is_zero());
        assert!(tax(m("300"), "").is_zero());
        assert_eq!(tax(m("300"), "16%"), m("48"));
    }

    #[test]
    fn test_total_is_sum() {
        assert_eq!(total(m("10.25"), m("1.75")), m("12"));
        assert_eq!(total(m("0"), m("0")), Money::zero());
    }

    #[test]
    fn test_profit_and_margin() {
        let p = profit(m("150"), m("100"));
        assert_eq!(p, m("50"));
        assert_eq!(profit_margin_percent(p, m("100")), Margin::Percent(Decimal::from(50)));

        let loss = profit(m("80"), m("100"));
        assert_eq!(loss, m("-20"));
        assert_eq!(
            profit_margin_percent(loss, m("100")).percent(),
            Some(Decimal::from(-20))
        );
    }

    #[test]
    fn test_margin_undefined_for_zero_subtotal() {
        let margin = profit_margin_percent(m("100"), Money::zero());
        assert_eq!(margin, Margin::Undefined);
        assert_eq!(margin.percent(), None);
        assert_eq!(margin.to_fixed(), "0.00");
    }

    #[test]
    fn test_margin_serializes_tagged() {
        let json = serde_json::to_string(&Margin::Undefined).unwrap();
        assert_eq!(json, r#"{"kind":"undefined"}"#);
    }

    #[test]
    fn test_invoice_profit_priced() {
        let inv = priced_invoice("Boda", &["40", "60"], "150");
        let figures = invoice_profit(&inv);

        assert_eq!(figures.expense_sum, m("100"));
        assert_eq!(figures.charged, m("150"));
        assert_eq!(figures.profit, m("50"));
        assert!(!figures.is_loss());
    }

    #[test]
    fn test_invoice_profit_rate_counts_tax() {
        let inv = rate_invoice("A", "INV-1000", &["200.50", "99.50"], "330");
        let figures = invoice_profit(&inv);

        assert_eq!(figures.profit, m("30"));
        assert_eq!(figures.margin, Margin::Percent(Decimal::from(10)));
    }
}

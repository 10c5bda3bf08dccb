//! # Aggregation Engine
//!
//! Dashboard figures computed from the ledger. Every function is a pure
//! read over a sequence of invoices; nothing here touches storage.
//!
//! ## Dashboard Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GlobalTotals      count │ Σ subtotal │ Σ tax │ Σ total                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Per client        "Ana"  ─► Σ total                                   │
//! │  (sorted by name)  "Luis" ─► Σ total                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Series            INV-4821 │ expense sum │ profit                      │
//! │  (ledger order)    INV-1093 │ expense sum │ profit                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calc;
use crate::money::Money;
use crate::types::{Invoice, Ledger};

// =============================================================================
// Global Totals
// =============================================================================

/// Count and sums over a set of invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTotals {
    pub count: u32,
    pub subtotal_sum: Money,
    pub tax_sum: Money,
    pub total_sum: Money,
}

/// Sums subtotal, tax and total. An empty input gives all zeros.
pub fn global_totals<'a, I>(invoices: I) -> GlobalTotals
where
    I: IntoIterator<Item = &'a Invoice>,
{
    invoices
        .into_iter()
        .fold(GlobalTotals::default(), |mut acc, invoice| {
            acc.count += 1;
            acc.subtotal_sum += invoice.subtotal();
            acc.tax_sum += invoice.tax();
            acc.total_sum += invoice.total();
            acc
        })
}

// =============================================================================
// Per-Client Totals
// =============================================================================

/// Summed `total` per distinct `clientName`.
///
/// Keys are the names exactly as stored (case-sensitive, untrimmed), so
/// `"Ana"` and `"ana"` are two clients. Legacy priced records have no client
/// and group under the empty string.
pub fn per_client_totals<'a, I>(invoices: I) -> BTreeMap<String, Money>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();
    for invoice in invoices {
        *totals.entry(invoice.client_name.clone()).or_default() += invoice.total();
    }
    totals
}

// =============================================================================
// Expense vs Profit Series
// =============================================================================

/// One chart point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// The invoice number, or its name when it never had one.
    pub label: String,
    pub expense_sum: Money,
    pub profit: Money,
}

/// `(expense sum, profit)` per invoice, in ledger order.
///
/// Profit is `total − expense sum`, the same figure as
/// [`calc::invoice_profit`].
pub fn expense_vs_profit_series<'a, I>(invoices: I) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    invoices
        .into_iter()
        .map(|invoice| {
            let figures = calc::invoice_profit(invoice);
            SeriesPoint {
                label: invoice.label().to_string(),
                expense_sum: figures.expense_sum,
                profit: figures.profit,
            }
        })
        .collect()
}

// =============================================================================
// Dashboard Summary
// =============================================================================

/// Everything the dashboard screen shows, computed in one pass over the
/// closed records of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub totals: GlobalTotals,
    pub per_client: BTreeMap<String, Money>,
    pub series: Vec<SeriesPoint>,
}

impl DashboardSummary {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        DashboardSummary {
            totals: global_totals(ledger.closed()),
            per_client: per_client_totals(ledger.closed()),
            series: expense_vs_profit_series(ledger.closed()),
        }
    }
}

impl Ledger {
    pub fn global_totals(&self) -> GlobalTotals {
        global_totals(self.closed())
    }

    pub fn per_client_totals(&self) -> BTreeMap<String, Money> {
        per_client_totals(self.closed())
    }

    pub fn expense_vs_profit_series(&self) -> Vec<SeriesPoint> {
        expense_vs_profit_series(self.closed())
    }

    pub fn dashboard(&self) -> DashboardSummary {
        DashboardSummary::from_ledger(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::{priced_invoice, rate_invoice};
    use crate::types::RecordStatus;

    fn m(text: &str) -> Money {
        Money::parse_or_zero(text)
    }

    #[test]
    fn test_empty_ledger_totals() {
        let totals = Ledger::default().global_totals();
        assert_eq!(totals.count, 0);
        assert!(totals.subtotal_sum.is_zero());
        assert!(totals.tax_sum.is_zero());
        assert!(totals.total_sum.is_zero());
    }

    #[test]
    fn test_global_totals() {
        let ledger: Ledger = vec![
            rate_invoice("A", "INV-1000", &["200.50", "99.50"], "330"),
            priced_invoice("Boda", &["40", "60"], "150"),
        ]
        .into_iter()
        .collect();

        let totals = ledger.global_totals();
        assert_eq!(totals.count, 2);
        assert_eq!(totals.subtotal_sum, m("400"));
        assert_eq!(totals.tax_sum, m("30"));
        assert_eq!(totals.total_sum, m("480"));
    }

    #[test]
    fn test_per_client_totals() {
        let ledger: Ledger = vec![
            rate_invoice("A", "INV-1001", &["10"], "10"),
            rate_invoice("A", "INV-1002", &["5"], "5"),
            rate_invoice("B", "INV-1003", &["7"], "7"),
        ]
        .into_iter()
        .collect();

        let totals = ledger.per_client_totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["A"], m("15"));
        assert_eq!(totals["B"], m("7"));
    }

    #[test]
    fn test_totals_saturate_on_huge_stored_amounts() {
        let ledger: Ledger = vec![
            rate_invoice("A", "INV-1001", &["5e28"], "5e28"),
            rate_invoice("A", "INV-1002", &["5e28"], "5e28"),
        ]
        .into_iter()
        .collect();

        let max = Money::new(rust_decimal::Decimal::MAX);
        assert_eq!(ledger.global_totals().total_sum, max);
        assert_eq!(ledger.per_client_totals()["A"], max);
        assert_eq!(ledger.expense_vs_profit_series().len(), 2);
    }

    #[test]
    fn test_client_keys_are_case_sensitive() {
        let invoices = vec![
            rate_invoice("Ana", "INV-1001", &["1"], "1"),
            rate_invoice("ana", "INV-1002", &["1"], "1"),
        ];
        let keys: Vec<String> = per_client_totals(&invoices).into_keys().collect();
        assert_eq!(keys, vec!["Ana".to_string(), "ana".to_string()]);
    }

    #[test]
    fn test_series_uses_total_minus_expenses() {
        let ledger: Ledger = vec![
            rate_invoice("A", "INV-1000", &["200.50", "99.50"], "330"),
            priced_invoice("Boda", &["120"], "100"),
        ]
        .into_iter()
        .collect();

        let series = ledger.expense_vs_profit_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "INV-1000");
        assert_eq!(series[0].expense_sum, m("300"));
        assert_eq!(series[0].profit, m("30"));
        assert_eq!(series[1].label, "Boda");
        assert_eq!(series[1].profit, m("-20"));
    }

    #[test]
    fn test_dashboard_skips_open_records() {
        let mut open = rate_invoice("C", "INV-2000", &["1"], "1");
        open.status = RecordStatus::Open;
        let ledger: Ledger = vec![rate_invoice("A", "INV-1000", &["1"], "2"), open]
            .into_iter()
            .collect();

        let summary = ledger.dashboard();
        assert_eq!(summary.totals.count, 1);
        assert!(!summary.per_client.contains_key("C"));
        assert_eq!(summary.series.len(), 1);
    }
}

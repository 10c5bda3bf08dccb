//! # Export Adapter
//!
//! Renders one closed invoice into a shareable artifact.
//!
//! ## Export Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  History screen "share" ──► Session::export(index, &exporter)           │
//! │                                   │                                     │
//! │                                   ├── ledger.get(index)                 │
//! │                                   ├── still open? → NotClosed           │
//! │                                   ▼                                     │
//! │                         InvoiceExporter::render                        │
//! │                          ├── TextExporter  → share message              │
//! │                          └── HtmlExporter  → printable document         │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                         Artifact ──► device share surface               │
//! │                                                                         │
//! │  Every failure is an ExportError the UI can show and retry; nothing     │
//! │  here writes to storage.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use tally_core::calc::invoice_profit;
use tally_core::{Invoice, Money};
use thiserror::Error;

use crate::error::StoreError;

/// Export failures. Never fatal; the ledger is untouched.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Only closed invoices can be exported.
    #[error("Invoice {invoice} is not closed")]
    NotClosed { invoice: String },

    /// The renderer could not produce the artifact.
    #[error("Render failed: {0}")]
    Render(String),

    /// The invoice could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A rendered invoice, ready for the share surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Plain share message.
    Text { subject: String, body: String },

    /// Printable document.
    Html {
        file_name: String,
        title: String,
        body: String,
    },
}

impl Artifact {
    /// The payload handed to the share surface.
    pub fn body(&self) -> &str {
        match self {
            Artifact::Text { body, .. } | Artifact::Html { body, .. } => body,
        }
    }
}

/// Renders a closed invoice.
///
/// `index` is the record's ledger position, used to title invoices that
/// have neither a name nor a number.
pub trait InvoiceExporter: Send + Sync {
    fn render(&self, invoice: &Invoice, index: usize) -> Result<Artifact, ExportError>;
}

fn ensure_closed(invoice: &Invoice) -> Result<(), ExportError> {
    if !invoice.is_closed() {
        return Err(ExportError::NotClosed {
            invoice: invoice.label().to_string(),
        });
    }
    Ok(())
}

/// Day/month/year, or empty when the record carries no date.
fn format_day(at: Option<DateTime<Utc>>) -> String {
    at.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn title(invoice: &Invoice, index: usize) -> String {
    if invoice.invoice_name.is_empty() {
        format!("Factura {}", index + 1)
    } else {
        invoice.invoice_name.clone()
    }
}

// =============================================================================
// Text Exporter
// =============================================================================

/// Builds the share message.
///
/// ```text
/// Factura INV-4821
/// Cliente: Ana
/// Fecha: 02/05/2024
/// Total: $330.00
///
/// Gastos:
/// - Transporte: $200.50
/// - Comida: $99.50
/// ```
#[derive(Debug, Clone)]
pub struct TextExporter {
    currency_symbol: String,
}

impl TextExporter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        TextExporter {
            currency_symbol: currency_symbol.into(),
        }
    }

    fn money(&self, amount: Money) -> String {
        format!("{}{}", self.currency_symbol, amount.to_fixed(2))
    }
}

impl Default for TextExporter {
    fn default() -> Self {
        TextExporter::new("$")
    }
}

impl InvoiceExporter for TextExporter {
    fn render(&self, invoice: &Invoice, index: usize) -> Result<Artifact, ExportError> {
        ensure_closed(invoice)?;

        let heading = invoice
            .invoice_number
            .clone()
            .unwrap_or_else(|| title(invoice, index));

        let mut body = String::new();
        let _ = writeln!(body, "Factura {}", heading);
        let _ = writeln!(body, "Cliente: {}", invoice.client_name);
        let _ = writeln!(body, "Fecha: {}", format_day(invoice.date.or(invoice.created_at)));
        let _ = writeln!(body, "Total: {}", self.money(invoice.total()));
        body.push('\n');

        if !invoice.expenses.is_empty() {
            body.push_str("Gastos:\n");
            for expense in &invoice.expenses {
                let _ = writeln!(body, "- {}: {}", expense.description, self.money(expense.amount));
            }
        }

        Ok(Artifact::Text {
            subject: format!("Factura {}", heading),
            body,
        })
    }
}

// =============================================================================
// HTML Exporter
// =============================================================================

/// Builds a printable one-page document with the expense sum, the charged
/// amount and the profit (or loss) with its margin.
#[derive(Debug, Clone)]
pub struct HtmlExporter {
    currency_symbol: String,
}

impl HtmlExporter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        HtmlExporter {
            currency_symbol: currency_symbol.into(),
        }
    }

    fn money(&self, amount: Money) -> String {
        escape_html(&format!("{}{}", self.currency_symbol, amount.to_fixed(2)))
    }
}

impl Default for HtmlExporter {
    fn default() -> Self {
        HtmlExporter::new("$")
    }
}

impl InvoiceExporter for HtmlExporter {
    fn render(&self, invoice: &Invoice, index: usize) -> Result<Artifact, ExportError> {
        ensure_closed(invoice)?;

        let title = title(invoice, index);
        let figures = invoice_profit(invoice);
        let profit_label = if figures.is_loss() { "Pérdida:" } else { "Ganancia:" };
        let escaped_title = escape_html(&title);

        let mut body = String::new();
        let _ = write!(
            body,
            r#"<html>
  <head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
      body {{ font-family: Arial; margin: 20px; }}
      .header {{ text-align: center; margin-bottom: 20px; }}
      .invoice-title {{ font-size: 18px; font-weight: bold; }}
      .invoice-date {{ font-size: 12px; color: #666; }}
      .row {{ display: flex; margin: 5px 0; }}
      .label {{ width: 100px; color: #666; }}
      .value {{ font-weight: 500; }}
      .profit {{ margin-top: 15px; padding-top: 10px; border-top: 1px solid #eee; }}
    </style>
  </head>
  <body>
    <div class="header">
      <div class="invoice-title">{title}</div>
      <div class="invoice-date">Fecha: {date}</div>
    </div>
"#,
            title = escaped_title,
            date = format_day(invoice.created_at.or(invoice.date)),
        );

        if !invoice.client_name.is_empty() {
            let _ = writeln!(
                body,
                r#"    <div class="row"><div class="label">Cliente:</div><div class="value">{}</div></div>"#,
                escape_html(&invoice.client_name)
            );
        }

        let _ = write!(
            body,
            r#"    <div class="row"><div class="label">Gastos:</div><div class="value">{expenses}</div></div>
    <div class="row"><div class="label">Total a pagar:</div><div class="value">{charged}</div></div>
    <div class="row profit"><div class="label">{profit_label}</div><div class="value">{profit} ({margin}%)</div></div>
    <div style="margin-top: 30px; text-align: center; color: #888; font-size: 12px;">
      Gracias por su preferencia
    </div>
  </body>
</html>
"#,
            expenses = self.money(figures.expense_sum),
            charged = self.money(figures.charged),
            profit_label = profit_label,
            profit = self.money(figures.profit.abs()),
            margin = figures.margin.to_fixed(),
        );

        let stamp = invoice
            .created_at
            .map(|at| at.timestamp_millis())
            .unwrap_or_default();
        let file_stem: String = if invoice.invoice_name.is_empty() {
            index.to_string()
        } else {
            invoice
                .invoice_name
                .chars()
                .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
                .collect()
        };

        Ok(Artifact::Html {
            file_name: format!("Factura_{}_{}.html", file_stem, stamp),
            title,
            body,
        })
    }
}

/// Escapes text for HTML element content and attribute values.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

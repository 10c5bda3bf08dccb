//! # Configuration
//!
//! Store configuration from defaults and environment variables.
//!
//! ## Environment Variables
//! | Variable                  | Default                      |
//! |---------------------------|------------------------------|
//! | `TALLY_DB_PATH`           | platform data dir `tally.db` |
//! | `TALLY_DRAFT_KEY`         | `currentInvoice`             |
//! | `TALLY_LEDGER_KEY`        | `invoices`                   |
//! | `TALLY_DEFAULT_TAX_RATE`  | `10`                         |
//! | `TALLY_WORKFLOW`          | `rate` (or `priced`)         |
//! | `TALLY_CURRENCY_SYMBOL`   | `$`                          |

use std::path::PathBuf;

use directories::ProjectDirs;
use tally_core::{DraftDefaults, Workflow, DEFAULT_TAX_RATE};
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::export::{HtmlExporter, TextExporter};
use crate::pool::DbConfig;

/// Key the draft document has always been stored under.
pub const DEFAULT_DRAFT_KEY: &str = "currentInvoice";

/// Key the ledger document has always been stored under.
pub const DEFAULT_LEDGER_KEY: &str = "invoices";

const DB_FILE_NAME: &str = "tally.db";

/// Everything a [`Session`](crate::session::Session) needs to know about
/// where and how to store documents.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,

    pub draft_key: String,
    pub ledger_key: String,

    /// Shape of a freshly reset draft.
    pub draft_defaults: DraftDefaults,

    /// Prefix for amounts in exported artifacts; see
    /// [`text_exporter`](Self::text_exporter) and
    /// [`html_exporter`](Self::html_exporter).
    pub currency_symbol: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            db_path: default_db_path(),
            draft_key: DEFAULT_DRAFT_KEY.to_string(),
            ledger_key: DEFAULT_LEDGER_KEY.to_string(),
            draft_defaults: DraftDefaults::default(),
            currency_symbol: "$".to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration from environment variables and defaults.
    pub fn from_env() -> Self {
        StoreConfig::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates a configuration reading variables through `lookup`.
    ///
    /// Blank values are ignored; an unknown workflow is logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = StoreConfig::default();

        if let Some(path) = var("TALLY_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(key) = var("TALLY_DRAFT_KEY") {
            config.draft_key = key;
        }

        if let Some(key) = var("TALLY_LEDGER_KEY") {
            config.ledger_key = key;
        }

        if let Some(rate) = var("TALLY_DEFAULT_TAX_RATE") {
            config.draft_defaults.tax_rate = rate.trim().to_string();
        }

        if let Some(workflow) = var("TALLY_WORKFLOW") {
            match workflow.parse::<Workflow>() {
                Ok(workflow) => config.draft_defaults.workflow = workflow,
                Err(e) => warn!(error = %e, "Ignoring TALLY_WORKFLOW"),
            }
        }

        if let Some(symbol) = var("TALLY_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        config
    }

    /// Configuration for an in-memory database (for testing).
    pub fn in_memory() -> Self {
        StoreConfig {
            db_path: PathBuf::from(":memory:"),
            ..StoreConfig::default()
        }
    }

    /// Pool configuration for [`db_path`](Self::db_path).
    pub fn db_config(&self) -> DbConfig {
        if self.db_path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(self.db_path.clone())
    }

    /// Share-message exporter using the configured currency symbol.
    pub fn text_exporter(&self) -> TextExporter {
        TextExporter::new(self.currency_symbol.clone())
    }

    /// Printable-document exporter using the configured currency symbol.
    pub fn html_exporter(&self) -> HtmlExporter {
        HtmlExporter::new(self.currency_symbol.clone())
    }

    /// Creates the database file's parent directory if it doesn't exist.
    pub fn ensure_db_dir(&self) -> StoreResult<()> {
        match self.db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
                .map_err(|e| StoreError::Storage(format!("{}: {}", dir.display(), e))),
            _ => Ok(()),
        }
    }
}

/// Platform data directory, falling back to the working directory.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.tally.invoices/tally.db`
/// - **Windows**: `%APPDATA%\tally\invoices\data\tally.db`
/// - **Linux**: `~/.local/share/invoices/tally.db`
fn default_db_path() -> PathBuf {
    ProjectDirs::from("com", "tally", "invoices")
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[]));
        assert_eq!(config.draft_key, "currentInvoice");
        assert_eq!(config.ledger_key, "invoices");
        assert_eq!(config.draft_defaults.tax_rate, DEFAULT_TAX_RATE);
        assert_eq!(config.draft_defaults.workflow, Workflow::RateComputed);
        assert_eq!(config.currency_symbol, "$");
        assert!(config.db_path.ends_with("tally.db"));
    }

    #[test]
    fn test_env_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("TALLY_DB_PATH", "/tmp/t.db"),
            ("TALLY_LEDGER_KEY", "ledger"),
            ("TALLY_DEFAULT_TAX_RATE", " 16 "),
            ("TALLY_WORKFLOW", "priced"),
            ("TALLY_CURRENCY_SYMBOL", "€"),
        ]));

        assert_eq!(config.db_path, PathBuf::from("/tmp/t.db"));
        assert_eq!(config.ledger_key, "ledger");
        assert_eq!(config.draft_key, "currentInvoice");
        assert_eq!(config.draft_defaults.tax_rate, "16");
        assert_eq!(config.draft_defaults.workflow, Workflow::Priced);
        assert_eq!(config.currency_symbol, "€");
    }

    #[test]
    fn test_blank_and_invalid_values_ignored() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("TALLY_DRAFT_KEY", "  "),
            ("TALLY_WORKFLOW", "hourly"),
        ]));
        assert_eq!(config.draft_key, "currentInvoice");
        assert_eq!(config.draft_defaults.workflow, Workflow::RateComputed);
    }

    #[test]
    fn test_exporters_use_configured_currency_symbol() {
        use crate::export::InvoiceExporter;
        use chrono::Utc;
        use tally_core::{DraftField, DraftTicket};

        let config = StoreConfig::from_lookup(lookup(&[("TALLY_CURRENCY_SYMBOL", "€")]));

        let mut draft = DraftTicket::empty(&config.draft_defaults);
        draft.set_field(DraftField::InvoiceName, "Consulta");
        draft.set_field(DraftField::ClientName, "Ana");
        draft.add_expense("Comida", "99.50").unwrap();
        let invoice = draft.close(Utc::now()).unwrap();

        let text = config.text_exporter().render(&invoice, 0).unwrap();
        assert!(text.body().contains("Total: €109.45"));
        assert!(text.body().contains("- Comida: €99.50"));

        let html = config.html_exporter().render(&invoice, 0).unwrap();
        assert!(html.body().contains("€99.50"));
        assert!(!html.body().contains("$"));
    }

    #[test]
    fn test_in_memory_db_config() {
        let db = StoreConfig::in_memory().db_config();
        assert_eq!(db.max_connections, 1);
    }
}

//! IDS symbol tables
//!
//! IDS files map engine integers to symbolic names (`2 PC`, `0x4023 True()`).
//! They may be XOR-obfuscated; [`IdsTable::from_bytes`] handles both forms.

mod cache;
mod parser;

use std::sync::Arc;

pub use cache::IdsCache;
pub use parser::{IdsTable, decrypt, encrypt, is_encrypted, normalize_name, parse_int};

/// Read access to IDS tables
///
/// The decompiler and compiler only see this trait, so tests can hand them
/// a private [`IdsCache`] instead of the global one.
pub trait SymbolSource: Send + Sync {
    /// Table by (case-insensitive, extension-normalized) name
    fn table(&self, name: &str) -> Option<Arc<IdsTable>>;

    /// Value of `symbol` in `table`, or -1
    fn value(&self, table: &str, symbol: &str) -> i64 {
        self.table(table)
            .and_then(|t| t.value(symbol))
            .unwrap_or(-1)
    }

    /// Symbol of `value` in `table`, or an empty string
    fn symbol(&self, table: &str, value: i64) -> String {
        self.table(table)
            .and_then(|t| t.symbol(value).map(str::to_string))
            .unwrap_or_default()
    }
}

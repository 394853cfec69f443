//! PVRZ page numbering
//!
//! Tileset pages are private to one TIS (`A0100` + page `00`..`99`), while
//! MOS V2 and BAM V2 share one global `MOSxxxx` namespace. Each namespace
//! keeps its own counter so independent assemble runs in one process never
//! hand out the same page twice.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

/// Which page namespace a resource draws from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageSpace {
    /// Pages of one tileset, keyed by the TIS resource name
    Tileset(String),
    /// The shared MOS/BAM namespace
    Mos,
}

impl PageSpace {
    /// File name of a page in this namespace
    #[must_use]
    pub fn page_name(&self, page: u32) -> String {
        match self {
            PageSpace::Tileset(tis) => tileset_page_name(tis, page),
            PageSpace::Mos => mos_page_name(page),
        }
    }
}

/// `MOS1234.PVRZ`
#[must_use]
pub fn mos_page_name(page: u32) -> String {
    format!("MOS{page:04}.PVRZ")
}

/// Tileset page name: first letter plus the last four characters of the
/// resource name, then a two-digit page (`AR0100` page 3 -> `A010003.PVRZ`)
#[must_use]
pub fn tileset_page_name(tis: &str, page: u32) -> String {
    let upper = tis.to_uppercase();
    let first: String = upper.chars().take(1).collect();
    let chars: Vec<char> = upper.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{first}{tail}{page:02}.PVRZ")
}

/// Hands out page numbers per namespace
#[derive(Debug)]
pub struct PageNamer {
    mos_base: u32,
    counters: Mutex<HashMap<PageSpace, u32>>,
}

impl PageNamer {
    /// Create a namer whose MOS/BAM pages start at `mos_base`
    #[must_use]
    pub fn new(mos_base: u32) -> Self {
        Self {
            mos_base,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide namer used by the format plugins
    pub fn global() -> &'static PageNamer {
        static NAMER: OnceLock<PageNamer> = OnceLock::new();
        NAMER.get_or_init(|| PageNamer::new(1000))
    }

    /// Allocate the next page number for `space`, skipping numbers for which
    /// `taken` reports an existing file
    pub fn allocate(&self, space: &PageSpace, taken: impl Fn(u32) -> bool) -> u32 {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let start = match space {
            PageSpace::Tileset(_) => 0,
            PageSpace::Mos => self.mos_base,
        };
        let counter = counters.entry(space.clone()).or_insert(start);
        while taken(*counter) {
            *counter += 1;
        }
        let page = *counter;
        *counter += 1;
        page
    }

    /// Forget every counter (used between independent batches and in tests)
    pub fn reset(&self) {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_names() {
        assert_eq!(mos_page_name(7), "MOS0007.PVRZ");
        assert_eq!(tileset_page_name("ar0100", 3), "A010003.PVRZ");
        assert_eq!(PageSpace::Tileset("AR2600".into()).page_name(12), "A260012.PVRZ");
    }

    #[test]
    fn test_counters_are_independent() {
        let namer = PageNamer::new(1000);
        let tis = PageSpace::Tileset("AR0100".into());
        assert_eq!(namer.allocate(&PageSpace::Mos, |_| false), 1000);
        assert_eq!(namer.allocate(&tis, |_| false), 0);
        assert_eq!(namer.allocate(&PageSpace::Mos, |p| p == 1001), 1002);
        assert_eq!(namer.allocate(&tis, |_| false), 1);
        namer.reset();
        assert_eq!(namer.allocate(&tis, |_| false), 0);
    }
}

//! 2DA text tables
//!
//! ```text
//! 2DA V1.0
//! ****
//!          X     Y
//! START    100   200
//! ```

use crate::error::{Error, Result};
use crate::ids::{decrypt, encrypt, is_encrypted};

pub const TWO_DA_SIGNATURE: &str = "2DA";

/// Columns holding pixel coordinates or extents
const COORDINATE_COLUMNS: &[&str] = &["X", "Y", "XPOS", "YPOS", "WIDTH", "HEIGHT"];

/// True when a column holds a pixel coordinate
#[must_use]
pub fn is_coordinate_column(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    COORDINATE_COLUMNS.contains(&upper.as_str()) || upper.ends_with("_X") || upper.ends_with("_Y")
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TwoDa {
    pub version: String,
    pub default_value: String,
    pub columns: Vec<String>,
    /// Row label plus its cells (may be shorter than `columns`)
    pub rows: Vec<(String, Vec<String>)>,
    /// Written back XOR-obfuscated
    pub encrypted: bool,
}

impl TwoDa {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let encrypted = is_encrypted(data);
        let plain = decrypt(data);
        let text = String::from_utf8_lossy(&plain);
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or_else(|| Error::invalid("2DA", "empty table"))?;
        let mut parts = header.split_whitespace();
        if !parts.next().is_some_and(|s| s.eq_ignore_ascii_case(TWO_DA_SIGNATURE)) {
            return Err(Error::invalid("2DA", format!("bad header line '{}'", header.trim())));
        }
        let version = parts.next().unwrap_or("V1.0").to_string();
        let default_value = lines
            .next()
            .map(|l| l.trim().to_string())
            .ok_or_else(|| Error::invalid("2DA", "missing default value"))?;
        let columns = lines
            .next()
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let rows = lines
            .filter_map(|line| {
                let mut cells = line.split_whitespace().map(str::to_string);
                let label = cells.next()?;
                Some((label, cells.collect()))
            })
            .collect();
        Ok(Self {
            version,
            default_value,
            columns,
            rows,
            encrypted,
        })
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let text = self.to_text();
        if self.encrypted {
            encrypt(text.as_bytes())
        } else {
            text.into_bytes()
        }
    }

    /// Aligned text with CRLF line ends
    #[must_use]
    pub fn to_text(&self) -> String {
        let label_width = self.rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 4;
        let mut widths: Vec<usize> = self.columns.iter().map(String::len).collect();
        for (_, cells) in &self.rows {
            for (i, cell) in cells.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }
        let line = |label: &str, cells: &[String]| {
            let mut out = format!("{label:<label_width$}");
            for (i, cell) in cells.iter().enumerate() {
                let width = widths.get(i).copied().unwrap_or(0) + 2;
                out.push_str(&format!("{cell:<width$}"));
            }
            out.trim_end().to_string() + "\r\n"
        };

        let mut text = format!("{} {}\r\n{}\r\n", TWO_DA_SIGNATURE, self.version, self.default_value);
        text.push_str(&line("", &self.columns));
        for (label, cells) in &self.rows {
            text.push_str(&line(label, cells));
        }
        text
    }

    #[must_use]
    pub fn cell(&self, row: &str, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c.eq_ignore_ascii_case(column))?;
        let (_, cells) = self.rows.iter().find(|(l, _)| l.eq_ignore_ascii_case(row))?;
        Some(cells.get(index).map_or(self.default_value.as_str(), String::as_str))
    }

    /// Multiply integer cells of coordinate columns by `factor`
    ///
    /// Returns the number of cells changed.
    pub fn upscale(&mut self, factor: u32) -> usize {
        let targets: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| is_coordinate_column(c))
            .map(|(i, _)| i)
            .collect();
        let mut changed = 0;
        for (_, cells) in &mut self.rows {
            for &i in &targets {
                let Some(cell) = cells.get_mut(i) else { continue };
                if let Ok(value) = cell.parse::<i64>() {
                    *cell = (value * i64::from(factor)).to_string();
                    changed += 1;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "2DA V1.0\n****\n      X    Y    RESREF  START_X\nONE   10   20   AR0100  5\nTWO   -1   ***  AR0200\n";

    #[test]
    fn test_parse() {
        let table = TwoDa::from_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["X", "Y", "RESREF", "START_X"]);
        assert_eq!(table.cell("one", "resref"), Some("AR0100"));
        assert_eq!(table.cell("TWO", "START_X"), Some("****"));
        assert!(!table.encrypted);
    }

    #[test]
    fn test_upscale_coordinate_columns() {
        let mut table = TwoDa::from_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.upscale(2), 4);
        assert_eq!(table.cell("ONE", "X"), Some("20"));
        assert_eq!(table.cell("ONE", "START_X"), Some("10"));
        assert_eq!(table.cell("TWO", "X"), Some("-2"));
        assert_eq!(table.cell("TWO", "Y"), Some("***"));
        assert_eq!(table.cell("ONE", "RESREF"), Some("AR0100"));
    }

    #[test]
    fn test_text_round_trip() {
        let table = TwoDa::from_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(TwoDa::from_bytes(&table.to_bytes()).unwrap(), table);
    }

    #[test]
    fn test_encrypted_round_trip() {
        let encrypted = encrypt(SAMPLE.as_bytes());
        let table = TwoDa::from_bytes(&encrypted).unwrap();
        assert!(table.encrypted);
        let bytes = table.to_bytes();
        assert!(is_encrypted(&bytes));
        assert_eq!(TwoDa::from_bytes(&bytes).unwrap(), table);
    }

    #[test]
    fn test_bad_header() {
        assert!(TwoDa::from_bytes(b"NOT A TABLE\n").is_err());
    }
}

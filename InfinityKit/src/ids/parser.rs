//! IDS text parsing and XOR de-obfuscation

use indexmap::IndexMap;
use std::collections::HashMap;

/// Repeating key used by obfuscated IDS and 2DA files
const XOR_KEY: [u8; 64] = [
    0x88, 0xa8, 0x8f, 0xba, 0x8a, 0xd3, 0xb9, 0xf5, 0xed, 0xb1, 0xcf, 0xea, 0xaa, 0xe4, 0xb5, 0xfb,
    0xeb, 0x82, 0xf9, 0x90, 0xca, 0xc9, 0xb5, 0xe7, 0xdc, 0x8e, 0xb7, 0xac, 0xee, 0xf7, 0xe0, 0xca,
    0x8e, 0xea, 0xca, 0x80, 0xce, 0xc5, 0xad, 0xb7, 0xc4, 0xd0, 0x84, 0x93, 0xd5, 0xf0, 0xeb, 0xc8,
    0xb4, 0x9d, 0xcc, 0xaf, 0xa5, 0x95, 0xba, 0x99, 0x87, 0xd2, 0x9d, 0xe3, 0x91, 0xba, 0x90, 0xca,
];

/// Whether a buffer carries the `0xFF 0xFF` obfuscation marker
#[must_use]
pub fn is_encrypted(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xFF
}

/// Strip the marker and XOR the rest with the repeating key
///
/// Plain buffers are returned unchanged.
#[must_use]
pub fn decrypt(data: &[u8]) -> Vec<u8> {
    if !is_encrypted(data) {
        return data.to_vec();
    }
    data[2..]
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()])
        .collect()
}

/// Inverse of [`decrypt`]
#[must_use]
pub fn encrypt(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 2);
    out.extend_from_slice(&[0xFF, 0xFF]);
    out.extend(
        data.iter()
            .enumerate()
            .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()]),
    );
    out
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer (optionally negative)
#[must_use]
pub fn parse_int(token: &str) -> Option<i64> {
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// An immutable, bidirectional value/symbol table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdsTable {
    name: String,
    /// Entries in file order; a value may appear more than once
    entries: Vec<(i64, String)>,
    by_value: IndexMap<i64, usize>,
    by_symbol: HashMap<String, usize>,
}

impl IdsTable {
    /// Parse IDS text (already decrypted)
    ///
    /// Lines that do not start with an integer followed by a symbol (the
    /// `IDS V1.0` banner, the entry count, comments) are skipped. The first
    /// occurrence wins for both lookup directions.
    #[must_use]
    pub fn parse(name: &str, text: &str) -> Self {
        let mut table = Self {
            name: normalize_name(name),
            ..Self::default()
        };
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') || line.starts_with("//") {
                continue;
            }
            let Some((value, symbol)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let Some(value) = parse_int(value) else {
                continue;
            };
            let symbol = symbol.trim();
            if symbol.is_empty() {
                continue;
            }
            table.push(value, symbol);
        }
        table
    }

    /// Parse raw file bytes, decrypting when needed
    #[must_use]
    pub fn from_bytes(name: &str, data: &[u8]) -> Self {
        let plain = decrypt(data);
        Self::parse(name, &String::from_utf8_lossy(&plain))
    }

    fn push(&mut self, value: i64, symbol: &str) {
        let index = self.entries.len();
        self.entries.push((value, symbol.to_string()));
        self.by_value.entry(value).or_insert(index);
        self.by_symbol.entry(symbol.to_uppercase()).or_insert(index);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in file order
    pub fn entries(&self) -> impl Iterator<Item = (i64, &str)> + '_ {
        self.entries.iter().map(|(v, s)| (*v, s.as_str()))
    }

    /// Value of a symbol (case-insensitive)
    #[must_use]
    pub fn value(&self, symbol: &str) -> Option<i64> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .map(|&i| self.entries[i].0)
    }

    /// First symbol declared for a value
    #[must_use]
    pub fn symbol(&self, value: i64) -> Option<&str> {
        self.by_value.get(&value).map(|&i| self.entries[i].1.as_str())
    }
}

/// Normalize a table name: file stem only, upper case (`ea.ids` -> `EA`)
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    stem.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EA: &str = "IDS V1.0\n5\n0 ANYONE\n2 PC\n0x1E ENEMY\n# comment\n; other\n255 ENEMY_DUP\n30 ENEMY_ALIAS\n";

    #[test]
    fn test_parse_skips_banner_and_comments() {
        let table = IdsTable::parse("ea.ids", EA);
        assert_eq!(table.name(), "EA");
        assert_eq!(table.len(), 5);
        assert_eq!(table.value("pc"), Some(2));
        assert_eq!(table.value("ENEMY"), Some(30));
        assert_eq!(table.symbol(30), Some("ENEMY"));
        assert_eq!(table.symbol(7), None);
    }

    #[test]
    fn test_function_lines_keep_full_symbol() {
        let table = IdsTable::parse("ACTION", "7 CreateCreature(S:NewObject*,P:Location*,I:Face*)");
        assert_eq!(table.symbol(7), Some("CreateCreature(S:NewObject*,P:Location*,I:Face*)"));
    }

    #[test]
    fn test_decrypt_round_trip() {
        let plain = EA.as_bytes();
        let obfuscated = encrypt(plain);
        assert!(is_encrypted(&obfuscated));
        assert_eq!(decrypt(&obfuscated), plain);
        assert_eq!(IdsTable::from_bytes("EA", &obfuscated), IdsTable::parse("EA", EA));
    }

    #[test]
    fn test_parse_int_forms() {
        assert_eq!(parse_int("0x4023"), Some(0x4023));
        assert_eq!(parse_int("-1"), Some(-1));
        assert_eq!(parse_int("12"), Some(12));
        assert_eq!(parse_int("PC"), None);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("override/Object.IDS"), "OBJECT");
        assert_eq!(normalize_name("trigger"), "TRIGGER");
    }
}

//! Packed string parameters
//!
//! Some functions declare two string parameters that the engine stores in a
//! single physical string field. `Global("Var","GLOBAL",1)` is stored as
//! `"GLOBALVar"`; a handful of functions join the pair with a colon instead.
//! Each opcode's packing is described by one nibble per string parameter.

use super::signature::FunctionKind;

/// First half of a packed pair (the variable name)
const FIRST: u32 = 0x1;
/// Second half of a packed pair (the scope/area prefix)
const SECOND: u32 = 0x2;
/// The pair is joined with `:`
const COLON: u32 = 0x8;

/// `(kind, opcode, nibble flags)`; nibble `n` describes string parameter `n`
const PACKED_STRINGS: &[(FunctionKind, u32, u32)] = &[
    (FunctionKind::Trigger, 0x400F, 0x21), // Global
    (FunctionKind::Trigger, 0x4034, 0x21), // GlobalGT
    (FunctionKind::Trigger, 0x4035, 0x21), // GlobalLT
    (FunctionKind::Trigger, 0x4039, 0x21), // GlobalTimerExact
    (FunctionKind::Trigger, 0x4040, 0x21), // GlobalTimerExpired
    (FunctionKind::Trigger, 0x4041, 0x21), // GlobalTimerNotExpired
    (FunctionKind::Trigger, 0x40A5, 0x21), // BitGlobal
    (FunctionKind::Action, 30, 0x21),      // SetGlobal
    (FunctionKind::Action, 109, 0x21),     // IncrementGlobal
    (FunctionKind::Action, 115, 0x21),     // SetGlobalTimer
    (FunctionKind::Action, 243, 0x2121),   // IncrementGlobalOnce
    (FunctionKind::Action, 268, 0x21),     // RealSetGlobalTimer
    (FunctionKind::Action, 294, 0xA9),     // SpellCastEffect
    (FunctionKind::Action, 308, 0x21),     // SetGlobalTimerRandom
    (FunctionKind::Action, 309, 0x21),     // SetGlobalTimerOnce
];

/// Scope prefixes that are always six characters
const SCOPES: [&str; 3] = ["GLOBAL", "LOCALS", "MYAREA"];

/// Short local scope, `LOCAL` followed directly by the variable
const SHORT_LOCAL: &str = "LOCAL";

/// Letters of an area code (`AR` in `AR0602`)
const AREA_CODE_LETTERS: usize = 2;

/// Most digits an area number carries
const AREA_NUMBER_DIGITS: usize = 4;

const AREA_LEN: usize = 6;

/// Packing nibbles of an opcode (0 if its strings are stored one per field)
#[must_use]
pub fn packing_flags(kind: FunctionKind, opcode: u32) -> u32 {
    PACKED_STRINGS
        .iter()
        .find(|(k, op, _)| *k == kind && *op == opcode)
        .map_or(0, |(_, _, flags)| *flags)
}

fn nibble(kind: FunctionKind, opcode: u32, index: usize) -> u32 {
    if index >= 8 {
        return 0;
    }
    (packing_flags(kind, opcode) >> (index * 4)) & 0xF
}

/// Whether string parameter `index` shares its field with a neighbour
#[must_use]
pub fn is_combined_string(kind: FunctionKind, opcode: u32, index: usize) -> bool {
    nibble(kind, opcode, index) & (FIRST | SECOND) != 0
}

/// Whether string parameter `index` is part of a colon-joined pair
#[must_use]
pub fn is_colon_separated(kind: FunctionKind, opcode: u32, index: usize) -> bool {
    is_combined_string(kind, opcode, index) && nibble(kind, opcode, index) & COLON != 0
}

/// Which part of a physical field a string parameter occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPart {
    Whole,
    First,
    Second,
}

/// Placement of one logical string parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringSlot {
    /// Physical field (0 = `str1`, 1 = `str2`)
    pub field: usize,
    pub part: StringPart,
    pub colon: bool,
}

/// Map `count` logical string parameters onto physical fields
#[must_use]
pub fn string_slots(kind: FunctionKind, opcode: u32, count: usize) -> Vec<StringSlot> {
    let mut slots = Vec::with_capacity(count);
    let mut field = 0;
    for index in 0..count {
        let flags = nibble(kind, opcode, index);
        let colon = flags & COLON != 0;
        if flags & FIRST != 0 {
            slots.push(StringSlot {
                field,
                part: StringPart::First,
                colon,
            });
        } else if flags & SECOND != 0 {
            slots.push(StringSlot {
                field,
                part: StringPart::Second,
                colon,
            });
            field += 1;
        } else {
            slots.push(StringSlot {
                field,
                part: StringPart::Whole,
                colon: false,
            });
            field += 1;
        }
    }
    slots
}

/// Number of physical string fields used by `count` logical parameters
#[must_use]
pub fn physical_string_count(kind: FunctionKind, opcode: u32, count: usize) -> usize {
    string_slots(kind, opcode, count)
        .iter()
        .map(|s| s.field + 1)
        .max()
        .unwrap_or(0)
}

/// Length of the scope/area prefix of a packed `AREAName` field
///
/// Rules, first match wins:
/// - `GLOBAL`, `LOCALS`, `MYAREA`: six characters
/// - `LOCAL` followed by anything but `S`: five characters
/// - two letters and up to four digits (`AR0602`, `OH12`): the area code
/// - anything else: the first six characters (all of a shorter field)
fn area_prefix_len(packed: &str) -> usize {
    let upper = packed.to_ascii_uppercase();
    if SCOPES.iter().any(|s| upper.starts_with(s)) {
        return AREA_LEN;
    }
    if upper.len() > SHORT_LOCAL.len() && upper.starts_with(SHORT_LOCAL) {
        return SHORT_LOCAL.len();
    }

    let bytes = packed.as_bytes();
    if bytes.len() > AREA_CODE_LETTERS && bytes[..AREA_CODE_LETTERS].iter().all(u8::is_ascii_alphabetic) {
        let digits = bytes[AREA_CODE_LETTERS..]
            .iter()
            .take(AREA_NUMBER_DIGITS)
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            return AREA_CODE_LETTERS + digits;
        }
    }

    let mut end = packed.len().min(AREA_LEN);
    while !packed.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Split a packed field into `(first, second)` parameter values
#[must_use]
pub fn split_packed(packed: &str, colon: bool) -> (String, String) {
    if colon {
        return match packed.split_once(':') {
            Some((first, second)) => (first.to_string(), second.to_string()),
            None => (packed.to_string(), String::new()),
        };
    }
    let split = area_prefix_len(packed);
    (packed[split..].to_string(), packed[..split].to_string())
}

/// Inverse of [`split_packed`]
#[must_use]
pub fn join_packed(first: &str, second: &str, colon: bool) -> String {
    if colon {
        if second.is_empty() {
            return first.to_string();
        }
        return format!("{first}:{second}");
    }
    format!("{second}{first}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_walk_nibbles() {
        assert!(is_combined_string(FunctionKind::Trigger, 0x400F, 0));
        assert!(is_combined_string(FunctionKind::Trigger, 0x400F, 1));
        assert!(!is_combined_string(FunctionKind::Trigger, 0x400F, 2));
        assert!(!is_combined_string(FunctionKind::Action, 0x400F, 0));
        assert!(is_colon_separated(FunctionKind::Action, 294, 1));
        assert!(!is_colon_separated(FunctionKind::Action, 30, 0));
    }

    #[test]
    fn test_string_slots() {
        let slots = string_slots(FunctionKind::Action, 243, 4);
        let fields: Vec<usize> = slots.iter().map(|s| s.field).collect();
        assert_eq!(fields, vec![0, 0, 1, 1]);
        assert_eq!(physical_string_count(FunctionKind::Action, 243, 4), 2);
        assert_eq!(physical_string_count(FunctionKind::Action, 34, 1), 1);
        assert_eq!(physical_string_count(FunctionKind::Action, 10, 0), 0);
    }

    #[test]
    fn test_split_scopes() {
        assert_eq!(split_packed("GLOBALKilledOgre", false), ("KilledOgre".into(), "GLOBAL".into()));
        assert_eq!(split_packed("localsTalked", false), ("Talked".into(), "locals".into()));
        assert_eq!(split_packed("AR0602Door", false), ("Door".into(), "AR0602".into()));
        assert_eq!(split_packed("MYAREAx", false), ("x".into(), "MYAREA".into()));
        assert_eq!(split_packed("ABC", false), (String::new(), "ABC".into()));
        assert_eq!(split_packed("BATTLE:CAS_P01", true), ("BATTLE".into(), "CAS_P01".into()));
    }

    #[test]
    fn test_split_area_codes() {
        assert_eq!(split_packed("AR1000Visited", false), ("Visited".into(), "AR1000".into()));
        assert_eq!(split_packed("OH12Ready", false), ("Ready".into(), "OH12".into()));
        assert_eq!(split_packed("ar0602_Spawned", false), ("_Spawned".into(), "ar0602".into()));
        // Only four digits belong to the area number
        assert_eq!(split_packed("AR06021stVisit", false), ("1stVisit".into(), "AR0602".into()));
        // No digits: generic six-character prefix
        assert_eq!(split_packed("KAPUTZDeaths", false), ("Deaths".into(), "KAPUTZ".into()));
    }

    #[test]
    fn test_split_local_scopes() {
        assert_eq!(split_packed("LOCALSTalked", false), ("Talked".into(), "LOCALS".into()));
        assert_eq!(split_packed("LOCALTalked", false), ("Talked".into(), "LOCAL".into()));
        assert_eq!(split_packed("LOCAL", false), (String::new(), "LOCAL".into()));
    }

    #[test]
    fn test_join_is_inverse() {
        for packed in [
            "GLOBALKilledOgre",
            "AR0602Door",
            "OH12Ready",
            "LOCALSx",
            "LOCALTalked",
            "KAPUTZDeaths",
        ] {
            let (first, second) = split_packed(packed, false);
            assert_eq!(join_packed(&first, &second, false), packed);
        }
        assert_eq!(join_packed("BATTLE", "CAS_P01", true), "BATTLE:CAS_P01");
        assert_eq!(join_packed("BATTLE", "", true), "BATTLE");
    }
}

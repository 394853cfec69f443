//! Trigger and action signatures
//!
//! A definition line reads `<id> <Name>(<params>)` where every parameter is
//! `<T>:<name>*<ids>`: `T` is one of `I O S P A T` and the optional IDS table
//! after the `*` names the table used to symbolize integer values. One opcode
//! may carry several signatures (overloads).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use indexmap::IndexMap;

use super::builtin::{ACTION_DEFINITIONS, TRIGGER_DEFINITIONS};
use super::strings::{StringSlot, physical_string_count, string_slots};
use crate::ids::{IdsTable, SymbolSource, parse_int};

/// Triggers and actions live in separate opcode spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Trigger,
    Action,
}

impl FunctionKind {
    /// IDS table holding the definitions
    #[must_use]
    pub fn ids_name(self) -> &'static str {
        match self {
            FunctionKind::Trigger => "TRIGGER",
            FunctionKind::Action => "ACTION",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Integer,
    Object,
    String,
    Point,
    Action,
    Trigger,
}

impl ParamType {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' => Some(ParamType::Integer),
            'O' => Some(ParamType::Object),
            'S' => Some(ParamType::String),
            'P' => Some(ParamType::Point),
            'A' => Some(ParamType::Action),
            'T' => Some(ParamType::Trigger),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            ParamType::Integer => 'I',
            ParamType::Object => 'O',
            ParamType::String => 'S',
            ParamType::Point => 'P',
            ParamType::Action => 'A',
            ParamType::Trigger => 'T',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub kind: ParamType,
    pub name: String,
    /// IDS table used to symbolize integer values
    pub ids: Option<String>,
}

impl Param {
    fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (type_part, rest) = token.split_once(':').unwrap_or((token, ""));
        let kind = ParamType::from_char(type_part.trim().chars().next()?)?;
        let (name, ids) = match rest.split_once('*') {
            Some((name, ids)) => (name, ids.trim()),
            None => (rest, ""),
        };
        Some(Self {
            kind,
            name: name.trim().to_string(),
            ids: (!ids.is_empty()).then(|| ids.to_string()),
        })
    }
}

/// Where a parameter lives in a compiled record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Integer field index (`int1`, `int2`, `int3`)
    Int(usize),
    Point,
    Str(StringSlot),
    /// Object slot (always 0 for triggers; 0 or 1 of the call's own objects for actions)
    Object(usize),
    /// Nested action of `ActionOverride`
    Action,
    /// The record has no room left for this parameter
    Unused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub opcode: u32,
    pub name: String,
    pub params: Vec<Param>,
}

impl Signature {
    /// Parse `Name(T:name*ids,...)`
    #[must_use]
    pub fn parse(opcode: u32, text: &str) -> Option<Self> {
        let text = text.trim();
        let open = text.find('(')?;
        let close = text.rfind(')')?;
        if close < open {
            return None;
        }
        let name = text[..open].trim();
        if name.is_empty() {
            return None;
        }
        let inner = text[open + 1..close].trim();
        let params = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(Param::parse).collect::<Option<Vec<_>>>()?
        };
        Some(Self {
            opcode,
            name: name.to_string(),
            params,
        })
    }

    /// Number of parameters of one type
    #[must_use]
    pub fn count(&self, kind: ParamType) -> usize {
        self.params.iter().filter(|p| p.kind == kind).count()
    }

    /// Whether this is the `ActionOverride` wrapper
    #[must_use]
    pub fn is_override(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamType::Action)
    }

    /// Physical string fields this signature occupies
    #[must_use]
    pub fn string_fields(&self, kind: FunctionKind) -> usize {
        physical_string_count(kind, self.opcode, self.count(ParamType::String))
    }

    /// Map every parameter onto the record field that stores it
    ///
    /// Integers fill `int1..int3` in order. A trigger point occupies
    /// `int2`/`int3`, which leaves only `int1` for integers; an action point
    /// has its own field pair.
    #[must_use]
    pub fn slots(&self, kind: FunctionKind) -> Vec<Slot> {
        let has_point = self.count(ParamType::Point) > 0;
        let int_fields: &[usize] = match (kind, has_point) {
            (FunctionKind::Trigger, true) => &[0],
            _ => &[0, 1, 2],
        };
        let mut strings = string_slots(kind, self.opcode, self.count(ParamType::String)).into_iter();
        let mut ints = int_fields.iter().copied();
        let object_fields = match kind {
            FunctionKind::Trigger => 1,
            FunctionKind::Action => 2,
        };
        let mut objects = 0..object_fields;
        let mut points = 0..1;

        self.params
            .iter()
            .map(|p| {
                let slot = match p.kind {
                    ParamType::Integer => ints.next().map(Slot::Int),
                    ParamType::String => strings.next().map(Slot::Str),
                    ParamType::Object => objects.next().map(Slot::Object),
                    ParamType::Point => points.next().map(|_| Slot::Point),
                    ParamType::Action => Some(Slot::Action),
                    ParamType::Trigger => None,
                };
                slot.unwrap_or(Slot::Unused)
            })
            .collect()
    }

    /// Definition line in IDS syntax
    #[must_use]
    pub fn to_definition(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}:{}*{}", p.kind.as_char(), p.name, p.ids.as_deref().unwrap_or("")))
            .collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// All signatures of one function kind
#[derive(Debug, Clone)]
pub struct SignatureSet {
    kind: FunctionKind,
    by_opcode: IndexMap<u32, Vec<Signature>>,
    by_name: HashMap<String, (u32, usize)>,
}

impl SignatureSet {
    fn empty(kind: FunctionKind) -> Self {
        Self {
            kind,
            by_opcode: IndexMap::new(),
            by_name: HashMap::new(),
        }
    }

    fn insert(&mut self, signature: Signature) {
        let key = signature.name.to_uppercase();
        let list = self.by_opcode.entry(signature.opcode).or_default();
        self.by_name.entry(key).or_insert((signature.opcode, list.len()));
        list.push(signature);
    }

    /// Parse definition text; malformed lines are skipped
    #[must_use]
    pub fn parse(kind: FunctionKind, text: &str) -> Self {
        let mut set = Self::empty(kind);
        for line in text.lines() {
            let line = line.trim();
            let Some((id, rest)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let Some(opcode) = parse_int(id) else {
                continue;
            };
            match Signature::parse(opcode as u32, rest) {
                Some(signature) => set.insert(signature),
                None => tracing::debug!("Skipping malformed {} definition: {line}", kind.ids_name()),
            }
        }
        set
    }

    /// Build from a loaded `TRIGGER` / `ACTION` IDS table
    #[must_use]
    pub fn from_ids_table(kind: FunctionKind, table: &IdsTable) -> Self {
        let mut set = Self::empty(kind);
        for (value, symbol) in table.entries() {
            if let Some(signature) = Signature::parse(value as u32, symbol) {
                set.insert(signature);
            }
        }
        set
    }

    /// The definitions shipped with the toolkit
    #[must_use]
    pub fn builtin(kind: FunctionKind) -> Self {
        match kind {
            FunctionKind::Trigger => Self::parse(kind, TRIGGER_DEFINITIONS),
            FunctionKind::Action => Self::parse(kind, ACTION_DEFINITIONS),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Every overload of an opcode (possibly none)
    #[must_use]
    pub fn get(&self, opcode: u32) -> &[Signature] {
        self.by_opcode.get(&opcode).map_or(&[], Vec::as_slice)
    }

    /// Signature by exact (case-insensitive) name
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Signature> {
        let (opcode, index) = self.by_name.get(&name.to_uppercase())?;
        self.by_opcode.get(opcode)?.get(*index)
    }

    /// Number of distinct opcodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_opcode.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_opcode.is_empty()
    }
}

/// A built set and the table it came from (`None` for the built-in one)
#[derive(Debug)]
struct CachedSet {
    source: Option<Weak<IdsTable>>,
    set: Arc<SignatureSet>,
}

impl CachedSet {
    /// Built from `table`; the held `Weak` keeps the allocation, so an
    /// address match is the same table
    fn built_from(&self, table: Option<&Arc<IdsTable>>) -> bool {
        match (&self.source, table) {
            (None, None) => true,
            (Some(source), Some(table)) => std::ptr::eq(source.as_ptr(), Arc::as_ptr(table)),
            _ => false,
        }
    }
}

/// Lazily built signature sets, cached per function kind and source table
#[derive(Debug, Default)]
pub struct SignatureRegistry {
    sets: Mutex<HashMap<FunctionKind, CachedSet>>,
}

impl SignatureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static SignatureRegistry {
        static REGISTRY: OnceLock<SignatureRegistry> = OnceLock::new();
        REGISTRY.get_or_init(SignatureRegistry::new)
    }

    /// The set for `kind` built from the caller's IDS source, falling back to
    /// the built-in definitions when the table is missing
    ///
    /// The cached set is reused only while `ids` serves the same table it
    /// was built from.
    pub fn get(&self, kind: FunctionKind, ids: &dyn SymbolSource) -> Arc<SignatureSet> {
        let table = ids.table(kind.ids_name());
        let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = sets.get(&kind) {
            if cached.built_from(table.as_ref()) {
                return Arc::clone(&cached.set);
            }
        }

        let set = match &table {
            Some(table) => SignatureSet::from_ids_table(kind, table),
            None => {
                tracing::debug!("No {}.IDS loaded, using built-in definitions", kind.ids_name());
                SignatureSet::builtin(kind)
            }
        };
        let set = Arc::new(set);
        sets.insert(
            kind,
            CachedSet {
                source: table.as_ref().map(Arc::downgrade),
                set: Arc::clone(&set),
            },
        );
        set
    }

    pub fn triggers(&self, ids: &dyn SymbolSource) -> Arc<SignatureSet> {
        self.get(FunctionKind::Trigger, ids)
    }

    pub fn actions(&self, ids: &dyn SymbolSource) -> Arc<SignatureSet> {
        self.get(FunctionKind::Action, ids)
    }

    /// Drop the cached sets (after the IDS cache was reloaded)
    pub fn reset(&self) {
        self.sets.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcs::strings::StringPart;
    use crate::ids::IdsCache;

    #[test]
    fn test_parse_params() {
        let sig = Signature::parse(2, "AttackedBy(O:Object*,I:Style*AStyles)").unwrap();
        assert_eq!(sig.name, "AttackedBy");
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.params[0].kind, ParamType::Object);
        assert_eq!(sig.params[0].ids, None);
        assert_eq!(sig.params[1].name, "Style");
        assert_eq!(sig.params[1].ids.as_deref(), Some("AStyles"));
        assert_eq!(sig.to_definition(), "AttackedBy(O:Object*,I:Style*AStyles)");
        assert!(Signature::parse(1, "Broken(").is_none());
    }

    #[test]
    fn test_overloads_share_opcode() {
        let set = SignatureSet::builtin(FunctionKind::Action);
        let names: Vec<&str> = set.get(31).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Spell", "SpellRES"]);
        assert_eq!(set.by_name("createcreature").unwrap().opcode, 7);
        assert!(set.get(9999).is_empty());
    }

    #[test]
    fn test_slots() {
        let set = SignatureSet::builtin(FunctionKind::Action);
        let slots = set.by_name("CreateCreature").unwrap().slots(FunctionKind::Action);
        assert!(matches!(slots[0], Slot::Str(StringSlot { field: 0, part: StringPart::Whole, .. })));
        assert_eq!(slots[1], Slot::Point);
        assert_eq!(slots[2], Slot::Int(0));

        let triggers = SignatureSet::builtin(FunctionKind::Trigger);
        let slots = triggers.by_name("NearLocation").unwrap().slots(FunctionKind::Trigger);
        assert_eq!(slots, vec![Slot::Object(0), Slot::Point, Slot::Int(0)]);
        let global = triggers.by_name("Global").unwrap();
        assert_eq!(global.string_fields(FunctionKind::Trigger), 1);
    }

    #[test]
    fn test_registry_prefers_loaded_table() {
        let ids = IdsCache::new();
        ids.initialize_with_ids_files(vec![("ACTION.IDS", b"500 Custom(I:Value*)\n".as_slice())]);
        let registry = SignatureRegistry::new();
        let actions = registry.actions(&ids);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions.by_name("Custom").unwrap().opcode, 500);
        // Triggers were not loaded
        assert!(registry.triggers(&ids).by_name("True").is_some());
        registry.reset();
        assert_eq!(registry.actions(&IdsCache::new()).by_name("Custom"), None);
    }

    #[test]
    fn test_registry_follows_the_callers_tables() {
        let registry = SignatureRegistry::new();
        let empty = IdsCache::new();
        assert!(registry.actions(&empty).by_name("Custom").is_none());

        let loaded = IdsCache::new();
        loaded.initialize_with_ids_files(vec![("ACTION.IDS", b"500 Custom(I:Value*)\n".as_slice())]);
        assert_eq!(registry.actions(&loaded).by_name("Custom").unwrap().opcode, 500);
        assert!(registry.actions(&empty).by_name("Custom").is_none());

        // Same table, same set
        let first = registry.actions(&loaded);
        assert!(Arc::ptr_eq(&first, &registry.actions(&loaded)));

        loaded.reset();
        loaded.initialize_with_ids_files(vec![("ACTION.IDS", b"501 Other()\n".as_slice())]);
        let reloaded = registry.actions(&loaded);
        assert!(reloaded.by_name("Custom").is_none());
        assert_eq!(reloaded.by_name("Other").unwrap().opcode, 501);
    }
}

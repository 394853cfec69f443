//! Overload selection
//!
//! Compiled records do not say which overload of an opcode produced them.
//! The decompiler compares the record's populated fields with what every
//! candidate expects and keeps the closest candidate that is not missing data.

use super::signature::{FunctionKind, ParamType, Signature};
use super::types::{ActionCall, Object, Trigger};

/// Number of populated (or expected) fields per parameter category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shape {
    pub ints: usize,
    pub strings: usize,
    pub objects: usize,
    pub points: usize,
}

/// Opcodes whose IDS files list interchangeable names; when exactly one
/// string field is populated the named function wins
const PREFERRED: &[(FunctionKind, u32, &str)] = &[
    (FunctionKind::Trigger, 0x400F, "Global"),
    (FunctionKind::Trigger, 0x4040, "GlobalTimerExpired"),
    (FunctionKind::Action, 30, "SetGlobal"),
    (FunctionKind::Action, 115, "SetGlobalTimer"),
];

fn trailing(values: &[bool]) -> usize {
    values.iter().rposition(|&v| v).map_or(0, |i| i + 1)
}

fn string_count(str1: &str, str2: &str) -> usize {
    trailing(&[!str1.is_empty(), !str2.is_empty()])
}

impl Shape {
    /// Populated fields of a trigger record
    #[must_use]
    pub fn of_trigger(trigger: &Trigger) -> Self {
        Self {
            ints: trailing(&[trigger.int1 != 0, trigger.int2 != 0, trigger.int3 != 0]),
            strings: string_count(&trigger.str1, &trigger.str2),
            objects: usize::from(!trigger.object.is_empty()),
            points: usize::from(trigger.int2 != 0 || trigger.int3 != 0),
        }
    }

    /// Populated fields of an action call (the override slot is not counted)
    #[must_use]
    pub fn of_action(call: &ActionCall) -> Self {
        Self {
            ints: trailing(&[call.int1 != 0, call.int2 != 0, call.int3 != 0]),
            strings: string_count(&call.str1, &call.str2),
            objects: trailing(&call.objects.each_ref().map(|o: &Object| !o.is_empty())),
            points: usize::from(call.point != (0, 0)),
        }
    }

    /// Fields a signature expects
    #[must_use]
    pub fn expected(signature: &Signature, kind: FunctionKind) -> Self {
        Self {
            ints: signature.count(ParamType::Integer),
            strings: signature.string_fields(kind),
            objects: signature.count(ParamType::Object),
            points: signature.count(ParamType::Point),
        }
    }

    /// `self - expected` per category
    fn slack(&self, expected: &Shape) -> [i64; 4] {
        [
            self.ints as i64 - expected.ints as i64,
            self.strings as i64 - expected.strings as i64,
            self.objects as i64 - expected.objects as i64,
            self.points as i64 - expected.points as i64,
        ]
    }
}

/// Pick the overload that best matches `observed`
///
/// A candidate is valid when it does not expect more of any category than
/// the record holds. Among valid candidates the lowest total slack wins,
/// ties going to the shorter signature and then to declaration order. When
/// no candidate is valid, the one missing the fewest fields is used.
#[must_use]
pub fn select_overload<'a>(
    kind: FunctionKind,
    candidates: &'a [Signature],
    observed: &Shape,
) -> Option<&'a Signature> {
    if candidates.len() <= 1 {
        return candidates.first();
    }

    let scored: Vec<(&Signature, [i64; 4])> = candidates
        .iter()
        .map(|c| (c, observed.slack(&Shape::expected(c, kind))))
        .collect();
    let valid: Vec<&(&Signature, [i64; 4])> = scored.iter().filter(|(_, s)| s.iter().all(|&v| v >= 0)).collect();

    if valid.is_empty() {
        return scored
            .iter()
            .min_by_key(|(_, s)| s.iter().filter(|&&v| v < 0).map(|v| -v).sum::<i64>())
            .map(|(c, _)| *c);
    }

    if observed.strings == 1 {
        let opcode = candidates[0].opcode;
        let preferred = PREFERRED
            .iter()
            .find(|(k, op, _)| *k == kind && *op == opcode)
            .and_then(|(_, _, name)| valid.iter().find(|(c, _)| c.name.eq_ignore_ascii_case(name)));
        if let Some((c, _)) = preferred {
            return Some(*c);
        }
    }

    valid
        .iter()
        .min_by_key(|(c, s)| (s.iter().sum::<i64>(), c.params.len()))
        .map(|(c, _)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcs::signature::SignatureSet;

    fn set(kind: FunctionKind, text: &str) -> SignatureSet {
        SignatureSet::parse(kind, text)
    }

    #[test]
    fn test_one_object_selects_one_object_overload() {
        let actions = set(FunctionKind::Action, "50 Follow(O:Target*)\n50 FollowBoth(O:Target*,O:Other*)\n");
        let call = ActionCall {
            opcode: 50,
            objects: [Object::named("Minsc"), Object::default()],
            ..ActionCall::default()
        };
        let chosen = select_overload(FunctionKind::Action, actions.get(50), &Shape::of_action(&call)).unwrap();
        assert_eq!(chosen.name, "Follow");

        let call = ActionCall {
            objects: [Object::named("Minsc"), Object::named("Jaheira")],
            ..call
        };
        let chosen = select_overload(FunctionKind::Action, actions.get(50), &Shape::of_action(&call)).unwrap();
        assert_eq!(chosen.name, "FollowBoth");
    }

    #[test]
    fn test_spell_forms() {
        let actions = SignatureSet::builtin(FunctionKind::Action);
        let by_id = ActionCall {
            opcode: 31,
            objects: [Object::identifier(1), Object::default()],
            int1: 2112,
            ..ActionCall::default()
        };
        let chosen = select_overload(FunctionKind::Action, actions.get(31), &Shape::of_action(&by_id)).unwrap();
        assert_eq!(chosen.name, "Spell");

        let by_res = ActionCall {
            int1: 0,
            str1: "SPWI112".to_string(),
            ..by_id
        };
        let chosen = select_overload(FunctionKind::Action, actions.get(31), &Shape::of_action(&by_res)).unwrap();
        assert_eq!(chosen.name, "SpellRES");
    }

    #[test]
    fn test_tie_prefers_shorter_then_named() {
        let triggers = set(
            FunctionKind::Trigger,
            "0x9000 Long(I:A*,I:B*)\n0x9000 Short(I:A*)\n0x4040 TimerAlias(S:Name*)\n0x4040 GlobalTimerExpired(S:Name*,S:Area*)\n",
        );
        let observed = Shape {
            ints: 2,
            ..Shape::default()
        };
        // Long uses both integers, so it has less slack
        assert_eq!(select_overload(FunctionKind::Trigger, triggers.get(0x9000), &observed).unwrap().name, "Long");

        let observed = Shape {
            strings: 1,
            ..Shape::default()
        };
        let chosen = select_overload(FunctionKind::Trigger, triggers.get(0x4040), &observed).unwrap();
        assert_eq!(chosen.name, "GlobalTimerExpired");
    }

    #[test]
    fn test_no_valid_candidate_falls_back_to_smallest_deficit() {
        let actions = set(FunctionKind::Action, "60 Two(I:A*,I:B*)\n60 One(I:A*)\n");
        let chosen = select_overload(FunctionKind::Action, actions.get(60), &Shape::default()).unwrap();
        assert_eq!(chosen.name, "One");
    }
}

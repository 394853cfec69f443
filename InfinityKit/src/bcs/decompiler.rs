//! Compiled script to source text

use std::fmt::Write as _;
use std::sync::Arc;

use super::builtin;
use super::overload::{Shape, select_overload};
use super::signature::{FunctionKind, Param, ParamType, Signature, SignatureSet, Slot};
use super::strings::{StringPart, StringSlot, split_packed};
use super::types::{Action, ActionCall, Block, NO_REGION, Object, Script, Trigger};
use crate::config::GameVariant;
use crate::ids::{IdsTable, SymbolSource};

/// Functions whose point parameter is not a map position
const POINT_SCALE_SKIP: [&str; 3] = ["ScreenShake", "FadeToColor", "FadeFromColor"];

/// Resource-named functions rendered through their id-based sibling when the
/// resource string is empty
const RESOURCE_SIBLINGS: [(&str, &str); 2] = [("SpellRES", "Spell"), ("HaveSpellRES", "HaveSpell")];

/// Object classification fields in text order, with their IDS tables
pub(crate) fn target_fields(object: &Object, variant: GameVariant) -> Vec<(i32, &'static str)> {
    let mut fields = vec![(object.ea, "EA")];
    if variant.has_faction_team() {
        fields.push((object.faction, "FACTION"));
        fields.push((object.team, "TEAM"));
    }
    fields.extend([
        (object.general, "GENERAL"),
        (object.race, "RACE"),
        (object.class, "CLASS"),
        (object.specific, "SPECIFIC"),
        (object.gender, "GENDER"),
        (object.alignment, "ALIGN"),
    ]);
    fields
}

/// Renders compiled records as script source
pub struct Decompiler<'a> {
    triggers: &'a SignatureSet,
    actions: &'a SignatureSet,
    ids: &'a dyn SymbolSource,
    variant: GameVariant,
    factor: i32,
}

impl<'a> Decompiler<'a> {
    #[must_use]
    pub fn new(
        triggers: &'a SignatureSet,
        actions: &'a SignatureSet,
        ids: &'a dyn SymbolSource,
        variant: GameVariant,
    ) -> Self {
        Self {
            triggers,
            actions,
            ids,
            variant,
            factor: 1,
        }
    }

    /// Multiply point coordinates and object regions by `factor`
    #[must_use]
    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor.max(1) as i32;
        self
    }

    fn table(&self, name: &str) -> Option<Arc<IdsTable>> {
        self.ids.table(name).or_else(|| builtin::symbol_table(name))
    }

    fn scale(&self, value: i32) -> i32 {
        // Negative coordinates are "here" / "unset" markers
        if value < 0 { value } else { value * self.factor }
    }

    /// Decompile a whole script
    #[must_use]
    pub fn script(&self, script: &Script) -> String {
        let mut out = String::new();
        for block in &script.blocks {
            self.block(block, &mut out);
            out.push('\n');
        }
        out
    }

    fn block(&self, block: &Block, out: &mut String) {
        out.push_str("IF\n");
        for trigger in &block.triggers {
            let _ = writeln!(out, "  {}", self.trigger(trigger));
        }
        out.push_str("THEN\n");
        for response in &block.responses {
            let _ = writeln!(out, "  RESPONSE #{}", response.weight);
            for action in &response.actions {
                let _ = writeln!(out, "    {}", self.action(action));
            }
        }
        out.push_str("END\n");
    }

    /// One trigger per line (dialogue state and transition triggers)
    #[must_use]
    pub fn triggers(&self, triggers: &[Trigger]) -> String {
        triggers.iter().map(|t| self.trigger(t) + "\n").collect()
    }

    /// One action per line (dialogue transition actions)
    #[must_use]
    pub fn actions(&self, actions: &[Action]) -> String {
        actions.iter().map(|a| self.action(a) + "\n").collect()
    }

    /// Render one trigger
    #[must_use]
    pub fn trigger(&self, trigger: &Trigger) -> String {
        let candidates = self.triggers.get(trigger.opcode);
        let Some(signature) = select_overload(FunctionKind::Trigger, candidates, &Shape::of_trigger(trigger)) else {
            tracing::warn!("Unknown trigger opcode 0x{:04X}", trigger.opcode);
            return format!("// unknown trigger 0x{:04X}", trigger.opcode);
        };
        let signature = self.resource_sibling(candidates, signature, &trigger.str1, &trigger.str2);

        let ints = [trigger.int1, trigger.int2, trigger.int3];
        let strings = [trigger.str1.as_str(), trigger.str2.as_str()];
        let args: Vec<String> = signature
            .params
            .iter()
            .zip(signature.slots(FunctionKind::Trigger))
            .map(|(param, slot)| match slot {
                Slot::Int(i) => self.integer(ints[i], param),
                Slot::Point => self.point(&signature.name, trigger.int2, trigger.int3),
                Slot::Str(s) => quote(&physical_part(strings, s)),
                Slot::Object(_) => self.object(&trigger.object),
                Slot::Action | Slot::Unused => default_arg(param),
            })
            .collect();

        let negation = if trigger.is_negated() { "!" } else { "" };
        format!("{negation}{}({})", signature.name, args.join(","))
    }

    /// Render one action, including `ActionOverride` wrappers
    #[must_use]
    pub fn action(&self, action: &Action) -> String {
        match action {
            Action::Plain(call) => self.call(call),
            Action::Override { target, inner } => {
                let name = self
                    .actions
                    .get(1)
                    .iter()
                    .find(|s| s.is_override())
                    .map_or("ActionOverride", |s| s.name.as_str());
                format!("{name}({},{})", self.object(target), self.action(inner))
            }
        }
    }

    fn call(&self, call: &ActionCall) -> String {
        let candidates = self.actions.get(call.opcode);
        let Some(signature) = select_overload(FunctionKind::Action, candidates, &Shape::of_action(call)) else {
            tracing::warn!("Unknown action opcode {}", call.opcode);
            return format!("// unknown action {}", call.opcode);
        };
        let signature = self.resource_sibling(candidates, signature, &call.str1, &call.str2);

        let ints = [call.int1, call.int2, call.int3];
        let strings = [call.str1.as_str(), call.str2.as_str()];
        let args: Vec<String> = signature
            .params
            .iter()
            .zip(signature.slots(FunctionKind::Action))
            .map(|(param, slot)| match slot {
                Slot::Int(i) => self.integer(ints[i], param),
                Slot::Point => self.point(&signature.name, call.point.0, call.point.1),
                Slot::Str(s) => quote(&physical_part(strings, s)),
                Slot::Object(i) => self.object(&call.objects[i]),
                Slot::Action | Slot::Unused => default_arg(param),
            })
            .collect();
        format!("{}({})", signature.name, args.join(","))
    }

    /// `SpellRES("")`-style records are rendered with the id-based sibling
    /// (`Spell(...,WIZARD_X)`) so the numeric spell id is not lost
    fn resource_sibling<'s>(&self, candidates: &'s [Signature], chosen: &'s Signature, str1: &str, str2: &str) -> &'s Signature {
        let Some(&(_, base)) = RESOURCE_SIBLINGS
            .iter()
            .find(|(name, _)| chosen.name.eq_ignore_ascii_case(name))
        else {
            return chosen;
        };
        if !str1.is_empty() || !str2.is_empty() {
            return chosen;
        }
        candidates
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(base))
            .unwrap_or(chosen)
    }

    fn integer(&self, value: i32, param: &Param) -> String {
        if let Some(table) = param.ids.as_deref().and_then(|name| self.table(name)) {
            if let Some(symbol) = table.symbol(i64::from(value)) {
                return symbol.to_string();
            }
        }
        value.to_string()
    }

    fn point(&self, function: &str, x: i32, y: i32) -> String {
        if POINT_SCALE_SKIP.iter().any(|s| s.eq_ignore_ascii_case(function)) {
            return format!("[{x}.{y}]");
        }
        format!("[{}.{}]", self.scale(x), self.scale(y))
    }

    /// Render an object reference
    #[must_use]
    pub fn object(&self, object: &Object) -> String {
        if !object.name.is_empty() {
            return quote(&object.name);
        }

        let fields = target_fields(object, self.variant);
        let used = fields.iter().rposition(|(v, _)| *v != 0).map_or(0, |i| i + 1);
        let mut text = if used > 0 {
            let parts: Vec<String> = fields[..used]
                .iter()
                .map(|&(value, table)| self.field_symbol(value, table))
                .collect();
            Some(format!("[{}]", parts.join(".")))
        } else {
            None
        };

        if self.variant.has_object_region() && object.region != NO_REGION {
            let [a, b, c, d] = object.region.map(|v| self.scale(v));
            let target = text.take().unwrap_or_else(|| "[ANYONE]".to_string());
            text = Some(format!("{target}[{a}.{b}.{c}.{d}]"));
        }

        for &id in object.identifiers.iter().rev() {
            if id == 0 {
                continue;
            }
            let function = self.field_symbol(id, "OBJECT");
            text = Some(match text {
                Some(inner) => format!("{function}({inner})"),
                None => function,
            });
        }
        text.unwrap_or_else(|| "[ANYONE]".to_string())
    }

    fn field_symbol(&self, value: i32, table: &str) -> String {
        self.table(table)
            .and_then(|t| t.symbol(i64::from(value)).map(str::to_string))
            .unwrap_or_else(|| value.to_string())
    }
}

fn physical_part(strings: [&str; 2], slot: StringSlot) -> String {
    let field = strings[slot.field.min(1)];
    match slot.part {
        StringPart::Whole => field.to_string(),
        StringPart::First => split_packed(field, slot.colon).0,
        StringPart::Second => split_packed(field, slot.colon).1,
    }
}

fn quote(text: &str) -> String {
    format!("\"{text}\"")
}

fn default_arg(param: &Param) -> String {
    match param.kind {
        ParamType::String => quote(""),
        ParamType::Object => "[ANYONE]".to_string(),
        ParamType::Point => "[0.0]".to_string(),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdsCache;
    use pretty_assertions::assert_eq;

    fn ids() -> IdsCache {
        let cache = IdsCache::new();
        cache.initialize_with_ids_files(vec![
            ("EA.IDS", b"0 ANYONE\n2 PC\n255 ENEMY\n".as_slice()),
            ("GENERAL.IDS", b"1 HUMANOID\n".as_slice()),
            ("CLASS.IDS", b"1 MAGE\n".as_slice()),
            ("OBJECT.IDS", b"1 Myself\n12 NearestEnemyOf\n".as_slice()),
            ("SPELL.IDS", b"2112 WIZARD_MAGIC_MISSILE\n".as_slice()),
        ]);
        cache
    }

    fn with<R>(variant: GameVariant, factor: u32, f: impl FnOnce(&Decompiler<'_>) -> R) -> R {
        let cache = ids();
        let triggers = SignatureSet::builtin(FunctionKind::Trigger);
        let actions = SignatureSet::builtin(FunctionKind::Action);
        let decompiler = Decompiler::new(&triggers, &actions, &cache, variant).with_factor(factor);
        f(&decompiler)
    }

    #[test]
    fn test_objects() {
        with(GameVariant::Bg2, 1, |d| {
            assert_eq!(d.object(&Object::default()), "[ANYONE]");
            assert_eq!(d.object(&Object::named("Door01")), "\"Door01\"");
            let mut enemy = Object {
                ea: 255,
                general: 1,
                ..Object::default()
            };
            assert_eq!(d.object(&enemy), "[ENEMY.HUMANOID]");
            enemy.class = 1;
            assert_eq!(d.object(&enemy), "[ENEMY.HUMANOID.0.MAGE]");

            let mut nearest = Object::identifier(12);
            nearest.identifiers[1] = 1;
            assert_eq!(d.object(&nearest), "NearestEnemyOf(Myself)");

            let mut of_pc = Object::identifier(12);
            of_pc.ea = 2;
            assert_eq!(d.object(&of_pc), "NearestEnemyOf([PC])");
        });
    }

    #[test]
    fn test_region_scaled() {
        with(GameVariant::Ee, 2, |d| {
            let object = Object {
                ea: 2,
                region: [10, 20, 30, 40],
                ..Object::default()
            };
            assert_eq!(d.object(&object), "[PC][20.40.60.80]");
        });
    }

    #[test]
    fn test_global_strings_are_split() {
        with(GameVariant::Bg2, 1, |d| {
            let trigger = Trigger {
                opcode: 0x400F,
                int1: 1,
                str1: "GLOBALKilledOgre".to_string(),
                ..Trigger::default()
            };
            assert_eq!(d.trigger(&trigger), "Global(\"KilledOgre\",\"GLOBAL\",1)");
        });
    }

    #[test]
    fn test_negated_trigger_and_unknown_opcode() {
        with(GameVariant::Bg2, 1, |d| {
            let mut trigger = Trigger {
                opcode: 0x401C,
                object: Object::identifier(1),
                ..Trigger::default()
            };
            trigger.set_negated(true);
            assert_eq!(d.trigger(&trigger), "!See(Myself)");
            trigger.opcode = 0x7777;
            assert_eq!(d.trigger(&trigger), "// unknown trigger 0x7777");
        });
    }

    #[test]
    fn test_spell_res_with_empty_string_uses_symbol() {
        with(GameVariant::Bg2, 1, |d| {
            let call = ActionCall {
                opcode: 31,
                objects: [Object::identifier(1), Object::default()],
                int1: 2112,
                ..ActionCall::default()
            };
            assert_eq!(d.action(&Action::Plain(call)), "Spell(Myself,WIZARD_MAGIC_MISSILE)");
        });
    }

    #[test]
    fn test_only_spell_functions_use_the_id_sibling() {
        let actions = SignatureSet::parse(
            FunctionKind::Action,
            "31 Spell(O:Target*,I:Spell*Spell)\n31 SpellRES(S:RES*,O:Target*)\n95 SpellPoint(P:Target*,I:Spell*Spell)\n95 SpellPointRES(S:RES*,P:Target*)\n",
        );
        let triggers = SignatureSet::builtin(FunctionKind::Trigger);
        let cache = ids();
        let d = Decompiler::new(&triggers, &actions, &cache, GameVariant::Bg2);

        let spell = actions.get(31);
        assert_eq!(d.resource_sibling(spell, &spell[1], "", "").name, "Spell");
        assert_eq!(d.resource_sibling(spell, &spell[1], "SPWI112", "").name, "SpellRES");

        let point = actions.get(95);
        assert_eq!(d.resource_sibling(point, &point[1], "", "").name, "SpellPointRES");
    }

    #[test]
    fn test_points_scale_except_skip_list() {
        with(GameVariant::Bg2, 2, |d| {
            let create = ActionCall {
                opcode: 7,
                point: (10, 20),
                str1: "OGRE".to_string(),
                ..ActionCall::default()
            };
            assert_eq!(d.action(&Action::Plain(create)), "CreateCreature(\"OGRE\",[20.40],0)");

            let shake = ActionCall {
                opcode: 254,
                point: (10, 20),
                int1: 5,
                ..ActionCall::default()
            };
            assert_eq!(d.action(&Action::Plain(shake)), "ScreenShake([10.20],5)");

            let here = ActionCall {
                opcode: 23,
                point: (-1, -1),
                ..ActionCall::default()
            };
            assert_eq!(d.action(&Action::Plain(here)), "MoveToPoint([-1.-1])");
        });
    }

    #[test]
    fn test_action_override() {
        with(GameVariant::Bg2, 1, |d| {
            let attack = ActionCall {
                opcode: 3,
                objects: [Object::identifier(12), Object::default()],
                ..ActionCall::default()
            };
            let action = Action::from_slots(Object::named("Imoen"), attack);
            assert_eq!(d.action(&action), "ActionOverride(\"Imoen\",Attack(NearestEnemyOf))");
        });
    }

    #[test]
    fn test_script_layout() {
        with(GameVariant::Bg2, 1, |d| {
            let script = Script {
                blocks: vec![Block {
                    triggers: vec![Trigger {
                        opcode: 0x23,
                        ..Trigger::default()
                    }],
                    responses: vec![super::super::types::Response {
                        weight: 100,
                        actions: vec![Action::Plain(ActionCall {
                            opcode: 7,
                            ..ActionCall::default()
                        })],
                    }],
                }],
            };
            assert_eq!(
                d.script(&script),
                "IF\n  True()\nTHEN\n  RESPONSE #100\n    CreateCreature(\"\",[0.0],0)\nEND\n\n"
            );
        });
    }
}

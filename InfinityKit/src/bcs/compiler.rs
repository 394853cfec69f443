//! Script source text to compiled records

use std::sync::Arc;

use super::builtin;
use super::decompiler::target_fields;
use super::signature::{FunctionKind, Param, ParamType, Signature, SignatureSet, Slot};
use super::strings::{StringPart, join_packed};
use super::types::{Action, ActionCall, Block, Object, Response, Script, Trigger};
use crate::config::GameVariant;
use crate::error::{Error, Result};
use crate::ids::{IdsTable, SymbolSource, parse_int};

/// A parsed `Name(arg, ...)` call
#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    negated: bool,
    name: String,
    args: Vec<String>,
}

/// Remove `//` comments that are not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let bytes = line.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Split text into top-level calls (`A() B()` and one call per line both work)
fn split_calls(text: &str) -> Vec<String> {
    let mut calls = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    for c in text.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && !in_string && c.is_whitespace() {
            continue;
        }
        current.push(c);
        if c == ')' && depth == 0 && !in_string {
            calls.push(std::mem::take(&mut current));
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        calls.push(rest.to_string());
    }
    calls
}

/// Split an argument list at top-level commas
fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    for c in text.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() || !args.is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

fn parse_call(text: &str, line: usize) -> Result<Call> {
    let text = text.trim();
    let (negated, body) = match text.strip_prefix('!') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let open = body.find('(').ok_or_else(|| Error::ScriptSyntax {
        line,
        message: format!("expected a function call, found '{text}'"),
    })?;
    if !body.ends_with(')') {
        return Err(Error::ScriptSyntax {
            line,
            message: format!("missing ')' in '{text}'"),
        });
    }
    Ok(Call {
        negated,
        name: body[..open].trim().to_string(),
        args: split_args(&body[open + 1..body.len() - 1]),
    })
}

fn unquote(arg: &str) -> String {
    let arg = arg.trim();
    arg.strip_prefix('"')
        .and_then(|a| a.strip_suffix('"'))
        .unwrap_or(arg)
        .to_string()
}

/// Parse `[x.y]`
fn parse_point(arg: &str, line: usize) -> Result<(i32, i32)> {
    let values = parse_group(arg, line)?;
    match values.as_slice() {
        [] => Ok((0, 0)),
        [x, y] => Ok((*x, *y)),
        _ => Err(Error::ScriptSyntax {
            line,
            message: format!("expected [x.y], found '{arg}'"),
        }),
    }
}

fn parse_group(arg: &str, line: usize) -> Result<Vec<i32>> {
    let inner = arg
        .trim()
        .strip_prefix('[')
        .and_then(|a| a.strip_suffix(']'))
        .ok_or_else(|| Error::ScriptSyntax {
            line,
            message: format!("expected a bracketed group, found '{arg}'"),
        })?;
    inner
        .split('.')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            parse_int(s.trim()).map(|v| v as i32).ok_or_else(|| Error::ScriptSyntax {
                line,
                message: format!("bad number '{s}' in '{arg}'"),
            })
        })
        .collect()
}

/// Compiles script source into records
pub struct Compiler<'a> {
    triggers: &'a SignatureSet,
    actions: &'a SignatureSet,
    ids: &'a dyn SymbolSource,
    variant: GameVariant,
}

impl<'a> Compiler<'a> {
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
        }
    }

    fn table(&self, name: &str) -> Option<Arc<IdsTable>> {
        self.ids.table(name).or_else(|| builtin::symbol_table(name))
    }

    /// Compile `IF ... THEN RESPONSE #n ... END` blocks
    pub fn compile(&self, text: &str) -> Result<Script> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Outside,
            Triggers,
            Actions,
        }

        let mut script = Script::default();
        let mut block = Block::default();
        let mut state = State::Outside;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = strip_comment(raw).trim();
            if content.is_empty() {
                continue;
            }
            let upper = content.to_uppercase();
            match state {
                State::Outside if upper == "IF" => {
                    block = Block::default();
                    state = State::Triggers;
                }
                State::Triggers if upper == "THEN" => state = State::Actions,
                State::Triggers => {
                    for call in split_calls(content) {
                        block.triggers.push(self.trigger(&parse_call(&call, line)?, line)?);
                    }
                }
                State::Actions if upper.starts_with("RESPONSE") => {
                    let weight = content
                        .split_once('#')
                        .and_then(|(_, w)| w.trim().parse::<i32>().ok())
                        .ok_or_else(|| Error::ScriptSyntax {
                            line,
                            message: format!("bad response weight in '{content}'"),
                        })?;
                    block.responses.push(Response {
                        weight,
                        actions: Vec::new(),
                    });
                }
                State::Actions if upper == "END" => {
                    script.blocks.push(std::mem::take(&mut block));
                    state = State::Outside;
                }
                State::Actions => {
                    let response = block.responses.last_mut().ok_or_else(|| Error::ScriptSyntax {
                        line,
                        message: "action outside of a RESPONSE".to_string(),
                    })?;
                    for call in split_calls(content) {
                        response.actions.push(self.action(&parse_call(&call, line)?, line)?);
                    }
                }
                State::Outside => {
                    return Err(Error::ScriptSyntax {
                        line,
                        message: format!("expected IF, found '{content}'"),
                    });
                }
            }
        }
        if state != State::Outside {
            return Err(Error::ScriptSyntax {
                line: text.lines().count(),
                message: "unterminated block (missing END)".to_string(),
            });
        }
        Ok(script)
    }

    /// Compile a bare list of trigger calls
    pub fn compile_triggers(&self, text: &str) -> Result<Vec<Trigger>> {
        let mut triggers = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            for call in split_calls(strip_comment(raw)) {
                triggers.push(self.trigger(&parse_call(&call, index + 1)?, index + 1)?);
            }
        }
        Ok(triggers)
    }

    /// Compile a bare list of action calls
    pub fn compile_actions(&self, text: &str) -> Result<Vec<Action>> {
        let mut actions = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            for call in split_calls(strip_comment(raw)) {
                actions.push(self.action(&parse_call(&call, index + 1)?, index + 1)?);
            }
        }
        Ok(actions)
    }

    fn lookup<'s>(&self, set: &'s SignatureSet, name: &str) -> Result<&'s Signature> {
        set.by_name(name).ok_or_else(|| Error::UnknownFunction(name.to_string()))
    }

    fn trigger(&self, call: &Call, line: usize) -> Result<Trigger> {
        let signature = self.lookup(self.triggers, &call.name)?;
        let mut trigger = Trigger {
            opcode: signature.opcode,
            ..Trigger::default()
        };
        trigger.set_negated(call.negated);

        let mut ints = [0i32; 3];
        let mut strings = PackedStrings::default();
        for ((param, slot), arg) in self.bind(signature, FunctionKind::Trigger, call) {
            match slot {
                Slot::Int(i) => ints[i] = self.integer(&arg, param, line)?,
                Slot::Point => {
                    let (x, y) = parse_point(&arg, line)?;
                    trigger.int2 = x;
                    trigger.int3 = y;
                }
                Slot::Str(s) => strings.set(s.field, s.part, s.colon, unquote(&arg)),
                Slot::Object(_) => trigger.object = self.object(&arg, line)?,
                Slot::Action | Slot::Unused => {}
            }
        }
        trigger.int1 = ints[0];
        if signature.count(ParamType::Point) == 0 {
            trigger.int2 = ints[1];
            trigger.int3 = ints[2];
        }
        [trigger.str1, trigger.str2] = strings.finish();
        Ok(trigger)
    }

    fn action(&self, call: &Call, line: usize) -> Result<Action> {
        let signature = self.lookup(self.actions, &call.name)?;
        if signature.is_override() {
            let [target, inner] = call.args.as_slice() else {
                return Err(Error::ScriptSyntax {
                    line,
                    message: format!("{} takes a target and an action", call.name),
                });
            };
            let inner = self.action(&parse_call(inner, line)?, line)?;
            // The binary form carries a single override target.
            if inner.override_target().is_some() {
                return Err(Error::ScriptSyntax {
                    line,
                    message: format!("{} cannot wrap another override", call.name),
                });
            }
            return Ok(Action::Override {
                target: self.object(target, line)?,
                inner: Box::new(inner),
            });
        }

        let mut action = ActionCall {
            opcode: signature.opcode,
            ..ActionCall::default()
        };
        let mut ints = [0i32; 3];
        let mut strings = PackedStrings::default();
        for ((param, slot), arg) in self.bind(signature, FunctionKind::Action, call) {
            match slot {
                Slot::Int(i) => ints[i] = self.integer(&arg, param, line)?,
                Slot::Point => action.point = parse_point(&arg, line)?,
                Slot::Str(s) => strings.set(s.field, s.part, s.colon, unquote(&arg)),
                Slot::Object(i) => action.objects[i] = self.object(&arg, line)?,
                Slot::Action | Slot::Unused => {}
            }
        }
        [action.int1, action.int2, action.int3] = ints;
        [action.str1, action.str2] = strings.finish();
        Ok(Action::Plain(action))
    }

    /// Pair every declared parameter with its slot and argument text
    ///
    /// Missing trailing arguments take their type's empty value.
    fn bind<'s>(&self, signature: &'s Signature, kind: FunctionKind, call: &Call) -> Vec<((&'s Param, Slot), String)> {
        if call.args.len() > signature.params.len() {
            tracing::warn!(
                "{} takes {} arguments, {} given; extra arguments ignored",
                signature.name,
                signature.params.len(),
                call.args.len()
            );
        }
        signature
            .params
            .iter()
            .zip(signature.slots(kind))
            .enumerate()
            .map(|(i, (param, slot))| {
                let arg = call.args.get(i).cloned().unwrap_or_else(|| match param.kind {
                    ParamType::String => "\"\"".to_string(),
                    ParamType::Object => "[ANYONE]".to_string(),
                    ParamType::Point => "[0.0]".to_string(),
                    _ => "0".to_string(),
                });
                ((param, slot), arg)
            })
            .collect()
    }

    /// Integer literal, IDS symbol, or `A|B` combination of either
    fn integer(&self, arg: &str, param: &Param, line: usize) -> Result<i32> {
        let mut value = 0i64;
        for part in arg.split('|') {
            let part = part.trim();
            if part.is_empty() {
                return Err(Error::ScriptSyntax {
                    line,
                    message: format!("empty operand in '{arg}'"),
                });
            }
            value |= parse_int(part)
                .or_else(|| {
                    param
                        .ids
                        .as_deref()
                        .and_then(|t| self.table(t))
                        .and_then(|t| t.value(part))
                })
                .unwrap_or_else(|| {
                    tracing::warn!("Line {line}: unresolved symbol '{part}' for {}, using 0", param.name);
                    0
                });
        }
        Ok(value as i32)
    }

    fn field_value(&self, token: &str, table: &str, line: usize) -> i32 {
        if let Some(v) = parse_int(token) {
            return v as i32;
        }
        match self.table(table).and_then(|t| t.value(token)) {
            Some(v) => v as i32,
            None => {
                tracing::warn!("Line {line}: unresolved {table} symbol '{token}', using 0");
                0
            }
        }
    }

    /// Parse an object reference
    pub(crate) fn object(&self, arg: &str, line: usize) -> Result<Object> {
        let arg = arg.trim();
        if arg.starts_with('"') {
            return Ok(Object::named(unquote(arg)));
        }

        if arg.starts_with('[') {
            let close = arg.find(']').ok_or_else(|| Error::ScriptSyntax {
                line,
                message: format!("unterminated object '{arg}'"),
            })?;
            let mut object = self.target(&arg[1..close], line);
            let rest = arg[close + 1..].trim();
            if !rest.is_empty() {
                let region = parse_group(rest, line)?;
                object.region = region.try_into().map_err(|_| Error::ScriptSyntax {
                    line,
                    message: format!("object region needs four values: '{rest}'"),
                })?;
            }
            return Ok(object);
        }

        // Identifier, possibly wrapping an inner object: NearestEnemyOf(Myself)
        let (function, inner) = match arg.find('(') {
            Some(open) if arg.ends_with(')') => (&arg[..open], Some(&arg[open + 1..arg.len() - 1])),
            _ => (arg, None),
        };
        let id = self.field_value(function.trim(), "OBJECT", line);
        let mut object = match inner {
            Some(inner) if !inner.trim().is_empty() => self.object(inner, line)?,
            _ => Object::default(),
        };
        let mut identifiers = [0i32; 5];
        identifiers[0] = id;
        identifiers[1..].copy_from_slice(&object.identifiers[..4]);
        if object.identifiers[4] != 0 {
            tracing::warn!("Line {line}: object nesting deeper than five levels is truncated");
        }
        object.identifiers = identifiers;
        Ok(object)
    }

    /// `[EA.GENERAL.RACE...]` or `[Identifier]`
    fn target(&self, inner: &str, line: usize) -> Object {
        let tokens: Vec<&str> = inner.split('.').map(str::trim).collect();
        if let [single] = tokens.as_slice() {
            if parse_int(single).is_none() {
                if let Some(id) = self.table("OBJECT").and_then(|t| t.value(single)) {
                    return Object::identifier(id as i32);
                }
            }
        }

        let mut object = Object::default();
        let layout = target_fields(&object, self.variant);
        let mut values: Vec<i32> = Vec::with_capacity(layout.len());
        for (i, (_, table)) in layout.iter().enumerate() {
            let value = match tokens.get(i) {
                Some(token) if !token.is_empty() => self.field_value(token, table, line),
                _ => 0,
            };
            values.push(value);
        }
        if tokens.len() > layout.len() {
            tracing::warn!("Line {line}: extra object fields in '[{inner}]' ignored");
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or(0);
        object.ea = next();
        if self.variant.has_faction_team() {
            object.faction = next();
            object.team = next();
        }
        object.general = next();
        object.race = next();
        object.class = next();
        object.specific = next();
        object.gender = next();
        object.alignment = next();
        object
    }
}

/// Collects logical string arguments into the two physical fields
#[derive(Debug, Default)]
struct PackedStrings {
    whole: [Option<String>; 2],
    first: [Option<(String, bool)>; 2],
    second: [Option<(String, bool)>; 2],
}

impl PackedStrings {
    fn set(&mut self, field: usize, part: StringPart, colon: bool, value: String) {
        let field = field.min(1);
        match part {
            StringPart::Whole => self.whole[field] = Some(value),
            StringPart::First => self.first[field] = Some((value, colon)),
            StringPart::Second => self.second[field] = Some((value, colon)),
        }
    }

    fn finish(self) -> [String; 2] {
        let Self { whole, first, second } = self;
        let mut out = [String::new(), String::new()];
        for (i, slot) in out.iter_mut().enumerate() {
            if let Some(value) = &whole[i] {
                *slot = value.clone();
            } else if first[i].is_some() || second[i].is_some() {
                let (a, colon) = first[i].clone().unwrap_or_default();
                let (b, colon_b) = second[i].clone().unwrap_or_default();
                *slot = join_packed(&a, &b, colon || colon_b);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcs::decompiler::Decompiler;
    use crate::ids::IdsCache;
    use pretty_assertions::assert_eq;

    fn ids() -> IdsCache {
        let cache = IdsCache::new();
        cache.initialize_with_ids_files(vec![
            ("EA.IDS", b"0 ANYONE\n2 PC\n255 ENEMY\n".as_slice()),
            ("GENERAL.IDS", b"1 HUMANOID\n".as_slice()),
            ("OBJECT.IDS", b"1 Myself\n12 NearestEnemyOf\n21 Player1\n".as_slice()),
            ("STATE.IDS", b"0x1 STATE_SLEEPING\n0x800 STATE_DEAD\n".as_slice()),
        ]);
        cache
    }

    fn sets() -> (SignatureSet, SignatureSet) {
        (
            SignatureSet::builtin(FunctionKind::Trigger),
            SignatureSet::builtin(FunctionKind::Action),
        )
    }

    #[test]
    fn test_minimal_script() {
        let cache = ids();
        let (triggers, actions) = sets();
        let compiler = Compiler::new(&triggers, &actions, &cache, GameVariant::Bg2);
        let text = "IF\nTrue()\nTHEN\nRESPONSE #100\nCreateCreature(\"\",[0.0],0)\nEND";
        let script = compiler.compile(text).unwrap();

        assert_eq!(script.blocks.len(), 1);
        let block = &script.blocks[0];
        assert_eq!(block.triggers.len(), 1);
        assert_eq!(block.triggers[0].opcode, triggers.by_name("True").unwrap().opcode);
        assert_eq!(block.responses.len(), 1);
        assert_eq!(block.responses[0].weight, 100);
        assert_eq!(block.responses[0].actions.len(), 1);
        assert_eq!(block.responses[0].actions[0].call().opcode, 7);

        let decompiler = Decompiler::new(&triggers, &actions, &cache, GameVariant::Bg2);
        assert_eq!(
            decompiler.action(&block.responses[0].actions[0]),
            "CreateCreature(\"\",[0.0],0)"
        );
    }

    #[test]
    fn test_objects() {
        let cache = ids();
        let (triggers, actions) = sets();
        let compiler = Compiler::new(&triggers, &actions, &cache, GameVariant::Bg2);

        assert_eq!(compiler.object("Myself", 1).unwrap(), Object::identifier(1));
        assert_eq!(compiler.object("\"Door01\"", 1).unwrap(), Object::named("Door01"));
        assert_eq!(compiler.object("[ANYONE]", 1).unwrap(), Object::default());
        assert_eq!(compiler.object("[Player1]", 1).unwrap(), Object::identifier(21));

        let enemy = compiler.object("[ENEMY.HUMANOID.0.3]", 1).unwrap();
        assert_eq!((enemy.ea, enemy.general, enemy.race, enemy.class), (255, 1, 0, 3));

        let nested = compiler.object("NearestEnemyOf(Myself)", 1).unwrap();
        assert_eq!(nested.identifiers, [12, 1, 0, 0, 0]);

        let regional = compiler.object("[PC][10.20.30.40]", 1).unwrap();
        assert_eq!(regional.ea, 2);
        assert_eq!(regional.region, [10, 20, 30, 40]);
    }

    #[test]
    fn test_action_override_and_negation() {
        let cache = ids();
        let (triggers, actions) = sets();
        let compiler = Compiler::new(&triggers, &actions, &cache, GameVariant::Bg2);
        let text = "IF\n  !See(NearestEnemyOf(Myself)) // nobody around\nTHEN\n  RESPONSE #50\n    ActionOverride(\"Imoen\",Attack([ENEMY]))\nEND\n";
        let script = compiler.compile(text).unwrap();
        let block = &script.blocks[0];
        assert!(block.triggers[0].is_negated());
        assert_eq!(block.triggers[0].object.identifiers[..2], [12, 1]);

        let action = &block.responses[0].actions[0];
        assert_eq!(action.override_target(), Some(&Object::named("Imoen")));
        assert_eq!(action.call().opcode, 3);
        assert_eq!(action.call().objects[0].ea, 255);
    }

    #[test]
    fn test_nested_override_rejected() {
        let cache = ids();
        let (triggers, actions) = sets();
        let compiler = Compiler::new(&triggers, &actions, &cache, GameVariant::Bg2);
        let text = "IF\n  True()\nTHEN\n  RESPONSE #100\n    ActionOverride(\"Imoen\",ActionOverride(\"Jaheira\",Attack([ENEMY])))\nEND\n";
        assert!(matches!(compiler.compile(text), Err(Error::ScriptSyntax { line: 5, .. })));
    }

    #[test]
    fn test_packed_strings_and_bit_or() {
        let cache = ids();
        let (triggers, actions) = sets();
        let compiler = Compiler::new(&triggers, &actions, &cache, GameVariant::Bg2);
        let found = compiler
            .compile_triggers("Global(\"KilledOgre\",\"GLOBAL\",1) StateCheck(Myself,STATE_SLEEPING|STATE_DEAD)")
            .unwrap();
        assert_eq!(found[0].str1, "GLOBALKilledOgre");
        assert_eq!(found[0].str2, "");
        assert_eq!(found[0].int1, 1);
        assert_eq!(found[1].int1, 0x801);

        let acts = compiler
            .compile_actions("IncrementGlobalOnce(\"A\",\"GLOBAL\",\"B\",\"LOCALS\",2)\nSpellCastEffect(Myself,\"BATTLE\",\"CAS_P01\",0)")
            .unwrap();
        assert_eq!(acts[0].call().str1, "GLOBALA");
        assert_eq!(acts[0].call().str2, "LOCALSB");
        assert_eq!(acts[0].call().int1, 2);
        assert_eq!(acts[1].call().str1, "BATTLE:CAS_P01");
    }

    #[test]
    fn test_unresolved_symbol_compiles_to_zero() {
        let cache = ids();
        let (triggers, actions) = sets();
        let compiler = Compiler::new(&triggers, &actions, &cache, GameVariant::Bg2);
        let found = compiler.compile_triggers("StateCheck(Myself,STATE_UNKNOWN)").unwrap();
        assert_eq!(found[0].int1, 0);
    }

    #[test]
    fn test_errors() {
        let cache = ids();
        let (triggers, actions) = sets();
        let compiler = Compiler::new(&triggers, &actions, &cache, GameVariant::Bg2);
        assert!(matches!(compiler.compile("IF\nNoSuchThing()\nTHEN\nEND"), Err(Error::UnknownFunction(_))));
        assert!(matches!(compiler.compile("IF\nTrue()\nTHEN\n"), Err(Error::ScriptSyntax { .. })));
        assert!(matches!(compiler.compile("True()"), Err(Error::ScriptSyntax { line: 1, .. })));
        assert!(matches!(
            compiler.compile("IF\nTrue()\nTHEN\nWait(1)\nEND"),
            Err(Error::ScriptSyntax { line: 4, .. })
        ));
    }

    #[test]
    fn test_split_helpers() {
        assert_eq!(split_calls("A() B(\"x y\",C(1))"), vec!["A()", "B(\"x y\",C(1))"]);
        assert_eq!(split_args("\"a,b\",[1.2],F(x,y)"), vec!["\"a,b\"", "[1.2]", "F(x,y)"]);
        assert_eq!(split_args(""), Vec::<String>::new());
        assert_eq!(strip_comment("See(\"a//b\") // c"), "See(\"a//b\") ");
    }
}

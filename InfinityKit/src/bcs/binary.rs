//! Compiled script container (`SC` ... `SC` token stream)
//!
//! Compiled scripts are ASCII: two-letter section tags, integers, quoted
//! strings and `[a.b.c.d]` groups. The reader is token based so it accepts
//! the spacing variations found across releases; the writer emits one
//! canonical layout, which files produced by the original compiler share.

use std::fmt::Write as _;

use super::types::{Action, ActionCall, Block, Object, Response, Script, Trigger};
use crate::config::GameVariant;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag([u8; 2]),
    Int(i64),
    Str(String),
    Group(Vec<i64>),
}

const TAGS: [&[u8; 2]; 8] = [b"SC", b"CR", b"CO", b"TR", b"OB", b"RS", b"RE", b"AC"];

fn tokenize(data: &[u8]) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let c = data[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c == b'"' {
            let end = data[i + 1..]
                .iter()
                .position(|&b| b == b'"')
                .ok_or_else(|| Error::InvalidBytecode(format!("unterminated string at byte {i}")))?;
            tokens.push(Token::Str(
                String::from_utf8_lossy(&data[i + 1..i + 1 + end]).into_owned(),
            ));
            i += end + 2;
        } else if c == b'[' {
            let end = data[i..]
                .iter()
                .position(|&b| b == b']')
                .ok_or_else(|| Error::InvalidBytecode(format!("unterminated group at byte {i}")))?;
            let inner = String::from_utf8_lossy(&data[i + 1..i + end]).into_owned();
            let values = inner
                .split(['.', ',', ' '])
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<i64>()
                        .map_err(|_| Error::InvalidBytecode(format!("bad group value '{s}'")))
                })
                .collect::<Result<Vec<_>>>()?;
            tokens.push(Token::Group(values));
            i += end + 1;
        } else if c == b'-' || c.is_ascii_digit() {
            let start = i;
            i += 1;
            while i < data.len() && data[i].is_ascii_digit() {
                i += 1;
            }
            let text = String::from_utf8_lossy(&data[start..i]).into_owned();
            let value = text
                .parse::<i64>()
                .map_err(|_| Error::InvalidBytecode(format!("bad integer '{text}' at byte {start}")))?;
            tokens.push(Token::Int(value));
        } else if i + 1 < data.len() && TAGS.iter().any(|t| t[..] == data[i..i + 2]) {
            tokens.push(Token::Tag([data[i], data[i + 1]]));
            i += 2;
        } else {
            return Err(Error::InvalidBytecode(format!(
                "unexpected byte 0x{c:02X} at offset {i}"
            )));
        }
    }
    Ok(tokens)
}

struct Reader {
    tokens: Vec<Token>,
    pos: usize,
    variant: GameVariant,
}

impl Reader {
    fn peek_tag(&self, tag: &[u8; 2]) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Tag(t)) if t == tag)
    }

    fn next(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| Error::InvalidBytecode("unexpected end of script".to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    fn tag(&mut self, tag: &[u8; 2]) -> Result<()> {
        match self.next()? {
            Token::Tag(t) if &t == tag => Ok(()),
            other => Err(Error::InvalidBytecode(format!(
                "expected {} at token {}, found {other:?}",
                String::from_utf8_lossy(tag),
                self.pos - 1
            ))),
        }
    }

    fn int(&mut self) -> Result<i32> {
        match self.next()? {
            // Opcodes and flags are unsigned on disk; keep the bit pattern
            Token::Int(v) => Ok(v as i32),
            other => Err(Error::InvalidBytecode(format!(
                "expected integer at token {}, found {other:?}",
                self.pos - 1
            ))),
        }
    }

    fn string(&mut self) -> Result<String> {
        match self.next()? {
            Token::Str(s) => Ok(s),
            other => Err(Error::InvalidBytecode(format!(
                "expected string at token {}, found {other:?}",
                self.pos - 1
            ))),
        }
    }

    fn region(&mut self) -> Result<[i32; 4]> {
        if let Some(Token::Group(values)) = self.tokens.get(self.pos) {
            if values.len() != 4 {
                return Err(Error::InvalidBytecode(format!(
                    "object region needs 4 values, found {}",
                    values.len()
                )));
            }
            let region = [values[0] as i32, values[1] as i32, values[2] as i32, values[3] as i32];
            self.pos += 1;
            return Ok(region);
        }
        Ok([self.int()?, self.int()?, self.int()?, self.int()?])
    }

    fn object(&mut self) -> Result<Object> {
        self.tag(b"OB")?;
        let mut object = Object {
            ea: self.int()?,
            ..Object::default()
        };
        if self.variant.has_faction_team() {
            object.faction = self.int()?;
            object.team = self.int()?;
        }
        object.general = self.int()?;
        object.race = self.int()?;
        object.class = self.int()?;
        object.specific = self.int()?;
        object.gender = self.int()?;
        object.alignment = self.int()?;
        for id in &mut object.identifiers {
            *id = self.int()?;
        }
        if self.variant.has_object_region() {
            object.region = self.region()?;
        }
        object.name = self.string()?;
        self.tag(b"OB")?;
        Ok(object)
    }

    fn trigger(&mut self) -> Result<Trigger> {
        self.tag(b"TR")?;
        let trigger = Trigger {
            opcode: self.int()? as u32,
            int1: self.int()?,
            flags: self.int()? as u32,
            int2: self.int()?,
            int3: self.int()?,
            str1: self.string()?,
            str2: self.string()?,
            object: self.object()?,
        };
        self.tag(b"TR")?;
        Ok(trigger)
    }

    fn action(&mut self) -> Result<Action> {
        self.tag(b"AC")?;
        let opcode = self.int()? as u32;
        let target = self.object()?;
        let first = self.object()?;
        let second = self.object()?;
        let call = ActionCall {
            opcode,
            objects: [first, second],
            int1: self.int()?,
            point: (self.int()?, self.int()?),
            int2: self.int()?,
            int3: self.int()?,
            str1: self.string()?,
            str2: self.string()?,
        };
        self.tag(b"AC")?;
        Ok(Action::from_slots(target, call))
    }

    fn response(&mut self) -> Result<Response> {
        self.tag(b"RE")?;
        let mut response = Response {
            weight: self.int()?,
            actions: Vec::new(),
        };
        while self.peek_tag(b"AC") {
            response.actions.push(self.action()?);
        }
        self.tag(b"RE")?;
        Ok(response)
    }

    fn block(&mut self) -> Result<Block> {
        self.tag(b"CR")?;
        let mut block = Block::default();
        self.tag(b"CO")?;
        while self.peek_tag(b"TR") {
            block.triggers.push(self.trigger()?);
        }
        self.tag(b"CO")?;
        self.tag(b"RS")?;
        while self.peek_tag(b"RE") {
            block.responses.push(self.response()?);
        }
        self.tag(b"RS")?;
        self.tag(b"CR")?;
        Ok(block)
    }
}

/// Parse a compiled script
pub fn read_script(data: &[u8], variant: GameVariant) -> Result<Script> {
    let mut reader = Reader {
        tokens: tokenize(data)?,
        pos: 0,
        variant,
    };
    reader.tag(b"SC")?;
    let mut script = Script::default();
    while reader.peek_tag(b"CR") {
        script.blocks.push(reader.block()?);
    }
    reader.tag(b"SC")?;
    tracing::debug!("Read script with {} blocks", script.blocks.len());
    Ok(script)
}

fn write_object(out: &mut String, object: &Object, variant: GameVariant) {
    let mut fields = vec![object.ea];
    if variant.has_faction_team() {
        fields.extend([object.faction, object.team]);
    }
    fields.extend([
        object.general,
        object.race,
        object.class,
        object.specific,
        object.gender,
        object.alignment,
    ]);
    fields.extend(object.identifiers);
    out.push_str("OB\n");
    let ints: Vec<String> = fields.iter().map(ToString::to_string).collect();
    out.push_str(&ints.join(" "));
    if variant.has_object_region() {
        let [a, b, c, d] = object.region;
        let _ = write!(out, " [{a}.{b}.{c}.{d}]");
    }
    let _ = writeln!(out, " \"{}\"OB", object.name);
}

fn write_trigger(out: &mut String, trigger: &Trigger, variant: GameVariant) {
    let _ = write!(
        out,
        "TR\n{} {} {} {} {} \"{}\" \"{}\" ",
        trigger.opcode, trigger.int1, trigger.flags, trigger.int2, trigger.int3, trigger.str1, trigger.str2
    );
    write_object(out, &trigger.object, variant);
    out.push_str("TR\n");
}

fn write_action(out: &mut String, action: &Action, variant: GameVariant) {
    let call = action.call();
    let empty = Object::default();
    let target = action.override_target().unwrap_or(&empty);
    let _ = write!(out, "AC\n{}", call.opcode);
    write_object(out, target, variant);
    write_object(out, &call.objects[0], variant);
    write_object(out, &call.objects[1], variant);
    let _ = writeln!(
        out,
        "{} {} {} {} {}\"{}\" \"{}\" AC",
        call.int1, call.point.0, call.point.1, call.int2, call.int3, call.str1, call.str2
    );
}

/// Serialize a compiled script
#[must_use]
pub fn write_script(script: &Script, variant: GameVariant) -> Vec<u8> {
    let mut out = String::from("SC\n");
    for block in &script.blocks {
        out.push_str("CR\nCO\n");
        for trigger in &block.triggers {
            write_trigger(&mut out, trigger, variant);
        }
        out.push_str("CO\nRS\n");
        for response in &block.responses {
            let _ = write!(out, "RE\n{}", response.weight);
            for action in &response.actions {
                write_action(&mut out, action, variant);
            }
            out.push_str("RE\n");
        }
        out.push_str("RS\nCR\n");
    }
    out.push_str("SC\n");
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Script {
        let mut see = Trigger {
            opcode: 0x401C,
            object: Object::identifier(17),
            ..Trigger::default()
        };
        see.object.identifiers[1] = 1;
        see.set_negated(true);
        let create = ActionCall {
            opcode: 7,
            point: (120, -5),
            str1: "OGRE01".to_string(),
            ..ActionCall::default()
        };
        let attack = ActionCall {
            opcode: 3,
            objects: [Object::named("Ogre"), Object::default()],
            ..ActionCall::default()
        };
        Script {
            blocks: vec![Block {
                triggers: vec![see],
                responses: vec![Response {
                    weight: 100,
                    actions: vec![
                        Action::Plain(create),
                        Action::from_slots(Object::named("Imoen"), attack),
                    ],
                }],
            }],
        }
    }

    #[test]
    fn test_round_trip_all_variants() {
        for variant in [GameVariant::Bg1, GameVariant::Bg2, GameVariant::Pst, GameVariant::Ee] {
            let script = sample();
            let bytes = write_script(&script, variant);
            let parsed = read_script(&bytes, variant).unwrap();
            assert_eq!(parsed, script);
            assert_eq!(write_script(&parsed, variant), bytes);
        }
    }

    #[test]
    fn test_canonical_layout() {
        let script = Script {
            blocks: vec![Block {
                triggers: vec![Trigger {
                    opcode: 0x23,
                    ..Trigger::default()
                }],
                responses: vec![],
            }],
        };
        let text = String::from_utf8(write_script(&script, GameVariant::Bg1)).unwrap();
        assert_eq!(
            text,
            "SC\nCR\nCO\nTR\n35 0 0 0 0 \"\" \"\" OB\n0 0 0 0 0 0 0 0 0 0 0 0 \"\"OB\nTR\nCO\nRS\nRS\nCR\nSC\n"
        );
    }

    #[test]
    fn test_reader_tolerates_spacing() {
        let text = b"SC CR CO TR 35 0 0 0 0 \"\" \"\" OB 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 \"\" OB TR CO RS RE 100 RE RS CR SC";
        let script = read_script(text, GameVariant::Bg2).unwrap();
        assert_eq!(script.blocks[0].triggers[0].opcode, 35);
        assert_eq!(script.blocks[0].triggers[0].object.region, [0, 0, 0, 0]);
        assert_eq!(script.blocks[0].responses[0].weight, 100);
    }

    #[test]
    fn test_truncated_script_fails() {
        assert!(read_script(b"SC\nCR\nCO\nTR\n35 0", GameVariant::Bg2).is_err());
        assert!(read_script(b"XX", GameVariant::Bg2).is_err());
    }
}

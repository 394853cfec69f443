//! DLG dialogue container
//!
//! States and transitions reference trigger and action scripts stored as
//! plain text in the file; upscaling rewrites the coordinates inside those
//! texts through the script compiler.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::bcs;
use crate::config::GameVariant;
use crate::error::{Error, Result};
use crate::ids::SymbolSource;
use crate::utils::{ByteSpan, read_resref, resref_bytes};

pub const DLG_SIGNATURE: &[u8; 4] = b"DLG ";
pub const DLG_VERSION: &[u8; 4] = b"V1.0";

/// Header without the trailing flags word (original release)
const SHORT_HEADER_SIZE: usize = 0x30;
/// Header with the flags word (Shadows of Amn onwards)
const LONG_HEADER_SIZE: usize = 0x34;
const STATE_SIZE: usize = 16;
const TRANSITION_SIZE: usize = 32;
const TEXT_ENTRY_SIZE: usize = 8;

pub mod transition_flags {
    pub const HAS_TEXT: u32 = 1 << 0;
    pub const HAS_TRIGGER: u32 = 1 << 1;
    pub const HAS_ACTION: u32 = 1 << 2;
    pub const TERMINATES: u32 = 1 << 3;
    pub const HAS_JOURNAL: u32 = 1 << 4;
}

/// Index value meaning "no trigger"
pub const NO_TRIGGER: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State {
    pub text: u32,
    pub first_transition: u32,
    pub transition_count: u32,
    pub trigger: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    pub flags: u32,
    pub text: u32,
    pub journal: u32,
    pub trigger: u32,
    pub action: u32,
    pub next_dialog: String,
    pub next_state: u32,
}

impl Transition {
    #[must_use]
    pub fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dlg {
    /// `None` for the short header
    pub flags: Option<u32>,
    pub states: Vec<State>,
    pub transitions: Vec<Transition>,
    pub state_triggers: Vec<String>,
    pub transition_triggers: Vec<String>,
    pub actions: Vec<String>,
}

/// Script texts are single-byte encoded; map each byte to one char
fn decode_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn encode_text(text: &str) -> Vec<u8> {
    text.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect()
}

fn read_texts(span: &ByteSpan<'_>, offset: usize, count: usize) -> Result<Vec<String>> {
    span.records(offset, count, TEXT_ENTRY_SIZE)?
        .iter()
        .map(|entry| {
            let start = entry.u32_at(0)? as usize;
            let len = entry.u32_at(4)? as usize;
            Ok(decode_text(span.slice(start, len)?))
        })
        .collect()
}

impl Dlg {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("DLG", DLG_SIGNATURE)?;
        if &version != DLG_VERSION {
            return Err(Error::UnsupportedVersion {
                format: "DLG",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let state_count = span.u32_at(0x08)? as usize;
        let states_offset = span.u32_at(0x0C)? as usize;
        let transition_count = span.u32_at(0x10)? as usize;
        let transitions_offset = span.u32_at(0x14)? as usize;
        let state_triggers_offset = span.u32_at(0x18)? as usize;
        let state_trigger_count = span.u32_at(0x1C)? as usize;
        let transition_triggers_offset = span.u32_at(0x20)? as usize;
        let transition_trigger_count = span.u32_at(0x24)? as usize;
        let actions_offset = span.u32_at(0x28)? as usize;
        let action_count = span.u32_at(0x2C)? as usize;

        // The short header has its first section right after offset 0x30
        let first_section = [
            states_offset,
            transitions_offset,
            state_triggers_offset,
            transition_triggers_offset,
            actions_offset,
        ]
        .into_iter()
        .filter(|&o| o > 0)
        .min()
        .unwrap_or(LONG_HEADER_SIZE);
        let flags = if first_section >= LONG_HEADER_SIZE {
            Some(span.u32_at(0x30)?)
        } else {
            None
        };
        tracing::debug!("DLG: {state_count} states, {transition_count} transitions");

        let states = span
            .records(states_offset, state_count, STATE_SIZE)?
            .iter()
            .map(|r| {
                Ok(State {
                    text: r.u32_at(0)?,
                    first_transition: r.u32_at(4)?,
                    transition_count: r.u32_at(8)?,
                    trigger: r.i32_at(12)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let transitions = span
            .records(transitions_offset, transition_count, TRANSITION_SIZE)?
            .iter()
            .map(|r| {
                Ok(Transition {
                    flags: r.u32_at(0)?,
                    text: r.u32_at(4)?,
                    journal: r.u32_at(8)?,
                    trigger: r.u32_at(12)?,
                    action: r.u32_at(16)?,
                    next_dialog: read_resref(r.slice(20, 8)?),
                    next_state: r.u32_at(28)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            flags,
            states,
            transitions,
            state_triggers: read_texts(&span, state_triggers_offset, state_trigger_count)?,
            transition_triggers: read_texts(&span, transition_triggers_offset, transition_trigger_count)?,
            actions: read_texts(&span, actions_offset, action_count)?,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header_size = if self.flags.is_some() {
            LONG_HEADER_SIZE
        } else {
            SHORT_HEADER_SIZE
        };
        let states_offset = header_size;
        let transitions_offset = states_offset + self.states.len() * STATE_SIZE;
        let state_triggers_offset = transitions_offset + self.transitions.len() * TRANSITION_SIZE;
        let transition_triggers_offset = state_triggers_offset + self.state_triggers.len() * TEXT_ENTRY_SIZE;
        let actions_offset = transition_triggers_offset + self.transition_triggers.len() * TEXT_ENTRY_SIZE;
        let texts_offset = actions_offset + self.actions.len() * TEXT_ENTRY_SIZE;

        let mut out = Vec::with_capacity(texts_offset);
        out.extend_from_slice(DLG_SIGNATURE);
        out.extend_from_slice(DLG_VERSION);
        for v in [
            self.states.len(),
            states_offset,
            self.transitions.len(),
            transitions_offset,
            state_triggers_offset,
            self.state_triggers.len(),
            transition_triggers_offset,
            self.transition_triggers.len(),
            actions_offset,
            self.actions.len(),
        ] {
            out.write_u32::<LittleEndian>(v as u32)?;
        }
        if let Some(flags) = self.flags {
            out.write_u32::<LittleEndian>(flags)?;
        }

        for state in &self.states {
            out.write_u32::<LittleEndian>(state.text)?;
            out.write_u32::<LittleEndian>(state.first_transition)?;
            out.write_u32::<LittleEndian>(state.transition_count)?;
            out.write_i32::<LittleEndian>(state.trigger)?;
        }
        for t in &self.transitions {
            for v in [t.flags, t.text, t.journal, t.trigger, t.action] {
                out.write_u32::<LittleEndian>(v)?;
            }
            out.extend_from_slice(&resref_bytes(&t.next_dialog));
            out.write_u32::<LittleEndian>(t.next_state)?;
        }

        let encoded: Vec<Vec<u8>> = self
            .state_triggers
            .iter()
            .chain(&self.transition_triggers)
            .chain(&self.actions)
            .map(|t| encode_text(t))
            .collect();
        let mut cursor = texts_offset;
        for text in &encoded {
            out.write_u32::<LittleEndian>(cursor as u32)?;
            out.write_u32::<LittleEndian>(text.len() as u32)?;
            cursor += text.len();
        }
        for text in &encoded {
            out.extend_from_slice(text);
        }
        Ok(out)
    }

    /// Rescale coordinates inside every trigger and action text
    ///
    /// Texts that do not compile are kept as they are. Returns the number of
    /// texts left untouched for that reason.
    pub fn upscale(&mut self, ids: &dyn SymbolSource, variant: GameVariant, factor: u32) -> usize {
        let mut skipped = 0;
        for text in self.state_triggers.iter_mut().chain(&mut self.transition_triggers) {
            match bcs::upscale_trigger_text(text, ids, variant, factor) {
                Ok(scaled) => *text = scaled,
                Err(e) => {
                    tracing::warn!("Keeping trigger text verbatim: {e}");
                    skipped += 1;
                }
            }
        }
        for text in &mut self.actions {
            match bcs::upscale_action_text(text, ids, variant, factor) {
                Ok(scaled) => *text = scaled,
                Err(e) => {
                    tracing::warn!("Keeping action text verbatim: {e}");
                    skipped += 1;
                }
            }
        }
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdsCache;
    use pretty_assertions::assert_eq;

    fn sample(flags: Option<u32>) -> Dlg {
        Dlg {
            flags,
            states: vec![
                State {
                    text: 100,
                    first_transition: 0,
                    transition_count: 2,
                    trigger: 0,
                },
                State {
                    text: 101,
                    first_transition: 2,
                    transition_count: 1,
                    trigger: NO_TRIGGER,
                },
            ],
            transitions: vec![
                Transition {
                    flags: transition_flags::HAS_TEXT | transition_flags::HAS_ACTION,
                    text: 200,
                    action: 0,
                    next_dialog: "MYDLG".into(),
                    next_state: 1,
                    ..Transition::default()
                },
                Transition {
                    flags: transition_flags::HAS_TRIGGER | transition_flags::TERMINATES,
                    trigger: 0,
                    ..Transition::default()
                },
                Transition {
                    flags: transition_flags::TERMINATES,
                    ..Transition::default()
                },
            ],
            state_triggers: vec!["Global(\"Met\",\"LOCALS\",0)\r\n".into()],
            transition_triggers: vec!["True()".into()],
            actions: vec!["MoveToPoint([100.200])\r\nSetGlobal(\"Met\",\"LOCALS\",1)".into()],
        }
    }

    #[test]
    fn test_round_trip_long_header() {
        let dlg = sample(Some(1));
        let bytes = dlg.to_bytes().unwrap();
        assert_eq!(u32::from_le_bytes(bytes[0x0C..0x10].try_into().unwrap()), 0x34);
        assert_eq!(Dlg::from_bytes(&bytes).unwrap(), dlg);
    }

    #[test]
    fn test_round_trip_short_header() {
        let dlg = sample(None);
        let bytes = dlg.to_bytes().unwrap();
        let parsed = Dlg::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.flags, None);
        assert_eq!(parsed, dlg);
    }

    #[test]
    fn test_high_bytes_survive() {
        let mut dlg = sample(None);
        dlg.actions = vec![decode_text(&[b'"', 0xE9, b'"'])];
        let parsed = Dlg::from_bytes(&dlg.to_bytes().unwrap()).unwrap();
        assert_eq!(encode_text(&parsed.actions[0]), vec![b'"', 0xE9, b'"']);
    }

    #[test]
    fn test_upscale_rewrites_points() {
        let ids = IdsCache::new();
        let mut dlg = sample(Some(0));
        dlg.actions.push("Gibberish(".into());
        let skipped = dlg.upscale(&ids, GameVariant::Bg2, 2);
        assert_eq!(skipped, 1);
        assert_eq!(dlg.actions[0], "MoveToPoint([200.400])\nSetGlobal(\"Met\",\"LOCALS\",1)\n");
        assert_eq!(dlg.actions[1], "Gibberish(");
        assert_eq!(dlg.transition_triggers[0], "True()\n");
    }

    #[test]
    fn test_wrong_signature() {
        let err = Dlg::from_bytes(b"DLX V1.0").unwrap_err();
        assert!(matches!(err, Error::InvalidSignature { .. }));
    }
}

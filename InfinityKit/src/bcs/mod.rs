//! BCS script support
//!
//! Compiled scripts (`.bcs`, also embedded in dialogs) are a token stream of
//! trigger and action records. This module reads and writes that stream,
//! renders it as source text using the IDS symbol tables, and compiles source
//! text back.
//!
//! ```no_run
//! use infinitykit::bcs::{decompile_bytes, compile_to_bytes};
//! use infinitykit::config::GameVariant;
//! use infinitykit::ids::IdsCache;
//!
//! let ids = IdsCache::global();
//! let data = std::fs::read("AR0602.BCS")?;
//! let text = decompile_bytes(&data, ids, GameVariant::Bg2, 1)?;
//! let again = compile_to_bytes(&text, ids, GameVariant::Bg2)?;
//! # Ok::<(), infinitykit::Error>(())
//! ```

mod binary;
pub mod builtin;
mod compiler;
mod decompiler;
mod overload;
mod signature;
pub mod strings;
mod types;

pub use binary::{read_script, write_script};
pub use compiler::Compiler;
pub use decompiler::Decompiler;
pub use overload::{Shape, select_overload};
pub use signature::{FunctionKind, Param, ParamType, Signature, SignatureRegistry, SignatureSet, Slot};
pub use types::{Action, ActionCall, Block, NO_REGION, Object, Response, Script, Trigger};

use crate::config::GameVariant;
use crate::error::Result;
use crate::ids::SymbolSource;

/// Decompile a compiled script to source text, scaling coordinates by `factor`
pub fn decompile_bytes(data: &[u8], ids: &dyn SymbolSource, variant: GameVariant, factor: u32) -> Result<String> {
    let script = read_script(data, variant)?;
    let registry = SignatureRegistry::global();
    let triggers = registry.triggers(ids);
    let actions = registry.actions(ids);
    Ok(Decompiler::new(&triggers, &actions, ids, variant)
        .with_factor(factor)
        .script(&script))
}

/// Compile source text to the binary script format
pub fn compile_to_bytes(text: &str, ids: &dyn SymbolSource, variant: GameVariant) -> Result<Vec<u8>> {
    let registry = SignatureRegistry::global();
    let triggers = registry.triggers(ids);
    let actions = registry.actions(ids);
    let script = Compiler::new(&triggers, &actions, ids, variant).compile(text)?;
    Ok(write_script(&script, variant))
}

/// Rescale the coordinates of a compiled script
///
/// Decompiles with scaling applied and compiles the result again, so the
/// same exemptions as the decompiler apply.
pub fn upscale_bytes(data: &[u8], ids: &dyn SymbolSource, variant: GameVariant, factor: u32) -> Result<Vec<u8>> {
    let text = decompile_bytes(data, ids, variant, factor)?;
    compile_to_bytes(&text, ids, variant)
}

/// Rescale a bare list of trigger calls, one per line on output
pub fn upscale_trigger_text(text: &str, ids: &dyn SymbolSource, variant: GameVariant, factor: u32) -> Result<String> {
    let registry = SignatureRegistry::global();
    let triggers = registry.triggers(ids);
    let actions = registry.actions(ids);
    let parsed = Compiler::new(&triggers, &actions, ids, variant).compile_triggers(text)?;
    Ok(Decompiler::new(&triggers, &actions, ids, variant)
        .with_factor(factor)
        .triggers(&parsed))
}

/// Rescale a bare list of action calls, one per line on output
pub fn upscale_action_text(text: &str, ids: &dyn SymbolSource, variant: GameVariant, factor: u32) -> Result<String> {
    let registry = SignatureRegistry::global();
    let triggers = registry.triggers(ids);
    let actions = registry.actions(ids);
    let parsed = Compiler::new(&triggers, &actions, ids, variant).compile_actions(text)?;
    Ok(Decompiler::new(&triggers, &actions, ids, variant)
        .with_factor(factor)
        .actions(&parsed))
}

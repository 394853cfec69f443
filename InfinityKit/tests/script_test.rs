//! Script compiler and decompiler against the built-in signature tables

use infinitykit::bcs::{read_script, upscale_action_text, upscale_trigger_text};
use infinitykit::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_minimal_script_round_trip() {
    let ids = IdsCache::new();
    let source = "IF\nTrue()\nTHEN\nRESPONSE #100\nCreateCreature(\"\",[0.0],0)\nEND";
    let compiled = compile_to_bytes(source, &ids, GameVariant::Bg2).unwrap();

    let script = read_script(&compiled, GameVariant::Bg2).unwrap();
    assert_eq!(script.blocks.len(), 1);
    assert_eq!(script.blocks[0].responses[0].weight, 100);

    let text = decompile_bytes(&compiled, &ids, GameVariant::Bg2, 1).unwrap();
    assert_eq!(
        text,
        "IF\n  True()\nTHEN\n  RESPONSE #100\n    CreateCreature(\"\",[0.0],0)\nEND\n\n"
    );
    assert_eq!(compile_to_bytes(&text, &ids, GameVariant::Bg2).unwrap(), compiled);
}

#[test]
fn test_every_variant_round_trips() {
    let ids = IdsCache::new();
    ids.initialize_with_ids_files([("EA.IDS", b"0 ANYONE\n255 ENEMY\n".as_slice())]);
    let source = "IF\n  See([ENEMY])\nTHEN\n  RESPONSE #50\n    MoveToPoint([300.400])\n  RESPONSE #50\n    NoAction()\nEND\n\n";
    for variant in [GameVariant::Bg1, GameVariant::Bg2, GameVariant::Iwd, GameVariant::Pst, GameVariant::Ee] {
        let compiled = compile_to_bytes(source, &ids, variant).unwrap();
        assert_eq!(decompile_bytes(&compiled, &ids, variant, 1).unwrap(), source, "{variant:?}");
    }
}

#[test]
fn test_dialog_fragments_scale() {
    let ids = IdsCache::new();
    let actions = upscale_action_text("CreateCreature(\"OGRE\",[10.20],0)", &ids, GameVariant::Bg2, 2).unwrap();
    assert_eq!(actions, "CreateCreature(\"OGRE\",[20.40],0)\n");

    let triggers = upscale_trigger_text("True()", &ids, GameVariant::Bg2, 2).unwrap();
    assert_eq!(triggers, "True()\n");
}

#[test]
fn test_unknown_function_is_an_error() {
    let ids = IdsCache::new();
    let source = "IF\n  True()\nTHEN\n  RESPONSE #100\n    NoSuchAction()\nEND\n";
    assert!(compile_to_bytes(source, &ids, GameVariant::Bg2).is_err());
}

#[test]
fn test_loaded_action_table_is_used_after_an_empty_one() {
    let empty = IdsCache::new();
    let plain = compile_to_bytes("IF\n  True()\nTHEN\n  RESPONSE #100\n    NoAction()\nEND\n", &empty, GameVariant::Bg2).unwrap();
    decompile_bytes(&plain, &empty, GameVariant::Bg2, 1).unwrap();

    let loaded = IdsCache::new();
    loaded.initialize_with_ids_files([("ACTION.IDS", b"500 Custom(I:Value*)\n".as_slice())]);
    let source = "IF\n  True()\nTHEN\n  RESPONSE #100\n    Custom(7)\nEND\n\n";
    let compiled = compile_to_bytes(source, &loaded, GameVariant::Bg2).unwrap();
    assert_eq!(decompile_bytes(&compiled, &loaded, GameVariant::Bg2, 1).unwrap(), source);
    assert!(compile_to_bytes(source, &empty, GameVariant::Bg2).is_err());
}

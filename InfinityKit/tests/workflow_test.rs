//! Extract / upscale / assemble round trips through the plugin manager

use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use infinitykit::formats::key::{pack_locator, type_for, unpack_locator};
use infinitykit::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

struct Workspace {
    _root: TempDir,
    config: Config,
    ids: IdsCache,
    namer: PageNamer,
}

impl Workspace {
    fn new(factor: u32) -> Self {
        let root = tempdir().unwrap();
        let config = Config {
            game_dir: root.path().join("game"),
            extract_dir: root.path().join("extracted"),
            upscaled_dir: root.path().join("upscaled"),
            assemble_dir: root.path().join("assembled"),
            upscale_factor: factor,
            ..Config::default()
        };
        std::fs::create_dir_all(&config.game_dir).unwrap();
        Self {
            _root: root,
            config,
            ids: IdsCache::new(),
            namer: PageNamer::new(1000),
        }
    }

    fn add_resource(&self, name: &str, data: &[u8]) {
        std::fs::write(self.config.game_dir.join(name), data).unwrap();
    }

    fn run(&self, operation: Operation, resource_type: ResourceType, resource: &str) -> BatchReport {
        let context = PluginContext::new(&self.config)
            .with_ids(&self.ids)
            .with_namer(&self.namer);
        PluginManager::new().run(&context, operation, resource_type, &[resource.to_string()])
    }

    fn extracted(&self, resource: &str) -> std::path::PathBuf {
        self.config.extract_path(resource)
    }
}

/// BAM V1 with a single 2x2 frame stored as one sentinel run
fn transparent_bam() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"BAM V1  ");
    out.write_u16::<LittleEndian>(1).unwrap(); // frames
    out.write_u8(1).unwrap(); // cycles
    out.write_u8(0).unwrap(); // sentinel
    out.write_u32::<LittleEndian>(24).unwrap(); // frame entries
    out.write_u32::<LittleEndian>(40).unwrap(); // palette
    out.write_u32::<LittleEndian>(1064).unwrap(); // FLT
    // frame: 2x2, centre 0,0, RLE data after the FLT
    out.write_u16::<LittleEndian>(2).unwrap();
    out.write_u16::<LittleEndian>(2).unwrap();
    out.write_i16::<LittleEndian>(0).unwrap();
    out.write_i16::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(1066).unwrap();
    // cycle: one frame from FLT index 0
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.extend_from_slice(&[0u8; 1024]);
    out.write_u16::<LittleEndian>(0).unwrap();
    out.extend_from_slice(&[0, 3]);
    out
}

fn load_rgba(path: &Path) -> image::RgbaImage {
    image::open(path).unwrap().to_rgba8()
}

#[test]
fn test_bam_all_sentinel_frame_extracts_transparent() {
    let ws = Workspace::new(2);
    ws.add_resource("TEST.BAM", &transparent_bam());

    assert!(ws.run(Operation::Extract, ResourceType::Bam, "test").all_succeeded());
    let frame = load_rgba(&ws.extracted("TEST.BAM").join("frame_000.png"));
    assert_eq!(frame.dimensions(), (2, 2));
    assert!(frame.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_bam_upscale_and_assemble() {
    let ws = Workspace::new(2);
    ws.add_resource("TEST.BAM", &transparent_bam());

    assert!(ws.run(Operation::Extract, ResourceType::Bam, "TEST").all_succeeded());
    assert!(ws.run(Operation::Upscale, ResourceType::Bam, "TEST").all_succeeded());
    let frame = load_rgba(&ws.config.upscaled_path("TEST.BAM").join("frame_000.png"));
    assert_eq!(frame.dimensions(), (4, 4));

    assert!(ws.run(Operation::Assemble, ResourceType::Bam, "TEST").all_succeeded());
    let data = std::fs::read(ws.config.assemble_dir.join("TEST.BAM")).unwrap();
    let Bam::V1(bam) = Bam::from_bytes(&data).unwrap() else {
        panic!("expected a V1 BAM");
    };
    assert_eq!(bam.frames.len(), 1);
    assert_eq!((bam.frames[0].geometry.width, bam.frames[0].geometry.height), (4, 4));
    assert!(bam.frame_pixels(0).unwrap().iter().all(|&p| p == 0));
    assert_eq!(bam.cycle_frames(), vec![vec![0]]);
}

#[test]
fn test_bcs_plugin_scales_points() {
    let ws = Workspace::new(2);
    let text = "IF\n  True()\nTHEN\n  RESPONSE #100\n    MoveToPoint([10.20])\n    ScreenShake([10.20],5)\nEND\n\n";
    let compiled = compile_to_bytes(text, &ws.ids, GameVariant::Bg2).unwrap();
    ws.add_resource("AR0100.BCS", &compiled);

    assert!(ws.run(Operation::Extract, ResourceType::Bcs, "AR0100").all_succeeded());
    let extracted = std::fs::read_to_string(ws.extracted("AR0100.BCS").join("AR0100.baf")).unwrap();
    assert_eq!(extracted, text);

    assert!(ws.run(Operation::Upscale, ResourceType::Bcs, "AR0100").all_succeeded());
    let upscaled = std::fs::read_to_string(ws.config.upscaled_path("AR0100.BCS").join("AR0100.baf")).unwrap();
    assert!(upscaled.contains("MoveToPoint([20.40])"));
    assert!(upscaled.contains("ScreenShake([10.20],5)"));

    assert!(ws.run(Operation::Assemble, ResourceType::Bcs, "AR0100").all_succeeded());
    let assembled = std::fs::read(ws.config.assemble_dir.join("AR0100.BCS")).unwrap();
    let round = decompile_bytes(&assembled, &ws.ids, GameVariant::Bg2, 1).unwrap();
    assert_eq!(round, upscaled);
}

#[test]
fn test_two_da_coordinates_scale() {
    let ws = Workspace::new(3);
    ws.add_resource("POINTS.2DA", b"2DA V1.0\n0\n   X   Y   NAME\nA  10  20  10\n");

    assert!(ws.run(Operation::Upscale, ResourceType::TwoDa, "POINTS").all_succeeded());
    assert!(ws.run(Operation::Assemble, ResourceType::TwoDa, "POINTS").all_succeeded());
    let table = TwoDa::from_bytes(&std::fs::read(ws.config.assemble_dir.join("POINTS.2DA")).unwrap()).unwrap();
    assert_eq!(table.cell("A", "X"), Some("30"));
    assert_eq!(table.cell("A", "Y"), Some("60"));
    assert_eq!(table.cell("A", "NAME"), Some("10"));
}

#[test]
fn test_key_json_round_trip() {
    let ws = Workspace::new(1);
    let mut key = Key::default();
    let bif = key.add_bif("data\\AREA.BIF", 4096, 1);
    key.add_resource("ar0100", type_for("wed").unwrap(), bif, 12);
    ws.add_resource("CHITIN.KEY", &key.to_bytes().unwrap());

    assert!(ws.run(Operation::Extract, ResourceType::Key, "CHITIN").all_succeeded());
    assert!(!ws.run(Operation::Upscale, ResourceType::Key, "CHITIN").all_succeeded());
    assert!(ws.run(Operation::Assemble, ResourceType::Key, "CHITIN").all_succeeded());

    let assembled = Key::from_bytes(&std::fs::read(ws.config.assemble_dir.join("CHITIN.KEY")).unwrap()).unwrap();
    assert_eq!(assembled, key);
    let entry = assembled.find("AR0100", type_for("WED").unwrap()).unwrap();
    assert_eq!(entry.locator, pack_locator(0, 0, 12));
}

#[test]
fn test_locator_packing() {
    let locator = pack_locator(5, 3, 17);
    assert_eq!(locator, (5 << 20) | (3 << 14) | 17);
    assert_eq!(unpack_locator(locator), (5, 3, 17));
}

#[test]
fn test_batch_continues_after_failure() {
    let ws = Workspace::new(1);
    ws.add_resource("GOOD.BAM", &transparent_bam());
    ws.add_resource("BAD.BAM", b"not a bam");

    let context = PluginContext::new(&ws.config).with_ids(&ws.ids).with_namer(&ws.namer);
    let resources = ["BAD".to_string(), "GOOD".to_string()];
    let report = PluginManager::new().run(&context, Operation::Extract, ResourceType::Bam, &resources);
    assert_eq!((report.success_count, report.fail_count), (1, 1));
    assert!(!ws.extracted("BAD.BAM").join("meta.json").exists());
    assert!(ws.extracted("GOOD.BAM").join("meta.json").exists());
}

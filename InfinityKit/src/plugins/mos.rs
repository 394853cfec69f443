//! MOS plugin: `mos.png` plus `meta.json`

use serde::{Deserialize, Serialize};

use super::io::{
    assemble_path, assemble_source, load_png, page_taken, read_json, read_resource, save_png, scale_image,
    write_json, write_output, write_with_pages,
};
use super::{FormatPlugin, META_FILE, PluginContext, ResourceType};
use crate::error::{Error, Result};
use crate::formats::{Mos, MosV1, MosV2};
use crate::pvrz::{PageSpace, PageStore, build_atlas};

pub(crate) const MOS_IMAGE: &str = "mos.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MosMeta {
    pub version: u8,
    #[serde(default)]
    pub compressed: bool,
    pub width: u32,
    pub height: u32,
}

pub(crate) struct MosPlugin;

impl FormatPlugin for MosPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Mos
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let mos = Mos::from_bytes(&read_resource(context, resource)?)?;
        let (image, compressed) = match &mos {
            Mos::V1(v1) => (v1.to_image()?, v1.compressed),
            Mos::V2(v2) => {
                let mut store = PageStore::new(&context.config.game_dir, PageSpace::Mos);
                let image = v2.to_image(&mut store)?;
                store.release();
                (image, false)
            }
        };
        let meta = MosMeta {
            version: mos.version(),
            compressed,
            width: image.width(),
            height: image.height(),
        };
        let dir = context.config.extract_path(resource);
        save_png(&dir.join(MOS_IMAGE), &image)?;
        write_json(&dir.join(META_FILE), &meta)
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let source = context.config.extract_path(resource);
        let mut meta: MosMeta = read_json(&source.join(META_FILE))?;
        let scaled = scale_image(&load_png(&source.join(MOS_IMAGE))?, context.factor());
        meta.width = scaled.width();
        meta.height = scaled.height();

        let target = context.config.upscaled_path(resource);
        save_png(&target.join(MOS_IMAGE), &scaled)?;
        write_json(&target.join(META_FILE), &meta)
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let source = assemble_source(context, resource);
        let meta: MosMeta = read_json(&source.join(META_FILE))?;
        let image = load_png(&source.join(MOS_IMAGE))?;

        if meta.version != 2 {
            let data = Mos::V1(MosV1::from_image(&image, meta.compressed)?).to_bytes()?;
            return write_output(&assemble_path(context, resource), &data);
        }

        let space = PageSpace::Mos;
        let atlas = build_atlas(std::slice::from_ref(&image), &space, context.namer, page_taken(context, &space))?;
        let blocks = atlas
            .frame_blocks
            .first()
            .cloned()
            .ok_or_else(|| Error::invalid("MOS", "atlas produced no blocks"))?;
        let mos = MosV2 {
            width: image.width(),
            height: image.height(),
            blocks,
        };
        write_with_pages(context, &space, &atlas, resource, &mos.to_bytes()?)
    }
}

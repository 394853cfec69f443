//! TIS plugin: the whole tileset as one `tiles.png` grid
//!
//! The grid is as wide as the area's primary overlay when `<STEM>.WED` sits
//! next to the tileset, so the image shows the area as it appears in game.
//! Upscaling turns every tile into a `factor x factor` block, the layout the
//! upscaled WED expects.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::io::{
    assemble_path, assemble_source, load_png, page_taken, read_json, read_resource, read_sibling, save_png, scale_image,
    stem, write_json, write_output, write_with_pages,
};
use super::{FormatPlugin, META_FILE, PluginContext, ResourceType};
use crate::error::{Error, Result};
use crate::formats::Wed;
use crate::formats::tis::{SOLID_BLACK_PAGE, TILE_DIMENSION, Tis, TileV2, split_tiles, tile_grid, tiles_v1};
use crate::pvrz::{PageSpace, PageStore, build_atlas};

pub(crate) const TILES_FILE: &str = "tiles.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TisMeta {
    pub version: u8,
    pub tile_count: usize,
    pub columns: u32,
}

pub(crate) struct TisPlugin;

fn is_solid_black(tile: &RgbaImage) -> bool {
    tile.pixels().all(|p| *p == Rgba([0, 0, 0, 255]))
}

impl FormatPlugin for TisPlugin {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Tis
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let tis = Tis::from_bytes(&read_resource(context, resource)?)?;
        let name = stem(resource);
        let primary = match read_sibling(context, &format!("{name}.WED"))? {
            Some(bytes) => Wed::from_bytes(&bytes)?.primary_grid(),
            None => None,
        };
        let (columns, rows) = tile_grid(tis.len(), primary);
        tracing::debug!("{resource}: {} tiles on a {columns}x{rows} grid", tis.len());

        let mut store = PageStore::new(&context.config.game_dir, PageSpace::Tileset(name));
        let image = tis.to_image(columns, &mut store)?;
        store.release();

        let dir = context.config.extract_path(resource);
        save_png(&dir.join(TILES_FILE), &image)?;
        write_json(
            &dir.join(META_FILE),
            &TisMeta {
                version: tis.version(),
                tile_count: tis.len(),
                columns,
            },
        )
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let factor = context.factor();
        let source = context.config.extract_path(resource);
        let mut meta: TisMeta = read_json(&source.join(META_FILE))?;
        let image = load_png(&source.join(TILES_FILE))?;
        if image.width() % TILE_DIMENSION != 0 || image.height() % TILE_DIMENSION != 0 {
            return Err(Error::invalid(
                "TIS",
                format!("{TILES_FILE} is {}x{}, not a multiple of 64", image.width(), image.height()),
            ));
        }
        let scaled = scale_image(&image, factor);
        meta.columns = scaled.width() / TILE_DIMENSION;
        meta.tile_count = (meta.columns * (scaled.height() / TILE_DIMENSION)) as usize;

        let target = context.config.upscaled_path(resource);
        save_png(&target.join(TILES_FILE), &scaled)?;
        write_json(&target.join(META_FILE), &meta)
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let source = assemble_source(context, resource);
        let meta: TisMeta = read_json(&source.join(META_FILE))?;
        let image = load_png(&source.join(TILES_FILE))?;
        let tiles = split_tiles(&image, meta.tile_count)?;

        if meta.version != 2 {
            let data = Tis::V1(tiles_v1(&tiles)).to_bytes()?;
            return write_output(&assemble_path(context, resource), &data);
        }

        // Solid black tiles reference the engine's built-in black page
        let packed: Vec<usize> = (0..tiles.len()).filter(|&i| !is_solid_black(&tiles[i])).collect();
        let images: Vec<RgbaImage> = packed.iter().map(|&i| tiles[i].clone()).collect();
        let space = PageSpace::Tileset(stem(resource));
        let atlas = build_atlas(&images, &space, context.namer, page_taken(context, &space))?;

        let mut entries = vec![
            TileV2 {
                page: SOLID_BLACK_PAGE,
                x: 0,
                y: 0,
            };
            tiles.len()
        ];
        for (&tile, blocks) in packed.iter().zip(&atlas.frame_blocks) {
            let block = blocks
                .first()
                .ok_or_else(|| Error::invalid("TIS", format!("tile {tile} was not placed on a page")))?;
            entries[tile] = TileV2 {
                page: block.page,
                x: block.source_x,
                y: block.source_y,
            };
        }
        let data = Tis::V2(entries).to_bytes()?;
        write_with_pages(context, &space, &atlas, resource, &data)?;
        tracing::info!("Assembled {resource}: {} tiles, {} pages", tiles.len(), atlas.pages.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_black_detection() {
        let black = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
        assert!(is_solid_black(&black));
        let mut dotted = black.clone();
        dotted.put_pixel(3, 3, Rgba([1, 0, 0, 255]));
        assert!(!is_solid_black(&dotted));
    }
}

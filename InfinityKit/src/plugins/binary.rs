//! Plugins for binary containers that are upscaled in place
//!
//! WED, PRO, WMP, CHU, 2DA and BMP hold coordinates rather than pixels
//! worth editing. Extraction copies the resource and writes a readable
//! `summary.json`; upscaling rescales the original resource; assembling
//! re-serializes whatever sits in the upscaled (or extracted) directory.

use std::marker::PhantomData;

use image::RgbaImage;
use serde_json::{Value, json};

use super::io::{
    assemble_path, assemble_source, read_file, read_resource, save_png, upscaled_file, write_json, write_output,
};
use super::{FormatPlugin, PluginContext, ResourceType};
use crate::error::Result;
use crate::formats::{Bmp, Chu, Pro, TwoDa, Wed, Wmp};

pub(crate) const SUMMARY_FILE: &str = "summary.json";
pub(crate) const PREVIEW_FILE: &str = "preview.png";

/// A container the binary plugin can drive
pub(crate) trait BinaryResource: Sized {
    const TYPE: ResourceType;

    fn parse(data: &[u8]) -> Result<Self>;

    fn encode(&self) -> Result<Vec<u8>>;

    fn scale(&mut self, factor: u32) -> Result<()>;

    fn summary(&self) -> Result<Value>;

    fn preview(&self) -> Option<RgbaImage> {
        None
    }
}

impl BinaryResource for Wed {
    const TYPE: ResourceType = ResourceType::Wed;

    fn parse(data: &[u8]) -> Result<Self> {
        Wed::from_bytes(data)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        self.to_bytes()
    }

    fn scale(&mut self, factor: u32) -> Result<()> {
        self.upscale(factor)
    }

    fn summary(&self) -> Result<Value> {
        let overlays: Vec<Value> = self
            .overlays
            .iter()
            .map(|o| json!({ "width": o.width, "height": o.height, "tileset": o.tileset }))
            .collect();
        let doors: Vec<&str> = self.doors.iter().map(|d| d.name.as_str()).collect();
        Ok(json!({
            "version": String::from_utf8_lossy(&self.version),
            "overlays": overlays,
            "doors": doors,
            "door_cells": self.door_cells.len(),
            "wall_polygons": self.polygons.len(),
            "vertices": self.vertices.len(),
            "wall_groups": self.wall_groups.len(),
        }))
    }
}

impl BinaryResource for Pro {
    const TYPE: ResourceType = ResourceType::Pro;

    fn parse(data: &[u8]) -> Result<Self> {
        Pro::from_bytes(data)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_bytes())
    }

    fn scale(&mut self, factor: u32) -> Result<()> {
        self.upscale(factor)
    }

    fn summary(&self) -> Result<Value> {
        Ok(serde_json::to_value(Pro::summary(self)?)?)
    }
}

impl BinaryResource for Wmp {
    const TYPE: ResourceType = ResourceType::Wmp;

    fn parse(data: &[u8]) -> Result<Self> {
        Wmp::from_bytes(data)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        self.to_bytes()
    }

    fn scale(&mut self, factor: u32) -> Result<()> {
        self.upscale(factor)
    }

    fn summary(&self) -> Result<Value> {
        let maps = self
            .worldmaps
            .iter()
            .map(|map| {
                let (width, height) = map.size()?;
                let areas = map.areas.iter().map(|a| a.summary()).collect::<Result<Vec<_>>>()?;
                Ok(json!({
                    "background": map.background(),
                    "width": width,
                    "height": height,
                    "areas": areas,
                    "links": map.links.len(),
                }))
            })
            .collect::<Result<Vec<Value>>>()?;
        Ok(json!({ "worldmaps": maps }))
    }
}

impl BinaryResource for Chu {
    const TYPE: ResourceType = ResourceType::Chu;

    fn parse(data: &[u8]) -> Result<Self> {
        Chu::from_bytes(data)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        self.to_bytes()
    }

    fn scale(&mut self, factor: u32) -> Result<()> {
        self.upscale(factor);
        Ok(())
    }

    fn summary(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl BinaryResource for TwoDa {
    const TYPE: ResourceType = ResourceType::TwoDa;

    fn parse(data: &[u8]) -> Result<Self> {
        TwoDa::from_bytes(data)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_bytes())
    }

    fn scale(&mut self, factor: u32) -> Result<()> {
        let changed = self.upscale(factor);
        tracing::debug!("Scaled {changed} coordinate cells");
        Ok(())
    }

    fn summary(&self) -> Result<Value> {
        Ok(json!({
            "version": self.version,
            "default": self.default_value,
            "columns": self.columns,
            "rows": self.rows.len(),
            "encrypted": self.encrypted,
        }))
    }
}

impl BinaryResource for Bmp {
    const TYPE: ResourceType = ResourceType::Bmp;

    fn parse(data: &[u8]) -> Result<Self> {
        Bmp::from_bytes(data)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        self.to_bytes()
    }

    fn scale(&mut self, factor: u32) -> Result<()> {
        *self = self.upscale(factor);
        Ok(())
    }

    fn summary(&self) -> Result<Value> {
        Ok(json!({
            "width": self.width,
            "height": self.height,
            "bits_per_pixel": self.bits_per_pixel,
            "palette_size": self.palette.len(),
        }))
    }

    fn preview(&self) -> Option<RgbaImage> {
        Some(self.to_image())
    }
}

pub(crate) struct BinaryPlugin<T>(PhantomData<fn() -> T>);

impl<T> BinaryPlugin<T> {
    fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: BinaryResource> FormatPlugin for BinaryPlugin<T> {
    fn resource_type(&self) -> ResourceType {
        T::TYPE
    }

    fn extract(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let data = read_resource(context, resource)?;
        let parsed = T::parse(&data)?;
        let summary = parsed.summary()?;
        let dir = context.config.extract_path(resource);
        write_output(&dir.join(resource.to_uppercase()), &data)?;
        write_json(&dir.join(SUMMARY_FILE), &summary)?;
        if let Some(image) = parsed.preview() {
            save_png(&dir.join(PREVIEW_FILE), &image)?;
        }
        Ok(())
    }

    fn upscale(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let mut parsed = T::parse(&read_resource(context, resource)?)?;
        parsed.scale(context.factor())?;
        let data = parsed.encode()?;
        write_output(&upscaled_file(context, resource), &data)
    }

    fn assemble(&self, context: &PluginContext<'_>, resource: &str) -> Result<()> {
        let path = assemble_source(context, resource).join(resource.to_uppercase());
        let data = read_file(&path)?;
        // Round trip through the codec so every offset is recomputed
        let encoded = T::parse(&data)?.encode()?;
        write_output(&assemble_path(context, resource), &encoded)
    }
}

pub(crate) fn plugins() -> Vec<Box<dyn FormatPlugin>> {
    vec![
        Box::new(BinaryPlugin::<Bmp>::new()),
        Box::new(BinaryPlugin::<Chu>::new()),
        Box::new(BinaryPlugin::<Pro>::new()),
        Box::new(BinaryPlugin::<TwoDa>::new()),
        Box::new(BinaryPlugin::<Wed>::new()),
        Box::new(BinaryPlugin::<Wmp>::new()),
    ]
}

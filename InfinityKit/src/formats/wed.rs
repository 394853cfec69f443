//! WED area layout container
//!
//! Overlays map grid cells to TIS tiles, doors list the cells and polygons
//! they toggle, and wall polygons (grouped per 640x480 screen region) decide
//! which sprites are drawn behind walls.

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{ByteSpan, read_resref, resref_bytes};

pub const WED_SIGNATURE: &[u8; 4] = b"WED ";
const VERSIONS: [&[u8; 4]; 2] = [b"V1.3", b"V1.4"];

const HEADER_SIZE: usize = 0x20;
const OVERLAY_SIZE: usize = 0x18;
const SECONDARY_HEADER_SIZE: usize = 0x14;
const DOOR_SIZE: usize = 0x1A;
const TILEMAP_SIZE: usize = 0x0A;
const POLYGON_SIZE: usize = 0x12;
const VERTEX_SIZE: usize = 4;
const WALL_GROUP_SIZE: usize = 4;

/// Tilemap value meaning "no alternate tile"
pub const NO_SECONDARY_TILE: u16 = 0xFFFF;

/// Screen region covered by one wall group
const GROUP_WIDTH: i32 = 640;
const GROUP_HEIGHT: i32 = 480;

/// Number of wall groups for an overlay of `width` x `height` tiles
///
/// A group covers 10 x 7.5 tiles.
#[must_use]
pub fn wall_group_count(width: u16, height: u16) -> usize {
    let columns = (usize::from(width) + 9) / 10;
    let rows = (usize::from(height) * 2 + 14) / 15;
    columns * rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tilemap {
    /// First entry in the overlay's tile index lookup
    pub start: u16,
    /// Number of lookup entries (more than one for animated tiles)
    pub count: u16,
    /// Alternate tile (closed door state), a TIS index
    pub secondary: u16,
    pub overlay_flags: u8,
    pub unknown: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Overlay {
    pub width: u16,
    pub height: u16,
    pub tileset: String,
    pub unique_tile_count: u16,
    pub movement_type: u16,
    pub tilemap: Vec<Tilemap>,
    pub tile_indices: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub vertex_start: u32,
    pub vertex_count: u32,
    pub flags: u8,
    pub height: u8,
    pub min_x: i16,
    pub max_x: i16,
    pub min_y: i16,
    pub max_y: i16,
}

impl Polygon {
    fn read(span: &ByteSpan<'_>) -> Result<Self> {
        Ok(Self {
            vertex_start: span.u32_at(0)?,
            vertex_count: span.u32_at(4)?,
            flags: span.u8_at(8)?,
            height: span.u8_at(9)?,
            min_x: span.i16_at(10)?,
            max_x: span.i16_at(12)?,
            min_y: span.i16_at(14)?,
            max_y: span.i16_at(16)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u32::<LittleEndian>(self.vertex_start)?;
        out.write_u32::<LittleEndian>(self.vertex_count)?;
        out.write_u8(self.flags)?;
        out.write_u8(self.height)?;
        for v in [self.min_x, self.max_x, self.min_y, self.max_y] {
            out.write_i16::<LittleEndian>(v)?;
        }
        Ok(())
    }

    fn vertex_end(&self) -> usize {
        self.vertex_start as usize + self.vertex_count as usize
    }

    fn scale(&mut self, factor: i16) {
        self.min_x = self.min_x.saturating_mul(factor);
        self.max_x = self.max_x.saturating_mul(factor);
        self.min_y = self.min_y.saturating_mul(factor);
        self.max_y = self.max_y.saturating_mul(factor);
    }

    fn intersects(&self, x: i32, y: i32, width: i32, height: i32) -> bool {
        i32::from(self.min_x) < x + width
            && i32::from(self.max_x) >= x
            && i32::from(self.min_y) < y + height
            && i32::from(self.max_y) >= y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WallGroup {
    pub start: u16,
    pub count: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Door {
    pub name: String,
    /// 0 = open, 1 = closed
    pub state: u16,
    /// First entry in the door tile cell list
    pub first_cell: u16,
    pub cell_count: u16,
    pub open_polygons: Vec<Polygon>,
    pub closed_polygons: Vec<Polygon>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wed {
    pub version: [u8; 4],
    pub overlays: Vec<Overlay>,
    pub doors: Vec<Door>,
    /// Overlay 0 cells covered by doors
    pub door_cells: Vec<u16>,
    pub polygons: Vec<Polygon>,
    pub vertices: Vec<Vertex>,
    pub wall_groups: Vec<WallGroup>,
    pub polygon_indices: Vec<u16>,
}

impl Default for Wed {
    fn default() -> Self {
        Self {
            version: *VERSIONS[0],
            overlays: Vec::new(),
            doors: Vec::new(),
            door_cells: Vec::new(),
            polygons: Vec::new(),
            vertices: Vec::new(),
            wall_groups: Vec::new(),
            polygon_indices: Vec::new(),
        }
    }
}

fn u16_table(span: &ByteSpan<'_>, offset: usize, count: usize) -> Result<Vec<u16>> {
    span.records(offset, count, 2)?.iter().map(|r| r.u16_at(0)).collect()
}

fn polygons(span: &ByteSpan<'_>, offset: usize, count: usize) -> Result<Vec<Polygon>> {
    span.records(offset, count, POLYGON_SIZE)?.iter().map(Polygon::read).collect()
}

impl Wed {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("WED", WED_SIGNATURE)?;
        if !VERSIONS.iter().any(|v| **v == version) {
            return Err(Error::UnsupportedVersion {
                format: "WED",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let overlay_count = span.u32_at(0x08)? as usize;
        let door_count = span.u32_at(0x0C)? as usize;
        let overlays_offset = span.u32_at(0x10)? as usize;
        let secondary_offset = span.u32_at(0x14)? as usize;
        let doors_offset = span.u32_at(0x18)? as usize;
        let door_cells_offset = span.u32_at(0x1C)? as usize;
        tracing::debug!("WED: {overlay_count} overlays, {door_count} doors");

        let mut overlays = Vec::with_capacity(overlay_count);
        for record in span.records(overlays_offset, overlay_count, OVERLAY_SIZE)? {
            let width = record.u16_at(0)?;
            let height = record.u16_at(2)?;
            let tilemap_offset = record.u32_at(0x10)? as usize;
            let lookup_offset = record.u32_at(0x14)? as usize;
            let cells = usize::from(width) * usize::from(height);
            let tilemap = span
                .records(tilemap_offset, cells, TILEMAP_SIZE)?
                .iter()
                .map(|r| {
                    Ok(Tilemap {
                        start: r.u16_at(0)?,
                        count: r.u16_at(2)?,
                        secondary: r.u16_at(4)?,
                        overlay_flags: r.u8_at(6)?,
                        unknown: r.array_at(7)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let lookup_len = tilemap
                .iter()
                .map(|t| usize::from(t.start) + usize::from(t.count))
                .max()
                .unwrap_or(0);
            overlays.push(Overlay {
                width,
                height,
                tileset: read_resref(record.slice(4, 8)?),
                unique_tile_count: record.u16_at(0x0C)?,
                movement_type: record.u16_at(0x0E)?,
                tilemap,
                tile_indices: u16_table(&span, lookup_offset, lookup_len)?,
            });
        }

        let polygon_count = span.u32_at(secondary_offset)? as usize;
        let polygons_offset = span.u32_at(secondary_offset + 4)? as usize;
        let vertices_offset = span.u32_at(secondary_offset + 8)? as usize;
        let groups_offset = span.u32_at(secondary_offset + 12)? as usize;
        let polygon_indices_offset = span.u32_at(secondary_offset + 16)? as usize;

        let mut doors = Vec::with_capacity(door_count);
        for record in span.records(doors_offset, door_count, DOOR_SIZE)? {
            let open_count = usize::from(record.u16_at(0x0E)?);
            let closed_count = usize::from(record.u16_at(0x10)?);
            doors.push(Door {
                name: read_resref(record.slice(0, 8)?),
                state: record.u16_at(0x08)?,
                first_cell: record.u16_at(0x0A)?,
                cell_count: record.u16_at(0x0C)?,
                open_polygons: polygons(&span, record.u32_at(0x12)? as usize, open_count)?,
                closed_polygons: polygons(&span, record.u32_at(0x16)? as usize, closed_count)?,
            });
        }
        let door_cell_len = doors
            .iter()
            .map(|d| usize::from(d.first_cell) + usize::from(d.cell_count))
            .max()
            .unwrap_or(0);
        let door_cells = u16_table(&span, door_cells_offset, door_cell_len)?;

        let wall_polygons = polygons(&span, polygons_offset, polygon_count)?;
        let vertex_count = wall_polygons
            .iter()
            .chain(doors.iter().flat_map(|d| d.open_polygons.iter().chain(&d.closed_polygons)))
            .map(Polygon::vertex_end)
            .max()
            .unwrap_or(0);
        let vertices = span
            .records(vertices_offset, vertex_count, VERTEX_SIZE)?
            .iter()
            .map(|r| Ok(Vertex { x: r.i16_at(0)?, y: r.i16_at(2)? }))
            .collect::<Result<Vec<_>>>()?;

        let group_count = overlays.first().map_or(0, |o| wall_group_count(o.width, o.height));
        let wall_groups = span
            .records(groups_offset, group_count, WALL_GROUP_SIZE)?
            .iter()
            .map(|r| Ok(WallGroup { start: r.u16_at(0)?, count: r.u16_at(2)? }))
            .collect::<Result<Vec<_>>>()?;
        let index_len = wall_groups
            .iter()
            .map(|g| usize::from(g.start) + usize::from(g.count))
            .max()
            .unwrap_or(0);
        let polygon_indices = u16_table(&span, polygon_indices_offset, index_len)?;

        Ok(Self {
            version,
            overlays,
            doors,
            door_cells,
            polygons: wall_polygons,
            vertices,
            wall_groups,
            polygon_indices,
        })
    }

    /// Serialize with every section offset recomputed
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let overlays_offset = HEADER_SIZE;
        let secondary_offset = overlays_offset + self.overlays.len() * OVERLAY_SIZE;
        let doors_offset = secondary_offset + SECONDARY_HEADER_SIZE;

        let mut cursor = doors_offset + self.doors.len() * DOOR_SIZE;
        let mut tilemap_offsets = Vec::with_capacity(self.overlays.len());
        for overlay in &self.overlays {
            tilemap_offsets.push(cursor);
            cursor += overlay.tilemap.len() * TILEMAP_SIZE;
        }
        let mut lookup_offsets = Vec::with_capacity(self.overlays.len());
        for overlay in &self.overlays {
            lookup_offsets.push(cursor);
            cursor += overlay.tile_indices.len() * 2;
        }
        let door_cells_offset = cursor;
        cursor += self.door_cells.len() * 2;
        let polygons_offset = cursor;
        cursor += self.polygons.len() * POLYGON_SIZE;
        let mut door_polygon_offsets = Vec::with_capacity(self.doors.len());
        for door in &self.doors {
            let open = cursor;
            cursor += door.open_polygons.len() * POLYGON_SIZE;
            door_polygon_offsets.push((open, cursor));
            cursor += door.closed_polygons.len() * POLYGON_SIZE;
        }
        let vertices_offset = cursor;
        cursor += self.vertices.len() * VERTEX_SIZE;
        let groups_offset = cursor;
        cursor += self.wall_groups.len() * WALL_GROUP_SIZE;
        let polygon_indices_offset = cursor;
        cursor += self.polygon_indices.len() * 2;

        let mut out = Vec::with_capacity(cursor);
        out.extend_from_slice(WED_SIGNATURE);
        out.extend_from_slice(&self.version);
        for v in [
            self.overlays.len(),
            self.doors.len(),
            overlays_offset,
            secondary_offset,
            doors_offset,
            door_cells_offset,
        ] {
            out.write_u32::<LittleEndian>(v as u32)?;
        }

        for ((overlay, tilemap), lookup) in self.overlays.iter().zip(&tilemap_offsets).zip(&lookup_offsets) {
            out.write_u16::<LittleEndian>(overlay.width)?;
            out.write_u16::<LittleEndian>(overlay.height)?;
            out.extend_from_slice(&resref_bytes(&overlay.tileset));
            out.write_u16::<LittleEndian>(overlay.unique_tile_count)?;
            out.write_u16::<LittleEndian>(overlay.movement_type)?;
            out.write_u32::<LittleEndian>(*tilemap as u32)?;
            out.write_u32::<LittleEndian>(*lookup as u32)?;
        }

        for v in [
            self.polygons.len(),
            polygons_offset,
            vertices_offset,
            groups_offset,
            polygon_indices_offset,
        ] {
            out.write_u32::<LittleEndian>(v as u32)?;
        }

        for (door, (open, closed)) in self.doors.iter().zip(&door_polygon_offsets) {
            out.extend_from_slice(&resref_bytes(&door.name));
            out.write_u16::<LittleEndian>(door.state)?;
            out.write_u16::<LittleEndian>(door.first_cell)?;
            out.write_u16::<LittleEndian>(door.cell_count)?;
            out.write_u16::<LittleEndian>(door.open_polygons.len() as u16)?;
            out.write_u16::<LittleEndian>(door.closed_polygons.len() as u16)?;
            out.write_u32::<LittleEndian>(*open as u32)?;
            out.write_u32::<LittleEndian>(*closed as u32)?;
        }

        for overlay in &self.overlays {
            for t in &overlay.tilemap {
                out.write_u16::<LittleEndian>(t.start)?;
                out.write_u16::<LittleEndian>(t.count)?;
                out.write_u16::<LittleEndian>(t.secondary)?;
                out.write_u8(t.overlay_flags)?;
                out.extend_from_slice(&t.unknown);
            }
        }
        for overlay in &self.overlays {
            for &index in &overlay.tile_indices {
                out.write_u16::<LittleEndian>(index)?;
            }
        }
        for &cell in &self.door_cells {
            out.write_u16::<LittleEndian>(cell)?;
        }
        for polygon in &self.polygons {
            polygon.write(&mut out)?;
        }
        for door in &self.doors {
            for polygon in door.open_polygons.iter().chain(&door.closed_polygons) {
                polygon.write(&mut out)?;
            }
        }
        for vertex in &self.vertices {
            out.write_i16::<LittleEndian>(vertex.x)?;
            out.write_i16::<LittleEndian>(vertex.y)?;
        }
        for group in &self.wall_groups {
            out.write_u16::<LittleEndian>(group.start)?;
            out.write_u16::<LittleEndian>(group.count)?;
        }
        for &index in &self.polygon_indices {
            out.write_u16::<LittleEndian>(index)?;
        }
        debug_assert_eq!(out.len(), cursor);
        Ok(out)
    }

    /// Primary grid of overlay 0 in tiles
    #[must_use]
    pub fn primary_grid(&self) -> Option<(u32, u32)> {
        self.overlays
            .first()
            .map(|o| (u32::from(o.width), u32::from(o.height)))
    }

    /// Rescale the layout for a tileset upscaled by `factor`
    ///
    /// Every tile becomes a `factor x factor` block of tiles in the upscaled
    /// TIS, which keeps the extracted tile grid (same column count, scaled).
    pub fn upscale(&mut self, factor: u32) -> Result<()> {
        if factor <= 1 {
            return Ok(());
        }
        let scale = i16::try_from(factor).map_err(|_| Error::invalid("WED", format!("factor {factor} too large")))?;
        let primary_width = self.overlays.first().map_or(0, |o| u32::from(o.width));

        for overlay in &mut self.overlays {
            upscale_overlay(overlay, factor)?;
        }

        let mut door_cells = Vec::with_capacity(self.door_cells.len() * (factor * factor) as usize);
        for door in &mut self.doors {
            let start = usize::from(door.first_cell).min(self.door_cells.len());
            let end = (start + usize::from(door.cell_count)).min(self.door_cells.len());
            let first = door_cells.len();
            for &cell in &self.door_cells[start..end] {
                let cx = u32::from(cell) % primary_width.max(1);
                let cy = u32::from(cell) / primary_width.max(1);
                for dy in 0..factor {
                    for dx in 0..factor {
                        let new_cell = (cy * factor + dy) * primary_width * factor + cx * factor + dx;
                        door_cells.push(to_u16(new_cell, "door cell")?);
                    }
                }
            }
            door.first_cell = to_u16(first as u32, "door cell")?;
            door.cell_count = to_u16((door_cells.len() - first) as u32, "door cell count")?;
            for polygon in door.open_polygons.iter_mut().chain(&mut door.closed_polygons) {
                polygon.scale(scale);
            }
        }
        self.door_cells = door_cells;

        for polygon in &mut self.polygons {
            polygon.scale(scale);
        }
        for vertex in &mut self.vertices {
            vertex.x = vertex.x.saturating_mul(scale);
            vertex.y = vertex.y.saturating_mul(scale);
        }
        self.rebuild_wall_groups()
    }

    /// Recompute wall groups from the wall polygons' bounding boxes
    pub fn rebuild_wall_groups(&mut self) -> Result<()> {
        let Some(primary) = self.overlays.first() else {
            self.wall_groups.clear();
            self.polygon_indices.clear();
            return Ok(());
        };
        let columns = (usize::from(primary.width) + 9) / 10;
        let count = wall_group_count(primary.width, primary.height);

        let mut groups = Vec::with_capacity(count);
        let mut indices = Vec::new();
        for group in 0..count {
            let x = (group % columns.max(1)) as i32 * GROUP_WIDTH;
            let y = (group / columns.max(1)) as i32 * GROUP_HEIGHT;
            let start = indices.len();
            for (i, polygon) in self.polygons.iter().enumerate() {
                if polygon.intersects(x, y, GROUP_WIDTH, GROUP_HEIGHT) {
                    indices.push(to_u16(i as u32, "polygon index")?);
                }
            }
            groups.push(WallGroup {
                start: to_u16(start as u32, "wall group start")?,
                count: to_u16((indices.len() - start) as u32, "wall group size")?,
            });
        }
        self.wall_groups = groups;
        self.polygon_indices = indices;
        Ok(())
    }
}

fn to_u16(value: u32, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::invalid("WED", format!("{what} {value} exceeds 16 bits after upscaling")))
}

/// Tile index `tile` of a grid `width` tiles wide, moved to the
/// (`dx`, `dy`) sub-tile of its upscaled block
fn remap_tile(tile: u16, width: u32, factor: u32, dx: u32, dy: u32) -> Result<u16> {
    let width = width.max(1);
    let tx = u32::from(tile) % width;
    let ty = u32::from(tile) / width;
    to_u16((ty * factor + dy) * width * factor + tx * factor + dx, "tile index")
}

fn upscale_overlay(overlay: &mut Overlay, factor: u32) -> Result<()> {
    if overlay.width == 0 || overlay.height == 0 {
        return Ok(());
    }
    let width = u32::from(overlay.width);
    let height = u32::from(overlay.height);
    let new_width = width * factor;
    let new_height = height * factor;

    let mut tilemap = Vec::with_capacity((new_width * new_height) as usize);
    let mut indices = Vec::with_capacity(overlay.tile_indices.len() * (factor * factor) as usize);
    for y in 0..new_height {
        for x in 0..new_width {
            let source = overlay.tilemap[((y / factor) * width + x / factor) as usize];
            let (dx, dy) = (x % factor, y % factor);
            let start = indices.len();
            for k in 0..usize::from(source.count) {
                let tile = overlay
                    .tile_indices
                    .get(usize::from(source.start) + k)
                    .copied()
                    .ok_or_else(|| Error::invalid("WED", "tilemap points past the tile index lookup"))?;
                indices.push(remap_tile(tile, width, factor, dx, dy)?);
            }
            let secondary = if source.secondary == NO_SECONDARY_TILE {
                NO_SECONDARY_TILE
            } else {
                remap_tile(source.secondary, width, factor, dx, dy)?
            };
            tilemap.push(Tilemap {
                start: to_u16(start as u32, "tile lookup start")?,
                secondary,
                ..source
            });
        }
    }

    overlay.width = to_u16(new_width, "overlay width")?;
    overlay.height = to_u16(new_height, "overlay height")?;
    overlay.unique_tile_count = to_u16(u32::from(overlay.unique_tile_count) * factor * factor, "tile count")?;
    overlay.tilemap = tilemap;
    overlay.tile_indices = indices;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn polygon(start: u32, min: i16, max: i16) -> Polygon {
        Polygon {
            vertex_start: start,
            vertex_count: 2,
            flags: 1,
            height: 0,
            min_x: min,
            max_x: max,
            min_y: min,
            max_y: max,
        }
    }

    fn sample() -> Wed {
        let tilemap = (0..4u16)
            .map(|i| Tilemap {
                start: i,
                count: 1,
                secondary: if i == 3 { 4 } else { NO_SECONDARY_TILE },
                overlay_flags: 0,
                unknown: [0; 3],
            })
            .collect();
        let mut wed = Wed {
            overlays: vec![Overlay {
                width: 2,
                height: 2,
                tileset: "AR0100".into(),
                unique_tile_count: 5,
                movement_type: 0,
                tilemap,
                tile_indices: vec![0, 1, 2, 3],
            }],
            doors: vec![Door {
                name: "DOOR01".into(),
                state: 1,
                first_cell: 0,
                cell_count: 1,
                open_polygons: vec![polygon(2, 64, 100)],
                closed_polygons: vec![],
            }],
            door_cells: vec![3],
            polygons: vec![polygon(0, 10, 50)],
            vertices: vec![
                Vertex { x: 10, y: 10 },
                Vertex { x: 50, y: 50 },
                Vertex { x: 64, y: 64 },
                Vertex { x: 100, y: 100 },
            ],
            ..Wed::default()
        };
        wed.rebuild_wall_groups().unwrap();
        wed
    }

    #[test]
    fn test_round_trip() {
        let wed = sample();
        assert_eq!(wed.wall_groups, vec![WallGroup { start: 0, count: 1 }]);
        let bytes = wed.to_bytes().unwrap();
        let parsed = Wed::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, wed);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_upscale_remaps_tiles() {
        let mut wed = sample();
        wed.upscale(2).unwrap();
        let overlay = &wed.overlays[0];
        assert_eq!((overlay.width, overlay.height), (4, 4));
        assert_eq!(overlay.tilemap.len(), 16);
        assert_eq!(overlay.unique_tile_count, 20);
        // Row 0: tile 0 covers columns 0-1, tile 1 columns 2-3
        let row0: Vec<u16> = (0..4)
            .map(|x| overlay.tile_indices[usize::from(overlay.tilemap[x].start)])
            .collect();
        assert_eq!(row0, vec![0, 1, 2, 3]);
        let row1: Vec<u16> = (4..8)
            .map(|x| overlay.tile_indices[usize::from(overlay.tilemap[x].start)])
            .collect();
        assert_eq!(row1, vec![4, 5, 6, 7]);
        // Alternate tile 4 sits at (0, 2) of the old grid
        assert_eq!(overlay.tilemap[10].secondary, 16 + 2);

        assert_eq!(wed.door_cells, vec![10, 11, 14, 15]);
        assert_eq!((wed.doors[0].first_cell, wed.doors[0].cell_count), (0, 4));
        assert_eq!(wed.doors[0].open_polygons[0].max_x, 200);
        assert_eq!(wed.vertices[1], Vertex { x: 100, y: 100 });
        assert_eq!(wed.polygons[0].min_x, 20);

        let parsed = Wed::from_bytes(&wed.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, wed);
    }

    #[test]
    fn test_wall_group_count() {
        assert_eq!(wall_group_count(10, 7), 1);
        assert_eq!(wall_group_count(11, 8), 4);
        assert_eq!(wall_group_count(0, 0), 0);
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[4..8].copy_from_slice(b"V2.0");
        assert!(matches!(Wed::from_bytes(&bytes), Err(Error::UnsupportedVersion { .. })));
    }
}

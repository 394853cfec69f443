//! CHU user interface layout

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{ByteSpan, read_resref, resref_bytes};

pub const CHU_SIGNATURE: &[u8; 4] = b"CHU ";
pub const CHU_VERSION: &[u8; 4] = b"V1  ";
const HEADER_SIZE: usize = 0x14;
const WINDOW_SIZE: usize = 0x1C;
const CONTROL_ENTRY_SIZE: usize = 8;
const CONTROL_HEADER_SIZE: usize = 0x0E;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    fn read(span: &ByteSpan<'_>, offset: usize) -> Result<Self> {
        Ok(Self {
            x: span.u16_at(offset)?,
            y: span.u16_at(offset + 2)?,
            width: span.u16_at(offset + 4)?,
            height: span.u16_at(offset + 6)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        for v in [self.x, self.y, self.width, self.height] {
            out.write_u16::<LittleEndian>(v)?;
        }
        Ok(())
    }

    fn scale(&mut self, factor: u32) {
        let scale = |v: u16| u16::try_from(u32::from(v) * factor).unwrap_or(u16::MAX);
        self.x = scale(self.x);
        self.y = scale(self.y);
        self.width = scale(self.width);
        self.height = scale(self.height);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Control {
    pub id: u32,
    pub rect: Rect,
    pub control_type: u8,
    pub unknown: u8,
    /// Type-specific bytes following the common header
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Window {
    pub id: u16,
    pub unknown: u16,
    pub rect: Rect,
    pub has_background: u16,
    pub background: String,
    pub flags: u16,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Chu {
    pub windows: Vec<Window>,
}

impl Chu {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let span = ByteSpan::new(data);
        let version = span.expect_signature("CHU", CHU_SIGNATURE)?;
        if &version != CHU_VERSION {
            return Err(Error::UnsupportedVersion {
                format: "CHU",
                version: String::from_utf8_lossy(&version).into_owned(),
            });
        }
        let window_count = span.u32_at(0x08)? as usize;
        let control_table = span.u32_at(0x0C)? as usize;
        let windows_offset = span.u32_at(0x10)? as usize;
        tracing::debug!("CHU: {window_count} windows");

        let mut windows = Vec::with_capacity(window_count);
        for record in span.records(windows_offset, window_count, WINDOW_SIZE)? {
            let control_count = usize::from(record.u16_at(0x0E)?);
            let first_control = usize::from(record.u16_at(0x18)?);
            let mut controls = Vec::with_capacity(control_count);
            for entry in span.records(control_table + first_control * CONTROL_ENTRY_SIZE, control_count, CONTROL_ENTRY_SIZE)? {
                let offset = entry.u32_at(0)? as usize;
                let len = entry.u32_at(4)? as usize;
                if len < CONTROL_HEADER_SIZE {
                    return Err(Error::invalid("CHU", format!("control record of {len} bytes")));
                }
                let control = ByteSpan::new(span.slice(offset, len)?);
                controls.push(Control {
                    id: control.u32_at(0)?,
                    rect: Rect::read(&control, 4)?,
                    control_type: control.u8_at(0x0C)?,
                    unknown: control.u8_at(0x0D)?,
                    data: control.tail(CONTROL_HEADER_SIZE)?.to_vec(),
                });
            }
            windows.push(Window {
                id: record.u16_at(0)?,
                unknown: record.u16_at(2)?,
                rect: Rect::read(&record, 4)?,
                has_background: record.u16_at(0x0C)?,
                background: read_resref(record.slice(0x10, 8)?),
                flags: record.u16_at(0x1A)?,
                controls,
            });
        }
        Ok(Self { windows })
    }

    /// Header, windows, control table, then control records
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let windows_offset = HEADER_SIZE;
        let control_table = windows_offset + self.windows.len() * WINDOW_SIZE;
        let control_count: usize = self.windows.iter().map(|w| w.controls.len()).sum();
        let controls_offset = control_table + control_count * CONTROL_ENTRY_SIZE;

        let mut out = Vec::new();
        out.extend_from_slice(CHU_SIGNATURE);
        out.extend_from_slice(CHU_VERSION);
        out.write_u32::<LittleEndian>(self.windows.len() as u32)?;
        out.write_u32::<LittleEndian>(control_table as u32)?;
        out.write_u32::<LittleEndian>(windows_offset as u32)?;

        let mut first = 0usize;
        for window in &self.windows {
            let count = u16::try_from(window.controls.len())
                .map_err(|_| Error::invalid("CHU", format!("window {} has too many controls", window.id)))?;
            out.write_u16::<LittleEndian>(window.id)?;
            out.write_u16::<LittleEndian>(window.unknown)?;
            window.rect.write(&mut out)?;
            out.write_u16::<LittleEndian>(window.has_background)?;
            out.write_u16::<LittleEndian>(count)?;
            out.extend_from_slice(&resref_bytes(&window.background));
            out.write_u16::<LittleEndian>(first as u16)?;
            out.write_u16::<LittleEndian>(window.flags)?;
            first += window.controls.len();
        }

        let controls = self.windows.iter().flat_map(|w| &w.controls);
        let mut cursor = controls_offset;
        for control in controls.clone() {
            let len = CONTROL_HEADER_SIZE + control.data.len();
            out.write_u32::<LittleEndian>(cursor as u32)?;
            out.write_u32::<LittleEndian>(len as u32)?;
            cursor += len;
        }
        for control in controls {
            out.write_u32::<LittleEndian>(control.id)?;
            control.rect.write(&mut out)?;
            out.write_u8(control.control_type)?;
            out.write_u8(control.unknown)?;
            out.extend_from_slice(&control.data);
        }
        Ok(out)
    }

    /// Scale window and control rectangles by `factor`
    pub fn upscale(&mut self, factor: u32) {
        for window in &mut self.windows {
            window.rect.scale(factor);
            for control in &mut window.controls {
                control.rect.scale(factor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Chu {
        let button = Control {
            id: 1,
            rect: Rect {
                x: 10,
                y: 20,
                width: 100,
                height: 30,
            },
            control_type: 0,
            unknown: 0,
            data: vec![b'B'; 0x20],
        };
        let label = Control {
            id: 0x1000_0002,
            control_type: 6,
            data: vec![1, 2, 3],
            ..Control::default()
        };
        Chu {
            windows: vec![
                Window {
                    id: 0,
                    rect: Rect {
                        x: 0,
                        y: 0,
                        width: 640,
                        height: 480,
                    },
                    has_background: 1,
                    background: "GUIMAIN".into(),
                    controls: vec![button, label],
                    ..Window::default()
                },
                Window {
                    id: 3,
                    ..Window::default()
                },
            ],
        }
    }

    #[test]
    fn test_round_trip() {
        let chu = sample();
        let bytes = chu.to_bytes().unwrap();
        let parsed = Chu::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, chu);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_upscale_keeps_control_data() {
        let mut chu = sample();
        chu.upscale(2);
        assert_eq!(chu.windows[0].rect.width, 1280);
        let button = &chu.windows[0].controls[0];
        assert_eq!((button.rect.x, button.rect.y, button.rect.width), (20, 40, 200));
        assert_eq!(button.data, vec![b'B'; 0x20]);
    }

    #[test]
    fn test_upscale_saturates() {
        let mut chu = sample();
        chu.windows[0].rect.width = 40000;
        chu.upscale(2);
        assert_eq!(chu.windows[0].rect.width, u16::MAX);
    }
}

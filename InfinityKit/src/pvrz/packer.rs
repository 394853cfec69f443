//! Shelf packing of frames into power-of-two atlas pages
//!
//! Sources larger than a page are first cut into page-sized pieces, which is
//! why one logical frame may end up as several data blocks on several pages.
//! Every piece is placed on a 4-pixel grid so no DXT block mixes two frames.

/// One rectangle of a source image placed on an atlas page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasBlock {
    /// Index of the source image
    pub source: usize,
    /// Top-left corner of the piece inside the source image
    pub source_x: u32,
    pub source_y: u32,
    pub width: u32,
    pub height: u32,
    /// Page index within this layout (not the PVRZ page number)
    pub page: usize,
    /// Top-left corner on the page
    pub x: u32,
    pub y: u32,
}

/// Result of packing: page dimensions plus every placed block
#[derive(Debug, Clone, Default)]
pub struct AtlasLayout {
    pub pages: Vec<(u32, u32)>,
    pub blocks: Vec<AtlasBlock>,
}

impl AtlasLayout {
    /// Blocks belonging to one source, in placement order
    pub fn blocks_for(&self, source: usize) -> impl Iterator<Item = &AtlasBlock> + '_ {
        self.blocks.iter().filter(move |b| b.source == source)
    }
}

#[derive(Debug)]
struct Shelf {
    y: u32,
    height: u32,
    used: u32,
}

#[derive(Debug, Default)]
struct PageState {
    shelves: Vec<Shelf>,
    next_y: u32,
}

const ALIGN: u32 = 4;

fn align(v: u32) -> u32 {
    v.div_ceil(ALIGN) * ALIGN
}

/// Pack `sizes` (width, height) into pages of at most `max_page` pixels square
#[must_use]
pub fn pack(sizes: &[(u32, u32)], max_page: u32) -> AtlasLayout {
    let max_page = align(max_page.max(ALIGN));

    // Cut every source into pieces no larger than a page
    let mut pieces = Vec::new();
    for (source, &(w, h)) in sizes.iter().enumerate() {
        let mut sy = 0;
        while sy < h {
            let ph = (h - sy).min(max_page);
            let mut sx = 0;
            while sx < w {
                let pw = (w - sx).min(max_page);
                pieces.push((source, sx, sy, pw, ph));
                sx += pw;
            }
            sy += ph;
        }
    }
    // Tallest first keeps shelves dense; stable sort keeps frame order for ties
    pieces.sort_by(|a, b| align(b.4).cmp(&align(a.4)));

    let mut states: Vec<PageState> = Vec::new();
    let mut layout = AtlasLayout::default();

    for (source, sx, sy, pw, ph) in pieces {
        let (aw, ah) = (align(pw), align(ph));
        let mut placed = None;

        'pages: for (page, state) in states.iter_mut().enumerate() {
            for shelf in &mut state.shelves {
                if ah <= shelf.height && shelf.used + aw <= max_page {
                    placed = Some((page, shelf.used, shelf.y));
                    shelf.used += aw;
                    break 'pages;
                }
            }
            if state.next_y + ah <= max_page {
                state.shelves.push(Shelf {
                    y: state.next_y,
                    height: ah,
                    used: aw,
                });
                placed = Some((page, 0, state.next_y));
                state.next_y += ah;
                break;
            }
        }

        let (page, x, y) = placed.unwrap_or_else(|| {
            states.push(PageState {
                shelves: vec![Shelf {
                    y: 0,
                    height: ah,
                    used: aw,
                }],
                next_y: ah,
            });
            (states.len() - 1, 0, 0)
        });

        layout.blocks.push(AtlasBlock {
            source,
            source_x: sx,
            source_y: sy,
            width: pw,
            height: ph,
            page,
            x,
            y,
        });
    }

    // Shrink each page to the smallest power of two covering its blocks
    layout.pages = (0..states.len())
        .map(|page| {
            let (w, h) = layout
                .blocks
                .iter()
                .filter(|b| b.page == page)
                .fold((ALIGN, ALIGN), |(w, h), b| (w.max(b.x + b.width), h.max(b.y + b.height)));
            (w.next_power_of_two(), h.next_power_of_two())
        })
        .collect();

    // Restore source order for callers that emit blocks per frame
    layout.blocks.sort_by_key(|b| (b.source, b.source_y, b.source_x));
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: &AtlasBlock, b: &AtlasBlock) -> bool {
        a.page == b.page
            && a.x < b.x + b.width
            && b.x < a.x + a.width
            && a.y < b.y + b.height
            && b.y < a.y + a.height
    }

    #[test]
    fn test_blocks_do_not_overlap() {
        let sizes: Vec<(u32, u32)> = (1..40).map(|i| (i * 7 % 90 + 3, i * 13 % 70 + 5)).collect();
        let layout = pack(&sizes, 256);
        for (i, a) in layout.blocks.iter().enumerate() {
            assert_eq!(a.x % 4, 0);
            assert_eq!(a.y % 4, 0);
            let (pw, ph) = layout.pages[a.page];
            assert!(a.x + a.width <= pw && a.y + a.height <= ph);
            for b in &layout.blocks[i + 1..] {
                assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_large_source_is_split() {
        let layout = pack(&[(300, 100)], 128);
        let blocks: Vec<_> = layout.blocks_for(0).collect();
        assert_eq!(blocks.len(), 3);
        let covered: u32 = blocks.iter().map(|b| b.width * b.height).sum();
        assert_eq!(covered, 300 * 100);
    }

    #[test]
    fn test_page_is_power_of_two() {
        let layout = pack(&[(33, 17)], 1024);
        assert_eq!(layout.pages, vec![(64, 32)]);
    }
}

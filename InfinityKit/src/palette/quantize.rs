//! Median-cut colour quantization

use std::collections::HashMap;

use super::{alpha, blue, green, pack_argb, red};

/// Unique colour with its pixel count
#[derive(Debug, Clone, Copy)]
struct Entry {
    channels: [u8; 4],
    count: u64,
}

/// A box of colours in ARGB space
#[derive(Debug)]
struct ColorBox {
    entries: Vec<Entry>,
}

impl ColorBox {
    /// Longest channel and its range
    fn widest_channel(&self) -> (usize, u8) {
        let mut best = (0, 0u8);
        for ch in 0..4 {
            let (lo, hi) = self.entries.iter().fold((u8::MAX, u8::MIN), |(lo, hi), e| {
                (lo.min(e.channels[ch]), hi.max(e.channels[ch]))
            });
            let range = hi.saturating_sub(lo);
            if range > best.1 {
                best = (ch, range);
            }
        }
        best
    }

    /// Split at the weighted median of the widest channel
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.entries.sort_by_key(|e| e.channels[channel]);
        let total: u64 = self.entries.iter().map(|e| e.count).sum();
        let mut acc = 0;
        let mut cut = 1;
        for (i, e) in self.entries.iter().enumerate() {
            acc += e.count;
            if acc * 2 >= total {
                cut = i + 1;
                break;
            }
        }
        // Both halves must keep at least one colour
        let cut = cut.clamp(1, self.entries.len() - 1);
        let upper = self.entries.split_off(cut);
        (self, ColorBox { entries: upper })
    }

    /// Pixel-count weighted average colour
    fn average(&self) -> u32 {
        let total: u64 = self.entries.iter().map(|e| e.count).sum::<u64>().max(1);
        let mut sums = [0u64; 4];
        for e in &self.entries {
            for (sum, &c) in sums.iter_mut().zip(&e.channels) {
                *sum += u64::from(c) * e.count;
            }
        }
        let ch = |i: usize| ((sums[i] + total / 2) / total) as u8;
        pack_argb(ch(0), ch(1), ch(2), ch(3))
    }
}

/// Reduce `pixels` to at most `max_colors` representative colours
///
/// When the set of unique colours already fits the budget it is returned
/// directly (in first-seen order) so no colour is altered.
#[must_use]
pub fn median_cut(pixels: &[u32], max_colors: usize) -> Vec<u32> {
    if max_colors == 0 {
        return Vec::new();
    }

    let mut order = Vec::new();
    let mut counts: HashMap<u32, u64> = HashMap::new();
    for &p in pixels {
        let count = counts.entry(p).or_insert(0);
        if *count == 0 {
            order.push(p);
        }
        *count += 1;
    }
    if order.len() <= max_colors {
        return order;
    }

    let entries = order
        .iter()
        .map(|&c| Entry {
            channels: [alpha(c), red(c), green(c), blue(c)],
            count: counts[&c],
        })
        .collect();
    let mut boxes = vec![ColorBox { entries }];

    while boxes.len() < max_colors {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() > 1)
            .max_by_key(|(_, b)| b.widest_channel().1)
            .map(|(i, _)| i);
        let Some(index) = candidate else { break };
        let (lower, upper) = boxes.swap_remove(index).split();
        boxes.push(lower);
        boxes.push(upper);
    }

    boxes.iter().map(ColorBox::average).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_path_keeps_exact_colors() {
        let pixels = [0xFF11_2233, 0xFF44_5566, 0xFF11_2233];
        assert_eq!(median_cut(&pixels, 4), vec![0xFF11_2233, 0xFF44_5566]);
    }

    #[test]
    fn test_reduces_to_budget() {
        let pixels: Vec<u32> = (0..1000u32).map(|i| 0xFF00_0000 | (i * 4099)).collect();
        let palette = median_cut(&pixels, 16);
        assert_eq!(palette.len(), 16);
        assert!(palette.iter().all(|&c| alpha(c) == 0xFF));
    }

    #[test]
    fn test_splits_separate_clusters() {
        let mut pixels = vec![0xFF00_0000; 50];
        pixels.extend(vec![0xFF00_0001; 50]);
        pixels.extend(vec![0xFFFF_FFFF; 50]);
        pixels.extend(vec![0xFFFF_FFFE; 50]);
        let palette = median_cut(&pixels, 2);
        assert_eq!(palette.len(), 2);
        assert!(palette.iter().any(|&c| red(c) < 8));
        assert!(palette.iter().any(|&c| red(c) > 248));
    }
}

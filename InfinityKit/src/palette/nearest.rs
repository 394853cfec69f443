//! Weighted nearest-colour search

use super::{alpha, blue, green, red};

// Per-channel weights; green dominates perceived brightness
const WEIGHT_R: u64 = 14;
const WEIGHT_G: u64 = 28;
const WEIGHT_B: u64 = 6;
const WEIGHT_A: u64 = WEIGHT_R + WEIGHT_G + WEIGHT_B;

/// Alpha-weighted squared distance between two ARGB colours
///
/// The colour term is scaled by the smaller of the two alphas, so colour
/// differences between nearly transparent pixels count for little while the
/// alpha difference itself always counts in full.
#[must_use]
pub fn color_distance(a: u32, b: u32) -> u64 {
    let diff = |x: u8, y: u8| {
        let d = i64::from(x) - i64::from(y);
        (d * d) as u64
    };
    let color = WEIGHT_R * diff(red(a), red(b))
        + WEIGHT_G * diff(green(a), green(b))
        + WEIGHT_B * diff(blue(a), blue(b));
    let min_alpha = u64::from(alpha(a).min(alpha(b)));
    WEIGHT_A * diff(alpha(a), alpha(b)) + color * min_alpha / 255
}

/// Index of the palette entry closest to `color`, never returning `skip`
#[must_use]
pub fn nearest_index(palette: &[u32], color: u32, skip: Option<u8>) -> u8 {
    let mut best = 0u8;
    let mut best_dist = u64::MAX;
    for (i, &entry) in palette.iter().enumerate().take(256) {
        if Some(i as u8) == skip {
            continue;
        }
        let dist = color_distance(entry, color);
        if dist < best_dist {
            best_dist = dist;
            best = i as u8;
            if dist == 0 {
                break;
            }
        }
    }
    best
}

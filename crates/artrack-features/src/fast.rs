//! FAST-9 segment-test corner detection with grid non-max suppression.

use artrack_core::{GrayImageView, KeyPoint};
use std::collections::HashSet;

/// Bresenham circle of radius 3 used by the segment test, clockwise from N.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LENGTH: usize = 9;
const NMS_CELL: f32 = 5.0;

#[inline]
fn px(img: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    img.data[y as usize * img.width + x as usize]
}

/// Cardinal-point pre-check: at least three of N/E/S/W must be uniformly
/// brighter or darker before the full arc test is worth running.
#[inline]
fn passes_precheck(img: &GrayImageView<'_>, x: i32, y: i32, center: u8, threshold: u8) -> bool {
    let hi = center.saturating_add(threshold);
    let lo = center.saturating_sub(threshold);
    let cardinal = [
        px(img, x, y - 3),
        px(img, x + 3, y),
        px(img, x, y + 3),
        px(img, x - 3, y),
    ];
    let bright = cardinal.iter().filter(|&&p| p > hi).count();
    let dark = cardinal.iter().filter(|&&p| p < lo).count();
    bright >= 3 || dark >= 3
}

/// Full segment test: a run of at least [`ARC_LENGTH`] contiguous circle
/// pixels all brighter or all darker than the centre (with wraparound).
fn is_corner(img: &GrayImageView<'_>, x: i32, y: i32, center: u8, threshold: u8) -> bool {
    let hi = center.saturating_add(threshold);
    let lo = center.saturating_sub(threshold);

    let mut bright_run = 0usize;
    let mut dark_run = 0usize;
    let mut best_bright = 0usize;
    let mut best_dark = 0usize;

    for i in 0..CIRCLE.len() * 2 {
        let (dx, dy) = CIRCLE[i % CIRCLE.len()];
        let p = px(img, x + dx, y + dy);
        if p > hi {
            bright_run += 1;
            dark_run = 0;
            best_bright = best_bright.max(bright_run);
        } else if p < lo {
            dark_run += 1;
            bright_run = 0;
            best_dark = best_dark.max(dark_run);
        } else {
            bright_run = 0;
            dark_run = 0;
        }
    }

    best_bright >= ARC_LENGTH || best_dark >= ARC_LENGTH
}

/// Local intensity standard deviation over a 5x5 patch; used as the
/// keypoint response so corners on strong texture rank first.
fn corner_response(img: &GrayImageView<'_>, x: i32, y: i32) -> f32 {
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    let mut count = 0u32;
    for dy in -2..=2 {
        for dx in -2..=2 {
            let (sx, sy) = (x + dx, y + dy);
            if sx >= 0 && sy >= 0 && sx < img.width as i32 && sy < img.height as i32 {
                let v = px(img, sx, sy) as f32;
                sum += v;
                sum_sq += v * v;
                count += 1;
            }
        }
    }
    let mean = sum / count as f32;
    (sum_sq / count as f32 - mean * mean).max(0.0).sqrt()
}

/// Detect FAST corners on one image level.
///
/// Corners are returned strongest-first after grid non-max suppression,
/// in the coordinates of `img` (callers rescale to level 0).
pub fn detect_corners(img: &GrayImageView<'_>, threshold: u8) -> Vec<KeyPoint> {
    if img.width < 7 || img.height < 7 {
        return Vec::new();
    }

    let mut corners = Vec::new();
    for y in 3..(img.height as i32 - 3) {
        for x in 3..(img.width as i32 - 3) {
            let center = px(img, x, y);
            if !passes_precheck(img, x, y, center, threshold) {
                continue;
            }
            if is_corner(img, x, y, center, threshold) {
                corners.push(KeyPoint::new(
                    x as f32,
                    y as f32,
                    corner_response(img, x, y),
                ));
            }
        }
    }

    suppress_grid(corners)
}

/// Keep one corner per occupied 3x3 cell neighbourhood, strongest first.
fn suppress_grid(mut corners: Vec<KeyPoint>) -> Vec<KeyPoint> {
    corners.sort_by(|a, b| {
        b.response
            .partial_cmp(&a.response)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut occupied = HashSet::new();
    let mut kept = Vec::new();
    'outer: for kp in corners {
        let cx = (kp.position.x / NMS_CELL) as i32;
        let cy = (kp.position.y / NMS_CELL) as i32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if occupied.contains(&(cx + dx, cy + dy)) {
                    continue 'outer;
                }
            }
        }
        occupied.insert((cx, cy));
        kept.push(kp);
    }
    kept
}

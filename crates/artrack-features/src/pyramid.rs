//! Scale pyramid used by the multi-octave algorithm families.

use artrack_core::{GrayImage, GrayImageView};

/// Per-octave scale step, as used by ORB.
pub const SCALE_FACTOR: f32 = 1.2;

/// Levels below this side length carry no usable features.
const MIN_SIDE: usize = 40;

/// One pyramid level: the image and its scale relative to level 0.
pub struct PyramidLevel {
    pub image: GrayImage,
    pub scale: f32,
}

/// Build a pyramid of up to `octaves` levels, each [`SCALE_FACTOR`]
/// smaller than the previous. Stops early when a level gets too small.
pub fn build_pyramid(base: &GrayImageView<'_>, octaves: u32) -> Vec<PyramidLevel> {
    let mut levels = vec![PyramidLevel {
        image: GrayImage {
            width: base.width,
            height: base.height,
            data: base.data.to_vec(),
        },
        scale: 1.0,
    }];

    while levels.len() < octaves as usize {
        let last = &levels[levels.len() - 1];
        let next = last.image.downscale(SCALE_FACTOR);
        if next.width < MIN_SIDE || next.height < MIN_SIDE {
            break;
        }
        let scale = last.scale * SCALE_FACTOR;
        levels.push(PyramidLevel { image: next, scale });
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyramid_scales_multiply_up() {
        let base = GrayImage {
            width: 200,
            height: 160,
            data: vec![99; 200 * 160],
        };
        let levels = build_pyramid(&base.as_view(), 4);
        assert_eq!(levels.len(), 4);
        assert_eq!(levels[0].scale, 1.0);
        for pair in levels.windows(2) {
            let ratio = pair[1].scale / pair[0].scale;
            assert!((ratio - SCALE_FACTOR).abs() < 1e-5);
            assert!(pair[1].image.width < pair[0].image.width);
        }
    }

    #[test]
    fn small_images_stop_early() {
        let base = GrayImage {
            width: 50,
            height: 50,
            data: vec![0; 2500],
        };
        let levels = build_pyramid(&base.as_view(), 8);
        assert!(levels.len() < 8);
        assert!(!levels.is_empty());
    }
}

//! Lightweight grayscale image buffers.
//!
//! The tracking pipeline works on plain `u8` luma buffers so the core
//! crates stay independent of any image-decoding library.

/// Borrowed grayscale image, row-major, `data.len() == width * height`.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned grayscale image.
#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn as_view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Downscale by `1 / factor` with bilinear sampling at pixel centres.
    ///
    /// Used for pyramid construction; `factor` must be > 1.
    pub fn downscale(&self, factor: f32) -> GrayImage {
        let out_w = ((self.width as f32 / factor) as usize).max(1);
        let out_h = ((self.height as f32 / factor) as usize).max(1);
        let view = self.as_view();
        let mut data = vec![0u8; out_w * out_h];
        for y in 0..out_h {
            for x in 0..out_w {
                let sx = (x as f32 + 0.5) * factor - 0.5;
                let sy = (y as f32 + 0.5) * factor - 0.5;
                data[y * out_w + x] = sample_bilinear(&view, sx, sy).clamp(0.0, 255.0) as u8;
            }
        }
        GrayImage {
            width: out_w,
            height: out_h,
            data,
        }
    }
}

#[inline]
fn pixel_or_zero(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample at (x, y) in pixel coordinates; out-of-bounds reads 0.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = pixel_or_zero(src, x0, y0) as f32;
    let p10 = pixel_or_zero(src, x0 + 1, y0) as f32;
    let p01 = pixel_or_zero(src, x0, y0 + 1) as f32;
    let p11 = pixel_or_zero(src, x0 + 1, y0 + 1) as f32;

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);
    top + fy * (bottom - top)
}

/// Convert an RGBA frame (as delivered by a camera collaborator) to luma.
///
/// Uses the usual Rec. 601 weights. `rgba.len()` must be `4 * width * height`;
/// returns `None` on a size mismatch instead of panicking, since frame
/// buffers come from outside the crate.
pub fn rgba_to_gray(width: usize, height: usize, rgba: &[u8]) -> Option<GrayImage> {
    if rgba.len() != width * height * 4 {
        return None;
    }
    let mut data = Vec::with_capacity(width * height);
    for px in rgba.chunks_exact(4) {
        let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
        data.push(y.clamp(0.0, 255.0) as u8);
    }
    Some(GrayImage {
        width,
        height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_conversion_checks_length() {
        assert!(rgba_to_gray(2, 2, &[0u8; 15]).is_none());
        let gray = rgba_to_gray(2, 1, &[255, 255, 255, 255, 0, 0, 0, 255]).unwrap();
        assert_eq!(gray.data, vec![255, 0]);
    }

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let img = GrayImage {
            width: 2,
            height: 1,
            data: vec![0, 100],
        };
        let v = sample_bilinear(&img.as_view(), 0.5, 0.0);
        assert!((v - 50.0).abs() < 1e-4);
    }

    #[test]
    fn downscale_halves_dimensions() {
        let img = GrayImage {
            width: 8,
            height: 6,
            data: vec![128; 48],
        };
        let small = img.downscale(2.0);
        assert_eq!((small.width, small.height), (4, 3));
        assert!(small.data.iter().all(|&p| (p as i32 - 128).abs() <= 1));
    }
}

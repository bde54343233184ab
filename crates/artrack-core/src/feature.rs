use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Width of a binary descriptor row in bytes (256 bits).
pub const DESCRIPTOR_BYTES: usize = 32;

/// A detected keypoint: pixel position plus detector response strength.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KeyPoint {
    /// Position in level-0 pixel coordinates.
    pub position: Point2<f32>,
    /// Strength / response of the corner detector. Higher is better.
    pub response: f32,
}

impl KeyPoint {
    pub fn new(x: f32, y: f32, response: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            response,
        }
    }
}

/// Row-major storage for fixed-width binary descriptors.
///
/// Every row is [`DESCRIPTOR_BYTES`] long; row `i` describes keypoint `i`
/// of the owning [`FeatureSet`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DescriptorMatrix {
    data: Vec<u8>,
}

impl DescriptorMatrix {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self {
            data: Vec::with_capacity(rows * DESCRIPTOR_BYTES),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.len() / DESCRIPTOR_BYTES
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.data[i * DESCRIPTOR_BYTES..(i + 1) * DESCRIPTOR_BYTES]
    }

    pub fn push_row(&mut self, row: &[u8; DESCRIPTOR_BYTES]) {
        self.data.extend_from_slice(row);
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(DESCRIPTOR_BYTES)
    }
}

/// Hamming distance between two equally-sized binary descriptors.
#[inline]
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Keypoints paired 1:1 with binary descriptors.
///
/// Invariant: `keypoints.len() == descriptors.rows()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: DescriptorMatrix,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Keep only the `max` strongest keypoints.
    ///
    /// Ordering is by descending response with ties broken by original
    /// index, so the result is reproducible for equal-response keypoints.
    /// The descriptor matrix is rebuilt to stay 1:1 with the survivors.
    pub fn cap(&mut self, max: usize) {
        if self.keypoints.len() <= max {
            return;
        }

        let mut order: Vec<usize> = (0..self.keypoints.len()).collect();
        order.sort_by(|&a, &b| {
            self.keypoints[b]
                .response
                .partial_cmp(&self.keypoints[a].response)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        order.truncate(max);

        let mut keypoints = Vec::with_capacity(max);
        let mut descriptors = DescriptorMatrix::with_capacity(max);
        for &i in &order {
            keypoints.push(self.keypoints[i]);
            let mut row = [0u8; DESCRIPTOR_BYTES];
            row.copy_from_slice(self.descriptors.row(i));
            descriptors.push_row(&row);
        }

        self.keypoints = keypoints;
        self.descriptors = descriptors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with_responses(responses: &[f32]) -> FeatureSet {
        let mut fs = FeatureSet::new();
        for (i, &r) in responses.iter().enumerate() {
            fs.keypoints.push(KeyPoint::new(i as f32, 0.0, r));
            let mut row = [0u8; DESCRIPTOR_BYTES];
            row[0] = i as u8;
            fs.descriptors.push_row(&row);
        }
        fs
    }

    #[test]
    fn cap_keeps_strongest_and_rebuilds_descriptors() {
        let mut fs = set_with_responses(&[1.0, 5.0, 3.0, 4.0, 2.0]);
        fs.cap(3);
        assert_eq!(fs.len(), 3);
        assert_eq!(fs.descriptors.rows(), 3);

        let kept: Vec<f32> = fs.keypoints.iter().map(|k| k.response).collect();
        assert_eq!(kept, vec![5.0, 4.0, 3.0]);
        // descriptor rows followed their keypoints
        assert_eq!(fs.descriptors.row(0)[0], 1);
        assert_eq!(fs.descriptors.row(1)[0], 3);
        assert_eq!(fs.descriptors.row(2)[0], 2);
    }

    #[test]
    fn cap_is_stable_on_ties() {
        let mut fs = set_with_responses(&[2.0, 2.0, 2.0, 2.0]);
        fs.cap(2);
        // equal responses keep original order
        assert_eq!(fs.keypoints[0].position.x, 0.0);
        assert_eq!(fs.keypoints[1].position.x, 1.0);
    }

    #[test]
    fn cap_is_noop_below_limit() {
        let mut fs = set_with_responses(&[1.0, 2.0]);
        fs.cap(10);
        assert_eq!(fs.len(), 2);
    }

    #[test]
    fn hamming_counts_differing_bits() {
        let a = [0u8; DESCRIPTOR_BYTES];
        let mut b = [0u8; DESCRIPTOR_BYTES];
        assert_eq!(hamming_distance(&a, &b), 0);
        b[0] = 0xFF;
        b[5] = 0x0F;
        assert_eq!(hamming_distance(&a, &b), 12);
    }
}

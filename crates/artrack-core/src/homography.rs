use nalgebra::{DMatrix, Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// 3x3 projective transform mapping target-plane pixels to frame pixels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        Self { m }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.m[(row, col)]
    }

    /// Apply the transform with perspective divide.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.m * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new((v.x / v.z) as f32, (v.y / v.z) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|m| Self { m })
    }

    /// Direct linear transform from point correspondences `dst ~ H * src`.
    ///
    /// Points are Hartley-normalized before building the 2N x 9 system, and
    /// the result is scaled so `h22 == 1` where possible. Needs at least
    /// four correspondences; returns `None` on degenerate input.
    pub fn estimate(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Self> {
        if src.len() != dst.len() || src.len() < 4 {
            return None;
        }

        let (src_n, t_src) = hartley_normalize(src);
        let (dst_n, t_dst) = hartley_normalize(dst);

        // nalgebra's SVD is thin: for the minimal 4-point case A is 8x9 and
        // the null-space vector would be dropped, so pad to at least 9 rows.
        let n = src.len();
        let mut a = DMatrix::<f64>::zeros((2 * n).max(9), 9);
        for (k, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
            let (x, y) = (s.x, s.y);
            let (u, v) = (d.x, d.y);
            let r = 2 * k;
            a[(r, 0)] = -x;
            a[(r, 1)] = -y;
            a[(r, 2)] = -1.0;
            a[(r, 6)] = u * x;
            a[(r, 7)] = u * y;
            a[(r, 8)] = u;
            a[(r + 1, 3)] = -x;
            a[(r + 1, 4)] = -y;
            a[(r + 1, 5)] = -1.0;
            a[(r + 1, 6)] = v * x;
            a[(r + 1, 7)] = v * y;
            a[(r + 1, 8)] = v;
        }

        // Null vector of A = right singular vector of the smallest singular
        // value = last row of V^T.
        let svd = a.svd(false, true);
        let vt = svd.v_t?;
        let h = vt.row(vt.nrows().checked_sub(1)?);

        let hn = Matrix3::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);
        let denorm = t_dst.try_inverse()? * hn * t_src;

        let scale = denorm[(2, 2)];
        if scale.abs() < 1e-12 {
            return None;
        }
        Some(Self { m: denorm / scale })
    }
}

/// Translate to the centroid and scale so the mean distance is sqrt(2).
fn hartley_normalize(pts: &[Point2<f32>]) -> (Vec<Point2<f64>>, Matrix3<f64>) {
    let n = pts.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= n;
    cy /= n;

    let mean_dist = pts
        .iter()
        .map(|p| {
            let dx = p.x as f64 - cx;
            let dy = p.y as f64 - cy;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| Point2::new(s * (p.x as f64 - cx), s * (p.y as f64 - cy)))
        .collect();
    (normalized, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn four_point_estimate_maps_corners() {
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        // a general convex quad, not an affinity
        let dst = [
            Point2::new(100.0_f32, 50.0),
            Point2::new(220.0, 60.0),
            Point2::new(240.0, 190.0),
            Point2::new(90.0, 170.0),
        ];

        let h = Homography::estimate(&src, &dst).expect("homography");
        for (s, d) in src.iter().zip(dst.iter()) {
            let got = h.apply(*s);
            assert_abs_diff_eq!(got.x, d.x, epsilon = 1e-2);
            assert_abs_diff_eq!(got.y, d.y, epsilon = 1e-2);
        }
    }

    #[test]
    fn identity_round_trips_through_inverse() {
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(0.0, 100.0),
            Point2::new(50.0, 50.0),
        ];
        let h = Homography::estimate(&src, &src).expect("homography");
        let inv = h.inverse().expect("inverse");
        let p = Point2::new(25.0_f32, 75.0);
        let back = inv.apply(h.apply(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-2);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-2);
    }

    #[test]
    fn too_few_points_is_none() {
        let pts = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(Homography::estimate(&pts, &pts).is_none());
    }
}

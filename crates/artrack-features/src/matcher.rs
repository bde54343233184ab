//! Descriptor matching: 2-NN Hamming search with Lowe's ratio test.

use artrack_core::{hamming_distance, DescriptorMatrix};

/// An accepted correspondence between a query row and a target row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureMatch {
    pub query_idx: usize,
    pub target_idx: usize,
    pub distance: u32,
}

/// Match every query descriptor against the target set.
///
/// For each query row the two nearest target rows by Hamming distance are
/// found; the pair is accepted only when the best distance is unambiguously
/// smaller than the runner-up (`best < ratio * second`). Either side being
/// empty yields an empty list, never an error.
pub fn match_features(
    query: &DescriptorMatrix,
    target: &DescriptorMatrix,
    ratio: f32,
) -> Vec<FeatureMatch> {
    if query.is_empty() || target.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for qi in 0..query.rows() {
        let q = query.row(qi);

        let mut best = u32::MAX;
        let mut second = u32::MAX;
        let mut best_ti = 0usize;
        for (ti, t) in target.iter_rows().enumerate() {
            let d = hamming_distance(q, t);
            if d < best {
                second = best;
                best = d;
                best_ti = ti;
            } else if d < second {
                second = d;
            }
        }

        // with a single target row there is no runner-up to disambiguate
        if second == u32::MAX {
            continue;
        }
        if (best as f32) < ratio * second as f32 {
            matches.push(FeatureMatch {
                query_idx: qi,
                target_idx: best_ti,
                distance: best,
            });
        }
    }
    matches
}

//! Bag-of-visual-words candidate pre-filtering.
//!
//! The index clusters every registered target's binary descriptors into a
//! flat codebook of "visual words" (k-means under Hamming distance), keeps
//! a word-frequency vector per target, and answers ranked candidate
//! queries for an incoming frame with TF-IDF weighted dot-product scores.
//! This prunes full descriptor matching to a short candidate list when many
//! targets are registered.
//!
//! Clustering is deliberately deterministic: centers start from the first K
//! pool descriptors and the iteration count is fixed, so identical input
//! order reproduces identical vocabularies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use artrack_core::{hamming_distance, DescriptorMatrix, Target, TargetId, DESCRIPTOR_BYTES};

/// Fixed k-means pass count.
const KMEANS_ITERATIONS: usize = 10;

/// Vocabulary index parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VocabParams {
    /// Codebook size K; clipped to the descriptor pool size at build time.
    pub vocabulary_size: usize,
    /// How many ranked candidate ids a query returns.
    pub top_candidates: usize,
}

impl Default for VocabParams {
    fn default() -> Self {
        Self {
            vocabulary_size: 100,
            top_candidates: 5,
        }
    }
}

impl VocabParams {
    pub fn validate(&self) -> Result<(), VocabConfigError> {
        if self.vocabulary_size < 50 {
            return Err(VocabConfigError::VocabularyTooSmall(self.vocabulary_size));
        }
        if self.top_candidates == 0 {
            return Err(VocabConfigError::NoCandidates);
        }
        Ok(())
    }
}

/// Errors raised at configuration-validation time.
#[derive(thiserror::Error, Debug)]
pub enum VocabConfigError {
    #[error("vocabulary_size {0} is below the minimum of 50")]
    VocabularyTooSmall(usize),
    #[error("top_candidates must be at least 1")]
    NoCandidates,
}

/// One target's word histogram.
#[derive(Clone, Debug)]
struct BowDocument {
    target_id: TargetId,
    /// word index -> occurrence count
    counts: HashMap<usize, usize>,
}

/// The built codebook plus derived per-target vectors.
#[derive(Clone, Debug)]
struct Vocabulary {
    words: Vec<[u8; DESCRIPTOR_BYTES]>,
    documents: Vec<BowDocument>,
    /// `ln(target_count / document_frequency)` per word, 0 for unused words.
    idf: Vec<f64>,
}

/// Visual-word index over the registered target set.
#[derive(Debug, Default)]
pub struct VocabularyIndex {
    params: VocabParams,
    vocabulary: Option<Vocabulary>,
}

impl VocabularyIndex {
    pub fn new(params: VocabParams) -> Result<Self, VocabConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            vocabulary: None,
        })
    }

    pub fn params(&self) -> &VocabParams {
        &self.params
    }

    pub fn set_params(&mut self, params: VocabParams) -> Result<(), VocabConfigError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// True once `build` has produced a usable codebook.
    pub fn is_built(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Rebuild the codebook from scratch for the given target set.
    ///
    /// Targets without extracted features contribute nothing. An empty
    /// descriptor pool leaves the vocabulary unset: that is the normal
    /// state before any target is registered, not an error.
    pub fn build(&mut self, targets: &[Target]) {
        let mut pool: Vec<[u8; DESCRIPTOR_BYTES]> = Vec::new();
        for target in targets {
            if let Some(features) = &target.features {
                for row in features.descriptors.iter_rows() {
                    let mut word = [0u8; DESCRIPTOR_BYTES];
                    word.copy_from_slice(row);
                    pool.push(word);
                }
            }
        }

        if pool.is_empty() {
            log::info!("vocabulary build skipped: no target descriptors");
            self.vocabulary = None;
            return;
        }

        let k = self.params.vocabulary_size.min(pool.len());
        let words = cluster_descriptors(&pool, k);

        let mut documents = Vec::new();
        for target in targets {
            let Some(features) = &target.features else {
                continue;
            };
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for row in features.descriptors.iter_rows() {
                *counts.entry(nearest_word(&words, row)).or_insert(0) += 1;
            }
            documents.push(BowDocument {
                target_id: target.id.clone(),
                counts,
            });
        }

        let mut document_frequency = vec![0usize; words.len()];
        for doc in &documents {
            for &word in doc.counts.keys() {
                document_frequency[word] += 1;
            }
        }
        let corpus = documents.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| if df > 0 { (corpus / df as f64).ln() } else { 0.0 })
            .collect();

        log::info!(
            "vocabulary built: {} words from {} descriptors across {} targets",
            words.len(),
            pool.len(),
            documents.len()
        );
        self.vocabulary = Some(Vocabulary {
            words,
            documents,
            idf,
        });
    }

    /// Drop the codebook (used when the last target is removed).
    pub fn clear(&mut self) {
        self.vocabulary = None;
    }

    /// Rank registered targets against a frame's descriptors.
    ///
    /// Scores each target by the TF-IDF weighted dot product over shared
    /// words and returns the `top_candidates` best ids, highest first.
    /// An unset vocabulary or an empty frame yields an empty list.
    pub fn query(&self, frame: &DescriptorMatrix) -> Vec<TargetId> {
        let Some(vocab) = &self.vocabulary else {
            return Vec::new();
        };
        if frame.is_empty() {
            return Vec::new();
        }

        let mut frame_counts: HashMap<usize, usize> = HashMap::new();
        for row in frame.iter_rows() {
            *frame_counts
                .entry(nearest_word(&vocab.words, row))
                .or_insert(0) += 1;
        }
        let total = frame.rows() as f64;

        let mut ranked: Vec<(f64, &TargetId)> = vocab
            .documents
            .iter()
            .map(|doc| {
                let score: f64 = frame_counts
                    .iter()
                    .filter_map(|(&word, &count)| {
                        let doc_count = *doc.counts.get(&word)? as f64;
                        let idf = vocab.idf[word];
                        let tf = count as f64 / total;
                        Some(tf * idf * doc_count * idf)
                    })
                    .sum();
                (score, &doc.target_id)
            })
            .collect();

        // stable sort keeps registration order on equal scores
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked
            .into_iter()
            .take(self.params.top_candidates)
            .map(|(_, id)| id.clone())
            .collect()
    }
}

/// Flat k-means over binary descriptors with Hamming distance.
///
/// Centers are initialized from the first `k` pool entries; each pass
/// assigns every descriptor to its nearest center and recomputes centers
/// as the per-bit rounded majority of their members. Empty clusters keep
/// their previous center.
fn cluster_descriptors(pool: &[[u8; DESCRIPTOR_BYTES]], k: usize) -> Vec<[u8; DESCRIPTOR_BYTES]> {
    let mut centers: Vec<[u8; DESCRIPTOR_BYTES]> = pool[..k].to_vec();

    for _ in 0..KMEANS_ITERATIONS {
        let mut assignments = vec![0usize; pool.len()];
        for (i, desc) in pool.iter().enumerate() {
            assignments[i] = nearest_word(&centers, desc);
        }

        for (c, center) in centers.iter_mut().enumerate() {
            let members: Vec<&[u8; DESCRIPTOR_BYTES]> = pool
                .iter()
                .zip(&assignments)
                .filter_map(|(desc, &a)| (a == c).then_some(desc))
                .collect();
            if members.is_empty() {
                continue;
            }

            let mut bit_counts = [0usize; DESCRIPTOR_BYTES * 8];
            for member in &members {
                for (byte_idx, &byte) in member.iter().enumerate() {
                    for bit in 0..8 {
                        if byte & (1 << bit) != 0 {
                            bit_counts[byte_idx * 8 + bit] += 1;
                        }
                    }
                }
            }

            let member_count = members.len();
            let mut updated = [0u8; DESCRIPTOR_BYTES];
            for (i, &count) in bit_counts.iter().enumerate() {
                // mean >= 0.5 rounds to 1
                if count * 2 >= member_count {
                    updated[i / 8] |= 1 << (i % 8);
                }
            }
            *center = updated;
        }
    }

    centers
}

/// Index of the nearest center by Hamming distance, lowest index on ties.
fn nearest_word(words: &[[u8; DESCRIPTOR_BYTES]], desc: &[u8]) -> usize {
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, word) in words.iter().enumerate() {
        let d = hamming_distance(desc, word);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use artrack_core::{FeatureSet, KeyPoint};

    /// A target whose descriptors are all small perturbations of `base`.
    fn synthetic_target(id: &str, base: u8, rows: usize) -> Target {
        let mut features = FeatureSet::new();
        for i in 0..rows {
            features.keypoints.push(KeyPoint::new(i as f32, 0.0, 1.0));
            let mut row = [base; DESCRIPTOR_BYTES];
            row[i % DESCRIPTOR_BYTES] ^= 1 << (i % 8);
            features.descriptors.push_row(&row);
        }
        Target {
            id: id.into(),
            name: id.into(),
            width: 100,
            height: 100,
            features: Some(features),
            created_at_ms: 0,
        }
    }

    fn descriptors_like(base: u8, rows: usize) -> DescriptorMatrix {
        let mut m = DescriptorMatrix::new();
        for i in 0..rows {
            let mut row = [base; DESCRIPTOR_BYTES];
            row[(i + 3) % DESCRIPTOR_BYTES] ^= 1 << ((i + 1) % 8);
            m.push_row(&row);
        }
        m
    }

    fn index() -> VocabularyIndex {
        VocabularyIndex::new(VocabParams::default()).unwrap()
    }

    #[test]
    fn params_bounds_are_enforced() {
        assert!(VocabularyIndex::new(VocabParams {
            vocabulary_size: 10,
            top_candidates: 5,
        })
        .is_err());
        assert!(VocabularyIndex::new(VocabParams {
            vocabulary_size: 50,
            top_candidates: 0,
        })
        .is_err());
    }

    #[test]
    fn empty_build_leaves_index_unusable_but_quiet() {
        let mut idx = index();
        idx.build(&[]);
        assert!(!idx.is_built());
        assert!(idx.query(&descriptors_like(0x55, 10)).is_empty());
    }

    #[test]
    fn featureless_targets_contribute_nothing() {
        let mut idx = index();
        let bare = Target {
            id: "bare".into(),
            name: "bare".into(),
            width: 10,
            height: 10,
            features: None,
            created_at_ms: 0,
        };
        idx.build(&[bare]);
        assert!(!idx.is_built());
    }

    #[test]
    fn disjoint_targets_rank_by_descriptor_content() {
        let mut idx = index();
        // 0x00-ish and 0xFF-ish descriptor populations are maximally apart
        let a = synthetic_target("a", 0x00, 80);
        let b = synthetic_target("b", 0xFF, 80);
        idx.build(&[a, b]);
        assert!(idx.is_built());

        let ranked = idx.query(&descriptors_like(0x00, 40));
        assert_eq!(ranked.first().map(String::as_str), Some("a"));

        let ranked = idx.query(&descriptors_like(0xFF, 40));
        assert_eq!(ranked.first().map(String::as_str), Some("b"));
    }

    #[test]
    fn query_is_deterministic() {
        let mut idx = index();
        idx.build(&[synthetic_target("a", 0x0F, 60), synthetic_target("b", 0xF0, 60)]);
        let q = descriptors_like(0x0F, 25);
        assert_eq!(idx.query(&q), idx.query(&q));
    }

    #[test]
    fn top_candidates_limits_result_length() {
        let mut idx = VocabularyIndex::new(VocabParams {
            vocabulary_size: 50,
            top_candidates: 2,
        })
        .unwrap();
        let targets: Vec<Target> = (0..5)
            .map(|i| synthetic_target(&format!("t{i}"), (i * 40) as u8, 60))
            .collect();
        idx.build(&targets);
        assert!(idx.query(&descriptors_like(0x10, 30)).len() <= 2);
    }

    #[test]
    fn clear_resets_to_unbuilt() {
        let mut idx = index();
        idx.build(&[synthetic_target("a", 0x3C, 60)]);
        assert!(idx.is_built());
        idx.clear();
        assert!(!idx.is_built());
    }

    #[test]
    fn vocabulary_size_is_clipped_to_pool() {
        let mut idx = VocabularyIndex::new(VocabParams {
            vocabulary_size: 500,
            top_candidates: 5,
        })
        .unwrap();
        // pool of 20 descriptors < K = 500 must not panic
        idx.build(&[synthetic_target("a", 0x99, 20)]);
        assert!(idx.is_built());
        assert!(!idx.query(&descriptors_like(0x99, 5)).is_empty());
    }
}

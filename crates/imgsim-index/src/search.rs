//! Exhaustive cosine ranking over one store.

use imgsim_core::types::{EmbeddingRecord, SimilarityResult};

/// Cosine similarity of two vectors.
///
/// Each vector is divided by its largest absolute component before the dot
/// product and norms are accumulated, so any vector with a non-zero norm is
/// representable regardless of magnitude. Returns exactly 0.0 when lengths
/// differ, when either vector is all zeros, or when the arithmetic does not
/// produce a finite value.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (sa, sb) = (max_abs(a), max_abs(b));
    if sa == 0.0 || sb == 0.0 {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x / sa, y / sb);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let sim = dot / (na.sqrt() * nb.sqrt());
    if sim.is_finite() { sim.clamp(-1.0, 1.0) } else { 0.0 }
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0f64, |m, x| m.max(x.abs()))
}

/// Score every record against `query` and return the best `top_k`, highest first.
///
/// Records with absent or malformed features score 0 and stay in the output.
/// Ties keep store order. `store` is not modified.
pub fn rank(query: &[f64], store: &[EmbeddingRecord], top_k: usize) -> Vec<SimilarityResult> {
    if top_k == 0 || store.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<SimilarityResult> = store
        .iter()
        .map(|record| SimilarityResult {
            similarity: record.features.as_deref().map_or(0.0, |f| cosine_similarity(query, f)),
            record: record.clone(),
        })
        .collect();
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, features: Option<Vec<f64>>) -> EmbeddingRecord {
        EmbeddingRecord {
            id: id.to_string(),
            folder: String::new(),
            display_name: id.to_string(),
            original_path: format!("{id}.png"),
            image_url: format!("/assets/{id}.png"),
            features,
            model_used: "m".to_string(),
        }
    }

    #[test]
    fn self_similarity_is_one() {
        let cases = [
            vec![1.0, 2.0, 3.0],
            vec![-0.5, 1e-3, 42.0, 7.0],
            vec![1e150, 1e150],
            vec![1e-200, 2e-200],
            vec![1e200, 1e200],
            vec![3e-170],
            vec![f64::MAX, -f64::MAX, 1.0],
            vec![f64::MIN_POSITIVE, 0.0],
        ];
        for v in cases {
            let s = cosine_similarity(&v, &v);
            assert!((s - 1.0).abs() < 1e-12, "{v:?} -> {s}");
        }
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn extreme_magnitudes_keep_direction() {
        assert!((cosine_similarity(&[1e-200, 0.0], &[1e200, 0.0]) - 1.0).abs() < 1e-12);
        assert!((cosine_similarity(&[1e-200, 0.0], &[0.0, 1e-200])).abs() < 1e-12);
        assert!((cosine_similarity(&[3e-170], &[-5e180]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn tiny_vectors_rank_with_full_score() {
        let store = vec![rec("zero", Some(vec![0.0, 0.0])), rec("tiny", Some(vec![1e-200, 2e-200]))];
        let out = rank(&[1e-200, 2e-200], &store, 2);
        assert_eq!(out[0].record.id, "tiny");
        assert!((out[0].similarity - 1.0).abs() < 1e-12);
        assert_eq!(out[1].similarity, 0.0);
    }

    #[test]
    fn rank_orders_and_truncates() {
        let store = vec![
            rec("far", Some(vec![0.0, 1.0])),
            rec("near", Some(vec![1.0, 0.1])),
            rec("exact", Some(vec![2.0, 0.0])),
        ];
        let out = rank(&[1.0, 0.0], &store, 2);
        let ids: Vec<&str> = out.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "near"]);
        assert!((out[0].similarity - 1.0).abs() < 1e-12);
        assert_eq!(rank(&[1.0, 0.0], &store, 10).len(), 3);
        assert!(rank(&[1.0, 0.0], &store, 0).is_empty());
        assert!(rank(&[1.0, 0.0], &[], 5).is_empty());
    }

    #[test]
    fn ties_keep_store_order_and_malformed_rank_last() {
        let store = vec![
            rec("broken", None),
            rec("a", Some(vec![1.0, 1.0])),
            rec("short", Some(vec![1.0])),
            rec("b", Some(vec![2.0, 2.0])),
            rec("c", Some(vec![4.0, 4.0])),
        ];
        let out = rank(&[1.0, 1.0], &store, 5);
        let ids: Vec<&str> = out.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "broken", "short"]);
        assert_eq!(out[3].similarity, 0.0);
        assert_eq!(out[4].similarity, 0.0);
        for w in out.windows(2) {
            assert!(w[0].similarity >= w[1].similarity);
        }
    }

    #[test]
    fn rank_does_not_mutate_store() {
        let store = vec![rec("x", Some(vec![0.0, 1.0])), rec("y", Some(vec![1.0, 0.0]))];
        let before = store.clone();
        let _ = rank(&[1.0, 0.0], &store, 2);
        assert_eq!(store, before);
    }
}

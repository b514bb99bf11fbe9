//! Embedding blob encoding and cosine-similarity search.
//!
//! SQLite has no native vector column, so embeddings are stored as raw
//! little-endian `f32` bytes and similarity search is a linear scan scored
//! in-process. This stands in for the `<=>` operator a Postgres+pgvector
//! deployment would use; it is adequate at the single-project, low-tens-of-
//! thousands-of-rows scale this pipeline targets.

/// Encode an embedding vector as a little-endian `f32` byte blob.
pub fn encode(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a little-endian `f32` byte blob back into an embedding vector.
///
/// Returns `None` if `bytes` is not a multiple of 4 bytes long.
pub fn decode(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

/// Cosine similarity between two equal-length vectors, in `[-1.0, 1.0]`.
/// Returns `0.0` for mismatched lengths or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A candidate scored against a query embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch<T> {
    pub item: T,
    pub similarity: f32,
}

/// Score every candidate against `query`, keep those at or above `cutoff`,
/// sort descending by similarity, and truncate to `top_k`.
pub fn top_k_above_cutoff<T>(
    query: &[f32],
    candidates: impl IntoIterator<Item = (T, Vec<f32>)>,
    cutoff: f32,
    top_k: usize,
) -> Vec<ScoredMatch<T>> {
    let mut scored: Vec<ScoredMatch<T>> = candidates
        .into_iter()
        .map(|(item, embedding)| ScoredMatch {
            similarity: cosine_similarity(query, &embedding),
            item,
        })
        .filter(|m| m.similarity >= cutoff)
        .collect();

    scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let original = vec![0.1_f32, -0.2, 0.3, 1.0];
        let bytes = encode(&original);
        let decoded = decode(&bytes).unwrap();
        for (a, b) in original.iter().zip(decoded.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn decode_rejects_misaligned_length() {
        assert!(decode(&[0, 1, 2]).is_none());
    }

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0_f32, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_vectors_is_zero() {
        let a = vec![1.0_f32, 0.0];
        let b = vec![0.0_f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_length_is_zero() {
        let a = vec![1.0_f32, 2.0];
        let b = vec![1.0_f32];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn top_k_above_cutoff_filters_sorts_and_truncates() {
        let query = vec![1.0_f32, 0.0];
        let candidates = vec![
            ("low", vec![0.0_f32, 1.0]),
            ("high", vec![1.0_f32, 0.01]),
            ("mid", vec![0.7_f32, 0.7]),
        ];
        let results = top_k_above_cutoff(&query, candidates, 0.5, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item, "high");
    }
}

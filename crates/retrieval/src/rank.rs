//! Pure ranking over scored candidates.

use crate::types::RetrievalCandidate;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Merge order: score descending, then per-document rank, then doc id.
fn compare(a: &RetrievalCandidate, b: &RetrievalCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.doc_rank.cmp(&b.doc_rank))
        .then_with(|| a.doc_id.cmp(&b.doc_id))
        .then(a.position.cmp(&b.position))
}

/// Rank candidates from every document and keep the best `final_k`.
pub fn rank_candidates(
    candidates: &[RetrievalCandidate],
    final_k: usize,
) -> Vec<RetrievalCandidate> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(compare);
    ranked.truncate(final_k);
    ranked
}

/// Document ids in order of first appearance, each once.
pub fn unique_sources(candidates: &[RetrievalCandidate]) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|c| seen.insert(c.doc_id.as_str()))
        .map(|c| c.doc_id.clone())
        .collect()
}

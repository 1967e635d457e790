//! Relevance ranking of search results by title similarity.

use crate::scene::SearchResult;

/// Scale applied to the similarity ratio before comparing.
const SCORE_SCALE: f64 = 1000.0;

/// Ratcliff/Obershelp similarity (`2 * matches / total_len`) in `0.0..=1.0`.
///
/// Matches are found by taking the longest common block, then recursing on
/// the unmatched text to its left and right.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Relevance score of `title` for `query`, case-insensitive.
pub fn relevance_score(query: &str, title: &str) -> f64 {
    similarity_ratio(&query.to_lowercase(), &title.to_lowercase()) * SCORE_SCALE
}

/// Sort results by descending relevance to `query`. Equal scores keep their
/// input (fetch) order.
pub fn rank(results: Vec<SearchResult>, query: &str) -> Vec<SearchResult> {
    let mut scored: Vec<(f64, SearchResult)> = results
        .into_iter()
        .map(|r| (relevance_score(query, &r.title), r))
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, r)| r).collect()
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    total
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`, earliest in `a`
/// then earliest in `b` on ties. Returns `(start_a, start_b, len)`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    // run[j + 1] = length of the common run ending at (i - 1, j)
    let mut run = vec![0usize; b.len() + 1];

    for i in alo..ahi {
        let mut next = vec![0usize; b.len() + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let len = run[j] + 1;
                next[j + 1] = len;
                if len > best_len {
                    best_i = i + 1 - len;
                    best_j = j + 1 - len;
                    best_len = len;
                }
            }
        }
        run = next;
    }

    (best_i, best_j, best_len)
}

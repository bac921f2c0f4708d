//! String similarity scorers.
//!
//! Every scorer maps two strings to a score in `[0, 100]`. The base measure is
//! the normalised Indel similarity (insertions and deletions only) computed by
//! `rapidfuzz` over Unicode scalar values. Scorers are pure: the same pair
//! always produces the same score, and the argument order is preserved.

use std::collections::BTreeSet;

use fuzzmatch_model::ScorerKind;
use rapidfuzz::distance::indel;

/// Score `left` against `right` with the selected scorer.
pub fn similarity(kind: ScorerKind, left: &str, right: &str) -> f64 {
    match kind {
        ScorerKind::SetRatio => set_ratio(left, right),
        ScorerKind::SortRatio => sort_ratio(left, right),
        ScorerKind::TokenRatio => token_ratio(left, right),
        ScorerKind::WholeStringRatio => whole_string_ratio(left, right),
    }
}

/// Normalised Indel similarity of two strings, scaled to `[0, 100]`.
///
/// Two empty strings are identical and score 100.
pub fn ratio(left: &str, right: &str) -> f64 {
    let lensum = left.chars().count() + right.chars().count();
    let distance = indel::distance(left.chars(), right.chars());
    norm_distance(distance, lensum)
}

/// Similarity of the unordered token sets.
///
/// Returns 0 when either side has no tokens and 100 when the sets share at
/// least one token and one set contains the other.
pub fn set_ratio(left: &str, right: &str) -> f64 {
    let tokens_left = token_set(left);
    let tokens_right = token_set(right);
    if tokens_left.is_empty() || tokens_right.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_left.intersection(&tokens_right).copied().collect();
    let diff_lr: Vec<&str> = tokens_left.difference(&tokens_right).copied().collect();
    let diff_rl: Vec<&str> = tokens_right.difference(&tokens_left).copied().collect();

    if !intersection.is_empty() && (diff_lr.is_empty() || diff_rl.is_empty()) {
        return 100.0;
    }

    let diff_lr_joined = diff_lr.join(" ");
    let diff_rl_joined = diff_rl.join(" ");
    let lr_len = diff_lr_joined.chars().count();
    let rl_len = diff_rl_joined.chars().count();
    let sect_len = intersection.join(" ").chars().count();

    // Lengths of "sect + diff" on each side; the separator only exists when
    // the intersection is non-empty.
    let separator = usize::from(sect_len != 0);
    let sect_lr_len = sect_len + separator + lr_len;
    let sect_rl_len = sect_len + separator + rl_len;

    // Both "sect + diff" strings share the same prefix, so their distance is
    // the distance between the differences alone.
    let distance = indel::distance(diff_lr_joined.chars(), diff_rl_joined.chars());
    let diff_score = norm_distance(distance, sect_lr_len + sect_rl_len);
    if sect_len == 0 {
        return diff_score;
    }

    // sect <-> sect + diff differs only by the appended difference.
    let sect_lr_score = norm_distance(separator + lr_len, sect_len + sect_lr_len);
    let sect_rl_score = norm_distance(separator + rl_len, sect_len + sect_rl_len);

    diff_score.max(sect_lr_score).max(sect_rl_score)
}

/// Ratio of both strings after sorting their tokens alphabetically.
pub fn sort_ratio(left: &str, right: &str) -> f64 {
    ratio(&sorted_tokens(left), &sorted_tokens(right))
}

/// The better of [`set_ratio`] and [`sort_ratio`].
pub fn token_ratio(left: &str, right: &str) -> f64 {
    if left.split_whitespace().next().is_none() || right.split_whitespace().next().is_none() {
        return 0.0;
    }
    set_ratio(left, right).max(sort_ratio(left, right))
}

/// Ratio of the whole strings after lowercasing and collapsing whitespace.
///
/// Returns 0 when either side is empty after normalisation.
pub fn whole_string_ratio(left: &str, right: &str) -> f64 {
    let left = light_normalize(left);
    let right = light_normalize(right);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    ratio(&left, &right)
}

fn norm_distance(distance: usize, lensum: usize) -> f64 {
    if lensum == 0 {
        return 100.0;
    }
    100.0 - 100.0 * distance as f64 / lensum as f64
}

fn token_set(value: &str) -> BTreeSet<&str> {
    value.split_whitespace().collect()
}

fn sorted_tokens(value: &str) -> String {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn light_normalize(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

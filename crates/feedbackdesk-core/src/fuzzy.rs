//! Scored teacher-name matching.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::types::Teacher;

/// Fold a name for comparison: strip diacritics, lowercase, and collapse
/// every run of non-letters into a single space.
pub fn normalize_name(input: &str) -> String {
    let folded: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// +1 per target token found inside the candidate, +2 for an exact match.
/// Both arguments must already be normalized.
pub fn score(target: &str, candidate: &str) -> u32 {
    let overlap = target
        .split_whitespace()
        .filter(|token| candidate.contains(token))
        .count() as u32;
    let exact = if !target.is_empty() && target == candidate { 2 } else { 0 };
    overlap + exact
}

/// The highest-scoring candidate, or `None` when nothing scores above zero.
///
/// On equal scores the earlier candidate wins, so callers pass the list in a
/// deterministic order (the store returns teachers sorted by name).
pub fn best_match<'a>(target: &str, candidates: &'a [Teacher]) -> Option<&'a Teacher> {
    let target = normalize_name(target);
    let mut best: Option<(&Teacher, u32)> = None;
    for teacher in candidates {
        let s = score(&target, &normalize_name(&teacher.name));
        if s > best.map_or(0, |(_, b)| b) {
            best = Some((teacher, s));
        }
    }
    best.map(|(teacher, _)| teacher)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    fn teachers(names: &[&str]) -> Vec<Teacher> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Teacher { id: i.to_string(), name: (*n).to_owned(), email: None })
            .collect()
    }

    #[test]
    fn normalize_strips_diacritics_and_punctuation() {
        assert_eq!(normalize_name("  José  O'Brien-Núñez "), "jose o brien nunez");
        assert_eq!(normalize_name("Ms. Zoë 2nd"), "ms zoe nd");
    }

    #[test]
    fn exact_match_beats_partial_overlap() {
        let list = teachers(&["Samantha Oliveira", "Sam Bishop"]);
        let found = best_match("sam bishop", &list).unwrap();
        assert_eq!(found.name, "Sam Bishop");
    }

    #[test]
    fn exact_match_scores_tokens_plus_bonus() {
        assert_eq!(score("sam bishop", "sam bishop"), 4);
        assert_eq!(score("sam bishop", "samantha oliveira"), 1);
        assert_eq!(score("sam bishop", "maria lopes"), 0);
    }

    #[test]
    fn accented_names_match_plain_input() {
        let list = teachers(&["Ana Lúcia Gonçalves", "Bruno Costa"]);
        assert_eq!(best_match("ana goncalves", &list).unwrap().name, "Ana Lúcia Gonçalves");
    }

    #[test]
    fn ties_keep_first_seen() {
        let list = teachers(&["Sam Adams", "Sam Bishop"]);
        assert_eq!(best_match("sam", &list).unwrap().name, "Sam Adams");
    }

    #[test]
    fn zero_score_is_no_match() {
        let list = teachers(&["Sam Bishop"]);
        assert!(best_match("oliveira", &list).is_none());
        assert!(best_match("   ", &list).is_none());
    }
}

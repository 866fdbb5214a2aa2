//! Trigram similarity in the style of PostgreSQL's `pg_trgm`.
//!
//! `strict_similarity` is the score the refinement stage thresholds on. It is
//! exactly 1.0 only for texts with the same word sequence (case and
//! punctuation aside), which is what makes the default threshold of 1.0 an
//! exact-match test.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::normalize::words;

pub type Trigram = [char; 3];

// ============================================================================
// TRIGRAMS
// ============================================================================

/// Trigrams of one word, padded with two leading blanks and one trailing.
fn word_trigrams(word: &str, out: &mut FxHashSet<Trigram>) {
    let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
    for w in padded.windows(3) {
        out.insert([w[0], w[1], w[2]]);
    }
}

fn trigrams_of_words<S: AsRef<str>>(ws: &[S]) -> FxHashSet<Trigram> {
    let mut set = FxHashSet::default();
    for w in ws {
        word_trigrams(w.as_ref(), &mut set);
    }
    set
}

/// Trigram set of a text, words lowercased.
pub fn trigrams(text: &str) -> FxHashSet<Trigram> {
    trigrams_of_words(&words(text))
}

fn jaccard(a: &FxHashSet<Trigram>, b: &FxHashSet<Trigram>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let common = a.intersection(b).count();
    common as f64 / (a.len() + b.len() - common) as f64
}

// ============================================================================
// SCORES
// ============================================================================

/// Shared-trigram ratio of two texts.
pub fn similarity(a: &str, b: &str) -> f64 {
    jaccard(&trigrams(a), &trigrams(b))
}

/// Best similarity between `a` and any run of whole words in `b`.
pub fn strict_word_similarity(a: &str, b: &str) -> f64 {
    let target = trigrams(a);
    let b_words = words(b);
    if target.is_empty() || b_words.is_empty() {
        return 0.0;
    }
    best_extent(&target, &b_words)
}

/// Highest score of any whole-word run of `b_words` against `target`.
///
/// Trigrams are interned once, and each run start reuses one stamp table
/// instead of rebuilding a set. Starts are scanned left to right. The target
/// trigrams still reachable from a start only shrink, and `covered / t` bounds
/// every run from there, so the scan stops once that bound drops to the best
/// score. For near-identical texts this settles after a few starts.
fn best_extent(target: &FxHashSet<Trigram>, b_words: &[String]) -> f64 {
    let t = target.len();
    if t == 0 || b_words.is_empty() {
        return 0.0;
    }

    let mut ids: FxHashMap<Trigram, usize> = FxHashMap::default();
    let mut in_target: Vec<bool> = Vec::new();
    let mut per_word: Vec<Vec<usize>> = Vec::with_capacity(b_words.len());
    for word in b_words {
        let mut set = FxHashSet::default();
        word_trigrams(word, &mut set);
        let mut word_ids = Vec::with_capacity(set.len());
        for tri in set {
            let next = ids.len();
            let id = *ids.entry(tri).or_insert(next);
            if id == next {
                in_target.push(target.contains(&tri));
            }
            word_ids.push(id);
        }
        per_word.push(word_ids);
    }

    // covered[start]: distinct target trigrams in b_words[start..]
    let mut covered = vec![0usize; per_word.len()];
    let mut reached = vec![false; ids.len()];
    let mut count = 0;
    for (start, word) in per_word.iter().enumerate().rev() {
        for &id in word {
            if in_target[id] && !reached[id] {
                reached[id] = true;
                count += 1;
            }
        }
        covered[start] = count;
    }

    let t_f = t as f64;
    let mut stamp = vec![usize::MAX; ids.len()];
    let mut best = 0.0_f64;
    for start in 0..per_word.len() {
        if covered[start] as f64 / t_f <= best {
            break;
        }
        let mut extent = 0usize;
        let mut common = 0usize;
        for word in &per_word[start..] {
            for &id in word {
                if stamp[id] != start {
                    stamp[id] = start;
                    extent += 1;
                    if in_target[id] {
                        common += 1;
                    }
                }
            }
            let score = common as f64 / (t_f + (extent - common) as f64);
            if score > best {
                best = score;
                if best >= 1.0 {
                    return 1.0;
                }
            }
            // Trigrams outside the target only accumulate, so this bounds
            // every longer extent from the same start.
            let misses = (extent - common) as f64;
            if t_f / (t_f + misses) <= best {
                break;
            }
        }
    }
    best
}

/// Symmetric, order-sensitive strict similarity in `[0, 1]`.
///
/// Returns 1.0 exactly when both texts have the same lowercase word sequence.
/// Otherwise the lower of the two directional strict word similarities. When
/// both texts use the same vocabulary in a different arrangement the trigram
/// scores cannot tell them apart, so the score falls back to the share of
/// word positions that line up (`1 - levenshtein / longest`).
pub fn strict_similarity(a: &str, b: &str) -> f64 {
    let wa = words(a);
    let wb = words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    if wa == wb {
        return 1.0;
    }
    score_words(&wa, &wb, &trigrams_of_words(&wa), &trigrams_of_words(&wb))
}

// generic_levenshtein wants a sized iterable, hence &Vec.
#[allow(clippy::ptr_arg)]
fn score_words(wa: &Vec<String>, wb: &Vec<String>, ta: &FxHashSet<Trigram>, tb: &FxHashSet<Trigram>) -> f64 {
    let score = best_extent(ta, wb).min(best_extent(tb, wa));
    if score < 1.0 {
        return score;
    }

    let distance = strsim::generic_levenshtein(wa, wb);
    let longest = wa.len().max(wb.len());
    1.0 - distance as f64 / longest as f64
}

/// Null-aware form used by the SQL function: a missing value on either side
/// never matches.
pub fn strict_similarity_opt(a: Option<&str>, b: Option<&str>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(strict_similarity(a, b)),
        _ => None,
    }
}

/// Whether `strict_similarity(a, b) >= threshold`, without scoring when the
/// answer is already known. A missing value on either side never passes.
///
/// Only identical word sequences reach 1.0, so a threshold of 1.0 is a plain
/// word comparison. Below that, each direction scores at most
/// `shared / own trigram count`, which rejects most pairs before the extent
/// search runs.
pub fn reaches_threshold(a: Option<&str>, b: Option<&str>, threshold: f64) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    let wa = words(a);
    let wb = words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0 >= threshold;
    }
    if wa == wb {
        return true;
    }
    if threshold >= 1.0 {
        return false;
    }

    let ta = trigrams_of_words(&wa);
    let tb = trigrams_of_words(&wb);
    let shared = ta.intersection(&tb).count() as f64;
    if shared / (ta.len().max(tb.len()) as f64) < threshold {
        return false;
    }
    score_words(&wa, &wb, &ta, &tb) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigrams_padding() {
        let t = trigrams("ab");
        assert!(t.contains(&[' ', ' ', 'a']));
        assert!(t.contains(&[' ', 'a', 'b']));
        assert!(t.contains(&['a', 'b', ' ']));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_trigrams_case_insensitive() {
        assert_eq!(trigrams("Climate"), trigrams("CLIMATE"));
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("rainfall", "rainfall"), 1.0);
        assert_eq!(similarity("rainfall", ""), 0.0);
        let s = similarity("rainfall", "snowfall");
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn test_strict_word_similarity_extent() {
        assert_eq!(strict_word_similarity("climate", "climate data"), 1.0);
        let partial = strict_word_similarity("word", "two words");
        assert!((partial - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_strict_exact_match() {
        assert_eq!(strict_similarity("Dataset 1", "Dataset 1"), 1.0);
        assert_eq!(strict_similarity("DATASET 1", "dataset 1"), 1.0);
        assert_eq!(strict_similarity("Dataset-1", "Dataset 1"), 1.0);
    }

    #[test]
    fn test_strict_different_numbers() {
        assert!(strict_similarity("Dataset 1", "Dataset 2") < 1.0);
    }

    #[test]
    fn test_strict_word_order_matters() {
        let s = strict_similarity("climate data", "data climate");
        assert!(s < 1.0);
        assert!(s >= 0.0);
    }

    #[test]
    fn test_strict_repeated_words() {
        assert!(strict_similarity("data data", "data") < 1.0);
    }

    #[test]
    fn test_strict_subset_is_not_exact() {
        assert!(strict_similarity("Climate data", "Climate data 2020") < 1.0);
        assert!(strict_similarity("Climate data 2020", "Climate data") < 1.0);
    }

    #[test]
    fn test_strict_symmetric() {
        let pairs = [
            ("Climate change dataset", "Climate data"),
            ("Notes 1", "Notes 12"),
            ("a b c", "c b a"),
        ];
        for (a, b) in pairs {
            assert_eq!(strict_similarity(a, b), strict_similarity(b, a));
        }
    }

    #[test]
    fn test_strict_empty() {
        assert_eq!(strict_similarity("", ""), 0.0);
        assert_eq!(strict_similarity("text", "  "), 0.0);
    }

    #[test]
    fn test_strict_opt_null() {
        assert_eq!(strict_similarity_opt(None, Some("a")), None);
        assert_eq!(strict_similarity_opt(Some("a"), Some("a")), Some(1.0));
    }

    /// `n` generated words followed by `last`.
    fn long_notes(n: usize, last: &str) -> String {
        let mut text: Vec<String> = (0..n)
            .map(|i| {
                let mut word = String::new();
                let mut k = i;
                loop {
                    word.push((b'a' + (k % 26) as u8) as char);
                    k /= 26;
                    if k == 0 {
                        break;
                    }
                }
                word
            })
            .collect();
        text.push(last.to_string());
        text.join(" ")
    }

    #[test]
    fn test_reaches_threshold_agrees_with_score() {
        let pairs = [
            ("Dataset 1", "Dataset 1"),
            ("Dataset 1", "dataset-1"),
            ("Notes 1", "Notes 1 updated"),
            ("Climate change dataset", "Climate data"),
            ("climate data", "data climate"),
            ("data data", "data"),
            ("rainfall", "snowfall"),
        ];
        for (a, b) in pairs {
            let score = strict_similarity(a, b);
            for threshold in [0.1, 0.3, 0.5, 0.8, 1.0] {
                assert_eq!(
                    reaches_threshold(Some(a), Some(b), threshold),
                    score >= threshold,
                    "{:?} vs {:?} at {}",
                    a,
                    b,
                    threshold
                );
            }
        }
    }

    #[test]
    fn test_reaches_threshold_null() {
        assert!(!reaches_threshold(None, Some("Notes 1"), 0.1));
        assert!(!reaches_threshold(Some("Notes 1"), None, 0.1));
        assert!(!reaches_threshold(Some(""), Some(""), 1.0));
    }

    #[test]
    fn test_long_notes_differing_in_last_word() {
        let a = long_notes(5000, "zebra");
        let b = long_notes(5000, "yak");

        assert!(!reaches_threshold(Some(a.as_str()), Some(b.as_str()), 1.0));
        assert!(reaches_threshold(Some(a.as_str()), Some(a.to_uppercase().as_str()), 1.0));

        let score = strict_similarity(&a, &b);
        assert!(score < 1.0);
        assert!(score > 0.9);
        assert!(reaches_threshold(Some(a.as_str()), Some(b.as_str()), 0.9));
    }
}

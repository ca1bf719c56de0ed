use crate::error::{InputSource, RankError};

/// Score returned for an empty abbreviation.
///
/// Deliberately below a perfect match so a literal typed match always outranks
/// the implicit "everything matches nothing" case.
pub const PASS_THROUGH_SCORE: f64 = 0.9;

/// Penalty per non-blank character walked over when a match starts right after
/// a blank.
const PRECEDING_WORD_PENALTY: f64 = 0.15;

#[inline]
fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// Leftmost occurrence of `needle` in `haystack`. `needle` must be non-empty.
fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Score `haystack` against a typed `abbreviation`.
///
/// Returns a value in `[0.0, 1.0]`; `0.0` means no match. Both inputs are
/// compared exactly as given, so callers that want case-insensitive ranking
/// lowercase them first.
pub fn score(haystack: &str, abbreviation: &str) -> f64 {
    let haystack: Vec<char> = haystack.chars().collect();
    let abbreviation: Vec<char> = abbreviation.chars().collect();
    score_chars(&haystack, &abbreviation)
}

/// Byte-level variant of [`score`] for inputs that are not known to be text.
pub fn try_score(haystack: &[u8], abbreviation: &[u8]) -> Result<f64, RankError> {
    let haystack = std::str::from_utf8(haystack)
        .map_err(|err| RankError::invalid(InputSource::Haystack, err))?;
    let abbreviation = std::str::from_utf8(abbreviation)
        .map_err(|err| RankError::invalid(InputSource::Abbreviation, err))?;
    Ok(score(haystack, abbreviation))
}

/// The scorer proper, over decoded scalar values.
///
/// Tries to consume the longest possible prefix of `abbreviation` as one
/// contiguous run, recursing on the remainder and backtracking to shorter runs
/// when the remainder cannot be matched. Each run is searched from the start of
/// `haystack`, not from the previous match.
pub fn score_chars(haystack: &[char], abbreviation: &[char]) -> f64 {
    if abbreviation.is_empty() {
        return PASS_THROUGH_SCORE;
    }
    if abbreviation.len() > haystack.len() {
        return 0.0;
    }

    for run in (1..=abbreviation.len()).rev() {
        let Some(index) = find(haystack, &abbreviation[..run]) else {
            continue;
        };
        if index + abbreviation.len() > haystack.len() {
            continue;
        }

        let rest = &haystack[index + run..];
        let remaining = score_chars(rest, &abbreviation[run..]);
        if remaining <= 0.0 {
            continue;
        }

        let mut consumed = (haystack.len() - rest.len()) as f64;
        if index != 0 {
            if is_blank(haystack[index - 1]) {
                for &c in haystack[..index - 1].iter().rev() {
                    consumed -= if is_blank(c) { 1.0 } else { PRECEDING_WORD_PENALTY };
                }
            } else {
                consumed -= index as f64;
            }
        }

        consumed += remaining * rest.len() as f64;
        return consumed / haystack.len() as f64;
    }

    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_abbreviation_passes_through() {
        assert_eq!(score("anything", ""), PASS_THROUGH_SCORE);
        assert_eq!(score("", ""), PASS_THROUGH_SCORE);
    }

    #[test]
    fn longer_abbreviation_never_matches() {
        assert_eq!(score("abc", "abcd"), 0.0);
        assert_eq!(score("", "a"), 0.0);
    }

    #[test]
    fn exact_match_is_perfect() {
        assert_eq!(score("cache", "cache"), 1.0);
    }

    #[test]
    fn mid_word_match_is_penalized_by_offset() {
        assert_eq!(score("foobar", "bar"), 0.5);
    }

    #[test]
    fn word_boundary_match_discounts_preceding_word() {
        let s = score("foo bar", "bar");
        assert!((s - 0.935_714_285_7).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn tab_counts_as_word_boundary() {
        assert_eq!(score("foo\tbar", "bar"), score("foo bar", "bar"));
    }

    #[test]
    fn boundary_beats_mid_word() {
        assert!(score("foo bar", "bar") > score("foobar", "bar"));
    }

    #[test]
    fn abbreviation_spanning_words() {
        // "cache eviction" / "ce": run "c" at 0, then "e" inside "cache".
        let s = score("cache eviction", "ce");
        assert!(s > 0.0 && s <= 1.0, "got {s}");
        assert_eq!(score("cache eviction", "zz"), 0.0);
    }

    #[test]
    fn backtracks_to_shorter_runs() {
        // "ab" occurs only too far right to leave room for "x"; the scorer
        // must fall back to matching "a" on its own.
        assert_eq!(score("axab", "abx"), 0.0);
        assert!(score("abxab", "abx") > 0.0);
    }

    #[test]
    fn prefix_too_close_to_end_is_skipped() {
        // "b" is found at index 1 but 1 + 3 > 3.
        assert_eq!(score("abc", "bcd"), 0.0);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let cases = [
            ("search index", "si"),
            ("a b c d e", "abcde"),
            ("    leading blanks", "lead"),
            ("x y", "y"),
            ("mississippi", "ssi"),
        ];
        for (haystack, abbreviation) in cases {
            let s = score(haystack, abbreviation);
            assert!((0.0..=1.0).contains(&s), "{haystack:?}/{abbreviation:?} -> {s}");
        }
    }

    #[test]
    fn non_ascii_is_matched_by_scalar_value() {
        assert_eq!(score("größe", "größe"), 1.0);
        assert!(score("straße", "ße") > 0.0);
    }

    #[test]
    fn try_score_rejects_invalid_utf8() {
        let err = try_score(b"ok", &[0x66, 0xff]).unwrap_err();
        assert_eq!(
            err,
            RankError::InvalidInput {
                source_kind: InputSource::Abbreviation,
                valid_up_to: 1,
            }
        );
        assert!(matches!(
            try_score(&[0xc3], b"a"),
            Err(RankError::InvalidInput {
                source_kind: InputSource::Haystack,
                ..
            })
        ));
        assert_eq!(try_score(b"foobar", b"bar"), Ok(0.5));
    }
}

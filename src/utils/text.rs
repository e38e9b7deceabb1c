// src/utils/text.rs

//! Text cleanup helpers for labels and filenames.

use unicode_segmentation::UnicodeSegmentation;

/// Maximum filename length in grapheme clusters.
const MAX_FILENAME_LEN: usize = 150;

/// Characters that are invalid in filenames on common filesystems.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Collapse all whitespace runs (including newlines) into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize a free-text label into a safe filesystem name.
///
/// Invalid characters become `_`, whitespace is collapsed, leading and
/// trailing dots and spaces are trimmed, and the result is capped at 150
/// grapheme clusters.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();

    let collapsed = normalize_whitespace(&replaced);
    let trimmed = collapsed.trim_matches(['.', ' ']);

    trimmed.graphemes(true).take(MAX_FILENAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_invalid_characters() {
        let result = sanitize_filename("A/B: C?.gpx\"x\"");
        for c in super::INVALID_CHARS {
            assert!(!result.contains(*c), "result still contains {c:?}");
        }
        assert_eq!(result, "A_B_ C_.gpx_x_");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            sanitize_filename("蝶ヶ岳\n  三股から\tピストン"),
            "蝶ヶ岳 三股から ピストン"
        );
    }

    #[test]
    fn test_trims_dots_and_spaces() {
        assert_eq!(sanitize_filename(" . 山行記録 . "), "山行記録");
    }

    #[test]
    fn test_caps_length_at_150_graphemes() {
        let long = "山".repeat(300);
        let result = sanitize_filename(&long);
        assert_eq!(result.graphemes(true).count(), 150);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n b\t\tc "), "a b c");
    }
}

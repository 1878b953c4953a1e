use tracing::debug;

use super::outcome::Edit;

/// Quote pairs a generative model likes to wrap its answer in.
const QUOTE_PAIRS: [(char, char); 6] = [
    ('"', '"'),
    ('“', '”'),
    ('«', '»'),
    ('「', '」'),
    ('『', '』'),
    ('\'', '\''),
];

/// Answer prefixes stripped from generated corrections.
const ANSWER_PREFIXES: [&str; 5] = ["纠正后：", "纠正后:", "修改后：", "修改后:", "Corrected:"];

/// Utilities for cleaning backend output and turning it into edits
pub struct TextUtils;

impl TextUtils {
    /// Apply post-processing to a generated correction.
    ///
    /// Falls back to the original sentence when the generated text is empty
    /// or not a plausible correction of it.
    pub fn post_process_text(corrected_text: &str, original_text: &str) -> String {
        let first_line = corrected_text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");

        let mut cleaned = first_line;
        for prefix in ANSWER_PREFIXES {
            if let Some(rest) = cleaned.strip_prefix(prefix) {
                cleaned = rest.trim();
            }
        }
        let cleaned = Self::strip_quotes(cleaned);

        if cleaned.is_empty() {
            debug!("Corrected text is empty, keeping original");
            return original_text.to_string();
        }

        if !Self::is_reasonable_correction(original_text, cleaned) {
            debug!("Corrected text too different from original, keeping original");
            return original_text.to_string();
        }

        cleaned.to_string()
    }

    fn strip_quotes(text: &str) -> &str {
        let trimmed = text.trim();
        for (open, close) in QUOTE_PAIRS {
            if let Some(inner) = trimmed
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
            {
                return inner.trim();
            }
        }
        trimmed
    }

    /// Calculate similarity score between two texts (0.0 = completely different, 1.0 = identical)
    pub fn similarity_score(text1: &str, text2: &str) -> f32 {
        if text1 == text2 {
            return 1.0;
        }

        if text1.is_empty() || text2.is_empty() {
            return 0.0;
        }

        let chars1: Vec<char> = text1.chars().collect();
        let chars2: Vec<char> = text2.chars().collect();
        let max_len = chars1.len().max(chars2.len());

        let matches = chars1
            .iter()
            .zip(chars2.iter())
            .filter(|(a, b)| a == b)
            .count();

        matches as f32 / max_len as f32
    }

    /// Validate that a correction is a plausible edit of the original
    pub fn is_reasonable_correction(original: &str, corrected: &str) -> bool {
        if original == corrected {
            return true;
        }

        if corrected.trim().is_empty() && !original.trim().is_empty() {
            return false;
        }

        let original_len = original.chars().count();
        let corrected_len = corrected.chars().count();
        let length_ratio = corrected_len as f32 / original_len.max(1) as f32;
        if !(0.3..=3.0).contains(&length_ratio) {
            return false;
        }

        // Positional similarity is meaningless once lengths differ
        if original_len == corrected_len && Self::similarity_score(original, corrected) < 0.2 {
            return false;
        }

        true
    }
}

/// Derive the edits that turn `original` into `corrected`.
///
/// Same-length texts yield one edit per differing character. Otherwise the
/// common prefix and suffix are stripped and the differing middle becomes a
/// single edit positioned at the end of the prefix.
pub fn diff_edits(original: &str, corrected: &str) -> Vec<Edit> {
    if original == corrected {
        return Vec::new();
    }

    let before: Vec<char> = original.chars().collect();
    let after: Vec<char> = corrected.chars().collect();

    if before.len() == after.len() {
        return before
            .iter()
            .zip(after.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(index, (a, b))| Edit::at(index, a.to_string(), b.to_string()))
            .collect();
    }

    let prefix = before
        .iter()
        .zip(after.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = before.len().min(after.len()) - prefix;
    let suffix = before
        .iter()
        .rev()
        .zip(after.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let removed: String = before[prefix..before.len() - suffix].iter().collect();
    let inserted: String = after[prefix..after.len() - suffix].iter().collect();

    vec![Edit::at(prefix, removed, inserted)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spell_check::outcome::EditPosition;

    #[test]
    fn test_post_process_empty_corrected_text() {
        let result = TextUtils::post_process_text("", "今天天汽很好");
        assert_eq!(result, "今天天汽很好");
    }

    #[test]
    fn test_post_process_whitespace_only_corrected() {
        let result = TextUtils::post_process_text("  \n  ", "今天天汽很好");
        assert_eq!(result, "今天天汽很好");
    }

    #[test]
    fn test_post_process_strips_quotes_and_prefix() {
        let result = TextUtils::post_process_text("纠正后：“今天天气很好”", "今天天汽很好");
        assert_eq!(result, "今天天气很好");

        let result = TextUtils::post_process_text("«我们一起去公园»\n解释：门应为们", "我门一起去公园");
        assert_eq!(result, "我们一起去公园");
    }

    #[test]
    fn test_post_process_rejects_rewrites() {
        let original = "这个问提很难";
        let rambling = "这是一个很长的回答，它解释了为什么这个句子里有一个错误，并给出了非常多的背景信息和例子";
        let result = TextUtils::post_process_text(rambling, original);
        assert_eq!(result, original);
    }

    #[test]
    fn test_similarity_score_bounds() {
        assert_eq!(TextUtils::similarity_score("天气", "天气"), 1.0);
        assert_eq!(TextUtils::similarity_score("", "天气"), 0.0);

        let score = TextUtils::similarity_score("今天天汽很好", "今天天气很好");
        assert!(score > 0.5);
        assert!(score < 1.0);
    }

    #[test]
    fn test_is_reasonable_correction() {
        assert!(TextUtils::is_reasonable_correction("今天天汽很好", "今天天气很好"));
        assert!(!TextUtils::is_reasonable_correction("今天天汽很好", ""));
        assert!(!TextUtils::is_reasonable_correction("天汽", "今天的天气非常非常好"));
        assert!(!TextUtils::is_reasonable_correction("abcdef", "uvwxyz"));
        assert!(TextUtils::is_reasonable_correction("", ""));
    }

    #[test]
    fn test_diff_edits_identical_texts() {
        assert!(diff_edits("今天天气很好", "今天天气很好").is_empty());
    }

    #[test]
    fn test_diff_edits_same_length_uses_char_positions() {
        let edits = diff_edits("我门一起去公圆", "我们一起去公园");
        assert_eq!(
            edits,
            vec![Edit::at(1, "门", "们"), Edit::at(6, "圆", "园")]
        );
    }

    #[test]
    fn test_diff_edits_length_change_collapses_middle_span() {
        let edits = diff_edits("我们去公园", "我们一起去公园");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].position, EditPosition::Known(2));
        assert_eq!(edits[0].original_char, "");
        assert_eq!(edits[0].corrected_char, "一起");

        let edits = diff_edits("的的确确", "的确");
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].original_char.chars().count(), 2);
        assert_eq!(edits[0].corrected_char, "");
    }
}

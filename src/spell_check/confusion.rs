use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::errors::CorrectionError;
use super::model_manager::ModelManager;
use super::outcome::{CorrectionOutcome, Edit};
use super::text_utils::diff_edits;
use super::Corrector;

/// Common Chinese misspellings and their corrections.
const BUILTIN_PAIRS: &[(&str, &str)] = &[
    ("天汽", "天气"),
    ("我门", "我们"),
    ("问提", "问题"),
    ("因该", "应该"),
    ("以经", "已经"),
    ("坚苦", "艰苦"),
    ("急燥", "急躁"),
    ("辨论", "辩论"),
    ("安祥", "安详"),
    ("松驰", "松弛"),
    ("脉博", "脉搏"),
    ("渲泄", "宣泄"),
    ("再接再励", "再接再厉"),
    ("一愁莫展", "一筹莫展"),
    ("迫不急待", "迫不及待"),
    ("按步就班", "按部就班"),
    ("穿流不息", "川流不息"),
    ("甘败下风", "甘拜下风"),
    ("声名雀起", "声名鹊起"),
    ("谈笑风声", "谈笑风生"),
    ("默守成规", "墨守成规"),
    ("走头无路", "走投无路"),
    ("直接了当", "直截了当"),
];

/// A `wrong → right` lookup with longest-match-first scanning.
#[derive(Debug, Clone, Default)]
pub struct ConfusionTable {
    pairs: HashMap<String, String>,
    max_key_chars: usize,
}

impl ConfusionTable {
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (wrong, right) in BUILTIN_PAIRS {
            table.insert(wrong, right);
        }
        table
    }

    /// Parse a dictionary file: one pair per line, separated by a tab,
    /// whitespace or `=`. Blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self, CorrectionError> {
        if !path.exists() {
            return Err(CorrectionError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = fs::read_to_string(path)?;
        let mut table = Self::default();

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (wrong, right) = line
                .split_once('=')
                .or_else(|| line.split_once(char::is_whitespace))
                .map(|(wrong, right)| (wrong.trim(), right.trim()))
                .filter(|(wrong, right)| !wrong.is_empty() && !right.is_empty())
                .ok_or_else(|| CorrectionError::ModelLoadFailed {
                    path: path.display().to_string(),
                    details: format!("malformed pair on line {}: '{}'", line_no + 1, line),
                })?;

            table.insert(wrong, right);
        }

        info!("Loaded {} confusion pairs from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn insert(&mut self, wrong: &str, right: &str) {
        self.max_key_chars = self.max_key_chars.max(wrong.chars().count());
        self.pairs.insert(wrong.to_string(), right.to_string());
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace every known misspelling, scanning left to right.
    ///
    /// At each position the longest matching key wins and matches never
    /// overlap. Edit positions are character indices into `sentence`.
    pub fn apply(&self, sentence: &str) -> CorrectionOutcome {
        let chars: Vec<char> = sentence.chars().collect();
        let mut corrected = String::with_capacity(sentence.len());
        let mut edits = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let longest = self.max_key_chars.min(chars.len() - i);
            let hit = (1..=longest).rev().find_map(|len| {
                let key: String = chars[i..i + len].iter().collect();
                self.pairs.get(&key).map(|right| (len, key, right))
            });

            match hit {
                Some((len, wrong, right)) => {
                    edits.extend(diff_edits(&wrong, right).into_iter().map(|edit| {
                        let offset = edit.position.index().unwrap_or(0);
                        Edit::at(i + offset, edit.original_char, edit.corrected_char)
                    }));
                    corrected.push_str(right);
                    i += len;
                }
                None => {
                    corrected.push(chars[i]);
                    i += 1;
                }
            }
        }

        CorrectionOutcome::from_edits(sentence, corrected, edits)
    }
}

/// Dictionary-driven corrector for Chinese spelling confusions
#[derive(Debug)]
pub struct ConfusionCorrector {
    name: String,
    dictionary: Option<PathBuf>,
    manager: ModelManager<ConfusionTable>,
}

impl ConfusionCorrector {
    /// A corrector backed by the built-in confusion pairs
    pub fn builtin() -> Self {
        Self {
            name: "Confusion-Dictionary".to_string(),
            dictionary: None,
            manager: ModelManager::new("builtin"),
        }
    }

    /// A corrector backed by a dictionary file, read on first use
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: "Confusion-Dictionary".to_string(),
            manager: ModelManager::new(path.display().to_string()),
            dictionary: Some(path),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn table(&self) -> Result<&ConfusionTable, CorrectionError> {
        self.manager.load_with(|_| match &self.dictionary {
            Some(path) => ConfusionTable::from_file(path),
            None => Ok(ConfusionTable::builtin()),
        })
    }
}

impl Corrector for ConfusionCorrector {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<(), CorrectionError> {
        self.table().map(|_| ())
    }

    fn is_loaded(&self) -> bool {
        self.manager.is_loaded()
    }

    fn correct(&self, sentence: &str) -> Result<CorrectionOutcome, CorrectionError> {
        let outcome = self.table()?.apply(sentence);
        debug!(
            detected = outcome.has_error_detected,
            edits = outcome.edits.len(),
            "Corrected '{}' -> '{}'",
            sentence,
            outcome.corrected
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spell_check::outcome::EditPosition;
    use tempfile::TempDir;

    fn write_dictionary(contents: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("confusion.txt");
        fs::write(&path, contents).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_builtin_corrects_known_confusion() {
        let corrector = ConfusionCorrector::builtin();
        let outcome = corrector.correct("今天天汽很好").unwrap();

        assert_eq!(outcome.corrected, "今天天气很好");
        assert!(outcome.has_error_detected);
        assert_eq!(outcome.edits, vec![Edit::at(3, "汽", "气")]);
    }

    #[test]
    fn test_clean_sentence_is_unchanged() {
        let corrector = ConfusionCorrector::builtin();
        let outcome = corrector.correct("我们一起去公园").unwrap();

        assert_eq!(outcome.corrected, "我们一起去公园");
        assert!(!outcome.has_error_detected);
        assert!(outcome.edits.is_empty());
    }

    #[test]
    fn test_multiple_corrections_in_one_sentence() {
        let corrector = ConfusionCorrector::builtin();
        let outcome = corrector.correct("我门因该再接再励").unwrap();

        assert_eq!(outcome.corrected, "我们应该再接再厉");
        let positions: Vec<EditPosition> = outcome.edits.iter().map(|e| e.position).collect();
        assert_eq!(
            positions,
            vec![
                EditPosition::Known(1),
                EditPosition::Known(2),
                EditPosition::Known(7)
            ]
        );
    }

    #[test]
    fn test_correct_loads_lazily_and_load_is_idempotent() {
        let corrector = ConfusionCorrector::builtin();
        assert!(!corrector.is_loaded());

        corrector.correct("天汽").unwrap();
        assert!(corrector.is_loaded());

        corrector.load().unwrap();
        corrector.load().unwrap();
        assert!(corrector.is_loaded());
    }

    #[test]
    fn test_dictionary_file_longest_match_wins() {
        let (_temp_dir, path) = write_dictionary("# test pairs\nab\tAB\n\nabc = XYZ\n");
        let corrector = ConfusionCorrector::from_file(&path);

        let outcome = corrector.correct("abcd").unwrap();
        assert_eq!(outcome.corrected, "XYZd");

        let outcome = corrector.correct("abd").unwrap();
        assert_eq!(outcome.corrected, "ABd");
    }

    #[test]
    fn test_missing_dictionary_fails_to_load() {
        let corrector = ConfusionCorrector::from_file("/non/existent/confusion.txt");

        let result = corrector.load();
        assert!(matches!(result, Err(CorrectionError::ModelNotFound { .. })));
        assert!(!corrector.is_loaded());

        let result = corrector.correct("天汽");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_dictionary_line() {
        let (_temp_dir, path) = write_dictionary("天汽 天气\n孤零零\n");
        let result = ConfusionTable::from_file(&path);

        match result {
            Err(CorrectionError::ModelLoadFailed { details, .. }) => {
                assert!(details.contains("line 2"));
            }
            other => panic!("Expected ModelLoadFailed, got {:?}", other),
        }
    }
}

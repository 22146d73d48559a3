use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::CompareError;

/// Common English function words, lower-case.
pub const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she",
    "should", "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Which words a [`Wordlist`](super::Wordlist) ignores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stopwords {
    #[default]
    English,
    None,
    Custom(HashSet<String>),
}

impl Stopwords {
    /// One word per line; surrounding whitespace and blank lines are ignored.
    pub fn from_lines(text: &str) -> Self {
        Stopwords::Custom(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self, CompareError> {
        let text = fs::read_to_string(path).map_err(|source| CompareError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_lines(&text))
    }

    pub fn contains(&self, word: &str) -> bool {
        match self {
            Stopwords::English => ENGLISH.contains(&word),
            Stopwords::None => false,
            Stopwords::Custom(words) => words.contains(word),
        }
    }
}

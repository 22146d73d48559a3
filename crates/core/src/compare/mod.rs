//! Scoring OCR transcripts against a ground truth.
//!
//! A [`Wordlist`] is built once from the trusted text; every transcript is
//! then compared against it, producing a serializable [`ComparisonReport`]
//! with word counts, set/bag/sequence similarities at word and letter level,
//! and per-word tallies for terms the caller cares about.

pub mod similarity;
pub mod stopwords;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use similarity::{
    cosine_similarity, jaccard_similarity, smith_waterman_distance, AlignmentScores,
};
pub use stopwords::Stopwords;

/// Word separator used when none is given.
pub const DEFAULT_SPLIT_PATTERN: &str = "[^A-Za-z]+";

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("invalid split pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct WordlistOptions {
    pub split_pattern: String,
    pub ignore_case: bool,
    pub stopwords: Stopwords,
    /// Words to tally separately; a trailing `*` makes a prefix match.
    pub important_words: Vec<String>,
}

impl Default for WordlistOptions {
    fn default() -> Self {
        Self {
            split_pattern: DEFAULT_SPLIT_PATTERN.to_string(),
            ignore_case: true,
            stopwords: Stopwords::default(),
            important_words: Vec::new(),
        }
    }
}

/// Word-level scores use these: OCR tends to add cruft, so insertions are cheap.
pub const WORD_SCORES: AlignmentScores = AlignmentScores {
    matched: 3.0,
    mismatch: -2.0,
    deletion: -2.0,
    insertion: -0.5,
};

/// Tokenized ground truth.
#[derive(Debug, Clone)]
pub struct Wordlist {
    split: Regex,
    ignore_case: bool,
    stopwords: Stopwords,
    important_words: Vec<String>,
    words: Vec<String>,
    unique: HashSet<String>,
    counts: HashMap<String, usize>,
    letters: Vec<char>,
    letter_counts: HashMap<char, usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCounts {
    pub words: usize,
    pub true_words: usize,
    pub missing_words: usize,
    pub extra_words: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptive {
    pub total: WordCounts,
    pub unique: WordCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordSimilarity {
    pub jaccard: f64,
    pub cosine: f64,
    pub swd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LetterSimilarity {
    pub cosine: f64,
    pub swd: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportantWordCount {
    pub true_count: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub descriptive: Descriptive,
    pub word_similarity: WordSimilarity,
    pub letter_similarity: LetterSimilarity,
    pub important_words: BTreeMap<String, ImportantWordCount>,
}

impl Wordlist {
    pub fn new(text: &str, options: &WordlistOptions) -> Result<Self, CompareError> {
        let split = Regex::new(&options.split_pattern)?;
        let important_words = options
            .important_words
            .iter()
            .map(|w| {
                if options.ignore_case {
                    w.to_lowercase()
                } else {
                    w.clone()
                }
            })
            .collect();

        let mut wordlist = Self {
            split,
            ignore_case: options.ignore_case,
            stopwords: options.stopwords.clone(),
            important_words,
            words: Vec::new(),
            unique: HashSet::new(),
            counts: HashMap::new(),
            letters: Vec::new(),
            letter_counts: HashMap::new(),
        };

        wordlist.words = wordlist.tokenize(text);
        wordlist.unique = wordlist.words.iter().cloned().collect();
        wordlist.counts = count(wordlist.words.iter().cloned());
        wordlist.letters = wordlist.letters_of(text);
        wordlist.letter_counts = count(wordlist.letters.iter().copied());

        Ok(wordlist)
    }

    /// Ground-truth words, stopwords removed, in order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    fn normalize(&self, text: &str) -> String {
        if self.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = self.normalize(text);
        self.split
            .split(&text)
            .filter(|w| !w.is_empty() && !self.stopwords.contains(w))
            .map(str::to_string)
            .collect()
    }

    fn letters_of(&self, text: &str) -> Vec<char> {
        self.normalize(text)
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect()
    }

    /// Score `text` against the ground truth.
    pub fn compare(&self, text: &str) -> ComparisonReport {
        let words = self.tokenize(text);
        let unique: HashSet<String> = words.iter().cloned().collect();
        let counts = count(words.iter().cloned());
        let letters = self.letters_of(text);
        let letter_counts = count(letters.iter().copied());

        let total = WordCounts {
            words: words.len(),
            true_words: self.words.len(),
            missing_words: bag_difference(&self.counts, &counts),
            extra_words: bag_difference(&counts, &self.counts),
        };
        let unique_counts = WordCounts {
            words: unique.len(),
            true_words: self.unique.len(),
            missing_words: self.unique.difference(&unique).count(),
            extra_words: unique.difference(&self.unique).count(),
        };

        let important_words = self
            .important_words
            .iter()
            .map(|word| {
                let tally = ImportantWordCount {
                    true_count: tally(&self.counts, word),
                    count: tally(&counts, word),
                };
                (word.clone(), tally)
            })
            .collect();

        ComparisonReport {
            descriptive: Descriptive {
                total,
                unique: unique_counts,
            },
            word_similarity: WordSimilarity {
                jaccard: jaccard_similarity(&self.unique, &unique),
                cosine: cosine_similarity(&self.counts, &counts),
                swd: smith_waterman_distance(&self.words, &words, &WORD_SCORES),
            },
            letter_similarity: LetterSimilarity {
                cosine: cosine_similarity(&self.letter_counts, &letter_counts),
                swd: smith_waterman_distance(
                    &self.letters,
                    &letters,
                    &AlignmentScores::default(),
                ),
            },
            important_words,
        }
    }
}

fn count<T: Eq + Hash>(items: impl Iterator<Item = T>) -> HashMap<T, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Size of the multiset difference `a - b`.
fn bag_difference(a: &HashMap<String, usize>, b: &HashMap<String, usize>) -> usize {
    a.iter()
        .map(|(word, &n)| n.saturating_sub(b.get(word).copied().unwrap_or(0)))
        .sum()
}

/// Occurrences of `word`, or of every word starting with it when it ends in `*`.
fn tally(counts: &HashMap<String, usize>, word: &str) -> usize {
    match word.strip_suffix('*') {
        Some(prefix) => counts
            .iter()
            .filter(|(w, _)| w.starts_with(prefix))
            .map(|(_, &n)| n)
            .sum(),
        None => counts.get(word).copied().unwrap_or(0),
    }
}

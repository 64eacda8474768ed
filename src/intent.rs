//! Detects what a question asks of the uploaded files.
//!
//! Parsing is kept free of side effects; the resolver decides what each
//! [`Intent`] does to its state.

use regex::Regex;
use std::sync::LazyLock;

static COMPARE_BY_TOPIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)compare\s+(?:the\s+)?file\s+(?:about|with)\s+(.+?)\s+(?:and|with)\s+(?:the\s+)?file\s+(?:about|with)\s+(.+)",
    )
    .expect("compare-by-topic pattern is valid")
});

/// A position in the document store addressed by ordinal words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRef {
    First,
    Second,
}

impl FileRef {
    pub fn index(self) -> usize {
        match self {
            FileRef::First => 0,
            FileRef::Second => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// "compare the file about X and the file about Y"
    Compare {
        first_topic: String,
        second_topic: String,
    },
    /// "first file" / "second file"
    SwitchTo(FileRef),
    /// "both files"
    SetCompareMode,
    None,
}

/// Classifies a question. Comparison by topic takes precedence; otherwise the
/// switch phrases are tested in the order "first file", "second file", "both files".
pub fn parse_intent(question: &str) -> Intent {
    if let Some(caps) = COMPARE_BY_TOPIC.captures(question) {
        return Intent::Compare {
            first_topic: normalize_topic_fragment(&caps[1]),
            second_topic: normalize_topic_fragment(&caps[2]),
        };
    }

    let lowered = question.to_lowercase();
    if lowered.contains("first file") {
        Intent::SwitchTo(FileRef::First)
    } else if lowered.contains("second file") {
        Intent::SwitchTo(FileRef::Second)
    } else if lowered.contains("both files") {
        Intent::SetCompareMode
    } else {
        Intent::None
    }
}

// Trailing sentence punctuation would otherwise never match a stored topic.
fn normalize_topic_fragment(fragment: &str) -> String {
    fragment
        .trim()
        .trim_end_matches(['?', '.', '!', ','])
        .trim()
        .to_lowercase()
}

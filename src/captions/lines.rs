use serde::{Deserialize, Serialize};

use crate::transcription::Word;

/// A caption line built from consecutive words or from a slice of segment text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLine {
    pub text: String,
    /// Start of the first constituent word
    pub start: Option<f64>,
    /// End of the last constituent word
    pub end: Option<f64>,
}

/// Words accumulated for the line currently being filled
struct PendingLine<'a> {
    words: Vec<&'a str>,
    start: Option<f64>,
    end: Option<f64>,
    len: usize,
}

impl<'a> PendingLine<'a> {
    fn new() -> Self {
        Self {
            words: Vec::new(),
            start: None,
            end: None,
            len: 0,
        }
    }

    fn push(&mut self, text: &'a str, word: &Word) {
        if self.words.is_empty() {
            self.start = word.start;
        }
        self.len += text.chars().count() + usize::from(!self.words.is_empty());
        self.words.push(text);
        self.end = word.end;
    }

    fn flush_into(&mut self, lines: &mut Vec<CaptionLine>) {
        if self.words.is_empty() {
            return;
        }
        let pending = std::mem::replace(self, PendingLine::new());
        lines.push(CaptionLine {
            text: pending.words.join(" "),
            start: pending.start,
            end: pending.end,
        });
    }
}

/// Group timed words into lines of at most `max_chars` characters.
///
/// Same greedy fill as [`super::wrap_text`], but each line keeps the start of
/// its first word and the end of its last word. Words whose trimmed text is
/// empty are skipped without affecting grouping.
pub fn group_words(words: &[Word], max_chars: usize) -> Vec<CaptionLine> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut pending = PendingLine::new();

    for word in words {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }

        let add_len = text.chars().count() + usize::from(!pending.words.is_empty());
        if pending.len + add_len > max_chars {
            pending.flush_into(&mut lines);
        }
        pending.push(text, word);
    }

    pending.flush_into(&mut lines);
    lines
}

//! Preedit (composition string) as reported by the engine
//!
//! The preedit is the segmented, annotated text shown inline while the user
//! is composing and before anything is committed.

use serde::{Deserialize, Serialize};

/// How a segment is drawn in the host
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// Normal underline for uncommitted preedit text
    #[default]
    Underline,
    /// Highlight for the segment being converted
    Highlight,
}

/// A text attribute with range, in characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreeditAttribute {
    /// Start position (character index)
    pub start: usize,
    /// End position (character index, exclusive)
    pub end: usize,
    pub annotation: Annotation,
}

/// A segment within the preedit text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(default)]
    pub annotation: Annotation,
}

impl Segment {
    pub fn new(text: impl Into<String>, annotation: Annotation) -> Self {
        Self {
            text: text.into(),
            annotation,
        }
    }

    pub fn underlined(text: impl Into<String>) -> Self {
        Self::new(text, Annotation::Underline)
    }

    pub fn highlighted(text: impl Into<String>) -> Self {
        Self::new(text, Annotation::Highlight)
    }
}

/// Segments plus an optional cursor.
///
/// `cursor` is a character offset into the flattened text; `None` lets the
/// host place its default caret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preedit {
    #[serde(default)]
    segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cursor: Option<usize>,
}

impl Preedit {
    /// Create a new empty preedit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preedit from segments. The cursor is clamped to the text length.
    pub fn from_segments(segments: Vec<Segment>, cursor: Option<usize>) -> Self {
        let mut preedit = Self {
            segments,
            cursor: None,
        };
        preedit.cursor = cursor.map(|c| c.min(preedit.len()));
        preedit
    }

    /// A single underlined segment with the cursor at the end
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self::from_segments(vec![Segment::underlined(text)], Some(len))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The flattened text of all segments
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.text.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.is_empty())
    }

    /// Character ranges of each segment, in order
    pub fn attributes(&self) -> Vec<PreeditAttribute> {
        self.segments
            .iter()
            .scan(0usize, |pos, seg| {
                let start = *pos;
                *pos += seg.text.chars().count();
                Some(PreeditAttribute {
                    start,
                    end: *pos,
                    annotation: seg.annotation,
                })
            })
            .collect()
    }
}

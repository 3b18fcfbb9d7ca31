//! Composition buffer: the live preedit plus the typed-input accumulator

use super::preedit::Preedit;

/// Holds what the user is currently composing.
///
/// The preedit is replaced wholesale by [`rebuild`](Self::rebuild) on every
/// engine response. Alongside it the buffer keeps the string of characters
/// the user actually typed, which is sent to the engine as advisory context
/// (spelling fallback). It resets whenever the preedit becomes empty.
#[derive(Debug, Clone, Default)]
pub struct CompositionBuffer {
    preedit: Preedit,
    original_input: String,
}

impl CompositionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole preedit; `None` clears it.
    pub fn rebuild(&mut self, preedit: Option<Preedit>) {
        self.preedit = preedit.unwrap_or_default();
        if self.preedit.is_empty() {
            self.original_input.clear();
        }
    }

    /// Clear the preedit and the accumulator
    pub fn clear(&mut self) {
        self.rebuild(None);
    }

    pub fn preedit(&self) -> &Preedit {
        &self.preedit
    }

    /// Flattened preedit text
    pub fn text(&self) -> String {
        self.preedit.text()
    }

    pub fn is_empty(&self) -> bool {
        self.preedit.is_empty()
    }

    /// Characters typed since the composition started
    pub fn original_input(&self) -> &str {
        &self.original_input
    }

    /// The accumulator as it would read after typing `ch`.
    ///
    /// Does not modify the buffer; the caller stores the result with
    /// [`set_original_input`](Self::set_original_input) once the engine
    /// accepted the key.
    pub fn original_input_with(&self, ch: Option<char>) -> String {
        let mut input = self.original_input.clone();
        if let Some(ch) = ch {
            input.push(ch);
        }
        input
    }

    pub fn set_original_input(&mut self, input: String) {
        self.original_input = input;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::preedit::Segment;

    #[test]
    fn test_rebuild_replaces_wholesale() {
        let mut buffer = CompositionBuffer::new();
        buffer.rebuild(Some(Preedit::from_segments(
            vec![Segment::underlined("か"), Segment::underlined("な")],
            None,
        )));
        assert_eq!(buffer.text(), "かな");

        buffer.rebuild(Some(Preedit::with_text("漢")));
        assert_eq!(buffer.text(), "漢");
        assert_eq!(buffer.preedit().segments().len(), 1);
    }

    #[test]
    fn test_original_input_resets_on_empty() {
        let mut buffer = CompositionBuffer::new();
        buffer.set_original_input(buffer.original_input_with(Some('k')));
        buffer.rebuild(Some(Preedit::with_text("k")));
        buffer.set_original_input(buffer.original_input_with(Some('a')));
        buffer.rebuild(Some(Preedit::with_text("か")));
        assert_eq!(buffer.original_input(), "ka");

        buffer.rebuild(None);
        assert!(buffer.is_empty());
        assert_eq!(buffer.original_input(), "");
    }

    #[test]
    fn test_original_input_with_does_not_mutate() {
        let buffer = CompositionBuffer::new();
        assert_eq!(buffer.original_input_with(Some('x')), "x");
        assert_eq!(buffer.original_input(), "");
    }
}

//! Transcript accumulation for the current spoken turn

/// Accumulated text of the in-progress spoken turn
///
/// Append-only within a turn; cleared when the turn completes or is
/// interrupted.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    text: String,
}

impl TranscriptBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transcript fragment
    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    /// Clear the buffer at a turn boundary
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Current accumulated text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether anything has accumulated this turn
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

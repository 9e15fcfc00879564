//! Status text shown over the map while a source loads.

/// A text surface over the map.
pub trait Overlay {
    /// Remove all text.
    fn clear(&mut self);

    /// Add a line of text.
    fn append_text(&mut self, text: &str);
}

/// Overlay that keeps its lines in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    lines: Vec<String>,
}

impl MessageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines currently shown.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether the last line shown is `text`.
    #[must_use]
    pub fn ends_with(&self, text: &str) -> bool {
        self.lines.last().is_some_and(|line| line == text)
    }
}

impl Overlay for MessageLog {
    fn clear(&mut self) {
        self.lines.clear();
    }

    fn append_text(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

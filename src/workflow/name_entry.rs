use crate::database::{NameRules, ValidationError};

/// Keystroke-by-keystroke name capture.
///
/// Characters past the maximum length are ignored rather than rejected,
/// so holding a key never produces an error. The minimum is only checked
/// when the name is finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameEntry {
    text: String,
    rules: NameRules,
}

impl NameEntry {
    pub fn new(rules: NameRules) -> Self {
        Self {
            text: String::new(),
            rules,
        }
    }

    pub fn with_text(rules: NameRules, text: &str) -> Self {
        let mut entry = Self::new(rules);
        text.chars().for_each(|c| {
            entry.push(c);
        });
        entry
    }

    /// Appends `c` if it is printable and there is room. Returns whether it was taken.
    pub fn push(&mut self, c: char) -> bool {
        if c.is_control() || self.len() >= self.rules.max_len {
            return false;
        }
        self.text.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn finish(&self) -> Result<String, ValidationError> {
        self.rules.validate(&self.text)?;
        Ok(self.text.clone())
    }
}

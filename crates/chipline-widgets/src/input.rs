#![forbid(unsafe_code)]

//! Single-line text box.
//!
//! The editor embedded in a tag collection: value, cursor, placeholder
//! text, and the width model for the input slot. Grapheme-cluster aware for
//! correct Unicode handling. No selection or masking — chips don't need
//! either.

use chipline_core::event::{KeyCode, KeyEvent, Modifiers};
use chipline_core::geometry::{Rect, Sides};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Extra cells added to the measured text width so the cursor and the next
/// typed character have room.
const WIDTH_PAD: u16 = 2;

/// A single-line text box.
#[derive(Debug, Clone)]
pub struct TextBox {
    /// Text value.
    value: String,
    /// Cursor position (grapheme index).
    cursor: usize,
    /// Placeholder text.
    placeholder: String,
    /// Minimum width of the input slot in cells.
    min_width: u16,
}

impl Default for TextBox {
    fn default() -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            placeholder: String::new(),
            min_width: 4,
        }
    }
}

impl TextBox {
    /// Create a new empty text box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder text (builder).
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the minimum slot width in cells (builder).
    pub fn with_min_width(mut self, min_width: u16) -> Self {
        self.min_width = min_width;
        self
    }

    // --- Value access ---

    /// Get the current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Set the value, clamping the cursor to the valid range.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.cursor.min(self.grapheme_count());
    }

    /// Clear all text.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Get the cursor position (grapheme index).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Placeholder text.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    // --- Event handling ---

    /// Handle an editing key. Returns `true` if value or cursor changed.
    ///
    /// Only plain editing keys are handled here; the owning collection
    /// intercepts submit keys and empty-input deletions before delegating.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(Modifiers::CTRL);

        match key.code {
            KeyCode::Char(c) if !ctrl => {
                self.insert_char(c);
                true
            }
            KeyCode::Backspace => self.delete_char_back(),
            KeyCode::Delete => self.delete_char_forward(),
            KeyCode::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    true
                } else {
                    false
                }
            }
            KeyCode::Right => {
                if self.cursor < self.grapheme_count() {
                    self.cursor += 1;
                    true
                } else {
                    false
                }
            }
            KeyCode::Home => {
                let moved = self.cursor != 0;
                self.cursor = 0;
                moved
            }
            KeyCode::End => {
                let end = self.grapheme_count();
                let moved = self.cursor != end;
                self.cursor = end;
                moved
            }
            _ => false,
        }
    }

    // --- Editing operations ---

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, c: char) {
        let byte_offset = self.grapheme_byte_offset(self.cursor);
        self.value.insert(byte_offset, c);
        self.cursor += 1;
    }

    /// Insert a string at the cursor (paste path).
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let byte_offset = self.grapheme_byte_offset(self.cursor);
        self.value.insert_str(byte_offset, s);
        self.cursor += s.graphemes(true).count();
    }

    fn delete_char_back(&mut self) -> bool {
        if self.cursor > 0 {
            let byte_start = self.grapheme_byte_offset(self.cursor - 1);
            let byte_end = self.grapheme_byte_offset(self.cursor);
            self.value.drain(byte_start..byte_end);
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    fn delete_char_forward(&mut self) -> bool {
        if self.cursor < self.grapheme_count() {
            let byte_start = self.grapheme_byte_offset(self.cursor);
            let byte_end = self.grapheme_byte_offset(self.cursor + 1);
            self.value.drain(byte_start..byte_end);
            true
        } else {
            false
        }
    }

    // --- Sizing ---

    /// Measured display width of the current text in cells.
    pub fn measured_width(&self) -> u16 {
        UnicodeWidthStr::width(self.value.as_str()).min(u16::MAX as usize) as u16
    }

    /// Width of the input slot inside `container`.
    ///
    /// Measured text width plus a fixed pad, clamped between the minimum
    /// width and the container width minus its horizontal padding.
    pub fn box_width(&self, container: Rect, padding: Sides) -> u16 {
        let max = container.width.saturating_sub(padding.horizontal_sum());
        let wanted = self.measured_width().saturating_add(WIDTH_PAD);
        wanted.clamp(self.min_width.min(max), max.max(1))
    }

    // --- Internal helpers ---

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    fn grapheme_byte_offset(&self, grapheme_idx: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(grapheme_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}

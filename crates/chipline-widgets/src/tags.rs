#![forbid(unsafe_code)]

//! Tag collection widget.
//!
//! The ordered, duplicate-free chip list for one field instance: add and
//! remove with silent rejection rules, an insertion cursor, submit-key
//! confirmation of typed text, and two-step keyboard deletion so a held
//! Backspace cannot mow down the whole list.

use chipline_core::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use chipline_core::geometry::{Rect, Sides};

use crate::input::TextBox;

/// Delimiter that splits raw text into multiple tag values.
const DELIMITER: char = ',';

/// Configuration for a [`TagCollection`].
#[derive(Debug, Clone)]
pub struct TagsConfig {
    /// Trim surrounding whitespace from tag values.
    pub trim_tags: bool,
    /// Keep the case of tag values ("Tag" stays distinct from "tag").
    pub preserve_case: bool,
    /// Maximum number of tags (None = unlimited). Overflow adds are
    /// silently rejected.
    pub max_tags: Option<usize>,
    /// Placeholder shown while the collection and the text box are empty.
    pub placeholder: String,
    /// Keys that convert the pending text into tags.
    pub submit_keys: Vec<KeyCode>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            trim_tags: true,
            preserve_case: false,
            max_tags: None,
            placeholder: "Enter tags...".to_string(),
            submit_keys: vec![KeyCode::Char(DELIMITER), KeyCode::Tab, KeyCode::Enter],
        }
    }
}

/// An opaque handle locating a record's rendered chip.
///
/// Non-owning: the collection never dereferences it, it only hands it to
/// the embedder so a chip (or its declarative marker) can be found again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(u64);

/// One tag record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    value: String,
    display_label: String,
    marker: MarkerId,
}

impl TagRecord {
    /// Canonical (normalized) value submitted for this tag.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Text shown on the chip. Equals the value unless the tag came from a
    /// labeled candidate.
    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    /// Handle for locating the rendered chip.
    pub fn marker(&self) -> MarkerId {
        self.marker
    }
}

/// Two-step deletion state.
///
/// A deletion key on an empty text box first arms the neighboring record;
/// only a repeat of the same key at the same target deletes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArmState {
    Idle,
    Armed { index: usize, key: KeyCode },
}

/// What handling one event did to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagsOutcome {
    /// Event not handled; the host may process it further.
    Ignored,
    /// Input text, cursor, or focus state changed.
    Edited,
    /// A submit key converted the pending text. Carries the accepted
    /// values in insertion order (possibly empty — the key is still
    /// consumed so the host suppresses its default action).
    Submitted(Vec<String>),
    /// A deletion key armed the record at this index without deleting.
    Armed(usize),
    /// The armed record was released without deleting.
    Disarmed,
    /// A confirmed deletion removed this record.
    Deleted {
        /// The removed value.
        value: String,
        /// Position the record occupied.
        index: usize,
    },
}

/// The ordered, duplicate-free tag list with its embedded text box.
#[derive(Debug, Clone)]
pub struct TagCollection {
    config: TagsConfig,
    records: Vec<TagRecord>,
    input: TextBox,
    /// Where the next confirmed tag is inserted; also selects which
    /// neighbor keyboard deletion targets. Always in `[0, records.len()]`.
    input_position: usize,
    arm: ArmState,
    focused: bool,
    disabled: bool,
    next_marker: u64,
}

impl Default for TagCollection {
    fn default() -> Self {
        Self::new(TagsConfig::default())
    }
}

impl TagCollection {
    /// Create a collection with the given configuration.
    pub fn new(config: TagsConfig) -> Self {
        let input = TextBox::new().with_placeholder(config.placeholder.clone());
        Self {
            config,
            records: Vec::new(),
            input,
            input_position: 0,
            arm: ArmState::Idle,
            focused: false,
            disabled: false,
            next_marker: 0,
        }
    }

    /// Set the maximum tag count (builder).
    pub fn with_max_tags(mut self, max: usize) -> Self {
        self.config.max_tags = Some(max);
        self
    }

    /// Keep value case as typed (builder).
    pub fn with_preserve_case(mut self, preserve: bool) -> Self {
        self.config.preserve_case = preserve;
        self
    }

    // --- Value access ---

    /// Current values in order.
    pub fn values(&self) -> Vec<String> {
        self.records.iter().map(|r| r.value.clone()).collect()
    }

    /// All records in order.
    pub fn records(&self) -> &[TagRecord] {
        &self.records
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection holds no tags.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the (normalized) value is present.
    pub fn has(&self, value: &str) -> bool {
        let formatted = self.format(value);
        self.records.iter().any(|r| r.value == formatted)
    }

    /// The insertion cursor, in `[0, len]`.
    pub fn input_position(&self) -> usize {
        self.input_position
    }

    /// The embedded text box.
    pub fn input(&self) -> &TextBox {
        &self.input
    }

    /// Clear the pending text without touching the tags.
    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Index of the record currently armed for deletion, if any.
    pub fn armed_index(&self) -> Option<usize> {
        match self.arm {
            ArmState::Idle => None,
            ArmState::Armed { index, .. } => Some(index),
        }
    }

    /// Collection config.
    pub fn config(&self) -> &TagsConfig {
        &self.config
    }

    // --- Mutation ---

    /// Add tags parsed from `text`, split on the delimiter.
    ///
    /// Each piece is trimmed and case-folded per the config. Empty pieces,
    /// duplicates, and pieces beyond `max_tags` are silently skipped.
    /// Accepted values are inserted starting at
    /// `clamp(index.unwrap_or(len), 0, len)`, in text order. Returns the
    /// accepted values; the pending text is cleared when any were.
    pub fn add(&mut self, text: &str, index: Option<usize>) -> Vec<String> {
        let mut accepted = Vec::new();
        for piece in text.split(DELIMITER) {
            let formatted = self.format(piece);
            if !self.can_add(&formatted) {
                continue;
            }
            let len = self.records.len();
            let at = index.map_or(len, |i| i.saturating_add(accepted.len())).min(len);
            self.insert_record(formatted.clone(), formatted.clone(), at);
            accepted.push(formatted);
        }
        if !accepted.is_empty() {
            self.input.clear();
        }
        accepted
    }

    /// Add a single tag whose visible label differs from its value (the
    /// candidate-selection path). Returns the accepted value, or `None`
    /// when rejected.
    pub fn add_with_label(
        &mut self,
        value: &str,
        label: &str,
        index: Option<usize>,
    ) -> Option<String> {
        let formatted = self.format(value);
        if !self.can_add(&formatted) {
            return None;
        }
        let len = self.records.len();
        let at = index.unwrap_or(len).min(len);
        self.insert_record(formatted.clone(), label.to_string(), at);
        self.input.clear();
        Some(formatted)
    }

    /// Remove a tag by value. Absent values are a no-op returning `None`.
    pub fn remove(&mut self, value: &str) -> Option<String> {
        let formatted = self.format(value);
        let index = self.records.iter().position(|r| r.value == formatted)?;
        Some(self.remove_index(index).value)
    }

    /// Remove every tag, returning the removed values in order.
    pub fn remove_all(&mut self) -> Vec<String> {
        let mut removed = Vec::with_capacity(self.records.len());
        while !self.records.is_empty() {
            removed.push(self.remove_index(0).value);
        }
        removed
    }

    /// Enable or disable the collection. A disabled collection ignores
    /// every event.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.arm = ArmState::Idle;
        }
    }

    /// Whether the collection is disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Update the focus flag directly (hosts that track focus themselves).
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.arm = ArmState::Idle;
        }
    }

    /// Whether the text box has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    // --- View model ---

    /// Placeholder is visible exactly while there are no tags, no pending
    /// text, and the field is unfocused.
    pub fn placeholder_visible(&self) -> bool {
        self.records.is_empty() && self.input.is_empty() && !self.focused
    }

    /// Width of the input slot inside `container` (see
    /// [`TextBox::box_width`]).
    pub fn input_width(&self, container: Rect, padding: Sides) -> u16 {
        self.input.box_width(container, padding)
    }

    // --- Event handling ---

    /// Handle an input event.
    pub fn handle_event(&mut self, event: &Event) -> TagsOutcome {
        if self.disabled {
            return TagsOutcome::Ignored;
        }
        match event {
            Event::Key(key)
                if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
            {
                self.handle_key(key)
            }
            Event::Paste(paste) => self.handle_paste(&paste.text),
            Event::Focus(gained) => {
                self.set_focused(*gained);
                TagsOutcome::Edited
            }
            _ => TagsOutcome::Ignored,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> TagsOutcome {
        if self.config.submit_keys.contains(&key.code) && !self.input.is_empty() {
            self.arm = ArmState::Idle;
            let text = self.input.value().to_string();
            // `add` clears the text only when something was accepted; a
            // rejected submit leaves the field exactly as it was.
            let accepted = self.add(&text, Some(self.input_position));
            return TagsOutcome::Submitted(accepted);
        }

        let is_deletion = matches!(key.code, KeyCode::Backspace | KeyCode::Delete);
        if is_deletion && self.input.is_empty() && !self.records.is_empty() {
            return self.handle_arming(key);
        }

        // Any other key releases the armed record without deleting.
        let was_armed = self.arm != ArmState::Idle;
        self.arm = ArmState::Idle;
        if self.input.handle_key(key) {
            TagsOutcome::Edited
        } else if was_armed {
            TagsOutcome::Disarmed
        } else {
            TagsOutcome::Ignored
        }
    }

    /// Deletion-key transitions on an empty text box.
    ///
    /// Caller guarantees the collection is non-empty and `key` is
    /// Backspace or Delete. Targets are clamped into the record range:
    /// Backspace aims at the record before the insertion cursor, Delete at
    /// the one at it.
    fn handle_arming(&mut self, key: &KeyEvent) -> TagsOutcome {
        let last = self.records.len() - 1;
        let target = match key.code {
            KeyCode::Backspace => self.input_position.saturating_sub(1).min(last),
            _ => self.input_position.min(last),
        };

        match self.arm {
            ArmState::Armed { index, key: armed } if index == target && armed == key.code => {
                // Confirmation requires a fresh press; auto-repeat holds
                // the armed state without deleting.
                if key.kind == KeyEventKind::Press {
                    self.arm = ArmState::Idle;
                    let record = self.remove_index(target);
                    TagsOutcome::Deleted {
                        value: record.value,
                        index: target,
                    }
                } else {
                    TagsOutcome::Armed(target)
                }
            }
            _ => {
                self.arm = ArmState::Armed {
                    index: target,
                    key: key.code,
                };
                TagsOutcome::Armed(target)
            }
        }
    }

    fn handle_paste(&mut self, text: &str) -> TagsOutcome {
        if text.is_empty() {
            return TagsOutcome::Ignored;
        }
        self.arm = ArmState::Idle;
        self.input.insert_str(text);
        if text.contains(DELIMITER) {
            let pending = self.input.value().to_string();
            let accepted = self.add(&pending, Some(self.input_position));
            TagsOutcome::Submitted(accepted)
        } else {
            TagsOutcome::Edited
        }
    }

    // --- Internal helpers ---

    fn format(&self, raw: &str) -> String {
        let trimmed = if self.config.trim_tags {
            raw.trim()
        } else {
            raw
        };
        if self.config.preserve_case {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }

    fn can_add(&self, formatted: &str) -> bool {
        if formatted.is_empty() {
            return false;
        }
        if let Some(max) = self.config.max_tags
            && self.records.len() >= max
        {
            return false;
        }
        !self.records.iter().any(|r| r.value == formatted)
    }

    fn insert_record(&mut self, value: String, display_label: String, at: usize) {
        let marker = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.records.insert(
            at,
            TagRecord {
                value,
                display_label,
                marker,
            },
        );
        self.input_position = (self.input_position + 1).min(self.records.len());
    }

    fn remove_index(&mut self, index: usize) -> TagRecord {
        let record = self.records.remove(index);
        if index < self.input_position {
            self.input_position = self.input_position.saturating_sub(1);
        }
        self.input_position = self.input_position.min(self.records.len());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipline_core::event::{Modifiers, PasteEvent};

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn repeat(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code).with_kind(KeyEventKind::Repeat))
    }

    fn typed(collection: &mut TagCollection, text: &str) {
        for c in text.chars() {
            collection.handle_event(&press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn add_splits_on_delimiter() {
        let mut tags = TagCollection::default();
        let accepted = tags.add("red, green ,blue", None);
        assert_eq!(accepted, vec!["red", "green", "blue"]);
        assert_eq!(tags.values(), vec!["red", "green", "blue"]);
    }

    #[test]
    fn add_respects_max_tags() {
        let mut tags = TagCollection::default().with_max_tags(3);
        let accepted = tags.add("a,b,c,d", None);
        assert_eq!(accepted, vec!["a", "b", "c"]);
        assert_eq!(tags.values(), vec!["a", "b", "c"]);
    }

    #[test]
    fn add_rejects_case_folded_duplicate() {
        let mut tags = TagCollection::default();
        tags.add("x", None);
        let accepted = tags.add("X", None);
        assert!(accepted.is_empty());
        assert_eq!(tags.values(), vec!["x"]);
    }

    #[test]
    fn preserve_case_keeps_distinct_values() {
        let mut tags = TagCollection::default().with_preserve_case(true);
        tags.add("Tag", None);
        let accepted = tags.add("tag", None);
        assert_eq!(accepted, vec!["tag"]);
        assert_eq!(tags.values(), vec!["Tag", "tag"]);
    }

    #[test]
    fn add_rejects_empty_and_whitespace() {
        let mut tags = TagCollection::default();
        assert!(tags.add("  ,  ,", None).is_empty());
        assert!(tags.is_empty());
    }

    #[test]
    fn add_at_clamps_index() {
        let mut tags = TagCollection::default();
        tags.add("a,b", None);
        tags.add("c", Some(99));
        assert_eq!(tags.values(), vec!["a", "b", "c"]);
        tags.add("d", Some(0));
        assert_eq!(tags.values(), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn add_multiple_at_index_keeps_text_order() {
        let mut tags = TagCollection::default();
        tags.add("x,y", None);
        tags.add("a,b", Some(1));
        assert_eq!(tags.values(), vec!["x", "a", "b", "y"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut tags = TagCollection::default();
        tags.add("a", None);
        assert_eq!(tags.remove("missing"), None);
        assert_eq!(tags.values(), vec!["a"]);
    }

    #[test]
    fn remove_matches_normalized() {
        let mut tags = TagCollection::default();
        tags.add("Rust", None);
        assert_eq!(tags.remove("  RUST "), Some("rust".to_string()));
        assert!(tags.is_empty());
    }

    #[test]
    fn remove_before_cursor_decrements_position() {
        let mut tags = TagCollection::default();
        tags.add("a,b,c", None);
        assert_eq!(tags.input_position(), 3);
        tags.remove("a");
        assert_eq!(tags.input_position(), 2);
        tags.remove("c");
        assert_eq!(tags.input_position(), 1);
    }

    #[test]
    fn remove_all_clears_and_resets_cursor() {
        let mut tags = TagCollection::default();
        tags.add("a,b", None);
        let removed = tags.remove_all();
        assert_eq!(removed, vec!["a", "b"]);
        assert!(tags.is_empty());
        assert_eq!(tags.input_position(), 0);
    }

    #[test]
    fn add_with_label_separates_value_and_display() {
        let mut tags = TagCollection::default();
        let accepted = tags.add_with_label("js", "JavaScript", None);
        assert_eq!(accepted, Some("js".to_string()));
        let record = &tags.records()[0];
        assert_eq!(record.value(), "js");
        assert_eq!(record.display_label(), "JavaScript");
    }

    #[test]
    fn records_get_distinct_markers() {
        let mut tags = TagCollection::default();
        tags.add("a,b", None);
        let markers: Vec<_> = tags.records().iter().map(|r| r.marker()).collect();
        assert_ne!(markers[0], markers[1]);
        // Markers survive re-ordering removals.
        tags.remove("a");
        assert_eq!(tags.records()[0].marker(), markers[1]);
    }

    #[test]
    fn add_with_label_rejects_duplicate_value() {
        let mut tags = TagCollection::default();
        tags.add("js", None);
        assert_eq!(tags.add_with_label("js", "JavaScript", None), None);
    }

    // --- Submit keys ---

    #[test]
    fn enter_converts_pending_text() {
        let mut tags = TagCollection::default();
        typed(&mut tags, "rust");
        let outcome = tags.handle_event(&press(KeyCode::Enter));
        assert_eq!(outcome, TagsOutcome::Submitted(vec!["rust".to_string()]));
        assert_eq!(tags.values(), vec!["rust"]);
        assert!(tags.input().is_empty());
    }

    #[test]
    fn submit_with_embedded_delimiter_adds_each_piece() {
        // Drop comma from the submit keys so it can be typed literally.
        let config = TagsConfig {
            submit_keys: vec![KeyCode::Tab],
            ..TagsConfig::default()
        };
        let mut tags = TagCollection::new(config);
        typed(&mut tags, "a,b");
        assert_eq!(tags.input().value(), "a,b");
        let outcome = tags.handle_event(&press(KeyCode::Tab));
        assert_eq!(
            outcome,
            TagsOutcome::Submitted(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn typing_comma_submits_pending_text() {
        let mut tags = TagCollection::default();
        typed(&mut tags, "red");
        let outcome = tags.handle_event(&press(KeyCode::Char(',')));
        assert_eq!(outcome, TagsOutcome::Submitted(vec!["red".to_string()]));
        assert!(tags.input().is_empty());
    }

    #[test]
    fn comma_submit_key_with_empty_input_types_a_comma() {
        let mut tags = TagCollection::default();
        let outcome = tags.handle_event(&press(KeyCode::Char(',')));
        assert_eq!(outcome, TagsOutcome::Edited);
        assert_eq!(tags.input().value(), ",");
    }

    #[test]
    fn submit_of_duplicate_consumes_key_but_changes_nothing() {
        let mut tags = TagCollection::default();
        tags.add("rust", None);
        typed(&mut tags, "rust");
        let outcome = tags.handle_event(&press(KeyCode::Enter));
        assert_eq!(outcome, TagsOutcome::Submitted(vec![]));
        assert_eq!(tags.values(), vec!["rust"]);
        // The rejected text stays put for the user to edit.
        assert_eq!(tags.input().value(), "rust");
    }

    #[test]
    fn custom_submit_keys() {
        let config = TagsConfig {
            submit_keys: vec![KeyCode::Char(';')],
            ..TagsConfig::default()
        };
        let mut tags = TagCollection::new(config);
        typed(&mut tags, "a");
        // Enter is no longer a submit key.
        assert_eq!(
            tags.handle_event(&press(KeyCode::Enter)),
            TagsOutcome::Ignored
        );
        assert!(tags.is_empty());
        assert_eq!(
            tags.handle_event(&press(KeyCode::Char(';'))),
            TagsOutcome::Submitted(vec!["a".to_string()])
        );
    }

    #[test]
    fn submitted_at_cursor_position() {
        let mut tags = TagCollection::default();
        tags.add("a,b", None);
        tags.remove("a");
        // Removing index 0 (before the cursor at 2) pulls the cursor back
        // to 1, so the next confirmed tag lands after "b".
        typed(&mut tags, "mid");
        tags.handle_event(&press(KeyCode::Enter));
        assert_eq!(tags.values(), vec!["b", "mid"]);
    }

    // --- Armed deletion ---

    #[test]
    fn backspace_arms_then_deletes_previous() {
        let mut tags = TagCollection::default();
        tags.add("a,b", None);
        assert_eq!(tags.input_position(), 2);

        let outcome = tags.handle_event(&press(KeyCode::Backspace));
        assert_eq!(outcome, TagsOutcome::Armed(1));
        assert_eq!(tags.values(), vec!["a", "b"]);
        assert_eq!(tags.armed_index(), Some(1));

        let outcome = tags.handle_event(&press(KeyCode::Backspace));
        assert_eq!(
            outcome,
            TagsOutcome::Deleted {
                value: "b".to_string(),
                index: 1,
            }
        );
        assert_eq!(tags.values(), vec!["a"]);
        assert_eq!(tags.input_position(), 1);
        assert_eq!(tags.armed_index(), None);
    }

    #[test]
    fn delete_arms_record_at_clamped_cursor() {
        let mut tags = TagCollection::default();
        tags.add("x", None);
        // Cursor is 1; both deletion keys clamp to the only record.
        assert_eq!(
            tags.handle_event(&press(KeyCode::Delete)),
            TagsOutcome::Armed(0)
        );
        assert_eq!(
            tags.handle_event(&press(KeyCode::Delete)),
            TagsOutcome::Deleted {
                value: "x".to_string(),
                index: 0,
            }
        );
        assert!(tags.is_empty());
    }

    #[test]
    fn typing_disarms_without_deleting() {
        let mut tags = TagCollection::default();
        tags.add("a", None);
        tags.handle_event(&press(KeyCode::Backspace));
        assert_eq!(tags.armed_index(), Some(0));

        let outcome = tags.handle_event(&press(KeyCode::Char('z')));
        assert_eq!(outcome, TagsOutcome::Edited);
        assert_eq!(tags.armed_index(), None);
        assert_eq!(tags.values(), vec!["a"]);

        // Backspace now edits the text instead of arming.
        let outcome = tags.handle_event(&press(KeyCode::Backspace));
        assert_eq!(outcome, TagsOutcome::Edited);
        assert!(tags.input().is_empty());
        assert_eq!(tags.values(), vec!["a"]);
    }

    #[test]
    fn other_key_disarms() {
        let mut tags = TagCollection::default();
        tags.add("a", None);
        tags.handle_event(&press(KeyCode::Backspace));
        let outcome = tags.handle_event(&press(KeyCode::Up));
        assert_eq!(outcome, TagsOutcome::Disarmed);
        assert_eq!(tags.armed_index(), None);
    }

    #[test]
    fn switching_deletion_key_rearms_instead_of_deleting() {
        let mut tags = TagCollection::default();
        tags.add("a,b", None);
        assert_eq!(
            tags.handle_event(&press(KeyCode::Backspace)),
            TagsOutcome::Armed(1)
        );
        // Delete aims at the same clamped target but is a different key:
        // the record is re-armed, not deleted.
        assert_eq!(
            tags.handle_event(&press(KeyCode::Delete)),
            TagsOutcome::Armed(1)
        );
        assert_eq!(tags.values(), vec!["a", "b"]);
        // A repeat of the key that armed it confirms.
        assert_eq!(
            tags.handle_event(&press(KeyCode::Delete)),
            TagsOutcome::Deleted {
                value: "b".to_string(),
                index: 1,
            }
        );
        assert_eq!(tags.values(), vec!["a"]);
    }

    #[test]
    fn held_key_repeat_does_not_confirm() {
        let mut tags = TagCollection::default();
        tags.add("a,b", None);
        assert_eq!(
            tags.handle_event(&press(KeyCode::Backspace)),
            TagsOutcome::Armed(1)
        );
        // Auto-repeat events hold the armed state without deleting.
        assert_eq!(
            tags.handle_event(&repeat(KeyCode::Backspace)),
            TagsOutcome::Armed(1)
        );
        assert_eq!(tags.values(), vec!["a", "b"]);
        // A fresh press confirms.
        assert!(matches!(
            tags.handle_event(&press(KeyCode::Backspace)),
            TagsOutcome::Deleted { .. }
        ));
    }

    #[test]
    fn focus_loss_disarms() {
        let mut tags = TagCollection::default();
        tags.add("a", None);
        tags.handle_event(&press(KeyCode::Backspace));
        assert_eq!(tags.armed_index(), Some(0));
        tags.handle_event(&Event::Focus(false));
        assert_eq!(tags.armed_index(), None);
        assert_eq!(tags.values(), vec!["a"]);
    }

    #[test]
    fn backspace_on_empty_collection_is_ignored() {
        let mut tags = TagCollection::default();
        assert_eq!(
            tags.handle_event(&press(KeyCode::Backspace)),
            TagsOutcome::Ignored
        );
    }

    // --- Paste ---

    #[test]
    fn paste_with_delimiter_submits_all_pieces() {
        let mut tags = TagCollection::default();
        let outcome = tags.handle_event(&Event::Paste(PasteEvent::bracketed("a,b,c")));
        assert_eq!(
            outcome,
            TagsOutcome::Submitted(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ])
        );
        assert!(tags.input().is_empty());
    }

    #[test]
    fn paste_without_delimiter_just_edits() {
        let mut tags = TagCollection::default();
        let outcome = tags.handle_event(&Event::Paste(PasteEvent::bracketed("hello")));
        assert_eq!(outcome, TagsOutcome::Edited);
        assert_eq!(tags.input().value(), "hello");
        assert!(tags.is_empty());
    }

    #[test]
    fn paste_appends_to_pending_text() {
        let mut tags = TagCollection::default();
        typed(&mut tags, "pre");
        tags.handle_event(&Event::Paste(PasteEvent::bracketed("fix,done")));
        assert_eq!(tags.values(), vec!["prefix", "done"]);
    }

    // --- Placeholder / focus / disabled ---

    #[test]
    fn placeholder_lifecycle() {
        let mut tags = TagCollection::default();
        assert!(tags.placeholder_visible());

        tags.handle_event(&Event::Focus(true));
        assert!(!tags.placeholder_visible());

        tags.handle_event(&Event::Focus(false));
        assert!(tags.placeholder_visible());

        typed(&mut tags, "a");
        assert!(!tags.placeholder_visible());
        tags.handle_event(&press(KeyCode::Enter));
        assert!(!tags.placeholder_visible());

        tags.remove("a");
        tags.handle_event(&Event::Focus(false));
        assert!(tags.placeholder_visible());
    }

    #[test]
    fn disabled_ignores_everything() {
        let mut tags = TagCollection::default();
        tags.add("a", None);
        tags.set_disabled(true);
        assert_eq!(
            tags.handle_event(&press(KeyCode::Backspace)),
            TagsOutcome::Ignored
        );
        assert_eq!(
            tags.handle_event(&press(KeyCode::Char('x'))),
            TagsOutcome::Ignored
        );
        assert_eq!(tags.values(), vec!["a"]);

        tags.set_disabled(false);
        assert_eq!(
            tags.handle_event(&press(KeyCode::Char('x'))),
            TagsOutcome::Edited
        );
    }

    #[test]
    fn ctrl_modified_submit_key_still_submits() {
        let mut tags = TagCollection::default();
        typed(&mut tags, "a");
        let key = KeyEvent::new(KeyCode::Enter).with_modifiers(Modifiers::CTRL);
        assert!(matches!(
            tags.handle_event(&Event::Key(key)),
            TagsOutcome::Submitted(_)
        ));
    }

    #[test]
    fn input_width_tracks_text() {
        let mut tags = TagCollection::default();
        let container = Rect::new(0, 0, 30, 1);
        let padding = Sides::horizontal(1);
        let empty_width = tags.input_width(container, padding);
        typed(&mut tags, "long tag value");
        assert!(tags.input_width(container, padding) > empty_width);
    }

    // --- Properties ---

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn values_never_contain_duplicates(
                adds in proptest::collection::vec("[a-cA-C]{0,3}", 0..32),
            ) {
                let mut tags = TagCollection::default();
                for text in &adds {
                    tags.add(text, None);
                }
                let values = tags.values();
                let mut deduped = values.clone();
                deduped.sort();
                deduped.dedup();
                prop_assert_eq!(values.len(), deduped.len());
            }

            #[test]
            fn len_never_exceeds_max(
                adds in proptest::collection::vec("[a-z]{0,4}", 0..32),
                max in 0usize..6,
            ) {
                let mut tags = TagCollection::default().with_max_tags(max);
                for text in &adds {
                    tags.add(text, None);
                }
                prop_assert!(tags.len() <= max);
            }

            #[test]
            fn cursor_always_within_bounds(
                ops in proptest::collection::vec(
                    prop_oneof![
                        "[a-e]{1,3}".prop_map(|s| (true, s)),
                        "[a-e]{1,3}".prop_map(|s| (false, s)),
                    ],
                    0..48,
                ),
            ) {
                let mut tags = TagCollection::default();
                for (is_add, text) in &ops {
                    if *is_add {
                        tags.add(text, None);
                    } else {
                        tags.remove(text);
                    }
                    prop_assert!(tags.input_position() <= tags.len());
                }
            }

            #[test]
            fn add_at_places_value_at_clamped_index(
                index in 0usize..10,
                seed in 1usize..6,
            ) {
                let mut tags = TagCollection::default();
                for i in 0..seed {
                    tags.add(&format!("t{i}"), None);
                }
                tags.add("probe", Some(index));
                let expected = index.min(seed);
                let values = tags.values();
                prop_assert_eq!(values[expected].as_str(), "probe");
            }
        }
    }
}

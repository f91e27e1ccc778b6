#![forbid(unsafe_code)]

//! The field controller.
//!
//! [`FormBridge`] composes one tag collection and one autocomplete engine
//! into a field-like unit: it routes events (engine first, so navigation
//! and commits win while the panel is open), acts as the engine's data
//! source over the declarative candidate list, reconciles live state from
//! markup changes under a re-entrancy guard, and keeps the canonical
//! ordered value array in sync with what a host form would submit.

use std::fmt;
use std::mem;
use std::time::Duration;

use chipline_core::event::Event;
use chipline_core::geometry::Rect;
use chipline_core::timer::Countdown;
use chipline_widgets::autocomplete::{
    AutocompleteEngine, EngineConfig, EngineOutcome, SuggestionItem,
};
use chipline_widgets::tags::{TagCollection, TagsConfig, TagsOutcome};

use crate::markup::{Candidate, CandidateDirectory, CandidateSource, FieldMarkup};

/// Construction-time configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The field has no submission name, so it cannot participate in a
    /// form at all.
    MissingName,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "field has no submission name"),
        }
    }
}

impl std::error::Error for FieldError {}

/// Notification drained by the host after each interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNotice {
    /// A tag was accepted or removed.
    Update {
        /// The affected value.
        tag: String,
        /// For adds: whether the value is absent from the candidate list.
        /// `None` for removals.
        is_new: Option<bool>,
    },
    /// The net ordered value array differs from its previous snapshot.
    Change,
}

/// Interaction knobs for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Keep the case of tag values as typed.
    pub preserve_case: bool,
    /// Trim surrounding whitespace from tag values.
    pub trim_tags: bool,
    /// Minimum query length before suggestions are offered.
    pub min_length: usize,
    /// Delay between the last keystroke and the suggestion fetch.
    pub debounce: Duration,
    /// Offer suggestions as soon as the field gains focus.
    pub show_on_focus: bool,
    /// Row shown when no candidate matches; `None` hides the panel.
    pub empty_message: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            preserve_case: true,
            trim_tags: true,
            min_length: 1,
            debounce: Duration::ZERO,
            show_on_focus: false,
            empty_message: None,
        }
    }
}

/// One tag field: a collection plus an engine, bound to declarative
/// markup and a host form.
#[derive(Debug)]
pub struct FormBridge {
    markup: FieldMarkup,
    config: BridgeConfig,
    collection: TagCollection,
    engine: AutocompleteEngine,
    /// Resolved snapshot of the declarative candidate list.
    candidates: Vec<Candidate>,
    notices: Vec<FieldNotice>,
    /// Value array at the last Change notification.
    last_values: Vec<String>,
    /// Text last handed to the engine, to skip redundant notifications.
    last_text: String,
    /// Re-entrancy guard: reconciliation's own markup writes must not
    /// recursively retrigger it.
    reconciling: bool,
    /// Defers reconciliation so a batch of markup edits settles into one
    /// pass.
    settle: Countdown,
    destroyed: bool,
}

impl FormBridge {
    /// Build a field from its declarative description.
    ///
    /// Fails with [`FieldError::MissingName`] when the markup carries no
    /// submission name. Initial markers and candidates are reconciled in;
    /// no notifications are emitted for the initial state.
    pub fn new(
        markup: FieldMarkup,
        config: BridgeConfig,
        directory: &dyn CandidateDirectory,
    ) -> Result<Self, FieldError> {
        if markup.name.trim().is_empty() {
            return Err(FieldError::MissingName);
        }
        let collection = Self::build_collection(&markup, &config);
        let engine = Self::build_engine(&config);
        let mut bridge = Self {
            markup,
            config,
            collection,
            engine,
            candidates: Vec::new(),
            notices: Vec::new(),
            last_values: Vec::new(),
            last_text: String::new(),
            reconciling: false,
            settle: Countdown::idle(),
            destroyed: false,
        };
        bridge.reconcile(directory);
        bridge.notices.clear();
        Ok(bridge)
    }

    fn build_collection(markup: &FieldMarkup, config: &BridgeConfig) -> TagCollection {
        let mut tags_config = TagsConfig {
            trim_tags: config.trim_tags,
            preserve_case: config.preserve_case,
            max_tags: (!markup.multiple).then_some(1),
            ..TagsConfig::default()
        };
        if let Some(placeholder) = &markup.placeholder {
            tags_config.placeholder = placeholder.clone();
        }
        TagCollection::new(tags_config)
    }

    fn build_engine(config: &BridgeConfig) -> AutocompleteEngine {
        AutocompleteEngine::new(EngineConfig {
            min_length: config.min_length,
            debounce: config.debounce,
            show_on_focus: config.show_on_focus,
            empty_message: config.empty_message.clone(),
            ..EngineConfig::default()
        })
    }

    // --- Accessors ---

    /// The declarative description the field was last reconciled from.
    pub fn markup(&self) -> &FieldMarkup {
        &self.markup
    }

    /// The composed tag collection.
    pub fn collection(&self) -> &TagCollection {
        &self.collection
    }

    /// The composed autocomplete engine.
    pub fn engine(&self) -> &AutocompleteEngine {
        &self.engine
    }

    /// Current values in order.
    pub fn values(&self) -> Vec<String> {
        self.collection.values()
    }

    /// Whether the (normalized) value is present.
    pub fn has(&self, value: &str) -> bool {
        self.collection.has(value)
    }

    /// Whether the text box should be drawn. Single mode hides it while a
    /// tag is present.
    pub fn input_visible(&self) -> bool {
        self.markup.multiple || self.collection.is_empty()
    }

    // --- Mutation ---

    /// Add tags parsed from `text` (delimiter-split, same rejection rules
    /// as the collection). Fires an update notice per accepted value.
    pub fn add(&mut self, text: &str) -> Vec<String> {
        self.add_at_inner(text, None)
    }

    /// Add several values at once, in order.
    pub fn add_all<S: AsRef<str>>(&mut self, values: &[S]) -> Vec<String> {
        let mut accepted = Vec::new();
        for value in values {
            accepted.extend(self.add_at_inner(value.as_ref(), None));
        }
        accepted
    }

    /// Add at an explicit position (clamped into range).
    pub fn add_at(&mut self, text: &str, index: usize) -> Vec<String> {
        self.add_at_inner(text, Some(index))
    }

    fn add_at_inner(&mut self, text: &str, index: Option<usize>) -> Vec<String> {
        let accepted = self.collection.add(text, index);
        for value in &accepted {
            self.notify_add(value.clone());
        }
        if !accepted.is_empty() {
            self.sync_input_to_engine();
        }
        self.sync_change();
        accepted
    }

    /// Remove a tag by value. Absent values are a silent no-op.
    pub fn remove(&mut self, value: &str) {
        if let Some(removed) = self.collection.remove(value) {
            self.notify_remove(removed);
            self.sync_change();
        }
    }

    /// Remove every tag.
    pub fn remove_all(&mut self) {
        for removed in self.collection.remove_all() {
            self.notify_remove(removed);
        }
        self.sync_change();
    }

    /// Replace the value array wholesale.
    ///
    /// Emits a single change notice when the array differs; per-tag update
    /// notices are not fired for programmatic replacement.
    pub fn set_values<S: AsRef<str>>(&mut self, values: &[S]) {
        self.collection.remove_all();
        for value in values {
            self.collection.add(value.as_ref(), None);
        }
        self.sync_change();
    }

    /// Form-reset hook: clears tags, pending text, and the panel.
    pub fn reset(&mut self) {
        self.remove_all();
        self.collection.clear_input();
        self.last_text.clear();
        self.engine.clear();
    }

    /// Convert the pending text into tags (the add-button path). A
    /// rejected conversion leaves the text in place.
    pub fn confirm_input(&mut self) -> Vec<String> {
        let text = self.collection.input().value().to_string();
        if text.is_empty() {
            return Vec::new();
        }
        let at = self.collection.input_position();
        self.add_at_inner(&text, Some(at))
    }

    /// Enable the field.
    pub fn enable(&mut self) {
        self.collection.set_disabled(false);
    }

    /// Disable the field; a disabled field ignores every event.
    pub fn disable(&mut self) {
        self.collection.set_disabled(true);
        self.engine.clear();
    }

    /// Give the field focus.
    pub fn focus(&mut self) {
        self.collection.set_focused(true);
        if let Some(request) = self.engine.on_focus() {
            let items = self.suggestions_for(&request.query);
            self.engine.resolve(request.generation, items);
        }
    }

    /// Take focus away. The panel clears after the engine's grace period.
    pub fn blur(&mut self) {
        self.collection.set_focused(false);
        self.engine.on_blur();
    }

    /// A mouse click landed on the text box.
    pub fn notify_input_clicked(&mut self) {
        self.engine.on_click_input();
    }

    /// Tear down both halves. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.settle.cancel();
        self.engine.destroy();
        self.destroyed = true;
    }

    // --- Validity ---

    /// `false` exactly when the field is required and empty.
    pub fn check_validity(&self) -> bool {
        !(self.markup.required && self.collection.is_empty())
    }

    /// Like [`FormBridge::check_validity`], for the host's "surface the
    /// problem to the user" path.
    pub fn report_validity(&self) -> bool {
        self.check_validity()
    }

    /// Message a host should show when validity fails.
    pub fn validation_message(&self) -> Option<&'static str> {
        if self.check_validity() {
            None
        } else {
            Some("Please fill out this field.")
        }
    }

    // --- Form participation ---

    /// Ordered `(name, value)` submission entries.
    ///
    /// An empty collection still contributes one `(name, "")` entry so a
    /// receiving system can tell "explicitly cleared" from "absent".
    pub fn form_entries(&self) -> Vec<(String, String)> {
        let values = self.collection.values();
        if values.is_empty() {
            return vec![(self.markup.name.clone(), String::new())];
        }
        values
            .into_iter()
            .map(|value| (self.markup.name.clone(), value))
            .collect()
    }

    /// Drain pending notifications.
    pub fn take_notices(&mut self) -> Vec<FieldNotice> {
        mem::take(&mut self.notices)
    }

    // --- Markup reconciliation ---

    /// Mutate the declarative description. The rebuild is deferred behind
    /// a settle delay so a batch of edits reconciles as one pass on the
    /// next tick.
    pub fn update_markup(&mut self, f: impl FnOnce(&mut FieldMarkup)) {
        if self.reconciling || self.destroyed {
            return;
        }
        f(&mut self.markup);
        self.settle.start(Duration::ZERO);
    }

    /// Recompute collection records and the candidate set from the current
    /// markup. Held under a re-entrancy guard: the pruning writes it
    /// performs never retrigger it.
    pub fn reconcile(&mut self, directory: &dyn CandidateDirectory) {
        if self.reconciling || self.destroyed {
            return;
        }
        self.reconciling = true;
        let _span = chipline_core::debug_span!(
            "field_reconcile",
            name = %self.markup.name,
            markers = self.markup.markers.len(),
        )
        .entered();
        self.settle.cancel();

        // Single mode keeps only the first declared tag; the excess is
        // pruned from the markup itself.
        if !self.markup.multiple && self.markup.markers.len() > 1 {
            self.markup.markers.truncate(1);
        }

        self.collection.remove_all();
        let markers = self.markup.markers.clone();
        for marker in &markers {
            self.collection.add_with_label(&marker.value, &marker.label, None);
        }
        self.candidates = self.markup.resolve_candidates(directory).to_vec();

        self.reconciling = false;
        // Markup-driven rebuilds fire a change notice (not per-tag
        // updates) when the net array moved.
        self.sync_change();
    }

    /// Switch between single and multiple cardinality.
    ///
    /// Rebuilds the collection/engine pair, preserving existing values
    /// subject to the new limit (truncating to the first on demotion).
    pub fn set_multiple(&mut self, multiple: bool, directory: &dyn CandidateDirectory) {
        if self.markup.multiple == multiple || self.destroyed {
            return;
        }
        self.markup.multiple = multiple;
        let mut kept: Vec<(String, String)> = self
            .collection
            .records()
            .iter()
            .map(|r| (r.value().to_string(), r.display_label().to_string()))
            .collect();
        if !multiple {
            kept.truncate(1);
            self.markup.markers.truncate(1);
        }

        self.collection = Self::build_collection(&self.markup, &self.config);
        self.engine = Self::build_engine(&self.config);
        self.candidates = self.markup.resolve_candidates(directory).to_vec();
        for (value, label) in &kept {
            self.collection.add_with_label(value, label, None);
        }
        self.last_text.clear();
        self.sync_change();
    }

    /// Re-target the key the values submit under.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FieldError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FieldError::MissingName);
        }
        self.markup.name = name;
        Ok(())
    }

    /// Toggle the required flag; validity is re-evaluated on demand.
    pub fn set_required(&mut self, required: bool) {
        self.markup.required = required;
    }

    /// Re-bind the candidate source.
    pub fn set_candidates(
        &mut self,
        source: CandidateSource,
        directory: &dyn CandidateDirectory,
    ) {
        self.markup.candidates = source;
        self.candidates = self.markup.resolve_candidates(directory).to_vec();
    }

    // --- Event loop ---

    /// Advance timers: a settled markup batch reconciles, and an elapsed
    /// fetch debounce is served from the candidate list.
    pub fn tick(&mut self, dt: Duration, directory: &dyn CandidateDirectory) {
        if self.destroyed {
            return;
        }
        if self.settle.tick(dt) {
            self.reconcile(directory);
        }
        if let Some(request) = self.engine.tick(dt) {
            let items = self.suggestions_for(&request.query);
            self.engine.resolve(request.generation, items);
        }
    }

    /// Route one event. Returns `true` when the field consumed it (the
    /// host should suppress the key's default action).
    pub fn handle_event(&mut self, event: &Event) -> bool {
        if self.destroyed || self.collection.is_disabled() {
            return false;
        }
        if let Event::Focus(gained) = event {
            if *gained {
                self.focus();
            } else {
                self.blur();
            }
            return true;
        }

        // The engine sees events first so panel navigation and commits win
        // while it is open.
        match self.engine.handle_event(event) {
            EngineOutcome::Selected { item, .. } => {
                self.insert_selection(item);
                true
            }
            EngineOutcome::Consumed => true,
            EngineOutcome::Ignored => match self.collection.handle_event(event) {
                TagsOutcome::Submitted(accepted) => {
                    for value in &accepted {
                        self.notify_add(value.clone());
                    }
                    self.sync_input_to_engine();
                    self.sync_change();
                    true
                }
                TagsOutcome::Deleted { value, .. } => {
                    self.notify_remove(value);
                    self.sync_change();
                    true
                }
                TagsOutcome::Edited => {
                    self.sync_input_to_engine();
                    true
                }
                TagsOutcome::Armed(_) | TagsOutcome::Disarmed => true,
                TagsOutcome::Ignored => false,
            },
        }
    }

    /// Compute the panel rect for this frame (and remember it for mouse
    /// hit testing). See [`AutocompleteEngine::place`].
    pub fn place(&mut self, input_area: Rect, viewport: Rect) -> Rect {
        self.engine.place(input_area, viewport)
    }

    // --- Internal helpers ---

    /// The engine's data source: case-insensitive substring match against
    /// candidate labels, excluding values already present as tags.
    fn suggestions_for(&self, query: &str) -> Vec<SuggestionItem> {
        let needle = query.to_lowercase();
        self.candidates
            .iter()
            .filter(|c| c.label.to_lowercase().contains(&needle))
            .filter(|c| !self.collection.has(&c.value))
            .map(|c| SuggestionItem::new(c.value.clone(), c.label.clone()))
            .collect()
    }

    /// Insert a committed suggestion: canonical value from the candidate,
    /// visible label from the candidate.
    fn insert_selection(&mut self, item: SuggestionItem) {
        if !self.markup.multiple && !self.collection.is_empty() {
            // Single mode with a tag in place: the commit only clears the
            // pending text.
            self.collection.clear_input();
            self.sync_input_to_engine();
            return;
        }
        let at = self.collection.input_position();
        if let Some(value) = self.collection.add_with_label(&item.value, &item.label, Some(at))
        {
            self.notify_add(value);
            self.sync_change();
        }
        self.sync_input_to_engine();
    }

    /// Tell the engine about the text box when it actually changed.
    fn sync_input_to_engine(&mut self) {
        let text = self.collection.input().value();
        if text != self.last_text {
            self.last_text = text.to_string();
            let cursor = self.collection.input().cursor();
            let owned = self.last_text.clone();
            self.engine.input_changed(&owned, cursor);
        }
    }

    fn notify_add(&mut self, value: String) {
        let is_new = !self.candidates.iter().any(|c| c.value == value);
        self.notices.push(FieldNotice::Update {
            tag: value,
            is_new: Some(is_new),
        });
    }

    fn notify_remove(&mut self, value: String) {
        self.notices.push(FieldNotice::Update {
            tag: value,
            is_new: None,
        });
    }

    /// Push a change notice when the ordered value array moved.
    fn sync_change(&mut self) {
        let values = self.collection.values();
        if values != self.last_values {
            self.last_values = values;
            self.notices.push(FieldNotice::Change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{Candidate, EmptyDirectory, TagMarker};

    fn langs() -> CandidateSource {
        CandidateSource::Inline(vec![
            Candidate::new("js", "JavaScript"),
            Candidate::new("py", "Python"),
        ])
    }

    fn bridge(markup: FieldMarkup) -> FormBridge {
        FormBridge::new(markup, BridgeConfig::default(), &EmptyDirectory).expect("valid markup")
    }

    #[test]
    fn missing_name_is_a_setup_error() {
        let err = FormBridge::new(
            FieldMarkup::new("  "),
            BridgeConfig::default(),
            &EmptyDirectory,
        )
        .unwrap_err();
        assert_eq!(err, FieldError::MissingName);
        assert_eq!(err.to_string(), "field has no submission name");
    }

    #[test]
    fn initial_markers_reconcile_without_notices() {
        let mut field = bridge(
            FieldMarkup::new("tags")
                .with_multiple(true)
                .with_marker(TagMarker::labeled("rs", "Rust"))
                .with_marker(TagMarker::new("go")),
        );
        assert_eq!(field.values(), vec!["rs", "go"]);
        assert!(field.take_notices().is_empty());
    }

    #[test]
    fn add_fires_update_and_change() {
        let mut field = bridge(
            FieldMarkup::new("tags")
                .with_multiple(true)
                .with_candidates(langs()),
        );
        field.add("js,brand-new");
        assert_eq!(
            field.take_notices(),
            vec![
                FieldNotice::Update {
                    tag: "js".to_string(),
                    is_new: Some(false),
                },
                FieldNotice::Update {
                    tag: "brand-new".to_string(),
                    is_new: Some(true),
                },
                FieldNotice::Change,
            ]
        );
    }

    #[test]
    fn add_all_accepts_in_order_and_skips_duplicates() {
        let mut field = bridge(FieldMarkup::new("tags").with_multiple(true));
        let accepted = field.add_all(&["a", "b", "a"]);
        assert_eq!(accepted, vec!["a", "b"]);
        assert_eq!(field.values(), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_add_fires_nothing() {
        let mut field = bridge(FieldMarkup::new("tags").with_multiple(true));
        field.add("x");
        field.take_notices();
        field.add("x");
        assert!(field.take_notices().is_empty());
        assert_eq!(field.values(), vec!["x"]);
    }

    #[test]
    fn remove_absent_fires_nothing() {
        let mut field = bridge(FieldMarkup::new("tags").with_multiple(true));
        field.remove("ghost");
        assert!(field.take_notices().is_empty());
    }

    #[test]
    fn set_values_round_trips_and_coalesces_change() {
        let mut field = bridge(FieldMarkup::new("tags").with_multiple(true));
        field.set_values(&["a", "b", "c"]);
        assert_eq!(field.values(), vec!["a", "b", "c"]);
        assert_eq!(field.take_notices(), vec![FieldNotice::Change]);

        // Same array again: no change notice.
        field.set_values(&["a", "b", "c"]);
        assert!(field.take_notices().is_empty());
    }

    #[test]
    fn form_entries_always_carry_the_name() {
        let mut field = bridge(FieldMarkup::new("topics").with_multiple(true));
        assert_eq!(
            field.form_entries(),
            vec![("topics".to_string(), String::new())]
        );
        field.add("a,b");
        assert_eq!(
            field.form_entries(),
            vec![
                ("topics".to_string(), "a".to_string()),
                ("topics".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn required_validity_follows_emptiness() {
        let mut field = bridge(FieldMarkup::new("tags").with_required(true));
        assert!(!field.check_validity());
        assert_eq!(
            field.validation_message(),
            Some("Please fill out this field.")
        );
        field.add("present");
        assert!(field.check_validity());
        assert_eq!(field.validation_message(), None);

        field.set_required(false);
        field.remove_all();
        assert!(field.check_validity());
    }

    #[test]
    fn single_mode_caps_at_one() {
        let mut field = bridge(FieldMarkup::new("tag"));
        field.add("first");
        field.add("second");
        assert_eq!(field.values(), vec!["first"]);
        assert!(!field.input_visible());
    }

    #[test]
    fn single_mode_prunes_excess_markers() {
        let field = bridge(
            FieldMarkup::new("tag")
                .with_marker(TagMarker::new("keep"))
                .with_marker(TagMarker::new("drop"))
                .with_marker(TagMarker::new("drop-too")),
        );
        assert_eq!(field.values(), vec!["keep"]);
        assert_eq!(field.markup().markers.len(), 1);
    }

    #[test]
    fn demotion_to_single_truncates_values() {
        let mut field = bridge(FieldMarkup::new("tags").with_multiple(true));
        field.set_values(&["a", "b", "c"]);
        field.take_notices();

        field.set_multiple(false, &EmptyDirectory);
        assert_eq!(field.values(), vec!["a"]);
        assert_eq!(field.take_notices(), vec![FieldNotice::Change]);

        // Promotion back keeps the surviving value and lifts the cap.
        field.set_multiple(true, &EmptyDirectory);
        field.add("d");
        assert_eq!(field.values(), vec!["a", "d"]);
    }

    #[test]
    fn rename_retargets_submission_entries() {
        let mut field = bridge(FieldMarkup::new("old").with_multiple(true));
        field.add("v");
        field.set_name("new").unwrap();
        assert_eq!(field.form_entries(), vec![("new".to_string(), "v".to_string())]);
        assert_eq!(field.set_name(""), Err(FieldError::MissingName));
    }

    #[test]
    fn suggestions_filter_by_label_substring_case_insensitive() {
        let mut field = bridge(
            FieldMarkup::new("tags")
                .with_multiple(true)
                .with_candidates(langs()),
        );
        let items = field.suggestions_for("ja");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].value, "js");
        assert_eq!(items[0].label, "JavaScript");

        // Active tags are excluded from the suggestion list.
        field.add("js");
        assert!(field.suggestions_for("ja").is_empty());
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut field = bridge(FieldMarkup::new("tags"));
        field.destroy();
        field.destroy();
        assert!(!field.handle_event(&Event::Focus(true)));
        field.tick(Duration::from_secs(1), &EmptyDirectory);
    }
}

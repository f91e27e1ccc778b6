#![forbid(unsafe_code)]

//! Autocomplete engine.
//!
//! A generic debounced fetch → display → select cycle bound to one text
//! input. The engine owns no data source: it issues [`FetchRequest`]s
//! (tagged with a monotonic generation) and accepts results back through
//! [`AutocompleteEngine::resolve`], dropping anything stale. It never looks
//! inside tag semantics, which keeps it reusable for any suggestion
//! surface.
//!
//! # Invariants
//!
//! 1. `selected`, when set, indexes a live member of `items`.
//! 2. A resolution whose generation is not the engine's current one is
//!    discarded before any session state changes.
//! 3. `clear()` bumps the generation, so in-flight work can never
//!    resurrect a dismissed panel.

use std::fmt;
use std::time::Duration;

use chipline_core::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use chipline_core::geometry::Rect;
use chipline_core::timer::Countdown;

/// Grace period between focus loss and clearing the panel, so a mouse
/// selection that caused the blur can still land.
const BLUR_GRACE: Duration = Duration::from_millis(200);

/// What prompted a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Debounced keystroke in the bound input.
    Keystroke,
    /// The input gained focus (with `show_on_focus`).
    Focus,
    /// A mouse click on the bound input.
    Mouse,
    /// Programmatic refresh.
    Manual,
}

/// One suggestion supplied by a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionItem {
    /// Canonical value committed on selection.
    pub value: String,
    /// Human-readable label, matched against and displayed.
    pub label: String,
    /// Optional group header this item sorts under.
    pub group: Option<String>,
}

impl SuggestionItem {
    /// Create an ungrouped suggestion.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            group: None,
        }
    }

    /// Set the group header (builder).
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// A fetch handed to the data source.
///
/// The source reports back through [`AutocompleteEngine::resolve`] with the
/// same generation; results from superseded requests are dropped there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Query text at issue time.
    pub query: String,
    /// Generation the result must carry to be applied.
    pub generation: u64,
    /// What prompted the fetch.
    pub trigger: Trigger,
    /// Cursor position (grapheme index) in the bound input.
    pub cursor: usize,
}

/// When the engine swallows the key that would submit the host form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreventSubmit {
    /// Never interfere with the host's default action.
    #[default]
    Never,
    /// Always swallow Enter while the engine is bound.
    Always,
    /// Swallow Enter only when it commits a selection.
    OnSelect,
}

/// Produces the display text for panel rows. Injected at construction;
/// the default renders an item's label and a group's name verbatim.
pub trait SuggestionView {
    /// Display text for a suggestion row.
    fn item(&self, item: &SuggestionItem) -> String {
        item.label.clone()
    }

    /// Display text for a group header row.
    fn group(&self, name: &str) -> String {
        name.to_string()
    }
}

/// The default pass-through view.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelView;

impl SuggestionView for LabelView {}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum query length (in characters) before a keystroke fetch is
    /// scheduled. Focus and manual triggers ignore this.
    pub min_length: usize,
    /// Delay between the last keystroke and the fetch.
    pub debounce: Duration,
    /// Leave nothing selected when results arrive.
    pub disable_auto_select: bool,
    /// Fetch immediately when the input gains focus.
    pub show_on_focus: bool,
    /// Row shown when a fetch returns nothing. Without one, empty results
    /// close the panel.
    pub empty_message: Option<String>,
    /// Enter-key policy toward the host form.
    pub prevent_submit: PreventSubmit,
    /// Maximum visible panel rows; the rest scroll.
    pub max_visible: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_length: 2,
            debounce: Duration::ZERO,
            disable_auto_select: false,
            show_on_focus: false,
            empty_message: None,
            prevent_submit: PreventSubmit::default(),
            max_visible: 10,
        }
    }
}

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No panel; nothing pending.
    #[default]
    Idle,
    /// A fetch is scheduled or in flight.
    Pending,
    /// Suggestions (or the empty-message row) are on screen.
    Displaying,
}

/// What handling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// Event not handled; route it onward.
    Ignored,
    /// Event consumed (navigation, dismissal, or a swallowed submit key).
    Consumed,
    /// A suggestion was committed; the session has been cleared.
    Selected {
        /// The committed suggestion.
        item: SuggestionItem,
        /// Whether the host should suppress its default submit action,
        /// per the configured [`PreventSubmit`] policy.
        prevent_default: bool,
    },
}

/// One displayable panel row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelRow {
    /// Non-selectable group header.
    Group(String),
    /// A selectable suggestion.
    Item {
        /// Index into the current items.
        index: usize,
        /// Display text from the configured view.
        text: String,
        /// Whether this row carries the selection.
        selected: bool,
    },
    /// Non-selectable placeholder shown for empty results.
    Empty(String),
}

/// Debounced, race-safe suggestion engine for one text input.
pub struct AutocompleteEngine {
    config: EngineConfig,
    view: Box<dyn SuggestionView>,
    state: EngineState,
    /// Query the displayed items were fetched for.
    query: String,
    items: Vec<SuggestionItem>,
    selected: Option<usize>,
    /// First visible display row.
    scroll_offset: usize,
    /// Monotonic fetch generation; only a matching resolution is applied.
    generation: u64,
    /// Latest text and cursor seen from the bound input.
    last_input: String,
    last_cursor: usize,
    debounce: Countdown,
    pending_trigger: Trigger,
    blur: Countdown,
    /// Last computed panel rect, for mouse hit testing.
    placement: Rect,
    destroyed: bool,
}

impl fmt::Debug for AutocompleteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutocompleteEngine")
            .field("state", &self.state)
            .field("query", &self.query)
            .field("items", &self.items.len())
            .field("selected", &self.selected)
            .field("generation", &self.generation)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Default for AutocompleteEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AutocompleteEngine {
    /// Create an engine with the given configuration and the default view.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            view: Box::new(LabelView),
            state: EngineState::Idle,
            query: String::new(),
            items: Vec::new(),
            selected: None,
            scroll_offset: 0,
            generation: 0,
            last_input: String::new(),
            last_cursor: 0,
            debounce: Countdown::idle(),
            pending_trigger: Trigger::Keystroke,
            blur: Countdown::idle(),
            placement: Rect::default(),
            destroyed: false,
        }
    }

    /// Replace the row view (builder).
    pub fn with_view(mut self, view: Box<dyn SuggestionView>) -> Self {
        self.view = view;
        self
    }

    // --- Accessors ---

    /// Current session state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the panel is on screen.
    pub fn panel_visible(&self) -> bool {
        self.state == EngineState::Displaying
    }

    /// Query the displayed items were fetched for.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Currently displayed items.
    pub fn items(&self) -> &[SuggestionItem] {
        &self.items
    }

    /// Selected item index, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Current fetch generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// First visible display row (scroll position).
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Whether [`AutocompleteEngine::destroy`] has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Input notifications ---

    /// The bound input's text changed. Schedules a debounced keystroke
    /// fetch, or clears the session when the query is too short.
    pub fn input_changed(&mut self, text: &str, cursor: usize) {
        if self.destroyed {
            return;
        }
        self.last_input = text.to_string();
        self.last_cursor = cursor;
        self.schedule_fetch(Trigger::Keystroke);
    }

    /// The bound input gained focus. Cancels a pending blur-clear and,
    /// with `show_on_focus`, fetches immediately (no length threshold).
    pub fn on_focus(&mut self) -> Option<FetchRequest> {
        if self.destroyed {
            return None;
        }
        self.blur.cancel();
        if self.config.show_on_focus {
            Some(self.start_fetch(Trigger::Focus))
        } else {
            None
        }
    }

    /// The bound input lost focus. The session clears after a short grace
    /// period unless focus returns first; a mouse selection delivered
    /// before the deadline still completes.
    pub fn on_blur(&mut self) {
        if self.destroyed {
            return;
        }
        self.blur.start(BLUR_GRACE);
    }

    /// A mouse click landed on the bound input. Scheduled like a
    /// keystroke, under its own trigger.
    pub fn on_click_input(&mut self) {
        if self.destroyed {
            return;
        }
        self.schedule_fetch(Trigger::Mouse);
    }

    /// Fetch right now, regardless of query length or debounce.
    pub fn refresh(&mut self) -> Option<FetchRequest> {
        if self.destroyed {
            return None;
        }
        Some(self.start_fetch(Trigger::Manual))
    }

    /// Advance the engine's countdowns. Returns a fetch to run when the
    /// debounce deadline passes.
    pub fn tick(&mut self, dt: Duration) -> Option<FetchRequest> {
        if self.destroyed {
            return None;
        }
        if self.blur.tick(dt) {
            self.clear();
        }
        if self.debounce.tick(dt) {
            return Some(self.start_fetch(self.pending_trigger));
        }
        None
    }

    /// Apply fetched results.
    ///
    /// Returns `false` (dropping the results untouched) when the
    /// generation is stale or the engine is destroyed. Zero items close
    /// the panel unless an empty-message row is configured.
    pub fn resolve(&mut self, generation: u64, items: Vec<SuggestionItem>) -> bool {
        if self.destroyed || generation != self.generation {
            chipline_core::trace!(generation, current = self.generation, "dropping stale results");
            return false;
        }
        chipline_core::debug!(generation, count = items.len(), "applying fetch results");

        self.items = items;
        self.query = self.last_input.clone();
        self.scroll_offset = 0;
        if self.items.is_empty() {
            if self.config.empty_message.is_none() {
                self.clear();
                return true;
            }
            self.selected = None;
        } else {
            self.selected = if self.config.disable_auto_select {
                None
            } else {
                Some(0)
            };
        }
        self.state = EngineState::Displaying;
        self.adjust_scroll();
        true
    }

    // --- Event handling ---

    /// Handle a key or mouse event. Focus transitions go through
    /// [`AutocompleteEngine::on_focus`] / [`AutocompleteEngine::on_blur`]
    /// instead, because gaining focus may need to issue a fetch.
    pub fn handle_event(&mut self, event: &Event) -> EngineOutcome {
        if self.destroyed {
            return EngineOutcome::Ignored;
        }
        match event {
            Event::Key(key)
                if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
            {
                self.handle_key(key)
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                self.handle_click(mouse.x, mouse.y)
            }
            _ => EngineOutcome::Ignored,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EngineOutcome {
        let displaying = self.state == EngineState::Displaying;
        match key.code {
            KeyCode::Escape => {
                if displaying {
                    self.clear();
                    EngineOutcome::Consumed
                } else {
                    EngineOutcome::Ignored
                }
            }
            KeyCode::Down => {
                if displaying && !self.items.is_empty() {
                    self.select_next();
                    EngineOutcome::Consumed
                } else if !displaying {
                    // ArrowDown while closed re-requests suggestions.
                    self.schedule_fetch(Trigger::Keystroke);
                    EngineOutcome::Consumed
                } else {
                    EngineOutcome::Ignored
                }
            }
            KeyCode::Up => {
                if displaying && !self.items.is_empty() {
                    self.select_prev();
                    EngineOutcome::Consumed
                } else {
                    EngineOutcome::Ignored
                }
            }
            KeyCode::Enter => {
                if displaying && let Some(index) = self.selected {
                    let item = self.items[index].clone();
                    let prevent_default = matches!(
                        self.config.prevent_submit,
                        PreventSubmit::Always | PreventSubmit::OnSelect
                    );
                    self.clear();
                    EngineOutcome::Selected {
                        item,
                        prevent_default,
                    }
                } else if self.config.prevent_submit == PreventSubmit::Always {
                    EngineOutcome::Consumed
                } else {
                    EngineOutcome::Ignored
                }
            }
            _ => EngineOutcome::Ignored,
        }
    }

    fn handle_click(&mut self, x: u16, y: u16) -> EngineOutcome {
        if self.state != EngineState::Displaying || !self.placement.contains(x, y) {
            return EngineOutcome::Ignored;
        }
        let row_index = self.scroll_offset + (y - self.placement.y) as usize;
        if let Some(PanelRow::Item { index, .. }) = self.rows().get(row_index) {
            let item = self.items[*index].clone();
            self.clear();
            return EngineOutcome::Selected {
                item,
                prevent_default: true,
            };
        }
        // Header and empty rows swallow the click without selecting.
        EngineOutcome::Consumed
    }

    // --- Session control ---

    /// Clear the session and hide the panel.
    ///
    /// Bumps the generation so pending results are orphaned, and cancels a
    /// scheduled debounce — a dismissed panel stays dismissed until new
    /// input arrives.
    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.items.clear();
        self.query.clear();
        self.selected = None;
        self.scroll_offset = 0;
        self.state = EngineState::Idle;
        self.debounce.cancel();
    }

    /// Tear down: cancel timers and ignore everything from here on.
    /// Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.blur.cancel();
        self.clear();
        self.destroyed = true;
    }

    // --- View model ---

    /// All display rows: group headers on group change, one row per item,
    /// or the empty-message row.
    pub fn rows(&self) -> Vec<PanelRow> {
        if self.state != EngineState::Displaying {
            return Vec::new();
        }
        if self.items.is_empty() {
            return self
                .config
                .empty_message
                .iter()
                .map(|msg| PanelRow::Empty(msg.clone()))
                .collect();
        }
        let mut rows = Vec::with_capacity(self.items.len());
        let mut prev_group: Option<&str> = None;
        for (index, item) in self.items.iter().enumerate() {
            if let Some(group) = item.group.as_deref()
                && prev_group != Some(group)
            {
                prev_group = Some(group);
                rows.push(PanelRow::Group(self.view.group(group)));
            }
            rows.push(PanelRow::Item {
                index,
                text: self.view.item(item),
                selected: self.selected == Some(index),
            });
        }
        rows
    }

    /// The rows currently inside the scroll window.
    pub fn visible_rows(&self) -> Vec<PanelRow> {
        self.rows()
            .into_iter()
            .skip(self.scroll_offset)
            .take(self.config.max_visible)
            .collect()
    }

    /// Compute and remember the panel rect: directly beneath the input,
    /// width-matched, height clamped to the viewport space below. Call on
    /// every render pass (and after a resize) so mouse hit testing stays
    /// accurate.
    pub fn place(&mut self, input_area: Rect, viewport: Rect) -> Rect {
        if self.state != EngineState::Displaying {
            self.placement = Rect::default();
            return self.placement;
        }
        let wanted = self.rows().len().min(self.config.max_visible) as u16;
        let y = input_area.bottom();
        let below = viewport.bottom().saturating_sub(y);
        self.placement = Rect::new(input_area.x, y, input_area.width, wanted.min(below));
        self.placement
    }

    // --- Internal helpers ---

    fn schedule_fetch(&mut self, trigger: Trigger) {
        let long_enough = self.last_input.chars().count() >= self.config.min_length;
        if long_enough || trigger == Trigger::Focus {
            self.pending_trigger = trigger;
            self.debounce.start(match trigger {
                Trigger::Keystroke | Trigger::Mouse => self.config.debounce,
                Trigger::Focus | Trigger::Manual => Duration::ZERO,
            });
            if self.state == EngineState::Idle {
                self.state = EngineState::Pending;
            }
        } else {
            self.clear();
        }
    }

    fn start_fetch(&mut self, trigger: Trigger) -> FetchRequest {
        self.generation = self.generation.wrapping_add(1);
        if self.state == EngineState::Idle {
            self.state = EngineState::Pending;
        }
        chipline_core::trace!(generation = self.generation, ?trigger, "issuing fetch");
        FetchRequest {
            query: self.last_input.clone(),
            generation: self.generation,
            trigger,
            cursor: self.last_cursor,
        }
    }

    fn select_next(&mut self) {
        let len = self.items.len();
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) => (i + 1) % len,
        });
        self.adjust_scroll();
    }

    fn select_prev(&mut self) {
        let len = self.items.len();
        self.selected = Some(match self.selected {
            None => len - 1,
            Some(i) => (i + len - 1) % len,
        });
        self.adjust_scroll();
    }

    /// Keep the selected row inside the scroll window.
    fn adjust_scroll(&mut self) {
        let Some(selected) = self.selected else {
            self.scroll_offset = 0;
            return;
        };
        let rows = self.rows();
        let pos = rows
            .iter()
            .position(|r| matches!(r, PanelRow::Item { index, .. } if *index == selected))
            .unwrap_or(0);
        if pos < self.scroll_offset {
            self.scroll_offset = pos;
        } else if pos >= self.scroll_offset + self.config.max_visible {
            self.scroll_offset = pos + 1 - self.config.max_visible;
        }
    }
}

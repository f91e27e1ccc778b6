#![forbid(unsafe_code)]

//! Interactive widgets for an editable tag/chip field.
//!
//! These widgets are headless state machines: they consume canonical
//! [`chipline_core::event::Event`]s, advance their countdowns through
//! `tick(dt)`, and expose view-model accessors (chip records, panel rows,
//! placement rects, placeholder visibility) that the embedding application
//! draws however it likes. Nothing here writes to a screen.
//!
//! - [`input::TextBox`] — grapheme-aware single-line editor with width
//!   sizing, embedded inside the tag collection.
//! - [`tags::TagCollection`] — the ordered, duplicate-free chip list with
//!   keyboard-armed deletion.
//! - [`autocomplete::AutocompleteEngine`] — generic debounced
//!   fetch/render/select cycle with stale-result protection.

pub mod autocomplete;
pub mod input;
pub mod tags;

pub use autocomplete::{
    AutocompleteEngine, EngineConfig, EngineOutcome, EngineState, FetchRequest, LabelView,
    PanelRow, PreventSubmit, SuggestionItem, SuggestionView, Trigger,
};
pub use input::TextBox;
pub use tags::{MarkerId, TagCollection, TagRecord, TagsConfig, TagsOutcome};

#![forbid(unsafe_code)]

//! Form-field controller for the chipline widgets.
//!
//! [`bridge::FormBridge`] composes one
//! [`chipline_widgets::TagCollection`] and one
//! [`chipline_widgets::AutocompleteEngine`] into a single field-like unit:
//! its canonical value is an ordered array of strings, kept consistent
//! with a declarative [`markup::FieldMarkup`] description and exposed to a
//! host form as named submission entries.
//!
//! The host owns the event loop and the drawing; the bridge owns routing,
//! reconciliation, cardinality, validity, and change notification.

pub mod bridge;
pub mod markup;

pub use bridge::{BridgeConfig, FieldError, FieldNotice, FormBridge};
pub use markup::{
    Candidate, CandidateDirectory, CandidateSource, EmptyDirectory, FieldMarkup, TagMarker,
};

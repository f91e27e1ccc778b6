#![forbid(unsafe_code)]

//! Declarative field description.
//!
//! A [`FieldMarkup`] is the host-owned, declarative picture of one field:
//! its submission name, cardinality, required flag, the tags it starts
//! with, and where its candidate list comes from. The bridge reconciles
//! its live state from this description; hosts that change it notify the
//! bridge rather than mutating widget state directly.

use std::collections::HashMap;

/// A `{value, label}` pair offered by autocomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Canonical value submitted when chosen.
    pub value: String,
    /// Human-readable label, matched against and displayed.
    pub label: String,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Where a field's candidate list comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CandidateSource {
    /// No autocomplete candidates.
    #[default]
    None,
    /// Candidates nested directly in the field description.
    Inline(Vec<Candidate>),
    /// A named list resolved through a [`CandidateDirectory`].
    Reference(String),
}

/// One pre-existing tag in the declarative description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMarker {
    /// Canonical value.
    pub value: String,
    /// Visible label.
    pub label: String,
}

impl TagMarker {
    /// Create a marker whose label equals its value.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }

    /// Create a marker with a distinct label.
    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Declarative description of one tag field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMarkup {
    /// Name the field submits under.
    pub name: String,
    /// Whether the field accepts more than one value.
    pub multiple: bool,
    /// Whether an empty field fails validation.
    pub required: bool,
    /// Placeholder for the empty field; `None` uses the widget default.
    pub placeholder: Option<String>,
    /// Pre-existing tags, in order.
    pub markers: Vec<TagMarker>,
    /// Candidate list for autocomplete.
    pub candidates: CandidateSource,
}

impl FieldMarkup {
    /// Create a description with the given submission name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            multiple: false,
            required: false,
            placeholder: None,
            markers: Vec::new(),
            candidates: CandidateSource::None,
        }
    }

    /// Allow multiple values (builder).
    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Mark the field required (builder).
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the placeholder (builder).
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Append a pre-existing tag (builder).
    pub fn with_marker(mut self, marker: TagMarker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Set the candidate source (builder).
    pub fn with_candidates(mut self, candidates: CandidateSource) -> Self {
        self.candidates = candidates;
        self
    }

    /// Resolve the candidate list through `directory`.
    ///
    /// Inline candidates resolve to themselves; an unknown reference
    /// resolves to no candidates.
    pub fn resolve_candidates<'a>(
        &'a self,
        directory: &'a dyn CandidateDirectory,
    ) -> &'a [Candidate] {
        match &self.candidates {
            CandidateSource::None => &[],
            CandidateSource::Inline(candidates) => candidates,
            CandidateSource::Reference(id) => directory.lookup(id).unwrap_or(&[]),
        }
    }
}

/// Host-side registry of named candidate lists.
pub trait CandidateDirectory {
    /// Look up a list by its reference id.
    fn lookup(&self, id: &str) -> Option<&[Candidate]>;
}

/// A directory that resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDirectory;

impl CandidateDirectory for EmptyDirectory {
    fn lookup(&self, _id: &str) -> Option<&[Candidate]> {
        None
    }
}

impl CandidateDirectory for HashMap<String, Vec<Candidate>> {
    fn lookup(&self, id: &str) -> Option<&[Candidate]> {
        self.get(id).map(Vec::as_slice)
    }
}

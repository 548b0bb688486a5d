//! Identifiers for documents, slides and elements.
//!
//! Slide and element ids are plain strings because they come from outside the
//! editor (stored documents, slide generators) as often as from inside it.
//! Ids minted by the editor come from an [`IdGenerator`] carried in the editor
//! state, which keeps the transition function deterministic.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a stored presentation document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Slide identifier, unique within a presentation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(pub String);

/// Element identifier, unique within a slide
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl SlideId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ElementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlideId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SlideId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SlideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints fresh slide and element ids.
///
/// Ids have the form `{prefix}-{namespace}-{n}` where the namespace is a random
/// UUID chosen once per session and `n` counts up. The generator is a plain
/// value: copying an editor state copies its generator, so replaying the same
/// actions against the same state yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    namespace: String,
    next: u64,
}

impl IdGenerator {
    /// Create a generator with a random namespace
    pub fn new() -> Self {
        Self::with_namespace(Uuid::new_v4().simple().to_string())
    }

    /// Create a generator with a fixed namespace
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next: 1,
        }
    }

    /// Next element id not contained in `taken`
    pub fn next_element_id(&mut self, taken: &HashSet<String>) -> ElementId {
        ElementId(self.next_free("el", taken))
    }

    /// Next slide id not contained in `taken`
    pub fn next_slide_id(&mut self, taken: &HashSet<String>) -> SlideId {
        SlideId(self.next_free("slide", taken))
    }

    fn next_free(&mut self, prefix: &str, taken: &HashSet<String>) -> String {
        loop {
            let candidate = format!("{}-{}-{}", prefix, self.namespace, self.next);
            self.next += 1;
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

//! Pair key types: the ordered label pair and the unordered component pair.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::runtime::ComponentId;

/// An ordered pair of knowledge field labels. The filter label is the
/// knowledge used to measure the distance between two components; the
/// subject label is the knowledge whose correlation is being tested.
///
/// Direction matters: `(pos, temp)` and `(temp, pos)` are distinct pairs,
/// because the boundary and the confidence level are keyed by the subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LabelPair {
    pub filter: String,
    pub subject: String,
}

impl LabelPair {
    pub fn new(filter: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            subject: subject.into(),
        }
    }
}

impl fmt::Display for LabelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.filter, self.subject)
    }
}

/// An unordered pair of two distinct components. Equality and hashing are
/// symmetric: `pair(a, b) == pair(b, a)` and their hashes agree.
#[derive(Debug, Clone)]
pub struct ComponentPair {
    pub first: ComponentId,
    pub second: ComponentId,
}

impl ComponentPair {
    pub fn new(first: ComponentId, second: ComponentId) -> Self {
        Self { first, second }
    }
}

impl PartialEq for ComponentPair {
    fn eq(&self, other: &Self) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

impl Eq for ComponentPair {}

impl Hash for ComponentPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Combine the element hashes commutatively so that the ordering of
        // the components cannot influence the pair hash.
        state.write_u64(element_hash(&self.first).wrapping_add(element_hash(&self.second)));
    }
}

fn element_hash(id: &ComponentId) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

impl fmt::Display for ComponentPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.first, self.second)
    }
}

//! Entity names - the durable identity of graph nodes.

use serde::{Deserialize, Serialize};

/// The structured name of a graph entity.
///
/// This is the durable primary key of a node: a file, an identifier, an
/// anchor, or any other addressable element of the code graph. Any subset
/// of the fields may be empty; equality is field-wise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityName {
    /// Opaque discriminator assigned by the producing analyzer
    /// (e.g., a content digest for files).
    pub signature: String,

    /// The corpus the entity belongs to (usually a repository name).
    pub corpus: String,

    /// A corpus-relative root, for corpora with several source trees.
    pub root: String,

    /// Root-relative path of the entity's file.
    pub path: String,

    /// Source language of the entity, when known.
    pub language: String,
}

impl EntityName {
    /// Returns true if every field is empty.
    pub fn is_empty(&self) -> bool {
        self.signature.is_empty()
            && self.corpus.is_empty()
            && self.root.is_empty()
            && self.path.is_empty()
            && self.language.is_empty()
    }
}

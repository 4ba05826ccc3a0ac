//! Records - the atomic unit read from the graph store.

use crate::name::EntityName;
use serde::{Deserialize, Serialize};

/// One fact or edge, as stored and streamed.
///
/// A record is a *fact* (`edge` is `None`: a named attribute of `source`)
/// or an *edge* (`edge` is `Some`: a directed, kind-labeled relation from
/// `source` to a target). Exactly one of the two holds. Edge records may
/// carry a fact payload of their own (ordinals); the query engine does not
/// interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub source: EntityName,

    #[serde(default)]
    pub edge: Option<EdgeTarget>,

    #[serde(default)]
    pub fact_name: String,

    #[serde(default, with = "base64_bytes")]
    pub fact_value: Vec<u8>,
}

/// The edge half of an edge record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTarget {
    pub kind: String,
    pub target: EntityName,
}

impl Record {
    /// Builds a fact record.
    pub fn fact(
        source: EntityName,
        fact_name: impl Into<String>,
        fact_value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            source,
            edge: None,
            fact_name: fact_name.into(),
            fact_value: fact_value.into(),
        }
    }

    /// Builds an edge record with no fact payload.
    pub fn edge(source: EntityName, kind: impl Into<String>, target: EntityName) -> Self {
        Self {
            source,
            edge: Some(EdgeTarget {
                kind: kind.into(),
                target,
            }),
            fact_name: String::new(),
            fact_value: Vec::new(),
        }
    }

    /// Returns true for edge records.
    pub fn is_edge(&self) -> bool {
        self.edge.is_some()
    }

    /// The edge kind, for edge records.
    pub fn edge_kind(&self) -> Option<&str> {
        self.edge.as_ref().map(|e| e.kind.as_str())
    }
}

/// Serde adapter encoding byte fields as base64 strings in human-readable
/// formats (JSON) while leaving binary formats untouched.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&STANDARD.encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}

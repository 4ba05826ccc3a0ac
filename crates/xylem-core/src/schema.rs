//! Graph schema constants and the reverse-edge convention.
//!
//! Fact names, node kinds, and edge kinds are process-wide immutable
//! vocabulary shared by producers (indexers) and consumers (the query
//! engine). The store holds a mirror record for every forward edge, so
//! reverse traversal is a scan of the target's own records for the
//! mirrored kind - never a scan of the whole store.

/// Fact holding a node's kind (`anchor`, `file`, ...).
pub const NODE_KIND_FACT: &str = "/xylem/node/kind";

/// Byte offset where an anchor's span starts.
pub const ANCHOR_START_FACT: &str = "/xylem/loc/start";
/// Byte offset where an anchor's span ends.
pub const ANCHOR_END_FACT: &str = "/xylem/loc/end";

/// Full contents of a file node.
pub const FILE_TEXT_FACT: &str = "/xylem/text";
/// Character encoding of a file node's text.
pub const FILE_ENCODING_FACT: &str = "/xylem/text/encoding";

/// Node kind of source-span anchors.
pub const ANCHOR_KIND: &str = "anchor";
/// Node kind of files.
pub const FILE_KIND: &str = "file";
/// Node kind of abstract names.
pub const NAME_KIND: &str = "name";

const EDGE_PREFIX: &str = "/xylem/edge/";

/// Links an entity to the entity that contains it.
pub const CHILD_OF_EDGE: &str = "/xylem/edge/childof";
/// Links an anchor to the entity it defines.
pub const DEFINES_EDGE: &str = "/xylem/edge/defines";
/// Links an anchor to the entity it references.
pub const REF_EDGE: &str = "/xylem/edge/ref";

/// Prefix marking a mirrored (reverse) edge kind. An edge kind carries
/// the marker at most once.
pub const REVERSE_MARKER: &str = "%";

/// The inherent direction of an edge kind.
///
/// Forward edges are dependency-like and keep node out-degree small;
/// reverse edges are their store-maintained mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Forward,
    Reverse,
}

/// Returns the direction of the given edge kind.
pub fn direction(kind: &str) -> EdgeDirection {
    if kind.starts_with(REVERSE_MARKER) {
        EdgeDirection::Reverse
    } else {
        EdgeDirection::Forward
    }
}

/// Returns the mirrored kind: reverse for forward kinds, forward for
/// reverse kinds. An involution: `mirror(mirror(k)) == k`.
pub fn mirror(kind: &str) -> String {
    match kind.strip_prefix(REVERSE_MARKER) {
        Some(forward) => forward.to_string(),
        None => format!("{REVERSE_MARKER}{kind}"),
    }
}

/// Returns true if the kind carries the reverse marker at most once.
///
/// Kinds marked more than once cannot come from [`mirror`]; they are
/// malformed input and callers should reject them rather than guess.
pub fn is_well_formed(kind: &str) -> bool {
    match kind.strip_prefix(REVERSE_MARKER) {
        Some(forward) => !forward.starts_with(REVERSE_MARKER),
        None => true,
    }
}

/// Returns true for kinds in the canonical `/xylem/edge/` namespace,
/// marked or not.
pub fn is_edge_kind(kind: &str) -> bool {
    kind.strip_prefix(REVERSE_MARKER)
        .unwrap_or(kind)
        .starts_with(EDGE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_is_an_involution() {
        for kind in [CHILD_OF_EDGE, DEFINES_EDGE, REF_EDGE] {
            let mirrored = mirror(kind);
            assert_ne!(mirrored, kind);
            assert_eq!(mirror(&mirrored), kind);
        }
    }

    #[test]
    fn test_direction_flips_under_mirror() {
        assert_eq!(direction(CHILD_OF_EDGE), EdgeDirection::Forward);
        assert_eq!(direction(&mirror(CHILD_OF_EDGE)), EdgeDirection::Reverse);
    }

    #[test]
    fn test_well_formedness() {
        assert!(is_well_formed(REF_EDGE));
        assert!(is_well_formed(&mirror(REF_EDGE)));
        assert!(!is_well_formed("%%/xylem/edge/ref"));
    }

    #[test]
    fn test_edge_kind_namespace() {
        assert!(is_edge_kind(CHILD_OF_EDGE));
        assert!(is_edge_kind(&mirror(REF_EDGE)));
        assert!(!is_edge_kind(NODE_KIND_FACT));
    }
}

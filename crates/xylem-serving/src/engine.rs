//! The query engine: Nodes, Edges, and Decorations over a record store.

use crate::error::ServingError;
use crate::reply::{
    DecorationsReply, DecorationsRequest, EdgeGroup, EdgeSet, EdgesReply, EdgesRequest, Fact,
    NodeInfo, NodesReply, NodesRequest, Reference,
};
use crate::service::XrefService;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use xylem_core::{schema, EntityName, FactFilter};
use xylem_store::{KindFilter, RecordStore};

/// Serves cross-reference queries by scanning a [`RecordStore`].
///
/// One accumulator task runs per requested entity; each owns its private
/// state and sees its scan as a stream, so peak memory is bounded by one
/// entity's records per task. The engine never writes to the store.
pub struct XrefEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for XrefEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore + ?Sized + 'static> XrefEngine<S> {
    /// Creates an engine over an existing store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Collects the `(kind, target)` pairs of `source`'s edge records
    /// passing `keep`.
    fn edge_targets(
        store: &S,
        source: &EntityName,
        kinds: KindFilter,
        keep: impl Fn(&str) -> bool,
    ) -> Result<Vec<(String, EntityName)>, ServingError> {
        let mut targets = Vec::new();
        for record in store.scan(source, kinds)? {
            if let Some(edge) = record?.edge {
                if keep(&edge.kind) {
                    targets.push((edge.kind, edge.target));
                }
            }
        }
        Ok(targets)
    }

    /// Reads a file's text and encoding facts.
    fn source_text(
        store: &S,
        file: &EntityName,
        ticket: &str,
    ) -> Result<(Vec<u8>, String), ServingError> {
        let mut text = None;
        let mut encoding = String::new();
        for record in store.scan(file, KindFilter::Facts)? {
            let record = record?;
            match record.fact_name.as_str() {
                schema::FILE_TEXT_FACT => text = Some(record.fact_value),
                schema::FILE_ENCODING_FACT => {
                    encoding = String::from_utf8_lossy(&record.fact_value).into_owned();
                }
                _ => {} // other file facts are not part of the reply
            }
        }
        match text {
            Some(text) => Ok((text, encoding)),
            None => Err(ServingError::FileNotFound(ticket.to_string())),
        }
    }
}

/// What one Edges accumulator gathered for its ticket.
struct EdgeScan {
    ticket: String,
    facts: Vec<Fact>,
    groups: BTreeMap<String, BTreeSet<String>>,
}

#[async_trait]
impl<S: RecordStore + ?Sized + 'static> XrefService for XrefEngine<S> {
    async fn nodes(&self, req: NodesRequest) -> Result<NodesReply, ServingError> {
        let filter = Arc::new(FactFilter::compile(&req.filters)?);
        let names = decode_tickets(&req.tickets)?;
        debug!(tickets = names.len(), "nodes query");

        let mut jobs = Vec::with_capacity(names.len());
        for (ticket, name) in req.tickets.iter().cloned().zip(names) {
            let store = Arc::clone(&self.store);
            let filter = Arc::clone(&filter);
            jobs.push(move || -> Result<NodeInfo, ServingError> {
                let mut info = NodeInfo {
                    ticket,
                    facts: Vec::new(),
                };
                for record in store.scan(&name, KindFilter::Facts)? {
                    let record = record?;
                    if filter.matches(&record.fact_name) {
                        info.facts.push(Fact {
                            name: record.fact_name,
                            value: record.fact_value,
                        });
                    }
                }
                Ok(info)
            });
        }
        Ok(NodesReply {
            nodes: fan_out(jobs).await?,
        })
    }

    async fn edges(&self, req: EdgesRequest) -> Result<EdgesReply, ServingError> {
        if !req.page_token.is_empty() {
            return Err(ServingError::Unimplemented("edge pagination"));
        }
        for kind in &req.kinds {
            if !schema::is_well_formed(kind) {
                return Err(ServingError::InvalidEdgeKind(kind.clone()));
            }
        }

        let filter = Arc::new(FactFilter::compile(&req.filters)?);
        let allowed: Arc<HashSet<String>> = Arc::new(req.kinds.iter().cloned().collect());
        let names = decode_tickets(&req.tickets)?;
        debug!(tickets = names.len(), kinds = req.kinds.len(), "edges query");

        let mut jobs = Vec::with_capacity(names.len());
        for (ticket, name) in req.tickets.iter().cloned().zip(names) {
            let store = Arc::clone(&self.store);
            let filter = Arc::clone(&filter);
            let allowed = Arc::clone(&allowed);
            jobs.push(move || -> Result<EdgeScan, ServingError> {
                let mut scan = EdgeScan {
                    ticket,
                    facts: Vec::new(),
                    groups: BTreeMap::new(),
                };
                for record in store.scan(&name, KindFilter::Any)? {
                    let record = record?;
                    match record.edge {
                        None => {
                            // Source facts ride along only when the request
                            // names filters; targets get theirs from the
                            // batched lookup below.
                            if !filter.is_empty() && filter.matches(&record.fact_name) {
                                scan.facts.push(Fact {
                                    name: record.fact_name,
                                    value: record.fact_value,
                                });
                            }
                        }
                        Some(edge) => {
                            if allowed.is_empty() || allowed.contains(&edge.kind) {
                                scan.groups
                                    .entry(edge.kind)
                                    .or_default()
                                    .insert(edge.target.ticket());
                            }
                        }
                    }
                }
                Ok(scan)
            });
        }

        let mut reply = EdgesReply::default();
        let mut target_set = BTreeSet::new();
        for scan in fan_out(jobs).await? {
            // An EdgeSet appears iff the ticket kept at least one edge; its
            // NodeInfo appears iff it also kept facts.
            if scan.groups.is_empty() {
                continue;
            }
            let mut groups = Vec::with_capacity(scan.groups.len());
            for (kind, targets) in scan.groups {
                target_set.extend(targets.iter().cloned());
                groups.push(EdgeGroup {
                    kind,
                    targets: targets.into_iter().collect(),
                });
            }
            reply.edge_sets.push(EdgeSet {
                source_ticket: scan.ticket.clone(),
                groups,
            });
            if !scan.facts.is_empty() {
                reply.nodes.push(NodeInfo {
                    ticket: scan.ticket,
                    facts: scan.facts,
                });
            }
        }

        // Resolve every referenced target we don't already carry, in one
        // batched call.
        for node in &reply.nodes {
            target_set.remove(&node.ticket);
        }
        let targets = self
            .nodes(NodesRequest {
                tickets: target_set.into_iter().collect(),
                filters: req.filters,
            })
            .await?;
        reply.nodes.extend(targets.nodes);

        Ok(reply)
    }

    async fn decorations(
        &self,
        req: DecorationsRequest,
    ) -> Result<DecorationsReply, ServingError> {
        if !req.dirty_buffer.is_empty() {
            return Err(ServingError::Unimplemented("dirty-buffer patching"));
        }
        if req.location.span.is_some() {
            return Err(ServingError::Unimplemented("span locations"));
        }

        let file_ticket = req.location.ticket.clone();
        let file = decode_ticket(&file_ticket)?;
        let mut reply = DecorationsReply {
            location: req.location,
            ..Default::default()
        };

        if req.source_text {
            let store = Arc::clone(&self.store);
            let name = file.clone();
            let ticket = file_ticket.clone();
            let (text, encoding) =
                tokio::task::spawn_blocking(move || Self::source_text(&store, &name, &ticket))
                    .await??;
            reply.source_text = text;
            reply.encoding = encoding;
        }

        if req.references {
            // Chase file --%childof--> [anchor] --forward kind--> [target],
            // collecting anchor nodes, reference triples, and target nodes.
            let children = {
                let store = Arc::clone(&self.store);
                let name = file.clone();
                tokio::task::spawn_blocking(move || {
                    Self::edge_targets(
                        &store,
                        &name,
                        KindFilter::Exact(schema::mirror(schema::CHILD_OF_EDGE)),
                        |_| true,
                    )
                })
                .await??
            };

            let mut target_set = BTreeSet::new();
            for (_, child) in children {
                let child_ticket = child.ticket();
                let resolved = self
                    .nodes(NodesRequest {
                        tickets: vec![child_ticket.clone()],
                        filters: Vec::new(),
                    })
                    .await?;
                if resolved.nodes.len() != 1 {
                    return Err(ServingError::Inconsistent(format!(
                        "found {} nodes for {child_ticket}",
                        resolved.nodes.len()
                    )));
                }
                let Some(anchor) = resolved.nodes.into_iter().next() else {
                    return Err(ServingError::Inconsistent(format!(
                        "no node for {child_ticket}"
                    )));
                };
                if node_kind(&anchor) != schema::ANCHOR_KIND.as_bytes() {
                    // Files have non-anchor children too; they carry no
                    // decorations.
                    continue;
                }
                reply.nodes.push(anchor);

                let targets = {
                    let store = Arc::clone(&self.store);
                    tokio::task::spawn_blocking(move || {
                        Self::edge_targets(&store, &child, KindFilter::Any, |kind| {
                            schema::direction(kind) == schema::EdgeDirection::Forward
                                && kind != schema::CHILD_OF_EDGE
                        })
                    })
                    .await??
                };
                if targets.is_empty() {
                    warn!(anchor = %child_ticket, "anchor has no forward edges");
                }
                for (kind, target) in targets {
                    let target_ticket = target.ticket();
                    target_set.insert(target_ticket.clone());
                    reply.references.push(Reference {
                        anchor_ticket: child_ticket.clone(),
                        kind,
                        target_ticket,
                    });
                }
            }

            let targets = self
                .nodes(NodesRequest {
                    tickets: target_set.into_iter().collect(),
                    filters: Vec::new(),
                })
                .await?;
            reply.nodes.extend(targets.nodes);
        }

        // Different steps may fetch the same entity; the reply carries each
        // ticket once.
        let mut seen = HashSet::new();
        reply.nodes.retain(|node| seen.insert(node.ticket.clone()));

        Ok(reply)
    }
}

/// Runs one blocking accumulator per entity and joins the whole batch,
/// preserving input order. The first failure aborts the batch; results of
/// still-running accumulators are discarded.
async fn fan_out<T, F>(jobs: Vec<F>) -> Result<Vec<T>, ServingError>
where
    F: FnOnce() -> Result<T, ServingError> + Send + 'static,
    T: Send + 'static,
{
    let count = jobs.len();
    let mut set = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        set.spawn_blocking(move || (index, job()));
    }
    let mut slots: Vec<Option<T>> = Vec::new();
    slots.resize_with(count, || None);
    while let Some(joined) = set.join_next().await {
        let (index, outcome) = joined?;
        match outcome {
            Ok(value) => slots[index] = Some(value),
            Err(err) => {
                set.abort_all();
                return Err(err);
            }
        }
    }
    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| {
                ServingError::Inconsistent("accumulator finished without a result".into())
            })
        })
        .collect()
}

fn decode_ticket(ticket: &str) -> Result<EntityName, ServingError> {
    EntityName::parse_ticket(ticket)
        .map_err(|reason| ServingError::invalid_ticket(ticket, reason))
}

fn decode_tickets(tickets: &[String]) -> Result<Vec<EntityName>, ServingError> {
    tickets.iter().map(|t| decode_ticket(t)).collect()
}

/// The value of a node's kind fact, empty if absent.
fn node_kind(info: &NodeInfo) -> &[u8] {
    info.facts
        .iter()
        .find(|fact| fact.name == schema::NODE_KIND_FACT)
        .map(|fact| fact.value.as_slice())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::{Location, Span};
    use xylem_core::Record;
    use xylem_store::MemoryRecordStore;

    fn entity(path: &str) -> EntityName {
        EntityName {
            corpus: "c".into(),
            path: path.into(),
            language: "go".into(),
            ..Default::default()
        }
    }

    fn anchor(signature: &str) -> EntityName {
        EntityName {
            signature: signature.into(),
            ..entity("f")
        }
    }

    /// Writes a forward edge and its mirror, as a conforming store holds
    /// them.
    fn write_edge(store: &MemoryRecordStore, source: &EntityName, kind: &str, target: &EntityName) {
        store
            .write(&Record::edge(source.clone(), kind, target.clone()))
            .unwrap();
        store
            .write(&Record::edge(
                target.clone(),
                schema::mirror(kind),
                source.clone(),
            ))
            .unwrap();
    }

    fn write_fact(store: &MemoryRecordStore, source: &EntityName, name: &str, value: &[u8]) {
        store
            .write(&Record::fact(source.clone(), name, value.to_vec()))
            .unwrap();
    }

    /// A file with one anchor child (with a ref edge to a target), one
    /// non-anchor child, text, and an encoding.
    fn decorated_file() -> (MemoryRecordStore, EntityName) {
        let store = MemoryRecordStore::new();
        let file = entity("f");
        let a1 = anchor("a1");
        let stray = anchor("not-an-anchor");
        let target = anchor("t1");

        write_fact(&store, &file, schema::NODE_KIND_FACT, b"file");
        write_fact(&store, &file, schema::FILE_TEXT_FACT, b"hello world");
        write_fact(&store, &file, schema::FILE_ENCODING_FACT, b"UTF-8");

        write_fact(&store, &a1, schema::NODE_KIND_FACT, b"anchor");
        write_edge(&store, &a1, schema::CHILD_OF_EDGE, &file);
        write_edge(&store, &a1, schema::REF_EDGE, &target);

        write_fact(&store, &stray, schema::NODE_KIND_FACT, b"name");
        write_edge(&store, &stray, schema::CHILD_OF_EDGE, &file);

        write_fact(&store, &target, schema::NODE_KIND_FACT, b"name");
        (store, file)
    }

    fn engine(store: MemoryRecordStore) -> XrefEngine<MemoryRecordStore> {
        XrefEngine::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_nodes_without_filter_returns_all_facts() {
        let store = MemoryRecordStore::new();
        let f = entity("f");
        write_fact(&store, &f, schema::NODE_KIND_FACT, b"file");
        write_fact(&store, &f, schema::FILE_TEXT_FACT, b"x");
        // Edges never surface through nodes().
        write_edge(&store, &f, schema::REF_EDGE, &entity("g"));

        let reply = engine(store)
            .nodes(NodesRequest {
                tickets: vec![f.ticket()],
                filters: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(reply.nodes.len(), 1);
        assert_eq!(reply.nodes[0].facts.len(), 2);
    }

    #[tokio::test]
    async fn test_nodes_preserves_order_and_keeps_empty_entries() {
        let store = MemoryRecordStore::new();
        let f = entity("f");
        let g = entity("g");
        write_fact(&store, &f, schema::NODE_KIND_FACT, b"file");
        write_fact(&store, &g, schema::NODE_KIND_FACT, b"file");

        let reply = engine(store)
            .nodes(NodesRequest {
                tickets: vec![g.ticket(), f.ticket()],
                filters: vec!["/xylem/text".into()],
            })
            .await
            .unwrap();

        let tickets: Vec<_> = reply.nodes.iter().map(|n| n.ticket.clone()).collect();
        assert_eq!(tickets, vec![g.ticket(), f.ticket()]);
        assert!(reply.nodes.iter().all(|n| n.facts.is_empty()));
    }

    #[tokio::test]
    async fn test_nodes_rejects_bad_ticket() {
        let reply = engine(MemoryRecordStore::new())
            .nodes(NodesRequest {
                tickets: vec!["not-a-ticket".into()],
                filters: Vec::new(),
            })
            .await;
        assert!(matches!(reply, Err(ServingError::InvalidTicket { .. })));
    }

    #[tokio::test]
    async fn test_edges_page_token_is_unimplemented() {
        let reply = engine(MemoryRecordStore::new())
            .edges(EdgesRequest {
                tickets: vec![entity("f").ticket()],
                page_token: "next".into(),
                ..Default::default()
            })
            .await;
        assert!(matches!(reply, Err(ServingError::Unimplemented(_))));
    }

    #[tokio::test]
    async fn test_edges_rejects_doubly_marked_kind() {
        let reply = engine(MemoryRecordStore::new())
            .edges(EdgesRequest {
                tickets: vec![entity("f").ticket()],
                kinds: vec!["%%/xylem/edge/ref".into()],
                ..Default::default()
            })
            .await;
        assert!(matches!(reply, Err(ServingError::InvalidEdgeKind(_))));
    }

    #[tokio::test]
    async fn test_edges_groups_kinds_and_batches_targets() {
        let store = MemoryRecordStore::new();
        let f = entity("f");
        let t1 = entity("t1");
        let t2 = entity("t2");
        write_edge(&store, &f, schema::REF_EDGE, &t1);
        write_edge(&store, &f, schema::REF_EDGE, &t2);
        write_edge(&store, &f, schema::DEFINES_EDGE, &t1);
        write_fact(&store, &t1, schema::NODE_KIND_FACT, b"name");
        write_fact(&store, &t2, schema::NODE_KIND_FACT, b"name");

        let reply = engine(store)
            .edges(EdgesRequest {
                tickets: vec![f.ticket()],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(reply.edge_sets.len(), 1);
        let set = &reply.edge_sets[0];
        assert_eq!(set.source_ticket, f.ticket());
        assert_eq!(set.groups.len(), 2);
        for group in &set.groups {
            match group.kind.as_str() {
                schema::REF_EDGE => assert_eq!(group.targets.len(), 2),
                schema::DEFINES_EDGE => assert_eq!(group.targets, vec![t1.ticket()]),
                other => panic!("unexpected kind {other}"),
            }
        }

        // t1 is referenced by two groups but resolved once.
        let mut tickets: Vec<_> = reply.nodes.iter().map(|n| n.ticket.clone()).collect();
        tickets.sort();
        let mut expected = vec![t1.ticket(), t2.ticket()];
        expected.sort();
        assert_eq!(tickets, expected);
    }

    #[tokio::test]
    async fn test_edges_allow_list_gates_edge_set_emission() {
        let store = MemoryRecordStore::new();
        let f = entity("f");
        write_edge(&store, &f, schema::DEFINES_EDGE, &entity("t"));

        let reply = engine(store)
            .edges(EdgesRequest {
                tickets: vec![f.ticket()],
                kinds: vec![schema::REF_EDGE.into()],
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(reply.edge_sets.is_empty());
        assert!(reply.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_edges_source_facts_require_filters() {
        let store = MemoryRecordStore::new();
        let f = entity("f");
        write_fact(&store, &f, schema::NODE_KIND_FACT, b"file");
        write_edge(&store, &f, schema::REF_EDGE, &entity("t"));

        let engine = engine(store);
        let unfiltered = engine
            .edges(EdgesRequest {
                tickets: vec![f.ticket()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!unfiltered.nodes.iter().any(|n| n.ticket == f.ticket()));

        let filtered = engine
            .edges(EdgesRequest {
                tickets: vec![f.ticket()],
                filters: vec!["/xylem/node/**".into()],
                ..Default::default()
            })
            .await
            .unwrap();
        let source = filtered
            .nodes
            .iter()
            .find(|n| n.ticket == f.ticket())
            .expect("source node");
        assert_eq!(source.facts.len(), 1);
    }

    #[tokio::test]
    async fn test_decorations_source_text() {
        let (store, file) = decorated_file();
        let reply = engine(store)
            .decorations(DecorationsRequest {
                location: Location {
                    ticket: file.ticket(),
                    span: None,
                },
                source_text: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(reply.source_text, b"hello world");
        assert_eq!(reply.encoding, "UTF-8");
        assert!(reply.references.is_empty());
    }

    #[tokio::test]
    async fn test_decorations_missing_text_is_not_found() {
        let store = MemoryRecordStore::new();
        let file = entity("f");
        write_fact(&store, &file, schema::NODE_KIND_FACT, b"file");

        let reply = engine(store)
            .decorations(DecorationsRequest {
                location: Location {
                    ticket: file.ticket(),
                    span: None,
                },
                source_text: true,
                ..Default::default()
            })
            .await;
        assert!(matches!(reply, Err(ServingError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_decorations_references_end_to_end() {
        let (store, file) = decorated_file();
        let reply = engine(store)
            .decorations(DecorationsRequest {
                location: Location {
                    ticket: file.ticket(),
                    span: None,
                },
                references: true,
                ..Default::default()
            })
            .await
            .unwrap();

        // Only the anchor child decorates the file; the non-anchor child
        // contributes nothing.
        assert_eq!(reply.references.len(), 1);
        let reference = &reply.references[0];
        assert_eq!(reference.anchor_ticket, anchor("a1").ticket());
        assert_eq!(reference.kind, schema::REF_EDGE);
        assert_eq!(reference.target_ticket, anchor("t1").ticket());

        let mut tickets: Vec<_> = reply.nodes.iter().map(|n| n.ticket.clone()).collect();
        tickets.sort();
        let mut expected = vec![anchor("a1").ticket(), anchor("t1").ticket()];
        expected.sort();
        assert_eq!(tickets, expected);
    }

    #[tokio::test]
    async fn test_decorations_rejects_spans_and_dirty_buffers() {
        let (store, file) = decorated_file();
        let engine = engine(store);

        let spanned = engine
            .decorations(DecorationsRequest {
                location: Location {
                    ticket: file.ticket(),
                    span: Some(Span { start: 0, end: 5 }),
                },
                ..Default::default()
            })
            .await;
        assert!(matches!(spanned, Err(ServingError::Unimplemented(_))));

        let dirty = engine
            .decorations(DecorationsRequest {
                location: Location {
                    ticket: file.ticket(),
                    span: None,
                },
                dirty_buffer: b"edited".to_vec(),
                ..Default::default()
            })
            .await;
        assert!(matches!(dirty, Err(ServingError::Unimplemented(_))));
    }
}

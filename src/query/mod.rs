use serde::Serialize;

use crate::graph::{Diagram, ResourceId};

/// Query trait implemented by all query types.
///
/// Given an immutable reference to a `Diagram`, returns a result of type `R`.
pub trait Query<R> {
    fn run(&self, diagram: &Diagram) -> R;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedRow {
    pub from: String,
    pub target: String,
    pub label: String,
}

/// List references that resolved to nothing (edges pointing at a sentinel).
///
/// Rows are sorted by source id, then sentinel.
#[derive(Debug, Default)]
pub struct UnmatchedQuery;

impl UnmatchedQuery {
    #[must_use]
    pub fn new() -> Self { Self }
}

impl Query<Vec<UnmatchedRow>> for UnmatchedQuery {
    fn run(&self, diagram: &Diagram) -> Vec<UnmatchedRow> {
        let mut out: Vec<UnmatchedRow> = diagram
            .edges
            .iter()
            .filter(|e| e.to.is_unmatched())
            .map(|e| UnmatchedRow {
                from: e.from.to_string(),
                target: e.to.to_string(),
                label: e.label.clone(),
            })
            .collect();
        // Stable sort keeps engine order among edges of one source
        out.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.target.cmp(&b.target)));
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedRow {
    pub direction: Direction,
    pub other: String,
    pub label: String,
}

/// Edges touching one resource: outgoing first, then incoming, each in engine order.
pub struct RelatedQuery {
    pub id: ResourceId,
}

impl RelatedQuery {
    /// Construct a query for the resource with identifier `id` (e.g. `default_Deployment_web`).
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: ResourceId(id.into()) }
    }
}

impl Query<Vec<RelatedRow>> for RelatedQuery {
    fn run(&self, diagram: &Diagram) -> Vec<RelatedRow> {
        let outgoing = diagram.edges.iter().filter(|e| e.from == self.id).map(|e| RelatedRow {
            direction: Direction::Outgoing,
            other: e.to.to_string(),
            label: e.label.clone(),
        });
        let incoming = diagram
            .edges
            .iter()
            .filter(|e| e.to.as_str() == self.id.as_str() && !e.to.is_unmatched())
            .map(|e| RelatedRow {
                direction: Direction::Incoming,
                other: e.from.to_string(),
                label: e.label.clone(),
            });
        outgoing.chain(incoming).collect()
    }
}

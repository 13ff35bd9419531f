use core::fmt::Debug;

/// Failures raised by [`crate::BipartiteGraph`].
///
/// `Leaf` is the identifier type is parameterized so callers keep the
/// offending vertex/edge as data rather than a pre-rendered string, matching
/// the wire-error-attribute requirement that identifiers travel as data.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError<Leaf, NonLeaf>
where
    Leaf: Debug,
    NonLeaf: Debug,
{
    /// [`crate::BipartiteGraph::add_leaf`] called for a leaf that is already present.
    #[error("leaf vertex {0:?} already exists")]
    LeafAlreadyExists(Leaf),
    /// [`crate::BipartiteGraph::add_non_leaf`] called for a non-leaf that is already present.
    #[error("non-leaf vertex {0:?} already exists")]
    NonLeafAlreadyExists(NonLeaf),
    /// A leaf vertex referenced by an operation is absent.
    #[error("leaf vertex {0:?} not found")]
    LeafNotFound(Leaf),
    /// A non-leaf vertex referenced by an operation is absent.
    #[error("non-leaf vertex {0:?} not found")]
    NonLeafNotFound(NonLeaf),
    /// A leaf→non-leaf edge already exists between the given endpoints.
    #[error("leaf edge {0:?} -> {1:?} already exists")]
    LeafEdgeExists(Leaf, NonLeaf),
    /// A leaf→non-leaf edge does not exist between the given endpoints.
    #[error("leaf edge {0:?} -> {1:?} not found")]
    LeafEdgeNotFound(Leaf, NonLeaf),
    /// A non-leaf→non-leaf edge already exists between the given endpoints.
    #[error("non-leaf edge {0:?} -> {1:?} already exists")]
    NonLeafEdgeExists(NonLeaf, NonLeaf),
    /// A non-leaf→non-leaf edge does not exist between the given endpoints.
    #[error("non-leaf edge {0:?} -> {1:?} not found")]
    NonLeafEdgeNotFound(NonLeaf, NonLeaf),
    /// Adding this non-leaf→non-leaf edge would close a cycle in the
    /// non-leaf subgraph; the edge was not added.
    #[error("non-leaf edge {0:?} -> {1:?} would close a cycle")]
    CircularReference(NonLeaf, NonLeaf),
}

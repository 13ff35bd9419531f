use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use tracing::trace;

use crate::error::GraphError;

/// A directed bipartite graph of `Leaf` (user) and `NonLeaf` (group)
/// vertices.
///
/// Edges run leaf→non-leaf (membership) and non-leaf→non-leaf (group
/// nesting). The non-leaf subgraph is kept acyclic by
/// [`add_non_leaf_edge`](Self::add_non_leaf_edge): an edge `from -> to` means
/// "`from` is a member of `to`", so walking forward edges from a vertex
/// yields every ancestor it inherits grants from.
///
/// Maintains a reverse adjacency index on both relations so vertex removal
/// is O(incident edges) rather than O(|V| + |E|) (the bidirectional option
/// called out in the design).
#[derive(Clone)]
pub struct BipartiteGraph<Leaf, NonLeaf>
where
    Leaf: Eq + Hash + Clone + Ord + Debug,
    NonLeaf: Eq + Hash + Clone + Ord + Debug,
{
    leaf_out: IndexMap<Leaf, IndexSet<NonLeaf>>,
    leaf_in: IndexMap<NonLeaf, IndexSet<Leaf>>,
    nonleaf_out: IndexMap<NonLeaf, IndexSet<NonLeaf>>,
    nonleaf_in: IndexMap<NonLeaf, IndexSet<NonLeaf>>,
}

impl<Leaf, NonLeaf> Default for BipartiteGraph<Leaf, NonLeaf>
where
    Leaf: Eq + Hash + Clone + Ord + Debug,
    NonLeaf: Eq + Hash + Clone + Ord + Debug,
{
    fn default() -> Self {
        Self {
            leaf_out: IndexMap::new(),
            leaf_in: IndexMap::new(),
            nonleaf_out: IndexMap::new(),
            nonleaf_in: IndexMap::new(),
        }
    }
}

impl<Leaf, NonLeaf> BipartiteGraph<Leaf, NonLeaf>
where
    Leaf: Eq + Hash + Clone + Ord + Debug,
    NonLeaf: Eq + Hash + Clone + Ord + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    // --- vertices ---------------------------------------------------

    pub fn contains_leaf(&self, v: &Leaf) -> bool {
        self.leaf_out.contains_key(v)
    }

    pub fn contains_non_leaf(&self, v: &NonLeaf) -> bool {
        self.nonleaf_out.contains_key(v)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.leaf_out.keys()
    }

    pub fn non_leaves(&self) -> impl Iterator<Item = &NonLeaf> {
        self.nonleaf_out.keys()
    }

    pub fn add_leaf(&mut self, v: Leaf) -> Result<(), GraphError<Leaf, NonLeaf>> {
        if self.leaf_out.contains_key(&v) {
            return Err(GraphError::LeafAlreadyExists(v));
        }
        self.leaf_out.insert(v, IndexSet::new());
        Ok(())
    }

    pub fn add_non_leaf(&mut self, v: NonLeaf) -> Result<(), GraphError<Leaf, NonLeaf>> {
        if self.nonleaf_out.contains_key(&v) {
            return Err(GraphError::NonLeafAlreadyExists(v));
        }
        self.nonleaf_out.insert(v.clone(), IndexSet::new());
        self.nonleaf_in.insert(v.clone(), IndexSet::new());
        self.leaf_in.insert(v, IndexSet::new());
        Ok(())
    }

    pub fn remove_leaf(&mut self, v: &Leaf) -> Result<(), GraphError<Leaf, NonLeaf>> {
        let Some(targets) = self.leaf_out.shift_remove(v) else {
            return Err(GraphError::LeafNotFound(v.clone()));
        };
        for g in &targets {
            if let Some(members) = self.leaf_in.get_mut(g) {
                members.shift_remove(v);
            }
        }
        Ok(())
    }

    pub fn remove_non_leaf(&mut self, v: &NonLeaf) -> Result<(), GraphError<Leaf, NonLeaf>> {
        if !self.nonleaf_out.contains_key(v) {
            return Err(GraphError::NonLeafNotFound(v.clone()));
        }
        // leaf -> v edges
        if let Some(members) = self.leaf_in.shift_remove(v) {
            for leaf in &members {
                if let Some(s) = self.leaf_out.get_mut(leaf) {
                    s.shift_remove(v);
                }
            }
        }
        // v -> other, other -> v edges
        let outgoing = self.nonleaf_out.shift_remove(v).unwrap_or_default();
        for to in &outgoing {
            if let Some(s) = self.nonleaf_in.get_mut(to) {
                s.shift_remove(v);
            }
        }
        let incoming = self.nonleaf_in.shift_remove(v).unwrap_or_default();
        for from in &incoming {
            if let Some(s) = self.nonleaf_out.get_mut(from) {
                s.shift_remove(v);
            }
        }
        Ok(())
    }

    // --- edges --------------------------------------------------------

    pub fn add_leaf_edge(
        &mut self,
        leaf: &Leaf,
        nonleaf: &NonLeaf,
    ) -> Result<(), GraphError<Leaf, NonLeaf>> {
        if !self.leaf_out.contains_key(leaf) {
            return Err(GraphError::LeafNotFound(leaf.clone()));
        }
        if !self.nonleaf_out.contains_key(nonleaf) {
            return Err(GraphError::NonLeafNotFound(nonleaf.clone()));
        }
        let targets = self.leaf_out.get_mut(leaf).expect("checked above");
        if !targets.insert(nonleaf.clone()) {
            return Err(GraphError::LeafEdgeExists(leaf.clone(), nonleaf.clone()));
        }
        self.leaf_in
            .get_mut(nonleaf)
            .expect("non-leaf vertex checked above")
            .insert(leaf.clone());
        Ok(())
    }

    pub fn remove_leaf_edge(
        &mut self,
        leaf: &Leaf,
        nonleaf: &NonLeaf,
    ) -> Result<(), GraphError<Leaf, NonLeaf>> {
        if !self.leaf_out.contains_key(leaf) {
            return Err(GraphError::LeafNotFound(leaf.clone()));
        }
        if !self.nonleaf_out.contains_key(nonleaf) {
            return Err(GraphError::NonLeafNotFound(nonleaf.clone()));
        }
        let targets = self.leaf_out.get_mut(leaf).expect("checked above");
        if !targets.shift_remove(nonleaf) {
            return Err(GraphError::LeafEdgeNotFound(leaf.clone(), nonleaf.clone()));
        }
        if let Some(members) = self.leaf_in.get_mut(nonleaf) {
            members.shift_remove(leaf);
        }
        Ok(())
    }

    /// Adds the edge `from -> to` ("`from` is a member of `to`").
    ///
    /// Rejects the edge with [`GraphError::CircularReference`] without
    /// mutating the graph iff `from` is reachable from `to` via existing
    /// non-leaf edges (a self-loop, `from == to`, is always such a case).
    pub fn add_non_leaf_edge(
        &mut self,
        from: &NonLeaf,
        to: &NonLeaf,
    ) -> Result<(), GraphError<Leaf, NonLeaf>> {
        if !self.nonleaf_out.contains_key(from) {
            return Err(GraphError::NonLeafNotFound(from.clone()));
        }
        if !self.nonleaf_out.contains_key(to) {
            return Err(GraphError::NonLeafNotFound(to.clone()));
        }
        if self.nonleaf_out[from].contains(to) {
            return Err(GraphError::NonLeafEdgeExists(from.clone(), to.clone()));
        }
        if from == to || self.non_leaf_reaches(to, from) {
            trace!(?from, ?to, "rejecting non-leaf edge, would close a cycle");
            return Err(GraphError::CircularReference(from.clone(), to.clone()));
        }
        self.nonleaf_out.get_mut(from).expect("checked above").insert(to.clone());
        self.nonleaf_in.get_mut(to).expect("checked above").insert(from.clone());
        Ok(())
    }

    pub fn remove_non_leaf_edge(
        &mut self,
        from: &NonLeaf,
        to: &NonLeaf,
    ) -> Result<(), GraphError<Leaf, NonLeaf>> {
        if !self.nonleaf_out.contains_key(from) {
            return Err(GraphError::NonLeafNotFound(from.clone()));
        }
        if !self.nonleaf_out.contains_key(to) {
            return Err(GraphError::NonLeafNotFound(to.clone()));
        }
        let targets = self.nonleaf_out.get_mut(from).expect("checked above");
        if !targets.shift_remove(to) {
            return Err(GraphError::NonLeafEdgeNotFound(from.clone(), to.clone()));
        }
        if let Some(s) = self.nonleaf_in.get_mut(to) {
            s.shift_remove(from);
        }
        Ok(())
    }

    pub fn get_leaf_edges(
        &self,
        leaf: &Leaf,
    ) -> Result<impl Iterator<Item = NonLeaf> + '_, GraphError<Leaf, NonLeaf>> {
        self.leaf_out
            .get(leaf)
            .map(|s| s.iter().cloned())
            .ok_or_else(|| GraphError::LeafNotFound(leaf.clone()))
    }

    pub fn get_non_leaf_edges(
        &self,
        from: &NonLeaf,
    ) -> Result<impl Iterator<Item = NonLeaf> + '_, GraphError<Leaf, NonLeaf>> {
        self.nonleaf_out
            .get(from)
            .map(|s| s.iter().cloned())
            .ok_or_else(|| GraphError::NonLeafNotFound(from.clone()))
    }

    /// `true` iff `target` is reachable from `start` by following zero or
    /// more forward non-leaf edges. Does not allocate beyond the visited set;
    /// stops as soon as `target` is found.
    fn non_leaf_reaches(&self, start: &NonLeaf, target: &NonLeaf) -> bool {
        if start == target {
            return true;
        }
        let mut visited: IndexSet<NonLeaf> = IndexSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.clone());
        queue.push_back(start.clone());
        while let Some(v) = queue.pop_front() {
            let Some(next) = self.nonleaf_out.get(&v) else {
                continue;
            };
            for n in next {
                if n == target {
                    return true;
                }
                if visited.insert(n.clone()) {
                    queue.push_back(n.clone());
                }
            }
        }
        false
    }

    /// BFS over reachable non-leaf vertices starting from `leaf`'s direct
    /// group memberships. The leaf itself is never passed to `visit`.
    /// Stops early if `visit` returns `false`.
    pub fn traverse_from_leaf(
        &self,
        leaf: &Leaf,
        mut visit: impl FnMut(&NonLeaf) -> bool,
    ) -> Result<(), GraphError<Leaf, NonLeaf>> {
        let Some(direct) = self.leaf_out.get(leaf) else {
            return Err(GraphError::LeafNotFound(leaf.clone()));
        };
        let mut visited: IndexSet<NonLeaf> = IndexSet::new();
        let mut queue: VecDeque<NonLeaf> = VecDeque::new();
        for g in direct {
            if visited.insert(g.clone()) {
                queue.push_back(g.clone());
            }
        }
        self.bfs_non_leaf(&mut visited, &mut queue, &mut visit);
        Ok(())
    }

    /// BFS over non-leaf vertices reachable from `nonleaf`, not including
    /// `nonleaf` itself. Stops early if `visit` returns `false`.
    pub fn traverse_from_non_leaf(
        &self,
        nonleaf: &NonLeaf,
        mut visit: impl FnMut(&NonLeaf) -> bool,
    ) -> Result<(), GraphError<Leaf, NonLeaf>> {
        let Some(direct) = self.nonleaf_out.get(nonleaf) else {
            return Err(GraphError::NonLeafNotFound(nonleaf.clone()));
        };
        let mut visited: IndexSet<NonLeaf> = IndexSet::new();
        visited.insert(nonleaf.clone());
        let mut queue: VecDeque<NonLeaf> = VecDeque::new();
        for g in direct {
            if visited.insert(g.clone()) {
                queue.push_back(g.clone());
            }
        }
        self.bfs_non_leaf(&mut visited, &mut queue, &mut visit);
        Ok(())
    }

    fn bfs_non_leaf(
        &self,
        visited: &mut IndexSet<NonLeaf>,
        queue: &mut VecDeque<NonLeaf>,
        visit: &mut impl FnMut(&NonLeaf) -> bool,
    ) {
        while let Some(v) = queue.pop_front() {
            if !visit(&v) {
                return;
            }
            let Some(next) = self.nonleaf_out.get(&v) else {
                continue;
            };
            for n in next {
                if visited.insert(n.clone()) {
                    queue.push_back(n.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type G = BipartiteGraph<String, String>;

    #[test]
    fn add_and_contains_vertices() {
        let mut g = G::new();
        g.add_leaf("alice".into()).unwrap();
        g.add_non_leaf("admins".into()).unwrap();
        assert!(g.contains_leaf(&"alice".into()));
        assert!(g.contains_non_leaf(&"admins".into()));
        assert!(matches!(
            g.add_leaf("alice".into()),
            Err(GraphError::LeafAlreadyExists(_))
        ));
    }

    #[test]
    fn leaf_edge_requires_both_endpoints() {
        let mut g = G::new();
        g.add_leaf("alice".into()).unwrap();
        assert!(matches!(
            g.add_leaf_edge(&"alice".into(), &"admins".into()),
            Err(GraphError::NonLeafNotFound(_))
        ));
        g.add_non_leaf("admins".into()).unwrap();
        g.add_leaf_edge(&"alice".into(), &"admins".into()).unwrap();
        assert!(matches!(
            g.add_leaf_edge(&"alice".into(), &"admins".into()),
            Err(GraphError::LeafEdgeExists(_, _))
        ));
    }

    #[test]
    fn cycle_is_rejected_and_graph_untouched() {
        let mut g = G::new();
        for v in ["a", "b", "c"] {
            g.add_non_leaf(v.into()).unwrap();
        }
        g.add_non_leaf_edge(&"a".into(), &"b".into()).unwrap();
        g.add_non_leaf_edge(&"b".into(), &"c".into()).unwrap();

        let before: Vec<_> = g.get_non_leaf_edges(&"c".into()).unwrap().collect();
        assert!(matches!(
            g.add_non_leaf_edge(&"c".into(), &"a".into()),
            Err(GraphError::CircularReference(_, _))
        ));
        let after: Vec<_> = g.get_non_leaf_edges(&"c".into()).unwrap().collect();
        assert_eq!(before, after);
        assert!(before.is_empty());
    }

    #[test]
    fn self_loop_rejected() {
        let mut g = G::new();
        g.add_non_leaf("a".into()).unwrap();
        assert!(matches!(
            g.add_non_leaf_edge(&"a".into(), &"a".into()),
            Err(GraphError::CircularReference(_, _))
        ));
    }

    #[test]
    fn remove_non_leaf_cascades_both_directions() {
        let mut g = G::new();
        g.add_leaf("u".into()).unwrap();
        g.add_non_leaf("g1".into()).unwrap();
        g.add_non_leaf("g2".into()).unwrap();
        g.add_leaf_edge(&"u".into(), &"g1".into()).unwrap();
        g.add_non_leaf_edge(&"g1".into(), &"g2".into()).unwrap();

        g.remove_non_leaf(&"g2".into()).unwrap();

        assert!(!g.contains_non_leaf(&"g2".into()));
        assert!(g.get_non_leaf_edges(&"g1".into()).unwrap().next().is_none());
        // g1 still reachable from u
        assert!(g.get_leaf_edges(&"u".into()).unwrap().any(|t| t == "g1"));
    }

    #[test]
    fn traverse_from_leaf_skips_leaf_and_start_semantics() {
        let mut g = G::new();
        g.add_leaf("u".into()).unwrap();
        for v in ["g1", "g2", "g3"] {
            g.add_non_leaf(v.into()).unwrap();
        }
        g.add_leaf_edge(&"u".into(), &"g1".into()).unwrap();
        g.add_non_leaf_edge(&"g1".into(), &"g2".into()).unwrap();
        g.add_non_leaf_edge(&"g2".into(), &"g3".into()).unwrap();

        let mut seen = Vec::new();
        g.traverse_from_leaf(&"u".into(), |v| {
            seen.push(v.clone());
            true
        })
        .unwrap();
        seen.sort();
        assert_eq!(seen, vec!["g1".to_string(), "g2".to_string(), "g3".to_string()]);
    }

    #[test]
    fn traverse_from_non_leaf_excludes_start() {
        let mut g = G::new();
        for v in ["g1", "g2"] {
            g.add_non_leaf(v.into()).unwrap();
        }
        g.add_non_leaf_edge(&"g1".into(), &"g2".into()).unwrap();

        let mut seen = Vec::new();
        g.traverse_from_non_leaf(&"g1".into(), |v| {
            seen.push(v.clone());
            true
        })
        .unwrap();
        assert_eq!(seen, vec!["g2".to_string()]);
    }

    #[test]
    fn traverse_can_stop_early() {
        let mut g = G::new();
        for v in ["g1", "g2", "g3"] {
            g.add_non_leaf(v.into()).unwrap();
        }
        g.add_non_leaf_edge(&"g1".into(), &"g2".into()).unwrap();
        g.add_non_leaf_edge(&"g2".into(), &"g3".into()).unwrap();

        let mut count = 0;
        g.traverse_from_non_leaf(&"g1".into(), |_| {
            count += 1;
            false
        })
        .unwrap();
        assert_eq!(count, 1);
    }

    proptest::proptest! {
        #[test]
        fn non_leaf_subgraph_never_cycles(
            ops in proptest::collection::vec(
                (0u8..4, 0usize..6, 0usize..6), 0..200,
            )
        ) {
            let mut g = G::new();
            let names: Vec<String> = (0..6).map(|i| format!("n{i}")).collect();
            for n in &names {
                let _ = g.add_non_leaf(n.clone());
            }
            for (op, a, b) in ops {
                let from = &names[a];
                let to = &names[b];
                match op {
                    0 => { let _ = g.add_non_leaf_edge(from, to); }
                    1 => { let _ = g.remove_non_leaf_edge(from, to); }
                    _ => { let _ = g.get_non_leaf_edges(from); }
                }
                // invariant: no vertex can reach itself through a non-trivial path
                for n in &names {
                    let mut reached_self = false;
                    let _ = g.traverse_from_non_leaf(n, |v| {
                        if v == n { reached_self = true; }
                        true
                    });
                    prop_assert!(!reached_self);
                }
            }
        }
    }
}

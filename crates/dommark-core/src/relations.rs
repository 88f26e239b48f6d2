//! Parent and sibling links for a finished AST.
//!
//! The tree owns its children, so links are kept in a side table indexed by
//! preorder id instead of back-pointers inside [`Node`]. Traversal uses an
//! explicit stack; nesting depth is bounded by memory, not the call stack.

use std::collections::HashMap;

use crate::ast::{Node, NodeKind};

/// Preorder position of a node within the forest passed to
/// [`establish_relationships`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Structural invariant violations found by [`verify_relationships`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("node {node} is reachable from more than one parent")]
    MultipleParents { node: usize },

    #[error("parent chain of node {node} does not terminate at a root")]
    Cycle { node: usize },

    #[error("recorded parent of node {node} does not match the tree")]
    ParentMismatch { node: usize },
}

/// Parent and sibling links keyed by [`NodeId`], detached from the tree.
///
/// Ids are preorder positions over the forest the links were established
/// on, so they stay valid for as long as that forest is left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    parents: Vec<Option<NodeId>>,
    sibling_index: Vec<usize>,
}

impl Links {
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Parent of `id`; `None` for roots and unknown ids
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.0).copied().flatten()
    }

    /// Position of `id` among its parent's children (or among the roots)
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        self.sibling_index.get(id.0).copied()
    }

    /// Ids from the parent of `id` up to its root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.parent(id);
        std::iter::from_fn(move || {
            let next = current?;
            current = self.parent(next);
            Some(next)
        })
    }

    /// Direct children of `id`, in document order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.parents
            .iter()
            .enumerate()
            .skip(id.0 + 1)
            .filter(move |(_, parent)| **parent == Some(id))
            .map(|(child, _)| NodeId(child))
    }
}

/// Parent and sibling index for every node reachable from a set of roots
#[derive(Debug)]
pub struct Relationships<'a> {
    nodes: Vec<&'a Node>,
    links: Links,
    ids: HashMap<*const Node, NodeId>,
}

/// Assign each reachable node a parent reference and a stable sibling index.
pub fn establish_relationships(roots: &[Node]) -> Relationships<'_> {
    let mut rel = Relationships {
        nodes: Vec::new(),
        links: Links::default(),
        ids: HashMap::new(),
    };

    // (node, parent, index among parent's children); pushed in reverse so
    // ids come out in document order.
    let mut stack: Vec<(&Node, Option<NodeId>, usize)> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, n)| (n, None, i))
        .collect();

    while let Some((node, parent, index)) = stack.pop() {
        let id = NodeId(rel.nodes.len());
        rel.nodes.push(node);
        rel.links.parents.push(parent);
        rel.links.sibling_index.push(index);
        // first sighting wins; duplicates are reported by verification
        rel.ids.entry(std::ptr::from_ref(node)).or_insert(id);

        for (i, child) in node.children().iter().enumerate().rev() {
            stack.push((child, Some(id), i));
        }
    }

    rel
}

/// Assert that no node has more than one parent and that the graph is acyclic.
pub fn verify_relationships(roots: &[Node], rel: &Relationships<'_>) -> Result<(), StructureError> {
    let mut seen: HashMap<*const Node, usize> = HashMap::new();
    let mut stack: Vec<(&Node, Option<*const Node>)> =
        roots.iter().rev().map(|n| (n, None)).collect();
    let mut position = 0usize;

    while let Some((node, parent)) = stack.pop() {
        let ptr = std::ptr::from_ref(node);
        if seen.insert(ptr, position).is_some() {
            return Err(StructureError::MultipleParents { node: position });
        }

        let recorded = rel
            .id_of(node)
            .and_then(|id| rel.links.parent(id))
            .map(|p| std::ptr::from_ref(rel.nodes[p.0]));
        if recorded != parent {
            return Err(StructureError::ParentMismatch { node: position });
        }

        for child in node.children().iter().rev() {
            stack.push((child, Some(ptr)));
        }
        position += 1;
    }

    // preorder ids: a parent always precedes its children, so a chain that
    // strictly decreases must terminate at a root
    for (id, parent) in rel.links.parents.iter().enumerate() {
        if parent.is_some_and(|p| p.0 >= id) {
            return Err(StructureError::Cycle { node: id });
        }
    }

    Ok(())
}

impl<'a> Relationships<'a> {
    /// Number of nodes reached
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id of a node by identity; `None` if it is not part of this forest
    pub fn id_of(&self, node: &Node) -> Option<NodeId> {
        self.ids.get(&std::ptr::from_ref(node)).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&'a Node> {
        self.nodes.get(id.0).copied()
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Drop the borrowed nodes, keeping the id-keyed links
    pub fn into_links(self) -> Links {
        self.links
    }

    pub fn parent(&self, node: &Node) -> Option<&'a Node> {
        let parent = self.links.parent(self.id_of(node)?)?;
        Some(self.nodes[parent.0])
    }

    /// Position of `node` among its parent's children (or among the roots)
    pub fn sibling_index(&self, node: &Node) -> Option<usize> {
        self.links.sibling_index(self.id_of(node)?)
    }

    /// Nodes from the parent up to the root
    pub fn ancestors(&self, node: &Node) -> impl Iterator<Item = &'a Node> + '_ {
        let start = self.id_of(node);
        start
            .into_iter()
            .flat_map(move |id| self.links.ancestors(id))
            .map(move |id| self.nodes[id.0])
    }

    /// True if any ancestor of `node` has the given kind
    pub fn has_ancestor(&self, node: &Node, kind: NodeKind) -> bool {
        self.ancestors(node).any(|a| a.kind() == kind)
    }

    /// True if `node` shares its parent with at least one other node
    pub fn has_siblings(&self, node: &Node) -> bool {
        match self.id_of(node) {
            Some(id) => match self.links.parent(id) {
                Some(parent) => self.nodes[parent.0].children().len() > 1,
                None => self.links.parents.iter().filter(|p| p.is_none()).count() > 1,
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    fn sample() -> Vec<Node> {
        vec![document(vec![
            paragraph(vec![text("a"), strong(vec![text("b")])]),
            list(false, None, vec![list_item(vec![text("c")])]),
        ])]
    }

    #[test]
    fn test_preorder_ids_and_parents() {
        let roots = sample();
        let rel = establish_relationships(&roots);
        assert_eq!(rel.len(), 8);

        let doc = &roots[0];
        let para = &doc.children()[0];
        let strong_node = &para.children()[1];
        assert_eq!(rel.id_of(doc), Some(NodeId(0)));
        assert_eq!(rel.id_of(para), Some(NodeId(1)));
        assert!(std::ptr::eq(rel.parent(strong_node).unwrap(), para));
        assert_eq!(rel.sibling_index(strong_node), Some(1));
        assert!(rel.parent(doc).is_none());
    }

    #[test]
    fn test_has_ancestor() {
        let roots = sample();
        let rel = establish_relationships(&roots);
        let item = &roots[0].children()[1].children()[0];
        let leaf = &item.children()[0];
        assert!(rel.has_ancestor(leaf, NodeKind::List));
        assert!(rel.has_ancestor(leaf, NodeKind::Document));
        assert!(!rel.has_ancestor(leaf, NodeKind::Paragraph));
    }

    #[test]
    fn test_has_siblings() {
        let roots = sample();
        let rel = establish_relationships(&roots);
        let para = &roots[0].children()[0];
        let item = &roots[0].children()[1].children()[0];
        assert!(rel.has_siblings(para));
        assert!(!rel.has_siblings(item));
        assert!(!rel.has_siblings(&roots[0]));
    }

    #[test]
    fn test_links_outlive_borrow() {
        let roots = sample();
        let links = establish_relationships(&roots).into_links();
        assert_eq!(links.len(), 8);

        // document > list > item > "c"
        let leaf = NodeId(7);
        assert_eq!(links.parent(leaf), Some(NodeId(6)));
        assert_eq!(links.ancestors(leaf).collect::<Vec<_>>(), vec![NodeId(6), NodeId(5), NodeId(0)]);
        assert_eq!(links.children(NodeId(0)).collect::<Vec<_>>(), vec![NodeId(1), NodeId(5)]);
        assert_eq!(links.sibling_index(NodeId(5)), Some(1));
        assert_eq!(links.parent(NodeId(0)), None);
        assert_eq!(links.parent(NodeId(99)), None);
    }

    #[test]
    fn test_verify_accepts_tree() {
        let roots = sample();
        let rel = establish_relationships(&roots);
        assert_eq!(verify_relationships(&roots, &rel), Ok(()));
    }

    #[test]
    fn test_verify_rejects_foreign_forest() {
        let roots = sample();
        let other = sample();
        let rel = establish_relationships(&other);
        assert!(matches!(
            verify_relationships(&roots, &rel),
            Err(StructureError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let mut node = text("leaf");
        for _ in 0..50_000 {
            node = blockquote(vec![node]);
        }
        let roots = vec![node];
        let rel = establish_relationships(&roots);
        assert_eq!(rel.len(), 50_001);
        assert!(verify_relationships(&roots, &rel).is_ok());
        // dropping a 50k-deep owned tree recurses; leak it instead
        std::mem::forget(roots);
    }
}

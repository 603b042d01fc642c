//! Arena storage for parse trees

/// Index of a node inside its [`ParseTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Constituent or part-of-speech node
    Internal { label: String },
    /// Surface token
    Leaf { token: String },
}

/// A single node with its structural links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// `None` only for the root
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// An immutable, rooted, ordered, labeled tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    nodes: Vec<Node>,
    root: NodeId,
    leaves: Vec<NodeId>,
}

impl ParseTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Label of an internal node, `None` for leaves
    pub fn label(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Internal { label } => Some(label),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Surface token of a leaf, `None` for internal nodes
    pub fn token(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf { token } => Some(token),
            NodeKind::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Leaf { .. })
    }

    /// Leaf ids in left-to-right order
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Leaf tokens in left-to-right order
    pub fn leaf_tokens(&self) -> Vec<&str> {
        self.leaves.iter().filter_map(|&id| self.token(id)).collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ancestors of `id`, nearest first, ending at the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }
}

/// Iterator over the ancestors of a node, walking parent links
pub struct Ancestors<'a> {
    tree: &'a ParseTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Incremental tree construction
///
/// Nodes are opened and closed in document order. The first node opened
/// becomes the root; leaves must be pushed inside an open node.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    leaves: Vec<NodeId>,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an internal node under the currently open node.
    ///
    /// Returns `None` if a root was already built and closed.
    pub fn open(&mut self, label: impl Into<String>) -> Option<NodeId> {
        let parent = self.open.last().copied();
        if parent.is_none() && !self.nodes.is_empty() {
            return None;
        }
        let id = self.push(NodeKind::Internal { label: label.into() }, parent);
        self.open.push(id);
        Some(id)
    }

    /// Add a leaf under the currently open node.
    ///
    /// Returns `None` when no node is open.
    pub fn leaf(&mut self, token: impl Into<String>) -> Option<NodeId> {
        let parent = *self.open.last()?;
        let id = self.push(NodeKind::Leaf { token: token.into() }, Some(parent));
        self.leaves.push(id);
        Some(id)
    }

    /// Close the innermost open node, returning it
    pub fn close(&mut self) -> Option<NodeId> {
        self.open.pop()
    }

    /// Number of nodes still open
    pub fn open_depth(&self) -> usize {
        self.open.len()
    }

    pub fn has_root(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Finish the tree. Fails (returning `None`) while nodes are open or
    /// when nothing was built.
    pub fn finish(self) -> Option<ParseTree> {
        if !self.open.is_empty() || self.nodes.is_empty() {
            return None;
        }
        Some(ParseTree {
            nodes: self.nodes,
            root: NodeId(0),
            leaves: self.leaves,
        })
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }
}

use std::path::{Path, PathBuf};

/// Index of a node inside a [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether a node is a directory or a matched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    File,
}

/// A directory or matched file in the grouped tree.
///
/// Children are owned by the arena and referenced by id; `parent` is a
/// non-owning back-reference used for upward traversal.
#[derive(Debug, Clone)]
pub struct Node {
    pub label: String,
    pub path: PathBuf,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Expansion state reported to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapsible {
    /// Leaf item.
    None,
    Collapsed,
    Expanded,
}

/// Host-facing description of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    pub path: PathBuf,
    pub kind: NodeKind,
    pub collapsible: Collapsible,
    pub tooltip: String,
}

/// Arena of nodes with one root per workspace folder.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root folder node.
    pub fn add_root(&mut self, label: &str, path: &Path) -> NodeId {
        let id = self.alloc(label, path, NodeKind::Folder, None);
        self.roots.push(id);
        id
    }

    /// Append a new node as the last child of `parent`.
    pub fn push_child(&mut self, parent: NodeId, label: &str, path: &Path, kind: NodeKind) -> NodeId {
        let id = self.alloc(label, path, kind, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn alloc(&mut self, label: &str, path: &Path, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            label: label.to_string(),
            path: path.to_path_buf(),
            kind,
            children: Vec::new(),
            parent,
        });
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Children of `id`, empty for unknown ids and files.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Total number of nodes, roots included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a direct child of `parent` whose path equals `path` exactly.
    pub fn find_child(&self, parent: NodeId, path: &Path) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].path == path)
    }

    /// Find a direct child of `parent` whose path equals `path`, ignoring case.
    pub fn find_child_ignore_case(&self, parent: NodeId, path: &Path) -> Option<NodeId> {
        let wanted = path.to_string_lossy().to_lowercase();
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].path.to_string_lossy().to_lowercase() == wanted)
    }

    /// Find any node whose path equals `path` exactly.
    pub fn find_path(&self, path: &Path) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.path == path).map(NodeId)
    }

    /// Find a folder among the roots and their direct children whose path
    /// equals `path`, ignoring case.
    pub fn find_folder_ignore_case(&self, path: &Path) -> Option<NodeId> {
        let wanted = path.to_string_lossy().to_lowercase();
        let matches = |id: &NodeId| {
            let node = &self.nodes[id.0];
            node.is_folder() && node.path.to_string_lossy().to_lowercase() == wanted
        };
        self.roots.iter().copied().find(|id| matches(id)).or_else(|| {
            self.roots
                .iter()
                .flat_map(|&r| self.children(r).iter().copied())
                .find(|id| matches(id))
        })
    }

    /// Sort the children of `id` with `cmp` applied to the child nodes.
    pub fn sort_children_by<F>(&mut self, id: NodeId, mut cmp: F)
    where
        F: FnMut(&Node, &Node) -> std::cmp::Ordering,
    {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        let mut children = node.children.clone();
        children.sort_by(|a, b| cmp(&self.nodes[a.0], &self.nodes[b.0]));
        self.nodes[id.0].children = children;
    }

    /// Host-facing item for `id`.
    pub fn item(&self, id: NodeId) -> Option<TreeItem> {
        let node = self.nodes.get(id.0)?;
        let collapsible = match node.kind {
            NodeKind::Folder => Collapsible::Expanded,
            NodeKind::File => Collapsible::None,
        };
        Some(TreeItem {
            label: node.label.clone(),
            path: node.path.clone(),
            kind: node.kind,
            collapsible,
            tooltip: node.path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.add_root("app", Path::new("/work/app"));
        let src = tree.push_child(root, "src", Path::new("/work/app/src"), NodeKind::Folder);
        let file = tree.push_child(src, "main.ts", Path::new("/work/app/src/main.ts"), NodeKind::File);
        (tree, root, src, file)
    }

    #[test]
    fn parent_back_references() {
        let (tree, root, src, file) = sample();
        assert_eq!(tree.parent(file), Some(src));
        assert_eq!(tree.parent(src), Some(root));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn children_of_file_and_unknown_are_empty() {
        let (tree, _, _, file) = sample();
        assert!(tree.children(file).is_empty());
        assert!(tree.children(NodeId(99)).is_empty());
    }

    #[test]
    fn find_folder_ignores_case() {
        let (tree, root, src, _) = sample();
        assert_eq!(tree.find_folder_ignore_case(Path::new("/WORK/App")), Some(root));
        assert_eq!(tree.find_folder_ignore_case(Path::new("/work/app/SRC")), Some(src));
        assert_eq!(tree.find_folder_ignore_case(Path::new("/work/app/lib")), None);
    }

    #[test]
    fn find_folder_skips_files() {
        let (tree, _, _, _) = sample();
        assert_eq!(tree.find_folder_ignore_case(Path::new("/work/app/src/main.ts")), None);
    }

    #[test]
    fn item_reports_collapsible_state() {
        let (tree, root, _, file) = sample();
        let root_item = tree.item(root).unwrap();
        assert_eq!(root_item.collapsible, Collapsible::Expanded);
        assert_eq!(root_item.tooltip, "/work/app");
        let file_item = tree.item(file).unwrap();
        assert_eq!(file_item.collapsible, Collapsible::None);
        assert_eq!(file_item.label, "main.ts");
    }

    #[test]
    fn sort_children_reorders_only_that_parent() {
        let mut tree = Tree::new();
        let root = tree.add_root("app", Path::new("/a"));
        let b = tree.push_child(root, "b", Path::new("/a/b"), NodeKind::File);
        let a = tree.push_child(root, "a", Path::new("/a/a"), NodeKind::File);
        tree.sort_children_by(root, |x, y| x.path.cmp(&y.path));
        assert_eq!(tree.children(root), &[a, b]);
    }

    #[test]
    fn find_path_searches_every_level() {
        let (tree, root, _src, file) = sample();
        assert_eq!(tree.find_path(Path::new("/work/app")), Some(root));
        assert_eq!(tree.find_path(Path::new("/work/app/src/main.ts")), Some(file));
        assert_eq!(tree.find_path(Path::new("/work/app/SRC")), None);
    }

    #[test]
    fn find_child_ignore_case_matches_differently_cased_path() {
        let (tree, _root, src, file) = sample();
        assert_eq!(
            tree.find_child_ignore_case(src, Path::new("/WORK/app/src/Main.TS")),
            Some(file)
        );
        assert_eq!(tree.find_child(src, Path::new("/WORK/app/src/Main.TS")), None);
    }
}

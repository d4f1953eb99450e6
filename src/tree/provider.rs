//! Pull-based tree contract and the cached, watch-aware provider behind it.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::Result;
use crate::event::Event;
use crate::fs::search::{FilePattern, FileSearch, PatternMatcher};
use crate::fs::watcher::{ChangeKind, FileChange};
use crate::fs::workspace::Workspace;
use crate::tree::grouper::{build_tree, compare_nodes, split_path, FolderMatches};
use crate::tree::node::{NodeId, NodeKind, Tree, TreeItem};

/// What a tree renderer pulls from.
#[async_trait]
pub trait TreeDataProvider {
    /// Rendering description of `id`.
    fn get_tree_item(&self, id: NodeId) -> Option<TreeItem>;

    /// Children of `node`, or the roots when `node` is `None`.
    async fn get_children(&mut self, node: Option<NodeId>) -> Result<Vec<NodeId>>;

    /// Parent of `id`; `None` for roots.
    fn get_parent(&self, id: NodeId) -> Option<NodeId>;
}

/// Groups search results per workspace folder and caches the tree until
/// the next refresh.
///
/// Every mutation emits [`Event::TreeChanged`] on the change channel.
pub struct ViewDataProvider<W, S> {
    workspace: W,
    search: S,
    pattern: FilePattern,
    matcher: PatternMatcher,
    cache: Option<Tree>,
    changes: mpsc::UnboundedSender<Event>,
}

impl<W, S> ViewDataProvider<W, S>
where
    W: Workspace + Send + Sync,
    S: FileSearch,
{
    pub fn new(
        workspace: W,
        search: S,
        pattern: FilePattern,
        changes: mpsc::UnboundedSender<Event>,
    ) -> Result<Self> {
        let matcher = PatternMatcher::new(&pattern)?;
        Ok(Self {
            workspace,
            search,
            pattern,
            matcher,
            cache: None,
            changes,
        })
    }

    pub fn pattern(&self) -> &FilePattern {
        &self.pattern
    }

    /// Compiled include/exclude globs, shared with the watcher.
    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Whether a built tree is currently cached.
    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of cached nodes, zero when nothing is cached.
    pub fn node_count(&self) -> usize {
        self.cache.as_ref().map(Tree::len).unwrap_or(0)
    }

    /// Cached node at `path`, if the tree is built and contains it.
    pub fn find_node(&self, path: &Path) -> Option<NodeId> {
        self.cache.as_ref()?.find_path(path)
    }

    /// Drop the cached tree and notify. The next pull rebuilds it.
    pub fn refresh(&mut self) {
        self.cache = None;
        info!("tree refresh requested");
        self.notify();
    }

    /// Apply a single change notification to the cached tree, then notify.
    ///
    /// Only folders already in the tree (roots and their direct children)
    /// can receive new files. Removed files stay until the next rebuild.
    pub fn on_file_changed(&mut self, change: &FileChange) {
        if self.accepts(change) && self.patch(change) {
            debug!(path = %change.path.display(), "tree patched");
        }
        self.notify();
    }

    fn accepts(&self, change: &FileChange) -> bool {
        self.workspace
            .folders()
            .iter()
            .any(|f| self.matcher.matches_under(&f.root_path, &change.path))
    }

    fn patch(&mut self, change: &FileChange) -> bool {
        if change.kind == ChangeKind::Removed {
            return false;
        }
        let Some(tree) = self.cache.as_mut() else {
            return false;
        };
        let Some((filename, parent_dir)) = split_path(&change.path) else {
            return false;
        };
        let Some(parent) = tree.find_folder_ignore_case(&parent_dir) else {
            debug!(dir = %parent_dir.display(), "no cached folder for change");
            return false;
        };

        match tree.find_child_ignore_case(parent, &change.path) {
            Some(existing) => {
                if let Some(node) = tree.get_mut(existing) {
                    node.label = filename;
                    node.path = change.path.clone();
                }
            }
            None => {
                tree.push_child(parent, &filename, &change.path, NodeKind::File);
            }
        }
        tree.sort_children_by(parent, compare_nodes);
        true
    }

    async fn build(&self) -> Result<Tree> {
        let mut matched = Vec::new();
        for folder in self.workspace.folders() {
            let files = self
                .search
                .find_files(&folder.root_path, &self.matcher)
                .await?;
            matched.push(FolderMatches { folder, files });
        }
        Ok(build_tree(&matched))
    }

    fn notify(&self) {
        let _ = self.changes.send(Event::TreeChanged);
    }
}

#[async_trait]
impl<W, S> TreeDataProvider for ViewDataProvider<W, S>
where
    W: Workspace + Send + Sync,
    S: FileSearch,
{
    fn get_tree_item(&self, id: NodeId) -> Option<TreeItem> {
        self.cache.as_ref()?.item(id)
    }

    async fn get_children(&mut self, node: Option<NodeId>) -> Result<Vec<NodeId>> {
        if self.cache.is_none() {
            let tree = self.build().await?;
            self.cache = Some(tree);
        }
        let Some(tree) = self.cache.as_ref() else {
            return Ok(Vec::new());
        };
        Ok(match node {
            Some(id) => tree.children(id).to_vec(),
            None => tree.roots().to_vec(),
        })
    }

    fn get_parent(&self, id: NodeId) -> Option<NodeId> {
        self.cache.as_ref()?.parent(id)
    }
}

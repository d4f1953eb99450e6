use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, warn};

use crate::commands::CommandId;
use crate::error::Result;
use crate::fs::search::FileSearch;
use crate::fs::watcher::FileChange;
use crate::fs::workspace::Workspace;
use crate::tree::node::{Collapsible, NodeId, NodeKind};
use crate::tree::provider::{TreeDataProvider, ViewDataProvider};

/// A visible row of the tree, in display order.
#[derive(Debug, Clone)]
pub struct FlatItem {
    pub id: NodeId,
    pub label: String,
    pub path: PathBuf,
    pub kind: NodeKind,
    pub depth: usize,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
}

/// Main application state: the provider plus what the renderer shows.
pub struct App<W, S> {
    pub provider: ViewDataProvider<W, S>,
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    /// Folder paths the user collapsed; kept across rebuilds.
    pub collapsed: HashSet<PathBuf>,
    pub root_count: usize,
    pub file_count: usize,
    pub should_quit: bool,
    pub watcher_active: bool,
    /// Set when the visible rows must be pulled again.
    pub needs_reload: bool,
    pub status_message: Option<(String, Instant, bool)>,
}

impl<W, S> App<W, S>
where
    W: Workspace + Send + Sync,
    S: FileSearch,
{
    pub fn new(provider: ViewDataProvider<W, S>) -> Self {
        Self {
            provider,
            flat_items: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            collapsed: HashSet::new(),
            root_count: 0,
            file_count: 0,
            should_quit: false,
            watcher_active: true,
            needs_reload: false,
            status_message: None,
        }
    }

    /// Pull the whole tree from the provider and rebuild the visible rows.
    ///
    /// Children of collapsed folders are still pulled so that file counts
    /// cover the whole tree. The selection follows its path when possible.
    pub async fn reload(&mut self) -> Result<()> {
        self.needs_reload = false;
        let selected_path = self.selected().map(|item| item.path.clone());

        let roots = match self.provider.get_children(None).await {
            Ok(roots) => roots,
            Err(e) => {
                self.flat_items.clear();
                self.root_count = 0;
                self.file_count = 0;
                return Err(e);
            }
        };

        let mut items = Vec::new();
        let mut file_count = 0;
        // (id, depth, is_last_sibling, visible)
        let mut stack: Vec<(NodeId, usize, bool, bool)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &id)| (id, 0, i + 1 == roots.len(), true))
            .collect();

        while let Some((id, depth, is_last_sibling, visible)) = stack.pop() {
            let Some(item) = self.provider.get_tree_item(id) else {
                continue;
            };
            if item.kind == NodeKind::File {
                file_count += 1;
            }
            let is_expanded =
                item.collapsible != Collapsible::None && !self.collapsed.contains(&item.path);

            let children = self.provider.get_children(Some(id)).await?;
            let children_visible = visible && is_expanded;
            for (i, &child) in children.iter().enumerate().rev() {
                stack.push((child, depth + 1, i + 1 == children.len(), children_visible));
            }

            if visible {
                items.push(FlatItem {
                    id,
                    label: item.label,
                    path: item.path,
                    kind: item.kind,
                    depth,
                    is_expanded,
                    is_last_sibling,
                });
            }
        }

        self.flat_items = items;
        self.root_count = roots.len();
        self.file_count = file_count;

        if let Some(index) = selected_path.and_then(|p| self.find_index_by_path(&p)) {
            self.selected_index = index;
        }
        self.clamp_selection();
        debug!(rows = self.flat_items.len(), files = file_count, "view reloaded");
        Ok(())
    }

    /// Reload, turning a failure into an error status message.
    pub async fn reload_or_report(&mut self) {
        if let Err(e) = self.reload().await {
            warn!(error = %e, "tree reload failed");
            self.set_error_message(e.to_string());
        }
    }

    /// Reveal `path`: expand every ancestor folder and select its row.
    ///
    /// Returns false when the path is not in the tree.
    pub async fn select_path(&mut self, path: &Path) -> Result<bool> {
        if !self.provider.is_cached() {
            self.reload().await?;
        }
        let Some(target) = self.provider.find_node(path) else {
            return Ok(false);
        };

        let mut cursor = self.provider.get_parent(target);
        while let Some(id) = cursor {
            if let Some(item) = self.provider.get_tree_item(id) {
                self.collapsed.remove(&item.path);
            }
            cursor = self.provider.get_parent(id);
        }

        self.reload().await?;
        match self.find_index_by_path(path) {
            Some(index) => {
                self.selected_index = index;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run a registered command.
    pub fn execute(&mut self, command: CommandId) {
        debug!(command = command.id(), "executing command");
        match command {
            CommandId::Refresh => {
                self.provider.refresh();
                self.set_status_message("Refreshing…".to_string());
            }
            CommandId::ToggleWatcher => {
                self.watcher_active = !self.watcher_active;
                let state = if self.watcher_active { "resumed" } else { "paused" };
                self.set_status_message(format!("Watcher {state}"));
            }
            CommandId::Quit => self.quit(),
        }
    }

    /// Feed watcher notifications to the provider, one at a time.
    pub fn handle_fs_change(&mut self, changes: &[FileChange]) {
        for change in changes {
            self.provider.on_file_changed(change);
        }
    }

    /// Currently selected row.
    pub fn selected(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.selected_index)
    }

    fn find_index_by_path(&self, path: &Path) -> Option<usize> {
        self.flat_items.iter().position(|item| item.path == path)
    }

    fn clamp_selection(&mut self) {
        if self.flat_items.is_empty() {
            self.selected_index = 0;
        } else if self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now(), false));
    }

    /// Set an error status message with current timestamp.
    pub fn set_error_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now(), true));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created, _)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        let len = self.flat_items.len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    /// Move selection up by one item.
    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Jump to the first item.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the last item.
    pub fn select_last(&mut self) {
        let len = self.flat_items.len();
        if len > 0 {
            self.selected_index = len - 1;
        }
    }

    /// Expand the selected folder (no-op on files and expanded folders).
    pub fn expand_selected(&mut self) {
        let Some(item) = self.selected() else {
            return;
        };
        if item.kind == NodeKind::Folder && !item.is_expanded {
            let path = item.path.clone();
            self.collapsed.remove(&path);
            self.needs_reload = true;
        }
    }

    /// Collapse the selected folder, or jump to the parent of a file or
    /// collapsed folder.
    pub fn collapse_selected(&mut self) {
        let Some(item) = self.selected() else {
            return;
        };
        if item.kind == NodeKind::Folder && item.is_expanded {
            let path = item.path.clone();
            self.collapsed.insert(path);
            self.needs_reload = true;
            return;
        }
        if let Some(parent) = self.provider.get_parent(item.id) {
            if let Some(index) = self.flat_items.iter().position(|i| i.id == parent) {
                self.selected_index = index;
            }
        }
    }

    /// Toggle the selected folder between expanded and collapsed.
    pub fn toggle_selected(&mut self) {
        match self.selected() {
            Some(item) if item.is_expanded => self.collapse_selected(),
            Some(_) => self.expand_selected(),
            None => {}
        }
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }
}

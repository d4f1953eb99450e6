//! Panel lifecycle: everything created at startup lives in a [`PanelContext`]
//! and is released by [`deactivate`].

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::commands::{register_defaults, CommandRegistry};
use crate::config::AppConfig;
use crate::error::Result;
use crate::event::Event;
use crate::fs::search::FileSearch;
use crate::fs::watcher::{FsWatcher, DEFAULT_FLOOD_THRESHOLD};
use crate::fs::workspace::Workspace;
use crate::tree::provider::ViewDataProvider;

/// A resource released at teardown. Disposing twice is a no-op.
pub trait Disposable {
    fn dispose(&mut self);
}

/// Startup-owned state shared by the event loop and teardown.
#[derive(Default)]
pub struct PanelContext {
    pub commands: CommandRegistry,
    pub watcher: Option<FsWatcher>,
    /// Why the watcher is not running, when it was requested but failed.
    pub watcher_error: Option<String>,
}

impl PanelContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Register commands, start the watcher and create the tree provider.
///
/// The provider starts empty and an initial [`Event::TreeChanged`] is sent
/// so the renderer pulls the first tree. A watcher that fails to start is
/// recorded in `ctx.watcher_error` rather than failing activation.
pub fn activate<W, S>(
    ctx: &mut PanelContext,
    config: &AppConfig,
    workspace: W,
    search: S,
    event_tx: mpsc::UnboundedSender<Event>,
) -> Result<ViewDataProvider<W, S>>
where
    W: Workspace + Send + Sync,
    S: FileSearch,
{
    register_defaults(&mut ctx.commands);

    let roots: Vec<_> = workspace.folders().into_iter().map(|f| f.root_path).collect();
    let mut provider =
        ViewDataProvider::new(workspace, search, config.file_pattern(), event_tx.clone())?;

    if config.watcher_enabled() {
        match FsWatcher::new(
            &roots,
            Duration::from_millis(config.debounce_ms()),
            provider.matcher().clone(),
            DEFAULT_FLOOD_THRESHOLD,
            event_tx,
        ) {
            Ok(watcher) => ctx.watcher = Some(watcher),
            Err(e) => {
                warn!(error = %e, "watcher unavailable");
                ctx.watcher_error = Some(e.to_string());
            }
        }
    }

    provider.refresh();
    info!(
        pattern = ?provider.pattern(),
        watching = ctx.watcher.is_some(),
        "panel activated"
    );
    Ok(provider)
}

/// Unregister commands and dispose the watcher.
pub fn deactivate(ctx: &mut PanelContext) {
    ctx.commands.dispose();
    if let Some(watcher) = ctx.watcher.as_mut() {
        watcher.dispose();
    }
    ctx.watcher = None;
    info!("panel deactivated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandId;
    use crate::config::WatcherConfig;
    use crate::fs::search::GlobSearch;
    use crate::fs::workspace::{StaticWorkspace, WorkspaceFolder};
    use crate::tree::provider::TreeDataProvider;
    use std::fs;
    use tempfile::TempDir;

    fn config(watch: bool) -> AppConfig {
        AppConfig {
            watcher: WatcherConfig {
                enabled: Some(watch),
                debounce_ms: Some(50),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn activate_registers_refresh_and_requests_first_pull() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.ts"), "").unwrap();
        let workspace = StaticWorkspace::new(vec![WorkspaceFolder::new(dir.path())]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ctx = PanelContext::new();

        let mut provider =
            activate(&mut ctx, &config(false), workspace, GlobSearch::default(), tx).unwrap();

        assert!(ctx.commands.is_registered(CommandId::Refresh));
        assert!(ctx.watcher.is_none());
        assert!(matches!(rx.try_recv(), Ok(Event::TreeChanged)));

        let roots = provider.get_children(None).await.unwrap();
        let files = provider.get_children(Some(roots[0])).await.unwrap();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn activate_starts_watcher_when_enabled() {
        let dir = TempDir::new().unwrap();
        let workspace = StaticWorkspace::new(vec![WorkspaceFolder::new(dir.path())]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut ctx = PanelContext::new();
        activate(&mut ctx, &config(true), workspace, GlobSearch::default(), tx).unwrap();
        assert!(ctx.watcher.as_ref().is_some_and(FsWatcher::is_active));
        deactivate(&mut ctx);
    }

    #[tokio::test]
    async fn deactivate_twice_is_safe() {
        let dir = TempDir::new().unwrap();
        let workspace = StaticWorkspace::new(vec![WorkspaceFolder::new(dir.path())]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut ctx = PanelContext::new();
        activate(&mut ctx, &config(true), workspace, GlobSearch::default(), tx).unwrap();

        deactivate(&mut ctx);
        deactivate(&mut ctx);
        assert!(ctx.watcher.is_none());
        assert!(!ctx.commands.is_registered(CommandId::Refresh));
    }

    #[tokio::test]
    async fn watched_change_reaches_the_cached_tree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("lib")).unwrap();
        fs::write(root.join("lib/a.ts"), "").unwrap();
        let workspace = StaticWorkspace::new(vec![WorkspaceFolder::new(&root)]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ctx = PanelContext::new();
        let mut provider =
            activate(&mut ctx, &config(true), workspace, GlobSearch::default(), tx).unwrap();
        provider.get_children(None).await.unwrap();

        let added = root.join("lib/b.ts");
        fs::write(&added, "").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while provider.find_node(&added).is_none() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some(Event::FsChange(changes))) => {
                    for change in &changes {
                        provider.on_file_changed(change);
                    }
                }
                Ok(Some(_)) => {}
                _ => break,
            }
        }

        let id = provider.find_node(&added).expect("watched file never patched in");
        let lib = provider.get_parent(id).unwrap();
        assert_eq!(provider.get_tree_item(lib).unwrap().label, "lib");
        deactivate(&mut ctx);
    }

    #[test]
    fn missing_root_records_watcher_error() {
        let workspace =
            StaticWorkspace::new(vec![WorkspaceFolder::new("/nonexistent/glob-tree-root")]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut ctx = PanelContext::new();
        let provider = activate(&mut ctx, &config(true), workspace, GlobSearch::default(), tx);
        assert!(provider.is_ok());
        assert!(ctx.watcher.is_none());
        assert!(ctx.watcher_error.is_some());
    }
}

mod app;
mod commands;
mod components;
mod config;
mod error;
mod event;
mod extension;
mod fs;
mod handler;
mod logging;
mod theme;
mod tree;
mod tui;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::app::App;
use crate::config::{AppConfig, LogConfig, SearchConfig, ThemeConfig, WatcherConfig};
use crate::event::{Event, EventHandler};
use crate::extension::PanelContext;
use crate::fs::search::GlobSearch;
use crate::fs::workspace::StaticWorkspace;
use crate::tui::{install_panic_hook, Tui};

/// Browse the files matching a glob across workspace folders as a tree.
#[derive(Parser, Debug)]
#[command(name = "gtree", version, about)]
struct Cli {
    /// Workspace folders to search (defaults to current directory)
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Glob of files to show, e.g. '**/*.md'
    #[arg(long = "glob")]
    include: Option<String>,

    /// Glob of files to hide ('' disables exclusion)
    #[arg(long)]
    exclude: Option<String>,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,

    /// File to select on startup, expanding its folders
    #[arg(long)]
    reveal: Option<PathBuf>,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Color scheme: dark or light
    #[arg(long)]
    theme: Option<String>,

    /// Log filter, e.g. 'debug'
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            search: SearchConfig {
                include: self.include.clone(),
                exclude: self.exclude.clone(),
                follow_links: None,
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                debounce_ms: None,
            },
            theme: ThemeConfig {
                scheme: self.theme.clone(),
            },
            log: LogConfig {
                level: self.log_level.clone(),
                file: None,
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if let Some(log_file) = config.log_file() {
        if let Err(e) = logging::init(&log_file, config.log_level()) {
            eprintln!("warning: logging disabled: {e}");
        }
    }

    let workspace = StaticWorkspace::from_paths(&cli.paths)?;
    let theme = theme::resolve_theme(config.theme_scheme());
    let use_icons = config.use_icons();

    install_panic_hook();

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(16));
    let mut ctx = PanelContext::new();
    let provider = extension::activate(
        &mut ctx,
        &config,
        workspace,
        GlobSearch::new(config.follow_links()),
        events.sender(),
    )?;

    let mut app = App::new(provider);
    app.watcher_active = ctx.watcher.is_some();
    if let Some(err) = &ctx.watcher_error {
        app.set_status_message(format!("⚠ Watcher unavailable: {err}"));
    }

    if let Some(target) = &cli.reveal {
        let target = target.canonicalize().unwrap_or_else(|_| target.clone());
        match app.select_path(&target).await {
            Ok(true) => {}
            Ok(false) => app.set_error_message(format!("{} is not in the tree", target.display())),
            Err(e) => app.set_error_message(e.to_string()),
        }
    }

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame, &theme, use_icons);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, &ctx.commands, key),
            Event::Tick => app.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::FsChange(changes) => app.handle_fs_change(&changes),
            Event::FsRescan => {
                info!("change flood, rebuilding tree");
                app.provider.refresh();
            }
            Event::TreeChanged => app.reload_or_report().await,
        }

        if app.needs_reload {
            app.reload_or_report().await;
        }

        // Sync watcher pause/resume state
        match ctx.watcher.as_ref() {
            Some(watcher) if app.watcher_active && !watcher.is_active() => watcher.resume(),
            Some(watcher) if !app.watcher_active && watcher.is_active() => watcher.pause(),
            None if app.watcher_active => {
                warn!("no watcher to resume");
                app.watcher_active = false;
            }
            _ => {}
        }

        if app.should_quit {
            break;
        }
    }

    extension::deactivate(&mut ctx);
    tui.restore()?;
    Ok(())
}

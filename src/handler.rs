use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;
use crate::commands::CommandRegistry;
use crate::fs::search::FileSearch;
use crate::fs::workspace::Workspace;

/// Handle a key event: registered commands first, then navigation.
pub fn handle_key_event<W, S>(app: &mut App<W, S>, commands: &CommandRegistry, key: KeyEvent)
where
    W: Workspace + Send + Sync,
    S: FileSearch,
{
    if key.kind == KeyEventKind::Release {
        return;
    }

    if let Some(command) = commands.resolve(&key) {
        app.execute(command);
        return;
    }

    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Right | KeyCode::Char('l') => app.expand_selected(),
        KeyCode::Left | KeyCode::Char('h') => app.collapse_selected(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::register_defaults;
    use crate::fs::search::{FilePattern, GlobSearch};
    use crate::fs::workspace::{StaticWorkspace, WorkspaceFolder};
    use crate::tree::provider::ViewDataProvider;
    use crossterm::event::KeyModifiers;
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    async fn loaded_app() -> (TempDir, App<StaticWorkspace, GlobSearch>) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/a.ts"), "").unwrap();
        let workspace = StaticWorkspace::new(vec![WorkspaceFolder::new(dir.path())]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let provider =
            ViewDataProvider::new(workspace, GlobSearch::default(), FilePattern::default(), tx)
                .unwrap();
        let mut app = App::new(provider);
        app.reload().await.unwrap();
        (dir, app)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn navigation_keys_move_selection() {
        let (_dir, mut app) = loaded_app().await;
        let commands = CommandRegistry::new();
        handle_key_event(&mut app, &commands, press(KeyCode::Char('j')));
        assert_eq!(app.selected_index, 1);
        handle_key_event(&mut app, &commands, press(KeyCode::Char('G')));
        assert_eq!(app.selected_index, 2);
        handle_key_event(&mut app, &commands, press(KeyCode::Up));
        assert_eq!(app.selected_index, 1);
    }

    #[tokio::test]
    async fn registered_command_takes_precedence() {
        let (_dir, mut app) = loaded_app().await;
        let mut commands = CommandRegistry::new();
        register_defaults(&mut commands);
        handle_key_event(&mut app, &commands, press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn unregistered_refresh_key_does_nothing() {
        let (_dir, mut app) = loaded_app().await;
        let commands = CommandRegistry::new();
        handle_key_event(&mut app, &commands, press(KeyCode::Char('r')));
        assert!(app.provider.is_cached());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn enter_toggles_folder() {
        let (_dir, mut app) = loaded_app().await;
        let commands = CommandRegistry::new();
        app.selected_index = 1; // lib
        handle_key_event(&mut app, &commands, press(KeyCode::Enter));
        assert!(app.needs_reload);
        app.reload().await.unwrap();
        assert_eq!(app.flat_items.len(), 2);
    }
}

//! Panel commands and their key bindings.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::extension::Disposable;

/// Commands the panel contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// Drop the cached tree and rebuild it on the next pull.
    Refresh,
    /// Pause or resume the filesystem watcher.
    ToggleWatcher,
    Quit,
}

impl CommandId {
    /// Stable string identifier.
    pub fn id(&self) -> &'static str {
        match self {
            CommandId::Refresh => "globTree.refresh",
            CommandId::ToggleWatcher => "globTree.toggleWatcher",
            CommandId::Quit => "globTree.quit",
        }
    }
}

/// A key plus modifiers that triggers a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn plain(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    fn from_event(key: &KeyEvent) -> Self {
        // Shifted letters arrive as uppercase chars; the modifier is redundant.
        let modifiers = key.modifiers - KeyModifiers::SHIFT;
        Self {
            code: key.code,
            modifiers,
        }
    }
}

/// Registered commands and the keys bound to them.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    bindings: HashMap<KeyBinding, CommandId>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `keys` to `command`, replacing earlier bindings of the same keys.
    pub fn register(&mut self, command: CommandId, keys: &[KeyBinding]) {
        for key in keys {
            self.bindings.insert(*key, command);
        }
        debug!(command = command.id(), keys = keys.len(), "command registered");
    }

    /// Remove every binding of `command`.
    pub fn unregister(&mut self, command: CommandId) {
        self.bindings.retain(|_, c| *c != command);
    }

    pub fn is_registered(&self, command: CommandId) -> bool {
        self.bindings.values().any(|c| *c == command)
    }

    /// Command bound to a key event, if any.
    pub fn resolve(&self, key: &KeyEvent) -> Option<CommandId> {
        self.bindings.get(&KeyBinding::from_event(key)).copied()
    }
}

impl Disposable for CommandRegistry {
    fn dispose(&mut self) {
        self.bindings.clear();
    }
}

/// Register the panel's default commands.
pub fn register_defaults(registry: &mut CommandRegistry) {
    registry.register(CommandId::Refresh, &[KeyBinding::plain('r'), KeyBinding::ctrl('r')]);
    registry.register(CommandId::ToggleWatcher, &[KeyBinding::plain('w')]);
    registry.register(CommandId::Quit, &[KeyBinding::plain('q'), KeyBinding::ctrl('c')]);
}

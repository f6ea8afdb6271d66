//! Customizable keybindings for the interaction handler.
//!
//! Drawables understand the canonical keys (`Enter`, `Escape`, `Backspace`);
//! `KeyBindings::normalize` maps user-bound keys onto them before forwarding.

use serde::{Deserialize, Serialize};

/// A keyboard key as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Printable character, case-sensitive
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Shift,
    Control,
    Alt,
    Meta,
}

impl Key {
    /// Whether holding this key toggles labels in and out of the selection.
    pub fn is_multi_select(&self) -> bool {
        matches!(self, Key::Control | Key::Meta)
    }
}

/// Commands reachable through a dedicated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Link all selected labels into one group
    Link,
    /// Dissolve the groups of all selected labels
    Unlink,
    /// Finish the label being drawn
    Finish,
    /// Abort the label being drawn
    Cancel,
    /// Remove the last vertex of the label being drawn
    UndoVertex,
}

impl KeyCommand {
    pub fn name(&self) -> &'static str {
        match self {
            KeyCommand::Link => "Link labels",
            KeyCommand::Unlink => "Unlink labels",
            KeyCommand::Finish => "Finish label",
            KeyCommand::Cancel => "Cancel label",
            KeyCommand::UndoVertex => "Undo vertex",
        }
    }

    pub fn all() -> &'static [KeyCommand] {
        &[
            KeyCommand::Link,
            KeyCommand::Unlink,
            KeyCommand::Finish,
            KeyCommand::Cancel,
            KeyCommand::UndoVertex,
        ]
    }
}

/// Keybinding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub link: Key,
    pub unlink: Key,
    pub finish: Key,
    pub cancel: Key,
    pub undo_vertex: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            link: Key::Char('l'),
            unlink: Key::Char('L'),
            finish: Key::Enter,
            cancel: Key::Escape,
            undo_vertex: Key::Backspace,
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the command bound to a key, if any.
    pub fn command_for_key(&self, key: Key) -> Option<KeyCommand> {
        KeyCommand::all()
            .iter()
            .copied()
            .find(|command| self.key_for(*command) == key)
    }

    pub fn key_for(&self, command: KeyCommand) -> Key {
        match command {
            KeyCommand::Link => self.link,
            KeyCommand::Unlink => self.unlink,
            KeyCommand::Finish => self.finish,
            KeyCommand::Cancel => self.cancel,
            KeyCommand::UndoVertex => self.undo_vertex,
        }
    }

    pub fn set_key(&mut self, command: KeyCommand, key: Key) {
        match command {
            KeyCommand::Link => self.link = key,
            KeyCommand::Unlink => self.unlink = key,
            KeyCommand::Finish => self.finish = key,
            KeyCommand::Cancel => self.cancel = key,
            KeyCommand::UndoVertex => self.undo_vertex = key,
        }
    }

    /// Map a bound editing key onto the canonical key drawables understand.
    pub fn normalize(&self, key: Key) -> Key {
        match self.command_for_key(key) {
            Some(KeyCommand::Finish) => Key::Enter,
            Some(KeyCommand::Cancel) => Key::Escape,
            Some(KeyCommand::UndoVertex) => Key::Backspace,
            _ => key,
        }
    }

    /// Check if a key is already used by another command.
    /// Returns the name of the conflicting command, if any.
    pub fn key_conflict(&self, key: Key, exclude: Option<KeyCommand>) -> Option<&'static str> {
        KeyCommand::all()
            .iter()
            .filter(|command| Some(**command) != exclude)
            .find(|command| self.key_for(**command) == key)
            .map(|command| command.name())
    }
}

/// Convert a key to a display string.
pub fn key_to_string(key: Key) -> String {
    match key {
        Key::Char(c) => c.to_string(),
        Key::Enter => "Enter".to_string(),
        Key::Escape => "Esc".to_string(),
        Key::Backspace => "Backspace".to_string(),
        Key::Delete => "Del".to_string(),
        Key::Shift => "Shift".to_string(),
        Key::Control => "Ctrl".to_string(),
        Key::Alt => "Alt".to_string(),
        Key::Meta => "Meta".to_string(),
    }
}

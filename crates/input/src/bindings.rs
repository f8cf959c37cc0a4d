use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::CameraAction;
use crate::snapshot::InputSnapshot;

/// Maps key names to camera actions.
///
/// Key names are whatever the windowing layer reports (for winit, the
/// `Debug` form of a `KeyCode` such as `"KeyW"` or `"Escape"`). Several keys
/// may map to the same action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    keys: BTreeMap<String, CameraAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = [
            ("KeyW", CameraAction::MoveForward),
            ("KeyS", CameraAction::MoveBackward),
            ("KeyA", CameraAction::MoveLeft),
            ("KeyD", CameraAction::MoveRight),
            ("KeyQ", CameraAction::MoveUp),
            ("KeyE", CameraAction::MoveDown),
            ("KeyP", CameraAction::Perspective),
            ("KeyO", CameraAction::Orthographic),
            ("Escape", CameraAction::Quit),
        ]
        .into_iter()
        .map(|(k, a)| (k.to_string(), a))
        .collect();
        Self { keys }
    }
}

impl KeyBindings {
    /// Bindings with no keys mapped.
    pub fn empty() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Map `key` to `action`, replacing any previous mapping for that key.
    pub fn bind(&mut self, key: &str, action: CameraAction) -> Option<CameraAction> {
        let previous = self.keys.insert(key.to_string(), action);
        if let Some(old) = previous {
            tracing::debug!(key, ?old, new = ?action, "key rebound");
        }
        previous
    }

    pub fn unbind(&mut self, key: &str) -> Option<CameraAction> {
        self.keys.remove(key)
    }

    pub fn action_for(&self, key: &str) -> Option<CameraAction> {
        self.keys.get(key).copied()
    }

    /// Keys bound to `action`, in key-name order.
    pub fn keys_for(&self, action: CameraAction) -> Vec<&str> {
        self.keys
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Build this frame's snapshot from the names of keys currently held.
    /// Unbound keys are ignored.
    pub fn snapshot<'a>(&self, held_keys: impl IntoIterator<Item = &'a str>) -> InputSnapshot {
        held_keys
            .into_iter()
            .filter_map(|k| self.action_for(k))
            .collect()
    }
}

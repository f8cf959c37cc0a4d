use std::collections::BTreeSet;

use crate::action::CameraAction;

/// The set of actions held down at the moment a frame samples input.
///
/// Rebuilt every frame from current key state: an action stays in effect
/// for as long as its key is held, not just on the press edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    held: BTreeSet<CameraAction>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: CameraAction) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: CameraAction) {
        self.held.remove(&action);
    }

    pub fn is_held(&self, action: CameraAction) -> bool {
        self.held.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Held actions in declaration order of [`CameraAction`].
    pub fn held(&self) -> impl Iterator<Item = CameraAction> + '_ {
        self.held.iter().copied()
    }
}

impl FromIterator<CameraAction> for InputSnapshot {
    fn from_iter<I: IntoIterator<Item = CameraAction>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut snap = InputSnapshot::new();
        assert!(snap.is_empty());
        snap.press(CameraAction::MoveForward);
        snap.press(CameraAction::MoveForward);
        assert!(snap.is_held(CameraAction::MoveForward));
        assert_eq!(snap.held().count(), 1);
        snap.release(CameraAction::MoveForward);
        assert!(!snap.is_held(CameraAction::MoveForward));
    }

    #[test]
    fn collects_from_iterator() {
        let snap: InputSnapshot = [CameraAction::Orthographic, CameraAction::Perspective]
            .into_iter()
            .collect();
        assert!(snap.is_held(CameraAction::Perspective));
        assert!(snap.is_held(CameraAction::Orthographic));
    }
}

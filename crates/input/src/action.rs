use serde::{Deserialize, Serialize};

/// A high-level camera action a bound key can produce.
///
/// The camera consumes actions, never raw key codes, so bindings stay a
/// configuration concern of the frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    /// Rise along the camera's up axis.
    MoveUp,
    /// Sink along the camera's up axis.
    MoveDown,
    /// Force perspective projection while held.
    Perspective,
    /// Force orthographic projection while held.
    Orthographic,
    /// Ask the frame driver to shut down.
    Quit,
}

impl CameraAction {
    pub const ALL: [CameraAction; 9] = [
        CameraAction::MoveForward,
        CameraAction::MoveBackward,
        CameraAction::MoveLeft,
        CameraAction::MoveRight,
        CameraAction::MoveUp,
        CameraAction::MoveDown,
        CameraAction::Perspective,
        CameraAction::Orthographic,
        CameraAction::Quit,
    ];

    pub fn is_movement(self) -> bool {
        matches!(
            self,
            Self::MoveForward
                | Self::MoveBackward
                | Self::MoveLeft
                | Self::MoveRight
                | Self::MoveUp
                | Self::MoveDown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_classification() {
        let movement: Vec<_> = CameraAction::ALL
            .into_iter()
            .filter(|a| a.is_movement())
            .collect();
        assert_eq!(movement.len(), 6);
        assert!(!CameraAction::Quit.is_movement());
        assert!(!CameraAction::Orthographic.is_movement());
    }

    #[test]
    fn action_names_in_json() {
        let json = serde_json::to_string(&CameraAction::MoveForward).unwrap();
        assert_eq!(json, "\"move_forward\"");
        let back: CameraAction = serde_json::from_str("\"orthographic\"").unwrap();
        assert_eq!(back, CameraAction::Orthographic);
    }
}

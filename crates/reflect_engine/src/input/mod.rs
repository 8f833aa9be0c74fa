//! Input state
//!
//! The window layer polls keys and the cursor once per frame and hands the
//! result to the scene as an [`InputState`] snapshot.

use std::collections::HashSet;

use crate::foundation::math::Vec2;

/// Keys the demo reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Walk forward
    W,
    /// Strafe left
    A,
    /// Walk backward
    S,
    /// Strafe right
    D,
    /// Fly up
    Space,
    /// Fly down
    C,
    /// Quit
    Escape,
    /// Save a screenshot
    F12,
}

/// One frame of input
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
    mouse_delta: Vec2,
}

impl InputState {
    /// Empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key's state; a transition to held also marks it pressed this frame
    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            if self.held.insert(key) {
                self.pressed.insert(key);
            }
        } else {
            self.held.remove(&key);
        }
    }

    /// Set the cursor movement since the previous frame (previous minus current)
    pub fn set_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta = delta;
    }

    /// Whether the key is down
    pub fn is_down(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Whether the key went down this frame
    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Cursor movement since the previous frame
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Start a new frame: edges and mouse movement reset, held keys persist
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.mouse_delta = Vec2::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edges_reset_each_frame() {
        let mut input = InputState::new();
        input.set_key(KeyCode::F12, true);
        assert!(input.was_pressed(KeyCode::F12));

        input.begin_frame();
        input.set_key(KeyCode::F12, true);
        assert!(input.is_down(KeyCode::F12));
        assert!(!input.was_pressed(KeyCode::F12));

        input.set_key(KeyCode::F12, false);
        assert!(!input.is_down(KeyCode::F12));
    }

    #[test]
    fn test_mouse_delta_clears() {
        let mut input = InputState::new();
        input.set_mouse_delta(Vec2::new(3.0, -1.0));
        assert_eq!(input.mouse_delta(), Vec2::new(3.0, -1.0));
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::zeros());
    }
}

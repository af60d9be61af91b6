//! Keyboard input state.
//!
//! [`InputState`] is an explicit struct owned by the engine context: the
//! window event handler writes into it, entity behaviors read from it
//! through [`TickContext`](crate::entity::TickContext). There is no global
//! key table.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Tracks which keys are currently held, pressed this frame, or released
/// this frame. Per-frame sets are cleared after the entity pass.
#[derive(Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    just_pressed: HashSet<KeyCode>,
    just_released: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while the key is held down.
    pub fn held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Returns `true` only on the frame the key went down.
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Returns `true` only on the frame the key came up.
    pub fn just_released(&self, key: KeyCode) -> bool {
        self.just_released.contains(&key)
    }

    /// Record a key-down event (window event handler only).
    pub(crate) fn press(&mut self, key: KeyCode) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    /// Record a key-up event (window event handler only).
    pub(crate) fn release(&mut self, key: KeyCode) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Drop the per-frame edge sets; held keys stay held.
    pub(crate) fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_release_cycle() {
        let mut input = InputState::new();

        input.press(KeyCode::KeyW);
        assert!(input.held(KeyCode::KeyW));
        assert!(input.just_pressed(KeyCode::KeyW));

        input.end_frame();
        assert!(input.held(KeyCode::KeyW));
        assert!(!input.just_pressed(KeyCode::KeyW));

        input.release(KeyCode::KeyW);
        assert!(!input.held(KeyCode::KeyW));
        assert!(input.just_released(KeyCode::KeyW));

        input.end_frame();
        assert!(!input.just_released(KeyCode::KeyW));
    }

    #[test]
    fn key_repeat_does_not_retrigger_just_pressed() {
        let mut input = InputState::new();
        input.press(KeyCode::Space);
        input.end_frame();
        input.press(KeyCode::Space); // OS auto-repeat
        assert!(!input.just_pressed(KeyCode::Space));
        assert!(input.held(KeyCode::Space));
    }
}

//! Keyboard-driven paddle input.
//!
//! Key events are recorded into a [`KeyboardState`] by whatever owns the
//! window or terminal. Local controllers sample it once per tick; there is no
//! global key table.

use crate::controller::InputController;
use log::debug;
use pong_shared::{GameStateView, Movement};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Shared set of currently held keys. Cloning yields another handle to the
/// same set.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: Rc<RefCell<HashSet<String>>>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: &str) {
        self.held.borrow_mut().insert(normalize_key(key));
    }

    pub fn release(&self, key: &str) {
        self.held.borrow_mut().remove(&normalize_key(key));
    }

    pub fn is_down(&self, key: &str) -> bool {
        self.held.borrow().contains(&normalize_key(key))
    }

    pub fn release_all(&self) {
        self.held.borrow_mut().clear();
    }
}

// Letter keys arrive as "w" or "W" depending on shift state.
fn normalize_key(key: &str) -> String {
    if key.chars().count() == 1 {
        key.to_lowercase()
    } else {
        key.to_string()
    }
}

/// The pair of keys that drive one paddle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub increase: String,
    pub decrease: String,
}

impl KeyBinding {
    pub fn new(increase: &str, decrease: &str) -> Self {
        Self {
            increase: increase.to_string(),
            decrease: decrease.to_string(),
        }
    }

    pub fn wasd() -> Self {
        Self::new("w", "s")
    }

    pub fn arrows() -> Self {
        Self::new("ArrowUp", "ArrowDown")
    }
}

pub struct LocalController {
    binding: KeyBinding,
    keyboard: Option<KeyboardState>,
}

impl LocalController {
    pub fn new(keyboard: KeyboardState, binding: KeyBinding) -> Self {
        Self {
            binding,
            keyboard: Some(keyboard),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.keyboard.is_some()
    }
}

impl InputController for LocalController {
    fn movement(&mut self, _view: GameStateView<'_>) -> Movement {
        match &self.keyboard {
            Some(keyboard) => Movement::from_keys(
                keyboard.is_down(&self.binding.increase),
                keyboard.is_down(&self.binding.decrease),
            ),
            None => Movement::Idle,
        }
    }

    fn destroy(&mut self) {
        if self.keyboard.take().is_some() {
            debug!(
                "Released keyboard for {}/{}",
                self.binding.increase, self.binding.decrease
            );
        }
    }
}

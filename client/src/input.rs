//! Mouse and keyboard handling

use crate::game::{ClientGameState, Intent};
use crate::rendering::Layout;
use macroquad::prelude::*;
use shared::Symbol;

/// What a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Cell(u32),
    Choice(Symbol),
    Reset,
}

/// Finds the visible element under `point`
pub fn hit_test(layout: &Layout, state: &ClientGameState, point: Vec2) -> Option<Target> {
    if state.chooser_visible() {
        let choice = Symbol::ALL
            .iter()
            .zip(layout.choices.iter())
            .find(|(symbol, rect)| state.choices.contains(*symbol) && rect.contains(point))
            .map(|(symbol, _)| Target::Choice(*symbol));
        if choice.is_some() {
            return choice;
        }
    }

    if state.board_visible {
        if let Some(index) = layout.cells.iter().position(|rect| rect.contains(point)) {
            return Some(Target::Cell(index as u32));
        }
        if layout.reset.contains(point) {
            return Some(Target::Reset);
        }
    }

    None
}

/// Turns a target into a request, running the advisory checks first
pub fn resolve(target: Target, state: &mut ClientGameState) -> Option<Intent> {
    match target {
        Target::Cell(cell) => state.try_move(cell),
        Target::Choice(symbol) => state.try_choose(symbol),
        Target::Reset => Some(state.request_reset()),
    }
}

const CELL_KEYS: [KeyCode; 9] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
    KeyCode::Key9,
];

#[derive(Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    /// Samples this frame's input and returns the request to send, if any
    ///
    /// Keys 1-9 pick a cell in reading order and R asks for a reset.
    pub fn update(&mut self, layout: &Layout, state: &mut ClientGameState) -> Option<Intent> {
        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            if let Some(target) = hit_test(layout, state, vec2(x, y)) {
                return resolve(target, state);
            }
        }

        if state.board_visible {
            if let Some(index) = CELL_KEYS.iter().position(|key| is_key_pressed(*key)) {
                return resolve(Target::Cell(index as u32), state);
            }
            if is_key_pressed(KeyCode::R) {
                return resolve(Target::Reset, state);
            }
        }

        None
    }
}

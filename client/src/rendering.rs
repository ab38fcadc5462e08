use crate::game::{ClientGameState, StatusKind};
use macroquad::prelude::*;
use shared::{Symbol, BOARD_CELLS};

const BUTTON_HEIGHT: f32 = 50.0;
const BUTTON_GAP: f32 = 10.0;
const STATUS_FONT: f32 = 28.0;

/// Screen regions for every clickable element
#[derive(Debug, Clone)]
pub struct Layout {
    pub cells: [Rect; BOARD_CELLS],
    /// One button per symbol, in `Symbol::ALL` order
    pub choices: [Rect; 6],
    pub reset: Rect,
    pub status: Vec2,
}

impl Layout {
    pub fn new(width: f32, height: f32) -> Self {
        let button_width = ((width - 40.0 - 5.0 * BUTTON_GAP) / 6.0).min(110.0);
        let row_width = 6.0 * button_width + 5.0 * BUTTON_GAP;
        let row_x = (width - row_width) / 2.0;
        let choices = std::array::from_fn(|i| {
            Rect::new(
                row_x + i as f32 * (button_width + BUTTON_GAP),
                120.0,
                button_width,
                BUTTON_HEIGHT,
            )
        });

        let cell_size = ((height - 200.0) / 3.0).clamp(40.0, 120.0);
        let board_x = (width - 3.0 * cell_size) / 2.0;
        let board_y = 80.0;
        let cells = std::array::from_fn(|i| {
            Rect::new(
                board_x + (i % 3) as f32 * cell_size,
                board_y + (i / 3) as f32 * cell_size,
                cell_size,
                cell_size,
            )
        });

        let reset = Rect::new(
            (width - 160.0) / 2.0,
            board_y + 3.0 * cell_size + 20.0,
            160.0,
            44.0,
        );

        Self {
            cells,
            choices,
            reset,
            status: vec2(width / 2.0, 45.0),
        }
    }
}

pub fn symbol_color(symbol: Symbol) -> Color {
    match symbol {
        Symbol::Bear => Color::from_rgba(160, 100, 50, 255),
        Symbol::Koala => Color::from_rgba(170, 170, 180, 255),
        Symbol::Fox => Color::from_rgba(240, 120, 30, 255),
        Symbol::Monkey => Color::from_rgba(200, 150, 90, 255),
        Symbol::Rabbit => Color::from_rgba(240, 180, 200, 255),
        Symbol::Cow => Color::from_rgba(250, 250, 250, 255),
    }
}

/// Drops characters the built-in font has no glyph for, such as emoji
pub fn printable(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Renderer {
    layout: Layout,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            layout: Layout::new(width as f32, height as f32),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn render(&self, state: &ClientGameState) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        self.draw_status(state);

        if state.chooser_visible() {
            self.draw_chooser(state);
        }

        if state.board_visible {
            self.draw_board(state);
            self.draw_button(self.layout.reset, "Reset game", Color::from_rgba(68, 68, 68, 255));
        }
    }

    fn draw_status(&self, state: &ClientGameState) {
        let color = match state.status_kind {
            StatusKind::Info => WHITE,
            StatusKind::Error => Color::from_rgba(255, 68, 68, 255),
        };
        draw_centered_text(&printable(&state.status), self.layout.status, STATUS_FONT, color);

        if let Some(symbol) = state.my_symbol {
            let label = format!("You: {}", symbol.name());
            draw_text(&label, 10.0, 20.0, 18.0, symbol_color(symbol));
        }
    }

    fn draw_chooser(&self, state: &ClientGameState) {
        for (symbol, rect) in Symbol::ALL.iter().zip(self.layout.choices.iter()) {
            if state.choices.contains(symbol) {
                self.draw_button(*rect, symbol.name(), symbol_color(*symbol));
            }
        }
    }

    fn draw_board(&self, state: &ClientGameState) {
        for (cell, rect) in state.board.iter().zip(self.layout.cells.iter()) {
            draw_rectangle(rect.x, rect.y, rect.w, rect.h, Color::from_rgba(40, 40, 48, 255));
            draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 3.0, GRAY);

            if let Some(symbol) = cell {
                draw_centered_text(
                    symbol.name(),
                    rect.center(),
                    rect.h * 0.3,
                    symbol_color(*symbol),
                );
            }
        }
    }

    fn draw_button(&self, rect: Rect, label: &str, accent: Color) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, Color::from_rgba(51, 51, 51, 255));
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, accent);
        draw_centered_text(label, rect.center(), 22.0, accent);
    }
}

fn draw_centered_text(text: &str, center: Vec2, font_size: f32, color: Color) {
    let dims = measure_text(text, None, font_size as u16, 1.0);
    draw_text(
        text,
        center.x - dims.width / 2.0,
        center.y + dims.offset_y / 2.0,
        font_size,
        color,
    );
}

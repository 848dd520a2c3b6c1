// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub heat: f32,
}

impl Cell {
    pub fn blank_with_bg(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
            heat: 0.0,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.heat > 0.0
    }

    pub fn looks_like(&self, other: &Cell) -> bool {
        self.ch == other.ch && self.fg == other.fg && self.bg == other.bg && self.bold == other.bold
    }
}

// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::cell::Cell;
use crate::palette::Palette;

pub const FADE_FLOOR: f32 = 0.05;

#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    blank: Cell,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        let blank = Cell::blank_with_bg(bg);
        Self {
            width,
            height,
            cells: vec![blank; len],
            blank,
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn has_changes(&self) -> bool {
        self.dirty_all || !self.dirty.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_map.fill(false);
        } else {
            for &i in &self.dirty {
                self.dirty_map[i] = false;
            }
        }
        self.dirty_all = false;
        self.dirty.clear();
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[cfg(test)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(self.blank)
    }

    fn store(&mut self, i: usize, cell: Cell) {
        let changed = !self.cells[i].looks_like(&cell);
        self.cells[i] = cell;
        if changed && !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.index(x, y) {
            self.store(i, cell);
        }
    }

    pub fn plot(&mut self, x: u16, y: u16, ch: char, palette: &Palette) {
        let cell = Cell {
            ch,
            fg: palette.brightest(),
            bg: self.blank.bg,
            bold: true,
            heat: 1.0,
        };
        self.set(x, y, cell);
    }

    pub fn put_str(&mut self, x: u16, y: u16, text: &str, fg: Option<Color>, bold: bool) {
        for (dx, ch) in text.chars().enumerate() {
            let Ok(dx) = u16::try_from(dx) else {
                break;
            };
            let cell = Cell {
                ch,
                fg,
                bg: self.blank.bg,
                bold,
                heat: 0.0,
            };
            self.set(x.saturating_add(dx), y, cell);
        }
    }

    // Translucent black overlay: every lit glyph loses `alpha` of its heat.
    pub fn fade(&mut self, alpha: f32, palette: &Palette) {
        let keep = (1.0 - alpha).clamp(0.0, 1.0);
        for i in 0..self.cells.len() {
            let cur = self.cells[i];
            if !cur.is_lit() {
                continue;
            }
            let heat = cur.heat * keep;
            let next = if heat < FADE_FLOOR {
                self.blank
            } else {
                Cell {
                    fg: palette.shade(heat),
                    bold: false,
                    heat,
                    ..cur
                }
            };
            self.store(i, next);
        }
    }
}

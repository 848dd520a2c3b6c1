// Copyright (c) 2026 rezky_nightky

use std::time::Instant;

use rand::{rngs::StdRng, Rng};

use crate::frame::Frame;
use crate::palette::Palette;
use crate::scheduler::FrameEffect;

const INITIAL_POSITION: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RainConfig {
    pub font_size: u16,
    pub reset_probability: f32,
    pub fade_alpha: f32,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            font_size: 1,
            reset_probability: 0.025,
            fade_alpha: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Column {
    position: f32,
}

impl Column {
    fn new() -> Self {
        Self {
            position: INITIAL_POSITION,
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> f32 {
        self.position
    }
}

#[derive(Clone, Copy, Debug)]
struct Glyph {
    x: u16,
    y: u16,
    ch: char,
}

pub struct RainField {
    config: RainConfig,
    palette: Palette,
    alphabet: Vec<char>,
    rng: StdRng,
    height: u16,
    columns: Vec<Column>,
    pending: Vec<Glyph>,
}

impl RainField {
    pub fn new(config: RainConfig, alphabet: Vec<char>, palette: Palette, rng: StdRng) -> Self {
        let alphabet = if alphabet.is_empty() {
            vec!['0', '1']
        } else {
            alphabet
        };
        Self {
            config: RainConfig {
                font_size: config.font_size.max(1),
                reset_probability: config.reset_probability.clamp(0.0, 1.0),
                fade_alpha: config.fade_alpha.clamp(0.0, 1.0),
            },
            palette,
            alphabet,
            rng,
            height: 0,
            columns: Vec::new(),
            pending: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.height = height;
        let count = (width / self.config.font_size) as usize;
        self.columns.clear();
        self.columns.resize(count, Column::new());
        self.pending.clear();
        tracing::debug!(width, height, columns = count, "rain field rebuilt");
    }

    pub fn advance(&mut self) {
        let fs = self.config.font_size as f32;
        let limit = self.height as f32;
        self.pending.clear();

        for (i, col) in self.columns.iter_mut().enumerate() {
            let ch = self.alphabet[self.rng.random_range(0..self.alphabet.len())];
            self.pending.push(Glyph {
                x: (i as f32 * fs) as u16,
                y: (col.position * fs) as u16,
                ch,
            });

            col.position += 1.0;
            if col.position * fs > limit
                && self.rng.random::<f32>() < self.config.reset_probability
            {
                col.position = 0.0;
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        if frame.is_empty() {
            self.pending.clear();
            return;
        }
        frame.fade(self.config.fade_alpha, &self.palette);
        for g in self.pending.drain(..) {
            frame.plot(g.x, g.y, g.ch, &self.palette);
        }
    }
}

impl FrameEffect for RainField {
    fn resize(&mut self, width: u16, height: u16) {
        RainField::resize(self, width, height);
    }

    fn advance(&mut self, _now: Instant) {
        RainField::advance(self);
    }

    fn render(&mut self, frame: &mut Frame) {
        RainField::render(self, frame);
    }
}

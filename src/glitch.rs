// Copyright (c) 2026 rezky_nightky

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use crossterm::style::Color;
use rand::{rngs::StdRng, Rng};
use tokio::time::MissedTickBehavior;

use crate::frame::Frame;
use crate::scheduler::FrameEffect;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlitchConfig {
    pub tick: Duration,
    pub step: f32,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(30),
            step: 1.0 / 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlitchPhase {
    Idle,
    Revealing,
    Done,
}

#[derive(Clone, Debug)]
pub struct GlitchText {
    original: String,
    original_chars: Vec<char>,
    alphabet: Vec<char>,
    config: GlitchConfig,
    phase: GlitchPhase,
    revealed: f32,
    shown: String,
    next_tick: Option<Instant>,
}

impl GlitchText {
    pub fn new(text: impl Into<String>, alphabet: Vec<char>, config: GlitchConfig) -> Self {
        let original = text.into();
        let alphabet = if alphabet.is_empty() {
            vec!['#']
        } else {
            alphabet
        };
        let step = if config.step.is_finite() && config.step > 0.0 {
            config.step
        } else {
            GlitchConfig::default().step
        };
        Self {
            original_chars: original.chars().collect(),
            shown: original.clone(),
            original,
            alphabet,
            config: GlitchConfig { step, ..config },
            phase: GlitchPhase::Idle,
            revealed: 0.0,
            next_tick: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.shown
    }

    pub fn phase(&self) -> GlitchPhase {
        self.phase
    }

    pub fn revealed(&self) -> f32 {
        self.revealed
    }

    pub fn is_revealing(&self) -> bool {
        self.phase == GlitchPhase::Revealing
    }

    // Ignored while a reveal is running.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.is_revealing() {
            return false;
        }
        self.revealed = 0.0;
        if self.original_chars.is_empty() {
            self.finish();
            return true;
        }
        self.phase = GlitchPhase::Revealing;
        self.next_tick = Some(now + self.config.tick);
        true
    }

    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> bool {
        if !self.is_revealing() {
            return false;
        }

        let settled = self.revealed.floor() as usize;
        let alphabet = &self.alphabet;
        self.shown = self
            .original_chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if i < settled {
                    c
                } else {
                    alphabet[rng.random_range(0..alphabet.len())]
                }
            })
            .collect();

        self.revealed += self.config.step;
        if self.revealed >= self.original_chars.len() as f32 {
            self.finish();
        }
        true
    }

    pub fn poll<R: Rng>(&mut self, now: Instant, rng: &mut R) -> bool {
        let due = self.next_tick.is_some_and(|t| now >= t);
        if !due || !self.tick(rng) {
            return false;
        }
        if self.is_revealing() {
            self.next_tick = Some(now + self.config.tick);
        }
        true
    }

    pub fn cancel(&mut self) {
        if self.is_revealing() {
            tracing::debug!(text = %self.original, "glitch reveal cancelled");
        }
        self.phase = GlitchPhase::Idle;
        self.shown = self.original.clone();
        self.next_tick = None;
    }

    fn finish(&mut self) {
        self.phase = GlitchPhase::Done;
        self.shown = self.original.clone();
        self.next_tick = None;
    }

    pub async fn play<R, F>(&mut self, rng: &mut R, mut on_frame: F)
    where
        R: Rng,
        F: FnMut(&str),
    {
        if !self.trigger(Instant::now()) {
            return;
        }
        if !self.is_revealing() {
            on_frame(&self.shown);
            return;
        }

        let mut interval = tokio::time::interval(self.config.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        while self.is_revealing() {
            interval.tick().await;
            self.tick(rng);
            on_frame(&self.shown);
        }
    }
}

pub struct GlitchBanner {
    text: GlitchText,
    rng: StdRng,
    fg: Option<Color>,
    width: u16,
    height: u16,
    hidden: bool,
    // Box last drawn: (x, y, width). Erased once when the banner is hidden.
    drawn: Option<(u16, u16, u16)>,
}

impl GlitchBanner {
    pub fn new(text: GlitchText, fg: Option<Color>, rng: StdRng) -> Self {
        Self {
            text,
            rng,
            fg,
            width: 0,
            height: 0,
            hidden: false,
            drawn: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) -> bool {
        self.text.trigger(now)
    }
}

impl FrameEffect for GlitchBanner {
    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.drawn = None;
    }

    fn advance(&mut self, now: Instant) {
        self.text.poll(now, &mut self.rng);
    }

    fn render(&mut self, frame: &mut Frame) {
        if self.hidden {
            if let Some((x0, y0, outer)) = self.drawn.take() {
                let blank = " ".repeat(outer as usize);
                for dy in 0..5 {
                    frame.put_str(x0, y0 + dy, &blank, None, false);
                }
            }
            return;
        }

        let caption = self.text.text();
        let len = caption.chars().count();
        let Ok(inner) = u16::try_from(len + 4) else {
            return;
        };
        let outer = inner.saturating_add(2);
        if outer > self.width || self.height < 5 {
            return;
        }

        let x0 = (self.width - outer) / 2;
        let y0 = (self.height - 5) / 2;
        let bar = "─".repeat(inner as usize);
        let pad = " ".repeat(inner as usize);

        frame.put_str(x0, y0, &format!("┌{bar}┐"), self.fg, false);
        frame.put_str(x0, y0 + 1, &format!("│{pad}│"), self.fg, false);
        frame.put_str(x0, y0 + 2, &format!("│  {caption}  │"), self.fg, true);
        frame.put_str(x0, y0 + 3, &format!("│{pad}│"), self.fg, false);
        frame.put_str(x0, y0 + 4, &format!("└{bar}┘"), self.fg, false);
        self.drawn = Some((x0, y0, outer));
    }

    fn on_key(&mut self, key: KeyCode, now: Instant) -> bool {
        match key {
            KeyCode::Char('g') => {
                tracing::debug!(phase = ?self.text.phase(), revealed = self.text.revealed(), "caption replay");
                self.hidden = false;
                self.text.trigger(now);
                true
            }
            KeyCode::Char('x') => {
                self.text.cancel();
                self.hidden = true;
                true
            }
            _ => false,
        }
    }
}

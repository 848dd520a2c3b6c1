// Copyright (c) 2026 rezky_nightky

use std::io::Result;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEventKind};
use crossterm::style::Color;

use crate::frame::Frame;
use crate::runtime::Cadence;
use crate::terminal::Terminal;

pub trait FrameEffect {
    fn resize(&mut self, width: u16, height: u16);
    fn advance(&mut self, now: Instant);
    fn render(&mut self, frame: &mut Frame);
    fn on_key(&mut self, _key: KeyCode, _now: Instant) -> bool {
        false
    }
}

pub struct FrameScheduler {
    effects: Vec<Box<dyn FrameEffect>>,
    frame: Frame,
    bg: Option<Color>,
    period: Duration,
    cadence: Cadence,
    running: bool,
    ticks: u64,
}

impl FrameScheduler {
    pub fn new(width: u16, height: u16, bg: Option<Color>, fps: f64, cadence: Cadence) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        Self {
            effects: Vec::new(),
            frame: Frame::new(width, height, bg),
            bg,
            period: Duration::from_secs_f64(1.0 / fps),
            cadence,
            running: false,
            ticks: 0,
        }
    }

    // Later effects paint on top.
    pub fn push_effect(&mut self, mut effect: Box<dyn FrameEffect>) {
        effect.resize(self.frame.width, self.frame.height);
        self.effects.push(effect);
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        tracing::info!(
            cadence = ?self.cadence,
            period_ms = self.period.as_secs_f64() * 1000.0,
            "frame loop started"
        );
        true
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            tracing::info!(ticks = self.ticks, "frame loop stopped");
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        for effect in &mut self.effects {
            effect.advance(now);
            effect.render(&mut self.frame);
        }
        self.ticks = self.ticks.wrapping_add(1);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.frame = Frame::new(width, height, self.bg);
        for effect in &mut self.effects {
            effect.resize(width, height);
        }
    }

    pub fn dispatch_key(&mut self, key: KeyCode, now: Instant) -> bool {
        let mut consumed = false;
        for effect in &mut self.effects {
            consumed |= effect.on_key(key, now);
        }
        consumed
    }

    pub fn next_deadline(&self, started: Instant, finished: Instant) -> Instant {
        match self.cadence {
            Cadence::Continuous => finished + self.period,
            Cadence::Fixed => {
                let next = started + self.period;
                if next < finished {
                    finished
                } else {
                    next
                }
            }
        }
    }

    pub fn run(&mut self, term: &mut Terminal, until: Option<Instant>) -> Result<()> {
        self.start();
        let mut next_frame = Instant::now();

        while self.is_running() {
            let mut pending_resize: Option<(u16, u16)> = None;

            loop {
                while Terminal::poll_event(Duration::ZERO)? {
                    match Terminal::read_event()? {
                        Event::Resize(w, h) => pending_resize = Some((w, h)),
                        Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                            KeyCode::Esc | KeyCode::Char('q') => self.stop(),
                            KeyCode::Char(' ') => {
                                let (w, h) = (self.frame.width, self.frame.height);
                                self.resize(w, h);
                            }
                            code => {
                                self.dispatch_key(code, Instant::now());
                            }
                        },
                        _ => {}
                    }
                }

                let now = Instant::now();
                if until.is_some_and(|end| now >= end) {
                    self.stop();
                }
                if !self.running || pending_resize.is_some() || now >= next_frame {
                    break;
                }

                let mut timeout = next_frame - now;
                if let Some(end) = until {
                    timeout = timeout.min(end.saturating_duration_since(now));
                }
                Terminal::poll_event(timeout)?;
            }

            if !self.running {
                break;
            }

            if let Some((w, h)) = pending_resize {
                tracing::debug!(width = w, height = h, "surface resized");
                self.resize(w, h);
            }

            let started = Instant::now();
            self.tick(started);
            if self.frame.has_changes() {
                term.draw(&mut self.frame)?;
            }
            next_frame = self.next_deadline(started, Instant::now());
        }

        self.stop();
        Ok(())
    }
}

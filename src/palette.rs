// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, ColorScheme};

pub const TRAIL_SHADES: usize = 8;

#[derive(Clone, Debug)]
pub struct Palette {
    pub ramp: Vec<Color>,
    pub bg: Option<Color>,
    mono: bool,
}

impl Palette {
    pub fn shade(&self, heat: f32) -> Option<Color> {
        if self.mono || self.ramp.is_empty() {
            return None;
        }
        let last = self.ramp.len() - 1;
        let idx = (heat.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.ramp.get(idx.min(last)).copied()
    }

    pub fn brightest(&self) -> Option<Color> {
        self.shade(1.0)
    }
}

fn stops(scheme: ColorScheme) -> &'static [(u8, u8, u8)] {
    match scheme {
        ColorScheme::Green => &[(0, 40, 0), (0, 140, 0), (0, 255, 0)],
        ColorScheme::Amber => &[(40, 24, 0), (170, 110, 0), (255, 191, 0)],
        ColorScheme::Cyan => &[(0, 30, 40), (0, 140, 170), (0, 255, 255)],
        ColorScheme::Red => &[(40, 0, 0), (170, 0, 20), (255, 40, 40)],
        ColorScheme::Purple => &[(30, 0, 40), (120, 40, 170), (210, 120, 255)],
        ColorScheme::Ice => &[(20, 30, 40), (120, 160, 200), (235, 245, 255)],
    }
}

fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

fn rgb_to_ansi256(rgb: (u8, u8, u8)) -> u8 {
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let q = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    let (r6, g6, b6) = (q(rgb.0), q(rgb.1), q(rgb.2));
    let cube = (
        LEVELS[r6 as usize],
        LEVELS[g6 as usize],
        LEVELS[b6 as usize],
    );
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    let avg = ((rgb.0 as u16 + rgb.1 as u16 + rgb.2 as u16) / 3) as u8;
    let step = (avg.saturating_sub(8) / 10).min(23);
    let gray_v = 8 + 10 * step;
    if dist2(rgb, (gray_v, gray_v, gray_v)) < dist2(rgb, cube) {
        232 + step
    } else {
        cube_idx
    }
}

fn rgb_to_color16(rgb: (u8, u8, u8)) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 12] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::Yellow, (255, 255, 0)),
    ];
    TABLE
        .iter()
        .min_by_key(|(_, c)| dist2(rgb, *c))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn gradient(stops: &[(u8, u8, u8)], steps: usize) -> Vec<(u8, u8, u8)> {
    if stops.len() < 2 || steps < 2 {
        return stops.iter().copied().take(steps.max(1)).collect();
    }
    let segs = stops.len() - 1;
    (0..steps)
        .map(|i| {
            let pos = i as f32 / (steps - 1) as f32 * segs as f32;
            let seg = (pos.floor() as usize).min(segs - 1);
            let t = pos - seg as f32;
            let (a, b) = (stops[seg], stops[seg + 1]);
            (lerp(a.0, b.0, t), lerp(a.1, b.1, t), lerp(a.2, b.2, t))
        })
        .collect()
}

pub fn build_palette(scheme: ColorScheme, mode: ColorMode) -> Palette {
    let rgb = gradient(stops(scheme), TRAIL_SHADES);
    let (ramp, bg) = match mode {
        ColorMode::Mono => (Vec::new(), None),
        ColorMode::Color16 => (
            rgb.into_iter().map(rgb_to_color16).collect(),
            Some(Color::Black),
        ),
        ColorMode::Color256 => (
            rgb.into_iter()
                .map(|c| Color::AnsiValue(rgb_to_ansi256(c)))
                .collect(),
            Some(Color::AnsiValue(16)),
        ),
        ColorMode::TrueColor => (
            rgb.into_iter()
                .map(|(r, g, b)| Color::Rgb { r, g, b })
                .collect(),
            Some(Color::Rgb { r: 0, g: 0, b: 0 }),
        ),
    };
    Palette {
        ramp,
        bg,
        mono: mode == ColorMode::Mono,
    }
}

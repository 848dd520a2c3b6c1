// Copyright (c) 2026 rezky_nightky

use std::cell::RefCell;
use std::io::Write;

use crossterm::style::Stylize;
use rand::Rng;

use crate::charset::{build_chars, Charset};
use crate::form::{FormKind, SuccessPanel};
use crate::glitch::{GlitchConfig, GlitchText};
use crate::workflow::{NoticeKind, Notification, Presenter, SubmitControl, WorkflowPhase};

pub struct ConsolePresenter<W> {
    out: RefCell<W>,
    color: bool,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out: RefCell::new(out),
            color,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn line(&self, text: &str) {
        let mut out = self.out.borrow_mut();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }

    fn paint(&self, text: &str, kind: Option<NoticeKind>) -> String {
        if !self.color {
            return text.to_string();
        }
        match kind {
            Some(NoticeKind::Success) => text.green().bold().to_string(),
            Some(NoticeKind::Error) => text.red().bold().to_string(),
            None => text.dark_grey().to_string(),
        }
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn phase(&self, kind: FormKind, phase: WorkflowPhase) {
        if phase == WorkflowPhase::Validating {
            self.line(&self.paint(&format!("[{}] checking fields", kind.endpoint()), None));
        }
    }

    fn control(&self, control: &SubmitControl) {
        if control.disabled && control.label != control.original_label {
            self.line(&format!("  > {}", control.label));
        }
    }

    fn notify(&self, note: &Notification) {
        let mark = match note.kind {
            NoticeKind::Success => "[ok]",
            NoticeKind::Error => "[!!]",
        };
        self.line(&self.paint(&format!("{mark} {}", note.text), Some(note.kind)));
    }

    fn clear_fields(&self, kind: FormKind) {
        self.line(&self.paint(&format!("[{}] form cleared", kind.endpoint()), None));
    }

    fn success_panel(&self, panel: Option<&SuccessPanel>) {
        let Some(panel) = panel else {
            self.line(&self.paint("(panel closed)", None));
            return;
        };
        let width = panel
            .lines
            .iter()
            .map(|l| l.chars().count())
            .chain(std::iter::once(panel.title.chars().count()))
            .max()
            .unwrap_or(0);
        let bar = "─".repeat(width + 2);
        let row = |text: &str| format!("│ {text:<width$} │");

        self.line(&format!("┌{bar}┐"));
        self.line(&self.paint(&row(panel.title), Some(NoticeKind::Success)));
        for l in panel.lines {
            self.line(&row(l));
        }
        self.line(&format!("└{bar}┘"));
    }
}

pub async fn play_header<W: Write, R: Rng>(out: &mut W, caption: &str, config: GlitchConfig, rng: &mut R) {
    let mut header = GlitchText::new(caption, build_chars(Charset::Ghost, None), config);
    header
        .play(rng, |frame| {
            let _ = write!(out, "\r{frame}");
            let _ = out.flush();
        })
        .await;
    let _ = writeln!(out);
    tracing::debug!(caption, "header played");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::form::SIGNUP_PANEL;

    fn text(p: ConsolePresenter<Vec<u8>>) -> String {
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn plain_output_shows_stages_and_notices() {
        let p = ConsolePresenter::new(Vec::new(), false);
        let mut control = SubmitControl::new("Send Message");
        control.disabled = true;
        p.control(&control);
        control.label = "Encrypting...".into();
        p.control(&control);
        p.notify(&Notification {
            kind: NoticeKind::Error,
            text: "quota exceeded".into(),
        });

        let out = text(p);
        assert_eq!(out, "  > Encrypting...\n[!!] quota exceeded\n");
    }

    #[test]
    fn panel_is_boxed_to_its_widest_line() {
        let p = ConsolePresenter::new(Vec::new(), false);
        p.success_panel(Some(&SIGNUP_PANEL));
        p.success_panel(None);

        let out = text(p);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2 + 1 + SIGNUP_PANEL.lines.len() + 1);
        assert!(lines[1].contains("Welcome to GHOST Sec!"));
        let widths: Vec<_> = lines[..lines.len() - 1]
            .iter()
            .map(|l| l.chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(*lines.last().unwrap(), "(panel closed)");
    }

    #[tokio::test]
    async fn header_ends_on_the_caption() {
        let mut out = Vec::new();
        let mut rng = StdRng::seed_from_u64(3);
        let config = GlitchConfig {
            tick: Duration::from_millis(1),
            step: 1.0,
        };
        play_header(&mut out, "GHOST", config, &mut rng).await;
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("\rGHOST\n"));
    }
}

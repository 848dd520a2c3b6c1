// Copyright (c) 2026 rezky_nightky

mod api;
mod cell;
mod charset;
mod config;
mod console;
mod error;
mod form;
mod frame;
mod glitch;
mod logging;
mod palette;
mod rain;
mod runtime;
mod scheduler;
mod store;
mod terminal;
mod workflow;

use std::env;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use anyhow::Context;
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::api::ApiClient;
use crate::charset::{build_chars, charset_from_str};
use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_list_charsets, print_list_colors,
    Args, BackendArgs, Command, ContactArgs, EndpointArgs, ListArgs, RainArgs, SignupArgs,
};
use crate::console::{play_header, ConsolePresenter};
use crate::form::{FieldMap, FieldValue, FormKind};
use crate::glitch::{GlitchBanner, GlitchConfig, GlitchText};
use crate::palette::build_palette;
use crate::rain::{RainConfig, RainField};
use crate::runtime::{ColorMode, ColorScheme};
use crate::scheduler::FrameScheduler;
use crate::store::{FileBlobStore, MemoryBlobStore, SignupStore, StoredSignup};
use crate::terminal::{restore_terminal_best_effort, Terminal};
use crate::workflow::{Delivery, LocalDelivery, Outcome, Presenter, SubmissionWorkflow};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("GHOSTGRID_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    require_f64_range(name, v as f64, min as f64, max as f64) as f32
}

fn require_u64_range(name: &str, v: u64, min: u64, max: u64) -> u64 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn detect_color_mode(forced: Option<u16>) -> ColorMode {
    if let Some(m) = forced {
        return match m {
            0 => ColorMode::Mono,
            16 => ColorMode::Color16,
            8 | 256 => ColorMode::Color256,
            24 | 32 => ColorMode::TrueColor,
            _ => {
                eprintln!("invalid --colormode: {} (allowed: 0,16,8/256,24/32)", m);
                std::process::exit(1);
            }
        };
    }

    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }
    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    ColorMode::Color256
}

fn install_terminal_guards() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn run_rain(args: &RainArgs) -> anyhow::Result<()> {
    let color_mode = detect_color_mode(args.colormode);
    let fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let font_size = require_u64_range("--font-size", args.font_size as u64, 1, 16) as u16;
    let reset_pct = require_f32_range("--reset-pct", args.reset_pct, 0.0, 100.0);
    let fade = require_f32_range("--fade", args.fade, 0.001, 1.0);
    let glitch_ms = require_u64_range("--glitch-ms", args.glitch_ms, 1, 1000);
    let glitch_step = require_f32_range("--glitch-step", args.glitch_step, 0.01, 16.0);

    let until = match args.duration {
        Some(s) if s.is_finite() && s > 0.0 => {
            let s = require_f64_range("--duration", s, 0.1, 86400.0);
            Some(Instant::now() + Duration::from_secs_f64(s))
        }
        Some(s) if !s.is_finite() => {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        _ => None,
    };

    let scheme = match ColorScheme::parse(&args.color) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let charset = match charset_from_str(&args.charset) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    logging::init_file_logging();
    install_terminal_guards();

    let chars = build_chars(charset, args.chars.as_deref());
    let palette = build_palette(scheme, color_mode);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let banner_rng = StdRng::seed_from_u64(rng.random());

    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;

    let mut scheduler = FrameScheduler::new(w, h, palette.bg, fps, args.cadence);
    let caption_fg = palette.brightest();
    let rain_config = RainConfig {
        font_size,
        reset_probability: reset_pct / 100.0,
        fade_alpha: fade,
    };
    scheduler.push_effect(Box::new(RainField::new(
        rain_config,
        chars.clone(),
        palette,
        rng,
    )));

    let caption = args.message.trim();
    if !caption.is_empty() {
        let text = GlitchText::new(
            caption,
            chars,
            GlitchConfig {
                tick: Duration::from_millis(glitch_ms),
                step: glitch_step,
            },
        );
        let mut banner = GlitchBanner::new(text, caption_fg, banner_rng);
        banner.trigger(Instant::now());
        scheduler.push_effect(Box::new(banner));
    }

    tracing::info!(
        width = w,
        height = h,
        period_ms = scheduler.period().as_millis() as u64,
        cadence = ?args.cadence,
        ?scheme,
        "rain started"
    );
    scheduler.run(&mut term, until)?;
    let frame = scheduler.frame();
    tracing::info!(
        frames = scheduler.ticks(),
        width = frame.width,
        height = frame.height,
        "rain stopped"
    );
    Ok(())
}

fn open_store(endpoint: &EndpointArgs) -> anyhow::Result<SignupStore<FileBlobStore>> {
    let dir = match &endpoint.store_dir {
        Some(dir) => dir.clone(),
        None => FileBlobStore::default_dir()
            .context("no local data directory on this platform, pass --store-dir")?,
    };
    let store = SignupStore::new(FileBlobStore::new(dir));
    tracing::debug!(dir = %store.blobs().dir().display(), "using signup store");
    Ok(store)
}

fn api_client(endpoint: &EndpointArgs) -> anyhow::Result<ApiClient> {
    let timeout = require_u64_range("--timeout-ms", endpoint.timeout_ms, 100, 120_000);
    let api = ApiClient::new(&endpoint.api_url, Duration::from_millis(timeout))
        .with_context(|| format!("could not set up a client for {}", endpoint.api_url))?;
    tracing::debug!(base = api.base_url(), timeout_ms = timeout, "backend client ready");
    Ok(api)
}

fn current_thread_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")
}

fn put_text(fields: &mut FieldMap, name: &str, value: &Option<String>) {
    if let Some(v) = value {
        fields.insert(name.to_string(), FieldValue::from(v.as_str()));
    }
}

fn contact_fields(args: &ContactArgs) -> FieldMap {
    let mut fields = FieldMap::new();
    put_text(&mut fields, "name", &args.name);
    put_text(&mut fields, "email", &args.email);
    put_text(&mut fields, "message", &args.message);
    fields
}

fn signup_fields(args: &SignupArgs) -> FieldMap {
    let mut fields = FieldMap::new();
    put_text(&mut fields, "name", &args.name);
    put_text(&mut fields, "email", &args.email);
    let interests: Vec<String> = args
        .interests
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !interests.is_empty() {
        fields.insert("interests".to_string(), FieldValue::from(interests));
    }
    put_text(&mut fields, "expertise", &args.expertise);
    put_text(&mut fields, "message", &args.message);
    fields
}

async fn drive<D: Delivery, P: Presenter>(wf: SubmissionWorkflow<D, P>, fields: FieldMap) -> bool {
    for (name, value) in fields {
        wf.set_field(&name, value);
    }
    let outcome = wf.submit().await;
    match &outcome {
        Outcome::Succeeded(receipt) => {
            tracing::debug!(reply = ?receipt.message, "submission finished")
        }
        Outcome::Failed(e) => tracing::debug!(error = %e, "submission failed"),
        Outcome::Invalid(e) => tracing::debug!(error = %e, "submission not sent"),
        Outcome::Ignored => tracing::debug!("submission ignored"),
    }
    tracing::debug!(phase = ?wf.phase(), control = ?wf.control(), "form idle");
    if wf.panel_visible() {
        wf.settle().await;
    }
    outcome.is_success()
}

fn run_form(kind: FormKind, fields: FieldMap, backend: &BackendArgs) -> anyhow::Result<bool> {
    let panel_ms = require_u64_range("--panel-ms", backend.panel_ms, 0, 60_000);
    let stages = if backend.stages.is_empty() {
        kind.default_stages()
    } else {
        backend.stages.clone()
    };
    let color = color_enabled_stdout();
    let rt = current_thread_runtime()?;

    rt.block_on(async {
        if std::io::stdout().is_terminal() {
            let caption = format!("GHOST SEC // {}", kind.submit_label().to_uppercase());
            let mut rng = StdRng::from_os_rng();
            play_header(&mut std::io::stdout(), &caption, GlitchConfig::default(), &mut rng)
                .await;
        }

        let presenter = ConsolePresenter::new(std::io::stdout(), color);
        let panel = Duration::from_millis(panel_ms);
        let ok = if backend.dry_run {
            let wf = SubmissionWorkflow::new(
                kind,
                LocalDelivery::new(SignupStore::new(MemoryBlobStore::default())),
                presenter,
            )
            .with_stages(stages)
            .with_panel_duration(panel);
            drive(wf, fields).await
        } else if backend.local {
            let wf = SubmissionWorkflow::new(
                kind,
                LocalDelivery::new(open_store(&backend.endpoint)?),
                presenter,
            )
            .with_stages(stages)
            .with_panel_duration(panel);
            drive(wf, fields).await
        } else {
            let wf = SubmissionWorkflow::new(kind, api_client(&backend.endpoint)?, presenter)
                .with_stages(stages)
                .with_panel_duration(panel);
            drive(wf, fields).await
        };
        Ok::<_, anyhow::Error>(ok)
    })
}

fn run_list_signups(args: &ListArgs) -> anyhow::Result<()> {
    if !args.remote {
        let records = open_store(&args.endpoint)?.load()?;
        if records.is_empty() {
            println!("no signups stored");
        }
        for stored in records {
            match stored {
                StoredSignup::Record(record) => println!(
                    "{}  {}",
                    record.timestamp.to_rfc3339(),
                    serde_json::to_string(&record.fields)?
                ),
                StoredSignup::Foreign(entry) => println!("{:<25}  {entry}", "-"),
            }
        }
        return Ok(());
    }

    let api = api_client(&args.endpoint)?;
    let rows = current_thread_runtime()?.block_on(api.list_signups())?;
    for row in rows {
        println!("{row}");
    }
    Ok(())
}

fn run_list_messages(endpoint: &EndpointArgs) -> anyhow::Result<()> {
    let api = api_client(endpoint)?;
    let rows = current_thread_runtime()?.block_on(api.list_messages())?;
    for row in rows {
        println!("{row}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_charsets {
        print_list_charsets();
        return Ok(());
    }

    if args.list_colors {
        print_list_colors();
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        return Ok(());
    }

    let Some(command) = &args.command else {
        return run_rain(&args.rain);
    };

    logging::init_stderr_logging();
    let ok = match command {
        Command::Contact(c) => run_form(FormKind::Contact, contact_fields(c), &c.backend)?,
        Command::Signup(s) => run_form(FormKind::Signup, signup_fields(s), &s.backend)?,
        Command::Signups(l) => {
            run_list_signups(l)?;
            true
        }
        Command::Messages(e) => {
            run_list_messages(e)?;
            true
        }
    };
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::DEFAULT_API_URL;
use crate::form::WorkflowStage;
use crate::runtime::Cadence;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  ghostgrid --fps 30 --cadence continuous --font-size 1 --reset-pct 2.5 --fade 0.05 --charset ghost --color green --message \"GHOST SEC\" --glitch-ms 30 --glitch-step 0.3333\n  ghostgrid contact --name NAME --email EMAIL --message TEXT\n  ghostgrid signup --name NAME --email EMAIL --interests ctf,osint --expertise beginner";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_usage(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for line in text.lines() {
        if !out.is_empty() {
            out.push('\n');
        }
        if !line.starts_with(' ') && line.ends_with(':') {
            out.push_str(&format!("\x1b[1;36m{line}\x1b[0m"));
        } else if let Some(rest) = line.strip_prefix("  ghostgrid") {
            out.push_str(&format!("  \x1b[1;34mghostgrid\x1b[0m{rest}"));
        } else {
            out.push_str(line);
        }
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_usage(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ghostgrid",
    version,
    disable_version_flag = true,
    about = "Falling-glyph rain and the GHOST Sec contact/signup forms, in the terminal"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub rain: RainArgs,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available charset presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "list-colors",
        help_heading = "HELP",
        help = "List available color themes and exit"
    )]
    pub list_colors: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Send a contact message
    Contact(ContactArgs),
    /// Apply to join GHOST Sec
    Signup(SignupArgs),
    /// List stored signups
    Signups(ListArgs),
    /// List contact messages held by the backend
    Messages(EndpointArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RainArgs {
    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 30.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "cadence",
        default_value_t = Cadence::Continuous,
        value_enum,
        help_heading = "PERFORMANCE",
        help = "Frame pacing: continuous (after each frame) or fixed (fixed-rate grid)"
    )]
    pub cadence: Cadence,

    #[arg(
        long = "font-size",
        default_value_t = 1,
        help_heading = "RAIN",
        help = "Column spacing in cells (min 1 max 16)"
    )]
    pub font_size: u16,

    #[arg(
        long = "reset-pct",
        default_value_t = 2.5,
        help_heading = "RAIN",
        help = "Chance per frame that a column past the bottom restarts, in percent (min 0 max 100)"
    )]
    pub reset_pct: f32,

    #[arg(
        long = "fade",
        default_value_t = 0.05,
        help_heading = "RAIN",
        help = "Trail fade applied every frame (min 0.001 max 1)"
    )]
    pub fade: f32,

    #[arg(
        long = "seed",
        help_heading = "RAIN",
        help = "Seed the random source for a reproducible rain"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 'm',
        long = "message",
        default_value = "GHOST SEC",
        help_heading = "GENERAL",
        help = "Glitching overlay caption (empty disables; press g to replay)"
    )]
    pub message: String,

    #[arg(
        long = "glitch-ms",
        default_value_t = 30,
        help_heading = "GLITCH",
        help = "Milliseconds between glitch frames (min 1 max 1000)"
    )]
    pub glitch_ms: u64,

    #[arg(
        long = "glitch-step",
        default_value_t = 1.0 / 3.0,
        help_heading = "GLITCH",
        help = "Characters revealed per glitch frame (min 0.01 max 16)"
    )]
    pub glitch_step: f32,

    #[arg(
        long = "charset",
        default_value = "ghost",
        help_heading = "CHARSET",
        help = "Charset preset (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        long = "chars",
        help_heading = "CHARSET",
        help = "Custom characters override"
    )]
    pub chars: Option<String>,

    #[arg(
        short = 'c',
        long = "color",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-colors)"
    )]
    pub color: String,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 256-color"
    )]
    pub colormode: Option<u16>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EndpointArgs {
    #[arg(
        long = "api-url",
        env = "GHOSTGRID_API_URL",
        default_value = DEFAULT_API_URL,
        help_heading = "BACKEND",
        help = "Backend base URL"
    )]
    pub api_url: String,

    #[arg(
        long = "store-dir",
        help_heading = "BACKEND",
        help = "Directory for locally stored signups (default: <data dir>/ghostgrid)"
    )]
    pub store_dir: Option<PathBuf>,

    #[arg(
        long = "timeout-ms",
        default_value_t = 10_000,
        help_heading = "BACKEND",
        help = "HTTP request timeout in ms (min 100 max 120000)"
    )]
    pub timeout_ms: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct BackendArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,

    #[arg(
        long = "local",
        help_heading = "BACKEND",
        help = "Keep the submission on this machine instead of posting it"
    )]
    pub local: bool,

    #[arg(
        long = "dry-run",
        conflicts_with = "local",
        help_heading = "BACKEND",
        help = "Run the whole workflow against a throwaway in-memory store"
    )]
    pub dry_run: bool,

    #[arg(
        long = "stage",
        value_name = "LABEL=MS",
        help_heading = "WORKFLOW",
        help = "Replace the simulated stages (repeatable, in order)"
    )]
    pub stages: Vec<WorkflowStage>,

    #[arg(
        long = "panel-ms",
        default_value_t = 5000,
        help_heading = "WORKFLOW",
        help = "How long the success panel stays up (max 60000)"
    )]
    pub panel_ms: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ContactArgs {
    #[arg(long, help = "Your name")]
    pub name: Option<String>,

    #[arg(long, help = "Reply address")]
    pub email: Option<String>,

    #[arg(long, help = "Message body")]
    pub message: Option<String>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SignupArgs {
    #[arg(long, help = "Your name")]
    pub name: Option<String>,

    #[arg(long, help = "Contact address")]
    pub email: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Areas of interest, comma separated"
    )]
    pub interests: Vec<String>,

    #[arg(long, help = "Experience level")]
    pub expertise: Option<String>,

    #[arg(long, help = "Why you want to join")]
    pub message: Option<String>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(
        long = "remote",
        help = "Ask the backend instead of reading the local store"
    )]
    pub remote: bool,

    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

pub fn print_list_charsets() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE CHARSET PRESETS:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --charset.\x1b[0m");
    } else {
        println!("AVAILABLE CHARSET PRESETS:");
        println!("NOTE: Use only the VALUE (left side) with --charset.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("ghost        A-Z, 0-9 and @#$%^&*() (default; alias: default)");
    println!("binary       0 and 1 (aliases: bin, 01)");
    println!("hex          0-9 and A-F (alias: hexadecimal)");
    println!("digits       Digits only (aliases: dec, decimal)");
    println!("letters      Latin letters (alias: english)");
    println!("katakana     Half-width katakana");
    println!("matrix       Letters + digits + katakana");
}

pub fn print_list_colors() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE COLOR THEMES:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --color.\x1b[0m");
    } else {
        println!("AVAILABLE COLOR THEMES:");
        println!("NOTE: Use only the VALUE (left side) with --color.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("green        Terminal green (default; alias: matrix)");
    println!("amber        Amber phosphor (alias: gold)");
    println!("cyan         Cyan theme");
    println!("red          Red theme (alias: alert)");
    println!("purple       Purple theme (alias: violet)");
    println!("ice          Pale blue theme (alias: snow)");
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn bare_invocation_is_rain_with_defaults() {
        let args = Args::try_parse_from(["ghostgrid"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.rain.font_size, 1);
        assert_eq!(args.rain.charset, "ghost");
        assert_eq!(args.rain.cadence, Cadence::Continuous);
    }

    #[test]
    fn signup_collects_interests_and_stages() {
        let args = Args::try_parse_from([
            "ghostgrid",
            "signup",
            "--name",
            "Ada",
            "--email",
            "ada@ghost.dev",
            "--interests",
            "ctf,osint",
            "--stage",
            "One=5",
            "--stage",
            "Two=0",
            "--local",
        ])
        .unwrap();
        let Some(Command::Signup(s)) = args.command else {
            panic!("expected signup");
        };
        assert_eq!(s.interests, vec!["ctf", "osint"]);
        assert!(s.backend.local);
        let labels: Vec<_> = s.backend.stages.iter().map(|st| st.label.as_str()).collect();
        assert_eq!(labels, vec!["One", "Two"]);
        assert_eq!(s.backend.panel_ms, 5000);
    }

    #[test]
    fn malformed_stage_is_rejected() {
        assert!(Args::try_parse_from(["ghostgrid", "contact", "--stage", "nolabel"]).is_err());
    }
}

//! tzbanner - multi-timezone date/time banner renderer
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Config (layers)  →  Session             │
//! │                          ↓               │
//! │  Format tokens → TimeSource → text       │
//! │                          ↓               │
//! │  Font layout → coverage → colorize       │
//! │                          ↓               │
//! │  CanvasStack → PNG export (worker)       │
//! └──────────────────────────────────────────┘
//! ```

mod canvas;
mod config;
mod constants;
mod datetime;
mod font;
mod session;
mod utils;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::PathBuf;

use crate::canvas::Element;
use crate::config::Config;
use crate::constants::FRAME_INTERVAL;
use crate::datetime::{TimeSource, ZoneDatabase};
use crate::font::FontRegistry;
use crate::session::Session;

fn print_help() {
    println!(
        r#"tzbanner {} - multi-timezone date/time banner renderer

USAGE:
    tzbanner [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --init-config           Generate the default config file
    -f, --force             Overwrite an existing config file
    --list-zones            List known timezone identifiers
    --list-fonts            List fonts found by font discovery
    --formats               List date/time format tokens with samples
    --background PATH       Background image (overrides [canvas])
    --scale F               Background image scale factor
    --output PATH           Output PNG path (default: [export] directory)

EXAMPLES:
    tzbanner --init-config
    tzbanner --background wallpaper.png --scale 0.5 --output banner.png
    RUST_LOG=info tzbanner

CONFIG FILE:
    ~/.config/tzbanner/config.toml (override with TZBANNER_CONFIG)
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Value of `--flag VALUE` or `--flag=VALUE`
fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter().enumerate().find_map(|(i, a)| {
        if a == flag {
            args.get(i + 1).map(String::as_str)
        } else {
            a.strip_prefix(flag).and_then(|rest| rest.strip_prefix('='))
        }
    })
}

fn list_zones() {
    let mut zones = datetime::TzDatabase.enumerate_zones();
    zones.sort();
    for zone in zones {
        println!("{}", zone);
    }
}

fn list_fonts(cfg: &Config) {
    let registry = FontRegistry::new(cfg.font_directories(), cfg.fonts.system);
    let fonts = registry.available_fonts();
    if fonts.is_empty() {
        println!("No fonts found (directories: {:?})", cfg.font_directories());
        return;
    }
    for font in fonts {
        println!("{:<32} {}", font.name, font.path.display());
    }
}

fn print_formats(cfg: &Config) {
    let source = TimeSource::default();
    let zone = cfg.reference_zone();
    let now = source.now(&zone);

    println!("Format tokens (sampled at the current time in {}):", zone);
    println!();
    for (token, sample, description) in source.token_samples(&now, &zone) {
        println!("    {:<10} {:<28} {}", token, sample, description);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Check command line arguments
    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("tzbanner {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Config file generation mode
    if args.iter().any(|a| a == "--init-config") {
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        match Config::write_default(force) {
            Ok(path) => {
                println!("Config file generated: {}", path.display());
                return Ok(());
            }
            Err(e) => {
                eprintln!("Failed to generate config: {:#}", e);
                return Err(e);
            }
        }
    }

    let cfg = Config::load();

    if args.iter().any(|a| a == "--list-zones") {
        list_zones();
        return Ok(());
    }
    if args.iter().any(|a| a == "--list-fonts") {
        list_fonts(&cfg);
        return Ok(());
    }
    if args.iter().any(|a| a == "--formats") {
        print_formats(&cfg);
        return Ok(());
    }

    let scale = match arg_value(&args, "--scale") {
        Some(s) => s
            .parse::<f32>()
            .with_context(|| format!("Invalid --scale value: {}", s))?,
        None => cfg.canvas.scale,
    };
    let output = arg_value(&args, "--output").map(PathBuf::from);
    let background = arg_value(&args, "--background").map(PathBuf::from);
    let has_layers = !cfg.layers.is_empty();

    info!("tzbanner starting...");
    let mut session = Session::new(cfg);

    match background {
        Some(path) => session
            .open_canvas(&path, scale)
            .context("Failed to open background")?,
        None => session.open_configured_canvas(),
    }

    if has_layers {
        let added = session.add_configured_layers();
        info!("{} layer(s) added", added);
    } else {
        // No scene configured: a clock in the configured zones
        let clock = session.new_datetime();
        debug!("Default clock: {:?}", clock.text());
        session.add_element(Element::from(clock));
    }

    let dispatched = match output {
        Some(path) => session.export(path),
        None => session.export_default().is_some(),
    };
    if !dispatched {
        bail!("Export could not be started");
    }

    // Headless frame loop: poll the export once per frame
    loop {
        if let Some(result) = session.poll_export() {
            let path = result.context("Export failed")?;
            println!("{}", path.display());
            return Ok(());
        }
        std::thread::sleep(FRAME_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_arg_value() {
        let a = args(&["tzbanner", "--scale", "0.5", "--output=out.png"]);
        assert_eq!(arg_value(&a, "--scale"), Some("0.5"));
        assert_eq!(arg_value(&a, "--output"), Some("out.png"));
        assert_eq!(arg_value(&a, "--background"), None);
    }

    #[test]
    fn test_arg_value_missing_operand() {
        let a = args(&["tzbanner", "--output"]);
        assert_eq!(arg_value(&a, "--output"), None);
    }
}

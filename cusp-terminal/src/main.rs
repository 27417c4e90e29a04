/// Cusp3D Terminal Viewer - stereo horn surface
///
/// Controls:
///   - Mouse drag / WASD / Arrow Keys: Trackball rotation
///   - m: Cycle stereo mode
///   - r: Reset view
///   - ':': Enter a command (e.g. `convergence 2`, `light 0 1 5`)
///   - Q/ESC: Quit
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cusp_core::config::load_from_path;
use cusp_core::{StereoMode, ViewerConfig};
use cusp_terminal::{render_snapshot, TerminalApp};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cusp-terminal", about = "Stereo horn surface viewer for the terminal")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Texture image (overrides the config file)
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Stereo mode: mono, left or anaglyph
    #[arg(long, value_parser = parse_mode)]
    mode: Option<StereoMode>,

    /// File or named pipe delivering `alpha beta gamma` lines
    #[arg(long)]
    orientation_feed: Option<PathBuf>,

    /// Print one frame of the given size (COLSxROWS) and exit
    #[arg(long)]
    snapshot: Option<String>,
}

fn parse_mode(value: &str) -> Result<StereoMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "mono" => Ok(StereoMode::Mono),
        "left" | "leftonly" => Ok(StereoMode::LeftOnly),
        "anaglyph" => Ok(StereoMode::Anaglyph),
        other => Err(format!("unknown stereo mode '{other}', use mono, left or anaglyph")),
    }
}

fn parse_size(value: &str) -> Option<(u16, u16)> {
    let (cols, rows) = value.split_once('x')?;
    Some((cols.trim().parse().ok()?, rows.trim().parse().ok()?))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they do not mix with the rendered frame
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cusp_core=warn,cusp_terminal=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(texture) = cli.texture {
        config.texture_path = Some(texture);
    }
    if let Some(mode) = cli.mode {
        config.stereo.mode = mode;
    }

    if let Some(size) = &cli.snapshot {
        let (cols, rows) = parse_size(size)
            .with_context(|| format!("invalid snapshot size '{size}', expected COLSxROWS"))?;
        print!("{}", render_snapshot(&config, cols, rows)?);
        return Ok(());
    }

    info!("cusp-terminal v{} starting", env!("CARGO_PKG_VERSION"));
    let mut app = TerminalApp::new(&config, cli.orientation_feed)?;
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("80x24"), Some((80, 24)));
        assert_eq!(parse_size("80"), None);
        assert_eq!(parse_size("axb"), None);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("Anaglyph"), Ok(StereoMode::Anaglyph));
        assert!(parse_mode("side-by-side").is_err());
    }
}

/// Example: Render a textured anaglyph frame to stdout
///
/// Usage: cargo run --example textured_snapshot -- path/to/texture.png
use std::env;
use std::path::PathBuf;

use cusp_core::{StereoMode, ViewerConfig};
use cusp_terminal::render_snapshot;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config = ViewerConfig::default();
    config.stereo.mode = StereoMode::Anaglyph;

    match args.get(1) {
        Some(path) => {
            println!("Texturing with: {path}");
            config.texture_path = Some(PathBuf::from(path));
        }
        None => {
            eprintln!("Usage: {} <texture>", args[0]);
            eprintln!("\nNo texture provided, rendering untextured...");
        }
    }

    print!("{}", render_snapshot(&config, 100, 40)?);
    Ok(())
}

/// Orientation feed read from a file or named pipe, one reading per line
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use cusp_core::controls::parse_reading;
use cusp_core::OrientationReading;
use tracing::{info, warn};

/// Start reading `path` on a background thread.
///
/// Malformed lines are logged and skipped. The channel closes when the
/// file ends or cannot be opened.
pub fn spawn_feed(path: PathBuf) -> Receiver<OrientationReading> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!("orientation feed {} unavailable: {e}", path.display());
                return;
            }
        };
        info!("reading orientation from {}", path.display());

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("orientation feed read error: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_reading(&line) {
                Ok(reading) => {
                    if tx.send(reading).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("skipping orientation line: {e}"),
            }
        }
    });

    rx
}

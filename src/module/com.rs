//! Operator Command Module
//!
//! Reads one command per line and forwards it to the scan loop.

use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc::Sender;
use std::thread;
use std::thread::JoinHandle;

/// Commands accepted by the scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    ManualScan,
    ToggleContinuous,
    ToggleMute,
    Shutdown,
}

impl ScanCommand {
    /// Convert an input line to a command.
    pub fn from_string(s: &str) -> Option<ScanCommand> {
        match s.trim().to_lowercase().as_str() {
            "s" | "scan" => Some(ScanCommand::ManualScan),
            "v" | "vision" => Some(ScanCommand::ToggleContinuous),
            "a" | "audio" => Some(ScanCommand::ToggleMute),
            "q" | "quit" => Some(ScanCommand::Shutdown),
            _ => None,
        }
    }
}

/// Listens to `input` line by line and sends commands via a channel.
///
/// The thread ends at end of input, after a shutdown command, or once the loop has
/// hung up.
pub fn listen<R: Read + Send + 'static>(input: R, tx: Sender<ScanCommand>) -> JoinHandle<()> {
    thread::spawn(move || {
        log::debug!("Com Thread Started");
        let reader = BufReader::new(input);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Can't read command. {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match ScanCommand::from_string(&line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() || cmd == ScanCommand::Shutdown {
                        break;
                    }
                }
                None => log::warn!("Unknown command: {:?} (s: scan, v: vision, a: audio, q: quit)", line),
            }
        }
        log::debug!("Com Thread Exit Loop");
    })
}

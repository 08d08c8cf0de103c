use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    acquire::ProgressObserver,
    types::{ProgressEvent, ProgressStatus},
};

/// Renders progress events as log lines above a progress bar counting
/// settled tracks. A track advances the bar once, keyed by its id.
pub struct TerminalObserver {
    pb: ProgressBar,
    settled: Mutex<HashSet<String>>,
}

impl TerminalObserver {
    pub fn new(total_tracks: usize) -> Self {
        let pb = ProgressBar::new(total_tracks as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.blue} [{pos}/{len}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Acquiring tracks...");

        Self {
            pb,
            settled: Mutex::new(HashSet::new()),
        }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    fn render(event: &ProgressEvent) -> String {
        let symbol = event.status.symbol();
        let symbol = match event.status {
            ProgressStatus::Done | ProgressStatus::Cached => symbol.green().bold(),
            ProgressStatus::Failed => symbol.red().bold(),
            ProgressStatus::Retrying | ProgressStatus::Incomplete => symbol.yellow().bold(),
            ProgressStatus::Searching | ProgressStatus::Downloading => symbol.blue().bold(),
        };

        let mut line = format!("[{}] {} {}", symbol, event.label, event.status);
        if let Some(attempt) = event.attempt {
            line.push_str(&format!(" (attempt {})", attempt));
        }
        if let Some(peer) = &event.peer {
            line.push_str(&format!(" from {}", peer.dimmed()));
        }
        line
    }
}

impl ProgressObserver for TerminalObserver {
    fn notify(&self, event: &ProgressEvent) {
        match event.status {
            ProgressStatus::Searching | ProgressStatus::Downloading => {
                self.pb.set_message(Self::render(event));
            }
            _ => self.pb.println(Self::render(event)),
        }

        if event.status.is_terminal() {
            let mut settled = self.settled.lock().unwrap_or_else(PoisonError::into_inner);
            if settled.insert(event.id.clone()) {
                self.pb.inc(1);
            }
        }
    }
}

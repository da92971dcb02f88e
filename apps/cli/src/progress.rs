use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pathtrace_core::ProgressSink;

pub fn create_spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

/// Progress bar over root objects, fed by the assembler.
pub struct RootProgress {
    bar: ProgressBar,
}

impl RootProgress {
    pub fn new(msg: &str) -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        bar.set_message(msg.to_string());
        Ok(Self { bar })
    }
}

impl ProgressSink for RootProgress {
    fn progress(&mut self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }

    fn finish(&mut self) {
        let roots = self.bar.length().unwrap_or(0);
        self.bar.finish_with_message(format!(
            "{} Assembled {} root objects",
            style("✓").green().bold(),
            roots
        ));
    }
}

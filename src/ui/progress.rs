use indicatif::{ProgressBar, ProgressStyle};

/// Per-file progress over a batch.
pub struct Bar {
    bar: ProgressBar,
}

impl Bar {
    pub fn new(total: u64, visible: bool) -> Self {
        let bar = if visible { ProgressBar::new(total) } else { ProgressBar::hidden() };

        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg:30!} [{bar:30.cyan/blue}] {pos}/{len} files") {
            bar.set_style(style.progress_chars("●○ "));
        }

        Self { bar }
    }

    pub fn add(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_owned());
    }

    /// Hides the bar while `f` runs, for prompts that need the terminal.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

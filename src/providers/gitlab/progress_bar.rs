use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Creates and manages progress indication for the three-phase feed collection process
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    /// Create a new phase progress tracker and start Phase 1
    pub fn start_phase_1(target: &str) -> Self {
        Self {
            pb: spinner(format!("Phase 1/3: Fetching notes and label events for {target}...")),
        }
    }

    /// Finish Phase 1 and start Phase 2
    pub fn finish_phase_1_start_phase_2(self, notes: usize, events: usize) -> Self {
        self.pb.finish_with_message(format!(
            "✓ Phase 1/3: Fetched {notes} notes and {events} label events"
        ));

        Self {
            pb: spinner("Phase 2/3: Merging label events into notes...".to_string()),
        }
    }

    /// Finish Phase 2 and start Phase 3
    pub fn finish_phase_2_start_phase_3(self, entries: usize) -> Self {
        self.pb
            .finish_with_message(format!("✓ Phase 2/3: Merged into {entries} feed entries"));

        Self {
            pb: spinner("Phase 3/3: Updating feed cache...".to_string()),
        }
    }

    /// Finish Phase 3 and complete all progress
    pub fn finish_phase_3(self) {
        self.pb
            .finish_with_message("✓ Phase 3/3: Activity feed ready");
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

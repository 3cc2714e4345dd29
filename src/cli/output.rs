//! Output formatting utilities for CLI.

use serde::Serialize;
use soko::game::GameState;

/// JSON-serializable summary of one finished replay.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct JsonReplaySummary {
    /// Whether every destination holds a box.
    pub(crate) win: bool,
    /// Whether the terminal position is (conservatively) dead.
    pub(crate) stuck: bool,
    /// Undo quota left over (null when unlimited).
    pub(crate) undo_quota: Option<i32>,
    /// Number of box pushes still on the history stack.
    pub(crate) checkpoints: usize,
}

impl JsonReplaySummary {
    /// Summarize a terminal game state.
    pub(crate) fn from_state(state: &GameState) -> Self {
        Self {
            win: state.is_win(),
            stuck: state.is_stuck(),
            undo_quota: (state.undo_quota() >= 0).then(|| state.undo_quota()),
            checkpoints: state.checkpoints(),
        }
    }
}

/// Format a terminal game state as human-readable text.
pub(crate) fn format_summary_text(state: &GameState) -> String {
    let mut output = String::new();

    let outcome = if state.is_win() {
        "win"
    } else if state.is_stuck() {
        "stuck"
    } else {
        "exited"
    };
    output.push_str(&format!("Outcome: {outcome}\n"));
    let quota = state.undo_quota();
    if quota < 0 {
        output.push_str("  Undo quota left: unlimited\n");
    } else {
        output.push_str(&format!("  Undo quota left: {quota}\n"));
    }
    output.push_str(&format!("  Pushes in history: {}\n", state.checkpoints()));

    output
}

/// Aggregated statistics for repeated replays of the same recordings.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub(crate) struct CheckStats {
    /// Total runs completed.
    pub(crate) runs: u64,
    /// Runs that ended in a win.
    pub(crate) wins: u64,
    /// Runs that ended stuck.
    pub(crate) stuck: u64,
    /// Runs that merely ran out of actions.
    pub(crate) exited: u64,
}

impl CheckStats {
    /// Fold one run outcome into the stats.
    pub(crate) fn record(&mut self, state: &GameState) {
        self.runs += 1;
        if state.is_win() {
            self.wins += 1;
        } else if state.is_stuck() {
            self.stuck += 1;
        } else {
            self.exited += 1;
        }
    }

    /// Merge two partial tallies.
    #[must_use]
    pub(crate) fn merged(self, other: Self) -> Self {
        Self {
            runs: self.runs + other.runs,
            wins: self.wins + other.wins,
            stuck: self.stuck + other.stuck,
            exited: self.exited + other.exited,
        }
    }
}

/// Format check statistics as human-readable text.
pub(crate) fn format_check_text(stats: &CheckStats) -> String {
    let mut output = String::new();
    output.push_str(&format!("Runs: {}\n", stats.runs));
    output.push_str(&format!("  Wins:   {}\n", stats.wins));
    output.push_str(&format!("  Stuck:  {}\n", stats.stuck));
    output.push_str(&format!("  Exited: {}\n", stats.exited));
    if stats.runs > 0 {
        #[allow(clippy::cast_precision_loss)]
        let rate = stats.wins as f64 / stats.runs as f64 * 100.0;
        output.push_str(&format!("  Win rate: {rate:.1}%\n"));
    }
    output
}

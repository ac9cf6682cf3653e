mod engine;
mod ticker;

pub use engine::{
    CompletionRequest, Finish, FocusTimer, SessionStatus, Tick, TimerMode, TimerPhase, TimerState,
};
pub use ticker::{IntervalScheduler, ManualScheduler, Scheduler};

/// `MM:SS` rendering of a second count.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::format_clock;

    #[test]
    fn clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(7200), "120:00");
    }
}

//! Interactive focus/break loop.
//!
//! One current-thread runtime; stdin lines and engine signals are
//! multiplexed with `select!` so every mutation happens on this task.

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use clap::Args;
use flowstate_core::{
    format_clock, ApiClient, AudioController, AudioSink, Catalog, Config, ConfigFileSettings,
    Event, FlowController, IntervalScheduler, NullSink, RodioSink, SessionRecorder, Signal,
    TimerMode, TimerPhase, TimerSnapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::warn;

const HELP: &str = "\
commands:
  s          start / pause
  f          finish early (asks for confirmation)
  r          reset
  m          music on / off
  c [ID]     set or clear the category
  n [NOTE]   save the finished session and start the break
  q          quit";

#[derive(Args)]
pub struct RunArgs {
    /// Category ID attached to recorded sessions
    #[arg(long)]
    pub category: Option<i64>,
    /// Start with background music on
    #[arg(long)]
    pub music: bool,
    /// Emit events and snapshots as JSON lines instead of a status line
    #[arg(long)]
    pub json: bool,
    /// Do not open an audio device
    #[arg(long)]
    pub silent: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Toggle,
    Finish,
    Reset,
    Music,
    Category(Option<i64>),
    Note(String),
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head {
        "" => Ok(Command::Status),
        "s" | "start" | "pause" => Ok(Command::Toggle),
        "f" | "finish" => Ok(Command::Finish),
        "r" | "reset" => Ok(Command::Reset),
        "m" | "music" => Ok(Command::Music),
        "c" | "category" if rest.is_empty() => Ok(Command::Category(None)),
        "c" | "category" => rest
            .parse()
            .map(|id| Command::Category(Some(id)))
            .map_err(|_| format!("not a category id: {rest}")),
        "n" | "note" => Ok(Command::Note(rest.to_string())),
        "h" | "help" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other} (h for help)")),
    }
}

/// What to do with the line typed after "Finish this session early? [y/N]".
#[derive(Debug, PartialEq, Eq)]
enum FinishReply {
    Finish,
    Keep,
    /// Not y/n; treated as no.
    KeepUnrecognized,
    /// The interval ended or was paused while the question was open.
    Stale,
}

fn can_finish_early(snap: &TimerSnapshot) -> bool {
    snap.mode == TimerMode::Focus && snap.phase == TimerPhase::Running
}

fn finish_reply(snap: &TimerSnapshot, answer: &str) -> FinishReply {
    if !can_finish_early(snap) {
        return FinishReply::Stale;
    }
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => FinishReply::Finish,
        "" | "n" | "no" => FinishReply::Keep,
        _ => FinishReply::KeepUnrecognized,
    }
}

fn describe(event: &Event, music_enabled: bool) -> Option<String> {
    let text = match event {
        Event::TimerStarted { mode, resumed, .. } => {
            if *resumed {
                format!("Resumed {mode}.")
            } else {
                format!("Started {mode}.")
            }
        }
        Event::TimerPaused { .. } => "Paused.".into(),
        Event::TimerReset { duration_secs, .. } => {
            format!("Reset to {}.", format_clock(*duration_secs))
        }
        Event::CompletionRequested { request, .. } => format!(
            "Focus session done ({} min). Type `n <note>` to save it and start the break.",
            request.elapsed_minutes
        ),
        Event::SessionDiscarded { .. } => "Nothing elapsed, not saved.".into(),
        Event::FocusStarted { duration_secs, .. } => {
            format!("Break over. Focus for {}.", format_clock(*duration_secs))
        }
        Event::BreakStarted { duration_secs, .. } => {
            format!("Break for {}.", format_clock(*duration_secs))
        }
        Event::TrackChanged {
            track: Some(track), ..
        } if music_enabled => format!("Now playing: {}", track.display_name()),
        Event::MusicToggled { enabled, .. } => {
            if *enabled {
                "Music on.".into()
            } else {
                "Music off.".into()
            }
        }
        Event::CategorySelected {
            category_id: Some(id),
            ..
        } => format!("Category {id}."),
        Event::CategorySelected { category_id: None, .. } => "No category.".into(),
        Event::SessionRecorded {
            duration_minutes,
            today_count,
            ..
        } => format!("Saved {duration_minutes} min session. Sessions today: {today_count}."),
        Event::RecordingFailed { message, .. } => format!("Could not save session: {message}"),
        _ => return None,
    };
    Some(text)
}

fn status_line(snap: &TimerSnapshot) -> String {
    let mode = match snap.mode {
        TimerMode::Focus => "FOCUS",
        TimerMode::Break => "BREAK",
    };
    let phase = match snap.phase {
        TimerPhase::Idle => "ready",
        TimerPhase::Running => "running",
        TimerPhase::Paused => "paused",
        TimerPhase::AwaitingCompletion => "done, add a note",
    };
    let music = match (&snap.track, snap.music_enabled) {
        (Some(track), true) => format!(" | music: {}", track.display_name()),
        (None, true) => " | music: none".to_string(),
        (_, false) => String::new(),
    };
    format!(
        "[{mode}] {} {phase} {:>3.0}%{music} | today {}",
        snap.clock(),
        snap.progress() * 100.0,
        snap.today_count
    )
}

struct Output {
    json: bool,
}

impl Output {
    fn events(&self, flow: &FlowController, events: &[Event]) {
        for event in events {
            if self.json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("cannot encode event: {e}"),
                }
            } else if let Some(text) = describe(event, flow.audio().music_enabled()) {
                self.line(&text);
            }
        }
    }

    fn status(&self, flow: &FlowController) {
        if self.json {
            self.events(flow, &[flow.snapshot_event()]);
        } else {
            print!("\r\x1b[2K{}", status_line(&flow.snapshot()));
            let _ = std::io::stdout().flush();
        }
    }

    fn line(&self, text: &str) {
        if self.json {
            eprintln!("{text}");
        } else {
            println!("\r\x1b[2K{text}");
        }
    }
}

fn build_controller(
    config: &Config,
    silent: bool,
    tx: UnboundedSender<Signal>,
) -> Result<FlowController, Box<dyn Error>> {
    let sink: Box<dyn AudioSink> = if silent {
        Box::new(NullSink)
    } else {
        let cue = config
            .notifications
            .enabled
            .then_some(config.notifications.sound.as_str());
        match RodioSink::spawn(config.music_dir(), cue, config.music.volume, tx.clone()) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                warn!("audio unavailable, continuing without sound: {e}");
                Box::new(NullSink)
            }
        }
    };
    let audio = AudioController::new(sink).with_cue(config.notifications.enabled);
    let api = ApiClient::from_config(&config.api)?;
    let recorder = SessionRecorder::new(Arc::new(api)).with_signals(tx.clone());
    let settings = ConfigFileSettings::new(Config::path()?);

    Ok(FlowController::new(
        Arc::new(settings),
        Catalog::from_config(&config.music),
        audio,
        recorder,
        Box::new(IntervalScheduler::new(tx)),
    )
    .with_shuffle_seed(config.music.shuffle_seed))
}

fn apply(flow: &mut FlowController, command: Command, out: &Output) -> Vec<Event> {
    let blocked = flow.snapshot().phase == TimerPhase::AwaitingCompletion
        && matches!(command, Command::Toggle | Command::Reset);
    let events = match command {
        Command::Toggle => flow.toggle_start(),
        Command::Reset => flow.reset(),
        Command::Music => flow.toggle_music(),
        Command::Category(id) => flow.select_category(id),
        Command::Note(note) => flow.confirm_completion(&note),
        Command::Help => {
            out.line(HELP);
            Vec::new()
        }
        Command::Status | Command::Finish | Command::Quit => Vec::new(),
    };
    if blocked {
        out.line("Save the finished session first: n [NOTE]");
    }
    events
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    super::runtime()?.block_on(session(args))
}

async fn session(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut flow = build_controller(&config, args.silent, tx)?;
    flow.audio_mut().set_music_enabled(args.music);
    if args.category.is_some() {
        flow.select_category(args.category);
    }

    let out = Output { json: args.json };
    if !args.json {
        println!("{HELP}");
    }
    out.status(&flow);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut confirming_finish = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if confirming_finish {
                    confirming_finish = false;
                    match finish_reply(&flow.snapshot(), &line) {
                        FinishReply::Finish => {
                            let events = flow.early_finish(true);
                            out.events(&flow, &events);
                        }
                        FinishReply::Keep => out.line("Keep going."),
                        FinishReply::KeepUnrecognized => out.line(&format!(
                            "Took `{}` as no. Keep going.",
                            line.trim()
                        )),
                        FinishReply::Stale => {
                            out.line("That focus session is no longer running; nothing to finish.")
                        }
                    }
                    out.status(&flow);
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Finish) => {
                        if can_finish_early(&flow.snapshot()) {
                            out.line("Finish this session early? [y/N]");
                            confirming_finish = true;
                        } else {
                            out.line("Only a running focus session can be finished early.");
                        }
                    }
                    Ok(command) => {
                        let events = apply(&mut flow, command, &out);
                        out.events(&flow, &events);
                    }
                    Err(message) => out.line(&message),
                }
                out.status(&flow);
            }
            Some(signal) = rx.recv() => {
                let events = flow.handle_signal(signal);
                out.events(&flow, &events);
                out.status(&flow);
            }
        }
    }

    flow.shutdown();
    if !args.json {
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use flowstate_core::{CompletionRequest, SessionStatus, Track};

    fn snapshot() -> TimerSnapshot {
        TimerSnapshot {
            mode: TimerMode::Focus,
            phase: TimerPhase::Running,
            duration_secs: 1500,
            remaining_secs: 1200,
            running: true,
            started_at: None,
            track: Some(Track::new("focus/deep-space.mp3")),
            track_position: 0,
            playlist_len: 6,
            music_enabled: true,
            category_id: None,
            today_count: 2,
            pending: None,
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("s"), Ok(Command::Toggle));
        assert_eq!(parse_command("  f "), Ok(Command::Finish));
        assert_eq!(parse_command("c 12"), Ok(Command::Category(Some(12))));
        assert_eq!(parse_command("c"), Ok(Command::Category(None)));
        assert_eq!(
            parse_command("n wrote the parser"),
            Ok(Command::Note("wrote the parser".into()))
        );
        assert_eq!(parse_command("n"), Ok(Command::Note(String::new())));
        assert_eq!(parse_command(""), Ok(Command::Status));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
        assert!(parse_command("c twelve").is_err());
        assert!(parse_command("x").is_err());
    }

    #[test]
    fn confirmation_defaults_to_no() {
        let snap = snapshot();
        assert_eq!(finish_reply(&snap, "y"), FinishReply::Finish);
        assert_eq!(finish_reply(&snap, " YES "), FinishReply::Finish);
        assert_eq!(finish_reply(&snap, ""), FinishReply::Keep);
        assert_eq!(finish_reply(&snap, "n"), FinishReply::Keep);
    }

    #[test]
    fn other_commands_at_the_prompt_count_as_no() {
        assert_eq!(finish_reply(&snapshot(), "s"), FinishReply::KeepUnrecognized);
        assert_eq!(finish_reply(&snapshot(), "q"), FinishReply::KeepUnrecognized);
    }

    #[test]
    fn answer_after_the_interval_ended_is_stale() {
        let mut done = snapshot();
        done.phase = TimerPhase::AwaitingCompletion;
        done.running = false;
        assert_eq!(finish_reply(&done, "y"), FinishReply::Stale);

        let mut on_break = snapshot();
        on_break.mode = TimerMode::Break;
        assert_eq!(finish_reply(&on_break, "y"), FinishReply::Stale);

        let mut paused = snapshot();
        paused.phase = TimerPhase::Paused;
        paused.running = false;
        assert_eq!(finish_reply(&paused, "yes"), FinishReply::Stale);
    }

    #[test]
    fn status_line_shows_clock_and_track() {
        let line = status_line(&snapshot());
        assert!(line.starts_with("[FOCUS] 20:00 running"));
        assert!(line.contains("music: deep-space"));
        assert!(line.ends_with("today 2"));
    }

    #[test]
    fn status_line_hides_music_when_off() {
        let mut snap = snapshot();
        snap.music_enabled = false;
        assert!(!status_line(&snap).contains("music"));
    }

    #[test]
    fn describes_user_facing_events() {
        let done = Event::CompletionRequested {
            request: CompletionRequest {
                status: SessionStatus::Completed,
                elapsed_minutes: 25,
                note: "Completed".into(),
            },
            at: Utc::now(),
        };
        assert!(describe(&done, false).unwrap().contains("25 min"));

        let track = Event::TrackChanged {
            track: Some(Track::new("break/soft-piano.mp3")),
            position: 0,
            at: Utc::now(),
        };
        assert_eq!(describe(&track, false), None);
        assert_eq!(
            describe(&track, true).as_deref(),
            Some("Now playing: soft-piano")
        );

        let rebuilt = Event::PlaylistRebuilt {
            mode: TimerMode::Break,
            tracks: 3,
            at: Utc::now(),
        };
        assert_eq!(describe(&rebuilt, true), None);
    }
}

use clap::Subcommand;
use flowstate_core::{Catalog, Config, TimerMode};

#[derive(Subcommand)]
pub enum TracksAction {
    /// List focus and break tracks with their enabled state
    List,
    /// Enable a disabled track, or disable an enabled one
    Toggle {
        /// Track id as shown by `tracks list`
        id: String,
    },
}

pub fn run(action: TracksAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TracksAction::List => {
            let config = Config::load()?;
            let catalog = Catalog::from_config(&config.music);
            for mode in [TimerMode::Focus, TimerMode::Break] {
                println!("{mode}:");
                for track in catalog.tracks(mode) {
                    let mark = if config.music.disabled_tracks.iter().any(|d| d == track.id()) {
                        ' '
                    } else {
                        'x'
                    };
                    println!("  [{mark}] {:<32} {}", track.id(), track.display_name());
                }
            }
        }
        TracksAction::Toggle { id } => {
            let mut config = Config::load()?;
            let catalog = Catalog::from_config(&config.music);
            let known = [TimerMode::Focus, TimerMode::Break]
                .into_iter()
                .any(|mode| catalog.tracks(mode).iter().any(|t| t.id() == id));
            if !known {
                return Err(format!("unknown track: {id}").into());
            }
            let disabled = config.toggle_track(&id);
            config.save()?;
            if disabled {
                println!("disabled {id}");
            } else {
                println!("enabled {id}");
            }
        }
    }
    Ok(())
}

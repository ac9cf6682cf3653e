use clap::Subcommand;
use flowstate_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Dot-separated key, e.g. `timer.focus_duration` or `ui.theme`
        key: String,
    },
    /// Change one value; "null" clears optional keys
    Set { key: String, value: String },
    /// Print the whole configuration
    List {
        /// TOML as stored on disk instead of JSON
        #[arg(long)]
        toml: bool,
    },
    /// Overwrite config.toml with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List { toml } => {
            let config = Config::load()?;
            if toml {
                let path = Config::path()?;
                print!("{}", std::fs::read_to_string(path)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("reset {}", Config::path()?.display());
        }
    }
    Ok(())
}

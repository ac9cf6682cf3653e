use clap::Subcommand;
use flowstate_core::{Config, Theme};

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch to the next theme in the cycle
    Next,
}

pub fn run(action: ThemeAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let current = Theme::from_key(&config.ui.theme);
    match action {
        ThemeAction::Show => {
            println!("{} ({})", current.display_name(), current.key());
        }
        ThemeAction::Next => {
            let next = current.next();
            config.set("ui.theme", next.key())?;
            println!("{} ({})", next.display_name(), next.key());
        }
    }
    Ok(())
}

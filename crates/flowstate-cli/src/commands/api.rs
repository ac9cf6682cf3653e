//! Read-only backend queries.

use flowstate_core::{ApiClient, Config};

fn client() -> Result<ApiClient, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    Ok(ApiClient::from_config(&config.api)?)
}

pub fn categories() -> Result<(), Box<dyn std::error::Error>> {
    let api = client()?;
    let categories = super::runtime()?.block_on(api.list_categories())?;
    if categories.is_empty() {
        println!("no categories");
    }
    for category in categories {
        println!(
            "{:>4}  {:<24} {}",
            category.id, category.name, category.color_code
        );
    }
    Ok(())
}

pub fn history(limit: u32) -> Result<(), Box<dyn std::error::Error>> {
    let api = client()?;
    let sessions = super::runtime()?.block_on(api.list_sessions(0, limit))?;
    if sessions.is_empty() {
        println!("no sessions");
    }
    for session in sessions {
        let started = session
            .start_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{started:<16}  {:>3} min  {:<9}  {}",
            session.duration_minutes,
            session.status,
            session.note.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub fn dashboard() -> Result<(), Box<dyn std::error::Error>> {
    let api = client()?;
    let stats = super::runtime()?.block_on(api.dashboard())?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

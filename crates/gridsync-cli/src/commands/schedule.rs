//! Schedule subcommand: fetch and print the season's sessions.

use clap::Subcommand;

use gridsync_core::integrations::F1ApiClient;
use gridsync_core::schedule::extract_sessions;
use gridsync_core::sync::ScheduleSource;
use gridsync_core::{Config, Session};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// List the extracted sessions for the current season
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScheduleAction::List { json } => {
            let config = Config::load_or_default();
            let client = F1ApiClient::from_config(&config.source)?;
            let schedule = client.fetch_current_season()?;

            let mut sessions: Vec<Session> = Vec::new();
            for record in &schedule.races {
                match extract_sessions(record, &config.durations) {
                    Ok(extracted) => sessions.extend(extracted),
                    Err(e) => eprintln!("warning: skipping record: {e}"),
                }
            }
            sessions.sort_by_key(|s| s.start_utc);

            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else {
                for session in &sessions {
                    println!(
                        "{}  {:<17} {:<30} {}",
                        session.start_utc.format("%Y-%m-%d %H:%M"),
                        session.kind.label(),
                        session.name,
                        session.location
                    );
                }
                println!("{} session(s)", sessions.len());
            }
        }
    }
    Ok(())
}

//! Sync subcommand: one end-to-end schedule-to-calendar pass.

use gridsync_core::integrations::{F1ApiClient, GoogleCalendarStore};
use gridsync_core::sync::SyncRun;
use gridsync_core::Config;

pub fn run(dry_run: bool, include_past: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default();
    if include_past {
        config.run.include_past = true;
    }

    let source = F1ApiClient::from_config(&config.source)?;
    let store = GoogleCalendarStore::from_config(&config)?;
    let run = SyncRun::new(&source, &store, &config);

    if dry_run {
        let planned = run.preview()?;
        for action in &planned.actions {
            println!("{action}");
        }
        println!(
            "dry run: {} action(s) planned against calendar {}, nothing applied",
            planned.actions.len(),
            planned.calendar
        );
        return Ok(());
    }

    let summary = run.execute()?;
    print!("{summary}");
    if !summary.is_clean() {
        return Err("sync finished with failures".into());
    }
    Ok(())
}

//! HTTP client for the f1api.dev schedule endpoint.

use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::info;

use crate::config::SourceConfig;
use crate::error::{SourceUnavailableError, SyncError};
use crate::schedule::SeasonSchedule;
use crate::sync::traits::ScheduleSource;

/// Fetches the current season's raw schedule.
pub struct F1ApiClient {
    runtime: Runtime,
    http: reqwest::Client,
    api_base: String,
}

impl F1ApiClient {
    pub fn new(api_base: impl Into<String>, request_timeout: Duration) -> Result<F1ApiClient, SyncError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(SourceUnavailableError::from)?;
        Ok(F1ApiClient {
            runtime,
            http,
            api_base: api_base.into(),
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<F1ApiClient, SyncError> {
        F1ApiClient::new(
            config.api_base.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn fetch_body(&self) -> Result<String, SourceUnavailableError> {
        self.runtime.block_on(async {
            let response = self.http.get(&self.api_base).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SourceUnavailableError::Status {
                    status: status.as_u16(),
                });
            }
            Ok(response.text().await?)
        })
    }
}

impl ScheduleSource for F1ApiClient {
    fn fetch_current_season(&self) -> Result<SeasonSchedule, SourceUnavailableError> {
        let body = self.fetch_body()?;
        let schedule = parse_season(&body)?;
        info!(races = schedule.races.len(), "fetched F1 schedule");
        Ok(schedule)
    }
}

/// Parse the `/api/current` payload and stamp the envelope's season onto
/// each race record that lacks its own.
pub fn parse_season(body: &str) -> Result<SeasonSchedule, SourceUnavailableError> {
    let mut schedule: SeasonSchedule = serde_json::from_str(body)?;
    let season = schedule.season;
    for race in &mut schedule.races {
        if race.season.is_none() {
            race.season = season;
        }
    }
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "season": 2026,
        "races": [
            {
                "round": 1,
                "raceName": "Australian Grand Prix 2026",
                "circuit": {"circuitName": "Albert Park", "city": "Melbourne", "country": "Australia"},
                "schedule": {
                    "race": {"date": "2026-03-08", "time": "04:00:00Z"},
                    "qualy": {"date": "2026-03-07", "time": "05:00:00Z"}
                }
            },
            {
                "round": 2,
                "season": 2026,
                "raceName": "Chinese Grand Prix 2026",
                "schedule": {
                    "race": {"date": "2026-03-15", "time": "07:00:00Z"},
                    "sprintRace": {"date": "2026-03-14", "time": "03:00:00Z"}
                }
            }
        ]
    }"#;

    #[test]
    fn parses_fixture_and_stamps_season() {
        let schedule = parse_season(FIXTURE).unwrap();
        assert_eq!(schedule.season, Some(2026));
        assert_eq!(schedule.races.len(), 2);
        assert_eq!(schedule.races[0].season, Some(2026));
        assert_eq!(schedule.races[0].round, Some(1));
        assert!(schedule.races[1].schedule.sprint_race.is_some());
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        assert!(matches!(
            parse_season("not json"),
            Err(SourceUnavailableError::Parse(_))
        ));
    }

    #[test]
    fn empty_envelope_parses_to_empty_schedule() {
        let schedule = parse_season("{}").unwrap();
        assert!(schedule.races.is_empty());
        assert_eq!(schedule.season, None);
    }
}

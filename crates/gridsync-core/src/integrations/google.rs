//! Google Calendar v3 REST store.
//!
//! Managed events are marked with `extendedProperties.private` entries:
//! `gridsync_key` carries the sync key and `gridsync_hash` the content
//! digest recorded at last write. Recognition never relies on title text.

use reqwest::Client;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{OAuthError, StoreReadError, StoreWriteError, SyncError};
use crate::integrations::oauth::{self, OAuthConfig};
use crate::integrations::keyring_store;
use crate::sync::traits::{CalendarRef, CalendarStore};
use crate::sync::types::{CalendarEvent, SyncKey};

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
const REDIRECT_PORT: u16 = 18817;
const TOKEN_KEY: &str = "google_tokens";
const KEY_PROP: &str = "gridsync_key";
const HASH_PROP: &str = "gridsync_hash";

/// OAuth client credential handling, usable without a store instance so
/// the CLI can drive login/logout directly.
pub struct GoogleAuth {
    client_id: String,
    client_secret: String,
}

impl GoogleAuth {
    /// Load client credentials from the keyring. Empty if not stored yet.
    pub fn from_keyring() -> GoogleAuth {
        let client_id = keyring_store::get("google_client_id")
            .ok()
            .flatten()
            .unwrap_or_default();
        let client_secret = keyring_store::get("google_client_secret")
            .ok()
            .flatten()
            .unwrap_or_default();
        GoogleAuth {
            client_id,
            client_secret,
        }
    }

    /// Persist OAuth client credentials to the OS keyring.
    pub fn set_credentials(client_id: &str, client_secret: &str) -> Result<(), OAuthError> {
        keyring_store::set("google_client_id", client_id)?;
        keyring_store::set("google_client_secret", client_secret)?;
        Ok(())
    }

    pub fn is_authenticated() -> bool {
        oauth::load_tokens(TOKEN_KEY).is_some()
    }

    pub fn logout() -> Result<(), OAuthError> {
        keyring_store::delete(TOKEN_KEY)?;
        Ok(())
    }

    fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig {
            token_key: TOKEN_KEY.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            scopes: vec![CALENDAR_SCOPE.to_string()],
            redirect_port: REDIRECT_PORT,
        }
    }

    /// Run the interactive OAuth flow.
    pub fn login(&self) -> Result<(), OAuthError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(OAuthError::CredentialsNotConfigured);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OAuthError::AuthorizationFailed(e.to_string()))?;
        runtime.block_on(oauth::authorize(&self.oauth_config()))?;
        Ok(())
    }

    /// Return a valid access token, refreshing if expired.
    fn access_token(&self, runtime: &Runtime) -> Result<String, OAuthError> {
        let tokens = oauth::load_tokens(TOKEN_KEY).ok_or(OAuthError::NotAuthenticated)?;
        if !oauth::is_expired(&tokens) {
            return Ok(tokens.access_token);
        }
        let refresh = tokens
            .refresh_token
            .as_deref()
            .ok_or(OAuthError::TokenExpired)?;
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(OAuthError::CredentialsNotConfigured);
        }
        let refreshed = runtime.block_on(oauth::refresh(&self.oauth_config(), refresh))?;
        Ok(refreshed.access_token)
    }
}

enum TokenSource {
    Auth(GoogleAuth),
    Static(String),
}

/// Google Calendar API client implementing [`CalendarStore`].
pub struct GoogleCalendarStore {
    runtime: Runtime,
    http: Client,
    tokens: TokenSource,
    base_url: String,
    calendar_description: String,
    time_zone: String,
}

impl GoogleCalendarStore {
    pub fn from_config(config: &Config) -> Result<GoogleCalendarStore, SyncError> {
        Ok(GoogleCalendarStore {
            runtime: build_runtime()?,
            http: Client::new(),
            tokens: TokenSource::Auth(GoogleAuth::from_keyring()),
            base_url: API_BASE.to_string(),
            calendar_description: config.calendar.description.clone(),
            time_zone: config.calendar.time_zone.clone(),
        })
    }

    /// Store with a fixed bearer token and base URL. Test seam.
    pub fn with_static_token(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<GoogleCalendarStore, SyncError> {
        Ok(GoogleCalendarStore {
            runtime: build_runtime()?,
            http: Client::new(),
            tokens: TokenSource::Static(token.into()),
            base_url: base_url.into(),
            calendar_description: String::new(),
            time_zone: "UTC".to_string(),
        })
    }

    fn token(&self) -> Result<String, OAuthError> {
        match &self.tokens {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Auth(auth) => auth.access_token(&self.runtime),
        }
    }

    /// Share the calendar with the owner unless already shared. Sharing is
    /// best-effort: a failure downgrades to a warning.
    fn share_with_owner(&self, token: &str, calendar_id: &str, owner_email: &str) {
        let result: Result<(), StoreReadError> = self.runtime.block_on(async {
            let acl_url = format!(
                "{}/calendars/{}/acl",
                self.base_url,
                urlencoding::encode(calendar_id)
            );
            let acl: Value = self
                .http
                .get(&acl_url)
                .bearer_auth(token)
                .send()
                .await?
                .json()
                .await?;
            let already_shared = acl["items"].as_array().is_some_and(|items| {
                items
                    .iter()
                    .any(|rule| rule["scope"]["value"].as_str() == Some(owner_email))
            });
            if already_shared {
                return Ok(());
            }
            let rule = json!({
                "scope": {"type": "user", "value": owner_email},
                "role": "owner",
            });
            let response = self
                .http
                .post(&acl_url)
                .bearer_auth(token)
                .json(&rule)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(StoreReadError::Api(format!(
                    "ACL insert returned HTTP {}",
                    response.status().as_u16()
                )));
            }
            info!(owner_email, "shared calendar with owner");
            Ok(())
        });
        if let Err(error) = result {
            warn!(%error, owner_email, "could not share calendar");
        }
    }
}

fn build_runtime() -> Result<Runtime, SyncError> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

impl CalendarStore for GoogleCalendarStore {
    fn ensure_calendar(
        &self,
        name: &str,
        owner_email: Option<&str>,
    ) -> Result<CalendarRef, StoreReadError> {
        let token = self.token()?;
        let calendar_id = self.runtime.block_on(async {
            let list: Value = self
                .http
                .get(format!("{}/users/me/calendarList", self.base_url))
                .bearer_auth(&token)
                .send()
                .await?
                .json()
                .await?;
            if let Some(error) = list.get("error") {
                return Err(StoreReadError::Api(error.to_string()));
            }

            let items = list["items"].as_array().map(Vec::as_slice).unwrap_or(&[]);
            if let Some(id) = find_calendar_in_list(items, name) {
                return Ok(id);
            }

            info!(calendar = name, "calendar not found, creating");
            let body = json!({
                "summary": name,
                "description": self.calendar_description,
                "timeZone": self.time_zone,
            });
            let created: Value = self
                .http
                .post(format!("{}/calendars", self.base_url))
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await?
                .json()
                .await?;
            if let Some(error) = created.get("error") {
                return Err(StoreReadError::Api(error.to_string()));
            }
            created["id"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| StoreReadError::CalendarUnavailable {
                    name: name.to_string(),
                })
        })?;

        if let Some(owner) = owner_email {
            self.share_with_owner(&token, &calendar_id, owner);
        }
        Ok(CalendarRef::new(calendar_id))
    }

    fn list_managed_events(
        &self,
        calendar: &CalendarRef,
    ) -> Result<Vec<CalendarEvent>, StoreReadError> {
        let token = self.token()?;
        self.runtime.block_on(async {
            let mut events = Vec::new();
            let mut page_token: Option<String> = None;
            loop {
                let mut url = format!(
                    "{}/calendars/{}/events?maxResults=2500&singleEvents=true",
                    self.base_url,
                    urlencoding::encode(calendar.as_str())
                );
                if let Some(next) = &page_token {
                    url.push_str("&pageToken=");
                    url.push_str(&urlencoding::encode(next));
                }
                let page: Value = self
                    .http
                    .get(&url)
                    .bearer_auth(&token)
                    .send()
                    .await?
                    .json()
                    .await?;
                if let Some(error) = page.get("error") {
                    return Err(StoreReadError::Api(error.to_string()));
                }
                if let Some(items) = page["items"].as_array() {
                    events.extend(items.iter().filter_map(parse_gcal_event));
                }
                match page["nextPageToken"].as_str() {
                    Some(next) => page_token = Some(next.to_string()),
                    None => break,
                }
            }
            Ok(events)
        })
    }

    fn create_event(
        &self,
        calendar: &CalendarRef,
        event: &CalendarEvent,
    ) -> Result<String, StoreWriteError> {
        let token = self.token()?;
        self.runtime.block_on(async {
            let url = format!(
                "{}/calendars/{}/events",
                self.base_url,
                urlencoding::encode(calendar.as_str())
            );
            let response = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(&to_gcal_event(event, &self.time_zone))
                .send()
                .await?;
            let status = response.status();
            if status.as_u16() == 429 {
                return Err(StoreWriteError::RateLimited);
            }
            let body: Value = response.json().await?;
            if !status.is_success() {
                return Err(StoreWriteError::Api(api_error_message(&body, status.as_u16())));
            }
            body["id"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| StoreWriteError::Api("create response missing event id".into()))
        })
    }

    fn update_event(
        &self,
        calendar: &CalendarRef,
        external_id: &str,
        event: &CalendarEvent,
    ) -> Result<(), StoreWriteError> {
        let token = self.token()?;
        self.runtime.block_on(async {
            let url = format!(
                "{}/calendars/{}/events/{}",
                self.base_url,
                urlencoding::encode(calendar.as_str()),
                urlencoding::encode(external_id)
            );
            let response = self
                .http
                .put(&url)
                .bearer_auth(&token)
                .json(&to_gcal_event(event, &self.time_zone))
                .send()
                .await?;
            let status = response.status();
            match status.as_u16() {
                404 => Err(StoreWriteError::NotFound {
                    external_id: external_id.to_string(),
                }),
                429 => Err(StoreWriteError::RateLimited),
                _ if status.is_success() => Ok(()),
                code => {
                    let body: Value = response.json().await.unwrap_or_default();
                    Err(StoreWriteError::Api(api_error_message(&body, code)))
                }
            }
        })
    }
}

/// Find a calendar id by summary in a `calendarList` page.
pub fn find_calendar_in_list(items: &[Value], name: &str) -> Option<String> {
    items
        .iter()
        .find(|cal| cal["summary"].as_str() == Some(name))
        .and_then(|cal| cal["id"].as_str())
        .map(str::to_string)
}

/// Convert an event to the Calendar v3 wire format.
pub fn to_gcal_event(event: &CalendarEvent, time_zone: &str) -> Value {
    json!({
        "summary": event.title,
        "location": event.location,
        "start": {
            "dateTime": event.start_utc.to_rfc3339(),
            "timeZone": time_zone,
        },
        "end": {
            "dateTime": event.end_utc.to_rfc3339(),
            "timeZone": time_zone,
        },
        "extendedProperties": {
            "private": {
                KEY_PROP: event.sync_key.as_str(),
                HASH_PROP: event.content_hash,
            }
        }
    })
}

/// Parse a Calendar v3 event into a managed [`CalendarEvent`].
///
/// Returns `None` for anything this system does not own: events without a
/// private sync-key property, or with one that does not parse. A missing
/// hash property yields an empty hash, which can never match a computed
/// digest, so the next run rewrites the event.
pub fn parse_gcal_event(item: &Value) -> Option<CalendarEvent> {
    let props = &item["extendedProperties"]["private"];
    let sync_key = SyncKey::parse(props[KEY_PROP].as_str()?)?;
    let external_id = item["id"].as_str()?.to_string();
    let start_utc = parse_gcal_time(&item["start"])?;
    let end_utc = parse_gcal_time(&item["end"])?;
    Some(CalendarEvent {
        external_id: Some(external_id),
        sync_key,
        title: item["summary"].as_str().unwrap_or_default().to_string(),
        start_utc,
        end_utc,
        location: item["location"].as_str().unwrap_or_default().to_string(),
        content_hash: props[HASH_PROP].as_str().unwrap_or_default().to_string(),
    })
}

fn parse_gcal_time(value: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = value["dateTime"].as_str()?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

fn api_error_message(body: &Value, status: u16) -> String {
    body["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

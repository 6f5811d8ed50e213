use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::cache::Clock;
use super::client::GithubClient;
use super::curl_cmd::Transport;
use super::records::{EventRecord, ProfileRecord, RepositoryRecord};

/// Everything the viewer shows for one account.
#[derive(Clone, Debug)]
pub struct Portfolio {
    pub account: String,
    pub profile: Option<ProfileRecord>,
    pub repositories: Vec<RepositoryRecord>,
    pub events: Vec<EventRecord>,
    pub fetched_at: DateTime<Utc>,
}

/// Fetches the repository list plus profile and recent events.
///
/// Only the repository list is required; profile and events degrade to empty
/// when their requests fail.
pub fn collect_portfolio<T: Transport, C: Clock>(client: &GithubClient<T, C>) -> Result<Portfolio> {
    let account = client.account().to_owned();
    let repositories = client
        .repositories()
        .with_context(|| format!("failed to fetch repositories for {account}"))?;

    let profile = client
        .profile()
        .inspect_err(|error| warn!(%error, "profile unavailable"))
        .ok();
    let events = client.events().unwrap_or_else(|error| {
        warn!(%error, "events unavailable");
        Vec::new()
    });

    info!(
        account = account.as_str(),
        repositories = repositories.len(),
        events = events.len(),
        "loaded portfolio"
    );

    Ok(Portfolio {
        account,
        profile,
        repositories,
        events,
        fetched_at: Utc::now(),
    })
}

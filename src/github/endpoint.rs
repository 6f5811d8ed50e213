use std::time::Duration;

/// Endpoint category; decides how long a cached response stays fresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Profile,
    Repositories,
    Languages,
    Events,
}

impl Endpoint {
    pub fn ttl(self) -> Duration {
        let minutes = match self {
            Self::Profile => 15,
            Self::Repositories => 30,
            Self::Languages => 60,
            Self::Events => 5,
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Repositories => "repositories",
            Self::Languages => "languages",
            Self::Events => "events",
        }
    }
}

pub(super) fn profile_path(account: &str) -> String {
    format!("/users/{account}")
}

pub(super) fn repositories_path(account: &str) -> String {
    format!("/users/{account}/repos?per_page=100&sort=updated")
}

pub(super) fn languages_path(full_name: &str) -> String {
    format!("/repos/{full_name}/languages")
}

pub(super) fn events_path(account: &str) -> String {
    format!("/users/{account}/events/public?per_page=30")
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Repository fields the network uses. Everything else in the response is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, rename = "stargazers_count")]
    pub stars: u32,
    #[serde(default, rename = "forks_count")]
    pub forks: u32,
    #[serde(default, rename = "open_issues_count")]
    pub open_issues: u32,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProfileRecord {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub repo: EventRepo,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

/// Bytes of source per language, as reported for one repository.
pub type LanguageBreakdown = BTreeMap<String, u64>;

/// Language shares in percent, largest first.
pub fn language_shares(breakdown: &LanguageBreakdown) -> Vec<(String, f32)> {
    let total = breakdown.values().sum::<u64>();
    if total == 0 {
        return Vec::new();
    }

    let mut shares = breakdown
        .iter()
        .map(|(language, bytes)| {
            (
                language.clone(),
                (*bytes as f64 / total as f64 * 100.0) as f32,
            )
        })
        .collect::<Vec<_>>();
    shares.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    shares
}

/// Event counts per event type, most frequent first.
pub fn summarize_events(events: &[EventRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.kind.as_str()).or_default() += 1;
    }

    let mut summary = counts
        .into_iter()
        .map(|(kind, count)| (kind.to_owned(), count))
        .collect::<Vec<_>>();
    summary.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    summary
}

/// Repositories touched by the newest events, most recent first, each listed
/// once with the time of its latest event.
pub fn recent_repositories(
    events: &[EventRecord],
    limit: usize,
) -> Vec<(String, Option<DateTime<Utc>>)> {
    let mut latest: BTreeMap<&str, Option<DateTime<Utc>>> = BTreeMap::new();
    for event in events {
        let entry = latest.entry(event.repo.name.as_str()).or_insert(event.created_at);
        if event.created_at > *entry {
            *entry = event.created_at;
        }
    }

    let mut recent = latest
        .into_iter()
        .map(|(name, at)| (name.to_owned(), at))
        .collect::<Vec<_>>();
    recent.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_record_tolerates_missing_optional_fields() {
        let raw = r#"{
            "id": 7,
            "name": "dotfiles",
            "full_name": "octocat/dotfiles",
            "language": null,
            "stargazers_count": 3,
            "pushed_at": "2024-05-01T10:00:00Z",
            "fork": true
        }"#;

        let record: RepositoryRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.full_name, "octocat/dotfiles");
        assert_eq!(record.language, None);
        assert!(record.topics.is_empty());
        assert_eq!(record.stars, 3);
        assert_eq!(record.forks, 0);
        assert!(record.fork);
        assert!(record.pushed_at.is_some());
        assert!(record.created_at.is_none());
    }

    #[test]
    fn language_shares_sum_to_hundred_and_sort_descending() {
        let breakdown = LanguageBreakdown::from([
            ("Rust".to_owned(), 750),
            ("Shell".to_owned(), 50),
            ("Nix".to_owned(), 200),
        ]);

        let shares = language_shares(&breakdown);
        let names = shares.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Rust", "Nix", "Shell"]);
        let total = shares.iter().map(|(_, share)| share).sum::<f32>();
        assert!((total - 100.0).abs() < 0.01);
        assert!(language_shares(&LanguageBreakdown::new()).is_empty());
    }

    #[test]
    fn events_are_counted_per_type() {
        let raw = r#"[
            {"id": "1", "type": "PushEvent", "repo": {"name": "a/b"}},
            {"id": "2", "type": "WatchEvent", "repo": {"name": "a/c"}},
            {"id": "3", "type": "PushEvent", "repo": {"name": "a/b"}}
        ]"#;
        let events: Vec<EventRecord> = serde_json::from_str(raw).unwrap();

        assert_eq!(
            summarize_events(&events),
            vec![("PushEvent".to_owned(), 2), ("WatchEvent".to_owned(), 1)]
        );
    }

    #[test]
    fn recent_repositories_keep_latest_event_per_repository() {
        let raw = r#"[
            {"id": "1", "type": "PushEvent", "repo": {"name": "a/b"}, "created_at": "2025-05-01T10:00:00Z"},
            {"id": "2", "type": "WatchEvent", "repo": {"name": "a/c"}, "created_at": "2025-05-03T10:00:00Z"},
            {"id": "3", "type": "PushEvent", "repo": {"name": "a/b"}, "created_at": "2025-05-04T10:00:00Z"},
            {"id": "4", "type": "ForkEvent", "repo": {"name": "a/d"}}
        ]"#;
        let events: Vec<EventRecord> = serde_json::from_str(raw).unwrap();

        let recent = recent_repositories(&events, 5);
        let names = recent.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["a/b", "a/c", "a/d"]);
        assert_eq!(
            recent[0].1.map(|at| at.to_rfc3339()),
            Some("2025-05-04T10:00:00+00:00".to_owned())
        );
        assert_eq!(recent_repositories(&events, 1).len(), 1);
    }
}

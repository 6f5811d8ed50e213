use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use glam::Vec3;

use crate::github::RepositoryRecord;

use super::palette::{LanguagePalette, Rgb};

/// Group key for repositories without a primary language.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const MIN_RADIUS: f32 = 0.6;
const MAX_RADIUS: f32 = 2.8;

/// One repository plus the layout state the simulation mutates.
#[derive(Clone, Debug)]
pub struct RepositoryNode {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub topics: BTreeSet<String>,
    pub stars: u32,
    pub forks: u32,
    pub open_issues: u32,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_fork: bool,

    pub position: Vec3,
    pub target: Vec3,
    pub velocity: Vec3,
    pub force: Vec3,
    pub mass: f32,
    pub radius: f32,
    pub color: Rgb,
    pub adjacent: Vec<usize>,
}

impl RepositoryNode {
    pub fn from_record(
        record: RepositoryRecord,
        palette: &LanguagePalette,
        reference: DateTime<Utc>,
    ) -> Self {
        let radius = visual_radius(
            record.stars,
            record.forks,
            record.open_issues,
            record.pushed_at,
            reference,
        );
        let language = record.language.filter(|language| !language.is_empty());
        let color = palette.color_for(language.as_deref());

        Self {
            name: record.name,
            full_name: record.full_name,
            description: record.description,
            html_url: record.html_url,
            language,
            topics: record
                .topics
                .into_iter()
                .map(|topic| topic.trim().to_lowercase())
                .filter(|topic| !topic.is_empty())
                .collect(),
            stars: record.stars,
            forks: record.forks,
            open_issues: record.open_issues,
            size: record.size,
            created_at: record.created_at,
            pushed_at: record.pushed_at,
            updated_at: record.updated_at,
            is_fork: record.fork,
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            mass: mass_for_radius(radius),
            radius,
            color,
            adjacent: Vec::new(),
        }
    }

    pub fn language_key(&self) -> &str {
        self.language.as_deref().unwrap_or(UNKNOWN_LANGUAGE)
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.pushed_at.or(self.updated_at).or(self.created_at)
    }
}

pub fn visual_radius(
    stars: u32,
    forks: u32,
    open_issues: u32,
    pushed_at: Option<DateTime<Utc>>,
    reference: DateTime<Utc>,
) -> f32 {
    let log = |count: u32| (count as f32).ln_1p();

    let recency = match pushed_at.map(|pushed| (reference - pushed).num_days()) {
        Some(days) if days <= 30 => 0.4,
        Some(days) if days <= 180 => 0.2,
        _ => 0.0,
    };

    (MIN_RADIUS + 0.32 * log(stars) + 0.18 * log(forks) + 0.08 * log(open_issues) + recency)
        .clamp(MIN_RADIUS, MAX_RADIUS)
}

pub fn mass_for_radius(radius: f32) -> f32 {
    0.8 + 0.6 * radius
}

/// Keeps the `limit` most-starred records; ties fall back to full name.
pub fn select_top_by_stars(
    mut records: Vec<RepositoryRecord>,
    limit: usize,
) -> Vec<RepositoryRecord> {
    records.sort_by(|a, b| {
        b.stars
            .cmp(&a.stars)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });
    records.truncate(limit);
    records
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::github::RepositoryRecord;

    pub fn reference_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    pub fn record(id: u64, name: &str) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_owned(),
            full_name: format!("octocat/{name}"),
            description: None,
            html_url: String::new(),
            language: None,
            topics: Vec::new(),
            stars: 0,
            forks: 0,
            open_issues: 0,
            size: 0,
            created_at: None,
            pushed_at: Some(reference_time() - Duration::days(400 + id as i64)),
            updated_at: None,
            fork: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::test_support::{record, reference_time};
    use super::*;

    #[test]
    fn radius_grows_with_popularity_and_recency() {
        let now = reference_time();
        let quiet = visual_radius(0, 0, 0, None, now);
        let popular = visual_radius(500, 40, 12, None, now);
        let recent = visual_radius(0, 0, 0, Some(now - Duration::days(3)), now);
        let somewhat_recent = visual_radius(0, 0, 0, Some(now - Duration::days(90)), now);

        assert_eq!(quiet, MIN_RADIUS);
        assert!(popular > quiet);
        assert!((recent - (MIN_RADIUS + 0.4)).abs() < 1e-6);
        assert!((somewhat_recent - (MIN_RADIUS + 0.2)).abs() < 1e-6);
        assert!(visual_radius(u32::MAX, u32::MAX, u32::MAX, None, now) <= MAX_RADIUS);
    }

    #[test]
    fn node_normalizes_topics_and_empty_language() {
        let mut source = record(1, "tools");
        source.language = Some(String::new());
        source.topics = vec!["CLI".to_owned(), " cli ".to_owned(), String::new()];

        let node = RepositoryNode::from_record(
            source,
            &LanguagePalette::new(Rgb(9, 9, 9)),
            reference_time(),
        );

        assert_eq!(node.language, None);
        assert_eq!(node.language_key(), UNKNOWN_LANGUAGE);
        assert_eq!(node.color, Rgb(9, 9, 9));
        assert_eq!(node.topics.len(), 1);
        assert!(node.topics.contains("cli"));
        assert!((node.mass - mass_for_radius(node.radius)).abs() < f32::EPSILON);
    }

    #[test]
    fn top_selection_is_by_stars_then_name() {
        let mut a = record(1, "a");
        a.stars = 5;
        let mut b = record(2, "b");
        b.stars = 9;
        let mut c = record(3, "c");
        c.stars = 5;

        let kept = select_top_by_stars(vec![c, a, b], 2);
        let names = kept.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn last_activity_falls_back_to_creation_time() {
        let mut source = record(1, "a");
        let created = reference_time() - Duration::days(900);
        source.pushed_at = None;
        source.created_at = Some(created);

        let node =
            RepositoryNode::from_record(source, &LanguagePalette::github_defaults(), reference_time());
        assert_eq!(node.last_activity(), Some(created));
    }
}

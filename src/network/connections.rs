use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::node::RepositoryNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionKind {
    SameLanguage,
    SharedTopic,
    NameSimilarity,
    /// Neighbours in last-activity order. Unrelated to fork lineage.
    TemporalProximity,
}

impl ConnectionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::SameLanguage => "same language",
            Self::SharedTopic => "shared topic",
            Self::NameSimilarity => "similar name",
            Self::TemporalProximity => "active around the same time",
        }
    }
}

/// Undirected edge between two node indices. `source < target` always holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub source: usize,
    pub target: usize,
    pub kind: ConnectionKind,
    pub strength: f32,
}

impl Connection {
    pub fn opacity(&self) -> f32 {
        0.12 + 0.6 * self.strength
    }

    pub fn other(&self, index: usize) -> Option<usize> {
        if self.source == index {
            Some(self.target)
        } else if self.target == index {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn touches(&self, index: usize) -> bool {
        self.source == index || self.target == index
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    /// An existing edge for the pair was replaced by a stronger one.
    Strengthened,
    /// An existing edge for the pair was at least as strong.
    Kept,
    /// One of the endpoints is already at the degree cap.
    Saturated,
    Rejected,
}

/// Connection set with one edge per unordered pair and a per-node degree cap.
#[derive(Clone, Debug)]
pub struct ConnectionSet {
    connections: Vec<Connection>,
    index_by_pair: HashMap<(usize, usize), usize>,
    degree: Vec<usize>,
    cap: usize,
}

impl ConnectionSet {
    pub fn new(node_count: usize, cap: usize) -> Self {
        Self {
            connections: Vec::new(),
            index_by_pair: HashMap::new(),
            degree: vec![0; node_count],
            cap,
        }
    }

    pub fn insert(&mut self, a: usize, b: usize, kind: ConnectionKind, strength: f32) -> InsertOutcome {
        if a == b || a >= self.degree.len() || b >= self.degree.len() {
            return InsertOutcome::Rejected;
        }
        if !strength.is_finite() || strength <= 0.0 {
            return InsertOutcome::Rejected;
        }
        let strength = strength.min(1.0);
        let key = pair_key(a, b);

        if let Some(&existing) = self.index_by_pair.get(&key) {
            let connection = &mut self.connections[existing];
            if strength > connection.strength {
                connection.strength = strength;
                connection.kind = kind;
                return InsertOutcome::Strengthened;
            }
            return InsertOutcome::Kept;
        }

        if self.degree[a] >= self.cap || self.degree[b] >= self.cap {
            return InsertOutcome::Saturated;
        }

        self.index_by_pair.insert(key, self.connections.len());
        self.connections.push(Connection {
            source: key.0,
            target: key.1,
            kind,
            strength,
        });
        self.degree[a] += 1;
        self.degree[b] += 1;
        InsertOutcome::Added
    }

    pub fn get(&self, a: usize, b: usize) -> Option<&Connection> {
        self.index_by_pair
            .get(&pair_key(a, b))
            .map(|&index| &self.connections[index])
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn degree(&self, index: usize) -> usize {
        self.degree.get(index).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Neighbour lists per node; `b ∈ adjacency[a]` iff `a ∈ adjacency[b]`.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.degree.len()];
        for connection in self.iter() {
            adjacency[connection.source].push(connection.target);
            adjacency[connection.target].push(connection.source);
        }
        for neighbours in &mut adjacency {
            neighbours.sort_unstable();
        }
        adjacency
    }

    pub fn into_vec(self) -> Vec<Connection> {
        self.connections
    }
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Derives the connection set for `nodes`. Deterministic for a fixed node order.
pub fn infer_connections(nodes: &[RepositoryNode], cap: usize) -> ConnectionSet {
    let mut set = ConnectionSet::new(nodes.len(), cap);
    if nodes.len() < 2 {
        return set;
    }

    link_language_rings(nodes, &mut set);
    link_topics_and_names(nodes, &mut set);
    link_activity_neighbours(nodes, &mut set);
    set
}

fn link_language_rings(nodes: &[RepositoryNode], set: &mut ConnectionSet) {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        groups.entry(node.language_key()).or_default().push(index);
    }

    for members in groups.values_mut() {
        if members.len() < 2 {
            continue;
        }

        members.sort_by(|&a, &b| {
            nodes[b]
                .stars
                .cmp(&nodes[a].stars)
                .then_with(|| nodes[a].full_name.cmp(&nodes[b].full_name))
        });

        // A two-member ring is a single edge; the dedupe rule collapses the wrap-around.
        for (position, &from) in members.iter().enumerate() {
            let to = members[(position + 1) % members.len()];
            let strength = 0.45 + 0.12 * nodes[from].radius.min(nodes[to].radius);
            set.insert(from, to, ConnectionKind::SameLanguage, strength);
        }
    }
}

fn link_topics_and_names(nodes: &[RepositoryNode], set: &mut ConnectionSet) {
    let tokens = nodes
        .iter()
        .map(|node| name_tokens(&node.name))
        .collect::<Vec<_>>();

    for a in 0..nodes.len() {
        for b in (a + 1)..nodes.len() {
            let shared_topics = nodes[a].topics.intersection(&nodes[b].topics).count();
            if shared_topics > 0 {
                let strength = (0.4 + 0.12 * shared_topics as f32).min(0.9);
                set.insert(a, b, ConnectionKind::SharedTopic, strength);
                continue;
            }

            let shared_tokens = tokens[a].intersection(&tokens[b]).count();
            if shared_tokens > 0 {
                let strength = (0.25 + 0.1 * shared_tokens as f32).min(0.6);
                set.insert(a, b, ConnectionKind::NameSimilarity, strength);
            }
        }
    }
}

fn link_activity_neighbours(nodes: &[RepositoryNode], set: &mut ConnectionSet) {
    let mut order = (0..nodes.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        nodes[b]
            .last_activity()
            .cmp(&nodes[a].last_activity())
            .then_with(|| nodes[a].full_name.cmp(&nodes[b].full_name))
    });

    for pair in order.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let strength = 0.3 + 0.08 * nodes[from].radius.min(nodes[to].radius);
        set.insert(from, to, ConnectionKind::TemporalProximity, strength);
    }
}

/// Lower-cased alphanumeric runs longer than two characters.
pub fn name_tokens(name: &str) -> BTreeSet<String> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(str::to_ascii_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use proptest::prelude::*;

    use super::super::node::test_support::{record, reference_time};
    use super::super::palette::LanguagePalette;
    use super::*;

    fn node(id: u64, name: &str, language: Option<&str>, topics: &[&str]) -> RepositoryNode {
        let mut source = record(id, name);
        source.language = language.map(str::to_owned);
        source.topics = topics.iter().map(|topic| (*topic).to_owned()).collect();
        RepositoryNode::from_record(source, &LanguagePalette::github_defaults(), reference_time())
    }

    #[test]
    fn empty_and_single_node_sets_have_no_edges() {
        assert!(infer_connections(&[], 12).is_empty());
        assert!(infer_connections(&[node(1, "solo", Some("Rust"), &["x"])], 12).is_empty());
    }

    #[test]
    fn name_tokens_drop_short_and_symbol_fragments() {
        let tokens = name_tokens("My-Rust_CLI.v2-tools");
        assert_eq!(
            tokens.into_iter().collect::<Vec<_>>(),
            ["cli", "rust", "tools"]
        );
    }

    #[test]
    fn stronger_insert_overwrites_kind_and_strength() {
        let mut set = ConnectionSet::new(3, 12);
        assert_eq!(
            set.insert(0, 1, ConnectionKind::NameSimilarity, 0.35),
            InsertOutcome::Added
        );
        assert_eq!(
            set.insert(1, 0, ConnectionKind::SharedTopic, 0.52),
            InsertOutcome::Strengthened
        );
        assert_eq!(
            set.insert(0, 1, ConnectionKind::TemporalProximity, 0.4),
            InsertOutcome::Kept
        );

        let edge = set.get(1, 0).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(edge.kind, ConnectionKind::SharedTopic);
        assert!((edge.strength - 0.52).abs() < 1e-6);
        assert_eq!(set.degree(0), 1);
    }

    #[test]
    fn saturated_endpoint_rejects_new_pairs_but_allows_overwrites() {
        let mut set = ConnectionSet::new(4, 2);
        set.insert(0, 1, ConnectionKind::SameLanguage, 0.5);
        set.insert(0, 2, ConnectionKind::SameLanguage, 0.5);

        assert_eq!(
            set.insert(0, 3, ConnectionKind::SharedTopic, 0.9),
            InsertOutcome::Saturated
        );
        assert_eq!(
            set.insert(0, 1, ConnectionKind::SharedTopic, 0.9),
            InsertOutcome::Strengthened
        );
        assert_eq!(set.degree(0), 2);
        assert!(set.get(0, 3).is_none());
    }

    #[test]
    fn self_loops_and_bad_strengths_are_rejected() {
        let mut set = ConnectionSet::new(2, 12);
        assert_eq!(set.insert(1, 1, ConnectionKind::SharedTopic, 0.5), InsertOutcome::Rejected);
        assert_eq!(set.insert(0, 5, ConnectionKind::SharedTopic, 0.5), InsertOutcome::Rejected);
        assert_eq!(set.insert(0, 1, ConnectionKind::SharedTopic, f32::NAN), InsertOutcome::Rejected);
        assert_eq!(set.insert(0, 1, ConnectionKind::SharedTopic, 0.0), InsertOutcome::Rejected);
        assert_eq!(set.insert(0, 1, ConnectionKind::SharedTopic, 3.0), InsertOutcome::Added);
        assert_eq!(set.get(0, 1).unwrap().strength, 1.0);
    }

    #[test]
    fn typescript_pair_and_lone_go_repository() {
        let nodes = vec![
            node(1, "alpha", Some("TypeScript"), &["x"]),
            node(2, "beta", Some("TypeScript"), &["x"]),
            node(3, "gamma", Some("Go"), &[]),
        ];
        let set = infer_connections(&nodes, 12);

        // The smallest radius (0.6) already puts the ring edge above one shared topic (0.52).
        let language_strength = 0.45 + 0.12 * nodes[0].radius.min(nodes[1].radius);
        let ab = set.get(0, 1).unwrap();
        assert_eq!(ab.kind, ConnectionKind::SameLanguage);
        assert!((ab.strength - language_strength).abs() < 1e-6);
        assert!(ab.strength > 0.52);

        let c_edges = set.iter().filter(|edge| edge.touches(2)).collect::<Vec<_>>();
        assert!(
            c_edges
                .iter()
                .all(|edge| edge.kind == ConnectionKind::TemporalProximity)
        );
        // gamma has the oldest push time, so it trails beta in the activity order.
        assert_eq!(c_edges.len(), 1);
        assert!(set.get(1, 2).is_some());
    }

    #[test]
    fn two_shared_topics_overwrite_the_language_ring_edge() {
        let nodes = vec![
            node(1, "alpha", Some("Rust"), &["cli", "terminal"]),
            node(2, "beta", Some("Rust"), &["cli", "terminal"]),
        ];
        assert!((nodes[0].radius - 0.6).abs() < 1e-6);

        let set = infer_connections(&nodes, 12);
        let edge = set.get(0, 1).unwrap();

        // Ring edge at 0.522, replaced by the 0.64 topic edge; the later 0.348 activity edge loses.
        assert_eq!(set.len(), 1);
        assert_eq!(edge.kind, ConnectionKind::SharedTopic);
        assert!((edge.strength - 0.64).abs() < 1e-6);
    }

    #[test]
    fn languageless_repositories_form_their_own_ring() {
        let nodes = vec![
            node(1, "one", None, &[]),
            node(2, "two", None, &[]),
            node(3, "three", None, &[]),
        ];
        let set = infer_connections(&nodes, 12);

        for (a, b) in [(0, 1), (1, 2), (0, 2)] {
            assert!(set.get(a, b).is_some(), "missing ring edge {a}-{b}");
        }
    }

    #[test]
    fn shared_topic_skips_name_heuristic() {
        let nodes = vec![
            node(1, "rust-cli", Some("Rust"), &["cli", "terminal"]),
            node(2, "rust-web", Some("Go"), &["cli", "terminal"]),
        ];
        let set = infer_connections(&nodes, 12);
        let edge = set.get(0, 1).unwrap();

        assert_eq!(edge.kind, ConnectionKind::SharedTopic);
        assert!((edge.strength - 0.64).abs() < 1e-6);
    }

    #[test]
    fn inference_is_deterministic() {
        let nodes = (0..12)
            .map(|index| {
                let language = ["Rust", "Go", "Nix"][index % 3];
                node(index as u64, &format!("repo-{}-tool", index % 4), Some(language), &[])
            })
            .collect::<Vec<_>>();

        let first = infer_connections(&nodes, 12).into_vec();
        let second = infer_connections(&nodes, 12).into_vec();
        assert_eq!(first, second);
    }

    fn arbitrary_nodes() -> impl Strategy<Value = Vec<RepositoryNode>> {
        let language = prop::option::of(prop::sample::select(vec!["Rust", "Go", "Nix", "Lua"]));
        let topics = prop::collection::vec(prop::sample::select(vec!["cli", "web", "nix", "ml"]), 0..3);
        let name = prop::sample::select(vec!["core", "cli-core", "web-app", "app", "dotfiles", "nix-tools"]);
        prop::collection::vec((language, topics, name, 0u32..2000, 0i64..900), 0..60).prop_map(
            |specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(index, (language, topics, name, stars, age_days))| {
                        let mut source = record(index as u64, name);
                        source.full_name = format!("octocat/{name}-{index}");
                        source.language = language.map(str::to_owned);
                        source.topics = topics.into_iter().map(str::to_owned).collect();
                        source.stars = stars;
                        source.pushed_at = Some(reference_time() - Duration::days(age_days));
                        RepositoryNode::from_record(
                            source,
                            &LanguagePalette::github_defaults(),
                            reference_time(),
                        )
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn edges_are_unique_symmetric_and_capped(nodes in arbitrary_nodes()) {
            let cap = if nodes.len() > 40 { 10 } else { 12 };
            let set = infer_connections(&nodes, cap);
            let adjacency = set.adjacency();

            let mut seen = std::collections::HashSet::new();
            for edge in set.iter() {
                prop_assert!(edge.source < edge.target);
                prop_assert!(seen.insert((edge.source, edge.target)));
                prop_assert!(edge.strength > 0.0 && edge.strength <= 1.0);
                prop_assert!(adjacency[edge.source].contains(&edge.target));
                prop_assert!(adjacency[edge.target].contains(&edge.source));
            }

            for (index, neighbours) in adjacency.iter().enumerate() {
                prop_assert!(neighbours.len() <= cap);
                prop_assert_eq!(neighbours.len(), set.degree(index));
                for &other in neighbours {
                    prop_assert!(adjacency[other].contains(&index));
                }
            }
        }
    }
}

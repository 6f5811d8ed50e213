use std::collections::HashSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::network::RepoNetwork;
use crate::util::short_name;

use super::HighlightState;

/// Focused node plus its direct neighbours and every edge touching it.
pub(super) fn build_highlight_state(network: &RepoNetwork, focus: usize) -> Option<HighlightState> {
    if focus >= network.nodes().len() {
        return None;
    }

    let mut related_nodes = HashSet::new();
    let mut related_edges = HashSet::new();
    related_nodes.insert(focus);

    for connection in network.connections_of(focus) {
        related_edges.insert((connection.source, connection.target));
        if let Some(other) = connection.other(focus) {
            related_nodes.insert(other);
        }
    }

    Some(HighlightState {
        focus,
        related_nodes,
        related_edges,
    })
}

/// Indices of nodes whose name, language or topics fuzzy-match `query`.
pub(super) fn search_matches(network: &RepoNetwork, query: &str) -> HashSet<usize> {
    let query = query.trim();
    if query.is_empty() {
        return HashSet::new();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    network
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            matcher.fuzzy_match(short_name(&node.full_name), query).is_some()
                || node
                    .language
                    .as_deref()
                    .is_some_and(|language| matcher.fuzzy_match(language, query).is_some())
                || node
                    .topics
                    .iter()
                    .any(|topic| matcher.fuzzy_match(topic, query).is_some())
        })
        .map(|(index, _)| index)
        .collect()
}

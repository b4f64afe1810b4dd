//! Pattern trie over path segments.
//!
//! Patterns are `/`-separated sequences of literal segments and single
//! `*` wildcard segments. A lookup returns the value of the longest pattern
//! that is a prefix of the request path, with literal segments taking
//! precedence over wildcards at equal depth.

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::index::Route;

/// The routing trie. Maps path patterns to route records.
#[derive(Debug, Default)]
pub struct PatternTrie {
    root: Node,
}

/// A single node in the pattern trie.
#[derive(Debug, Default)]
struct Node {
    /// Literal children keyed by segment.
    literal: HashMap<String, Node>,
    /// Wildcard child (at most one per node). Matches exactly one segment.
    wildcard: Option<Box<Node>>,
    /// Route terminating at this node, if any.
    route: Option<Arc<Route>>,
}

impl PatternTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pattern into the trie. Last write wins for duplicate
    /// patterns.
    ///
    /// Returns the previous route when the pattern was already present.
    pub fn insert(&mut self, pattern: &str, route: Arc<Route>) -> Option<Arc<Route>> {
        let mut current = &mut self.root;
        for segment in split_segments(pattern) {
            current = if segment == "*" {
                current.wildcard.get_or_insert_with(Box::default)
            } else {
                current.literal.entry(segment.to_string()).or_default()
            };
        }
        current.route.replace(route)
    }

    /// Look up a request path, returning the route of the longest matching
    /// pattern prefix.
    pub fn lookup(&self, path: &str) -> Option<Arc<Route>> {
        let segments: Vec<&str> = split_segments(path).collect();
        longest_match(&self.root, &segments, 0)
            .map(|(route, _)| Arc::clone(route))
    }
}

/// Walk the trie, returning the deepest terminal route reachable by
/// consuming a prefix of `segments`, together with its pattern depth.
fn longest_match<'a>(
    node: &'a Node,
    segments: &[&str],
    depth: usize,
) -> Option<(&'a Arc<Route>, usize)> {
    let mut best = node.route.as_ref().map(|route| (route, depth));

    if let Some((first, rest)) = segments.split_first() {
        // Literal children first so they win ties against the wildcard.
        if let Some(child) = node.literal.get(*first) {
            keep_deeper(&mut best, longest_match(child, rest, depth + 1));
        }
        if let Some(child) = &node.wildcard {
            keep_deeper(&mut best, longest_match(child, rest, depth + 1));
        }
    }

    best
}

fn keep_deeper<'a>(
    best: &mut Option<(&'a Arc<Route>, usize)>,
    candidate: Option<(&'a Arc<Route>, usize)>,
) {
    if let Some((_, depth)) = candidate {
        if best.map_or(true, |(_, best_depth)| depth > best_depth) {
            *best = candidate;
        }
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str, pattern: &str) -> Arc<Route> {
        Arc::new(Route {
            name: name.to_string(),
            matched_path: pattern.to_string(),
            upstream: "http://backend:80".to_string(),
            aggregate_chunks: false,
        })
    }

    #[test]
    fn literal_pattern_matches_exact_path() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/items", route("items", "/v1/items"));

        let found = trie.lookup("/v1/items").expect("expected a match");
        assert_eq!(found.name, "items");
    }

    #[test]
    fn wildcard_matches_single_segment() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/*", route("api", "/v1/*"));

        assert_eq!(trie.lookup("/v1/items").unwrap().name, "api");
        assert_eq!(trie.lookup("/v1/users").unwrap().name, "api");
        assert!(trie.lookup("/v2/items").is_none());
    }

    #[test]
    fn longest_prefix_wins() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/*", route("api", "/v1/*"));
        trie.insert("/v1/items/special", route("special", "/v1/items/special"));

        assert_eq!(trie.lookup("/v1/items/special").unwrap().name, "special");
        assert_eq!(trie.lookup("/v1/items").unwrap().name, "api");
    }

    #[test]
    fn prefix_match_covers_deeper_paths() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/*", route("api", "/v1/*"));

        // The pattern is a prefix of the request path.
        assert_eq!(trie.lookup("/v1/items/42/detail").unwrap().name, "api");
    }

    #[test]
    fn literal_beats_wildcard_at_equal_depth() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/*", route("wild", "/v1/*"));
        trie.insert("/v1/items", route("items", "/v1/items"));

        assert_eq!(trie.lookup("/v1/items").unwrap().name, "items");
        assert_eq!(trie.lookup("/v1/other").unwrap().name, "wild");
    }

    #[test]
    fn miss_returns_none() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/*", route("api", "/v1/*"));

        assert!(trie.lookup("/other").is_none());
    }

    #[test]
    fn last_write_wins_for_duplicate_pattern() {
        let mut trie = PatternTrie::new();
        assert!(trie.insert("/v1/*", route("first", "/v1/*")).is_none());
        let previous = trie.insert("/v1/*", route("second", "/v1/*"));

        assert_eq!(previous.unwrap().name, "first");
        assert_eq!(trie.lookup("/v1/x").unwrap().name, "second");
    }

    #[test]
    fn pattern_matches_itself() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/*", route("api", "/v1/*"));
        trie.insert("/static/assets", route("assets", "/static/assets"));

        // The wildcard segment matches a literal `*` in the path.
        assert_eq!(trie.lookup("/v1/*").unwrap().name, "api");
        assert_eq!(trie.lookup("/static/assets").unwrap().name, "assets");
    }

    #[test]
    fn trailing_slash_does_not_add_a_segment() {
        let mut trie = PatternTrie::new();
        trie.insert("/v1/items", route("items", "/v1/items"));

        assert_eq!(trie.lookup("/v1/items/").unwrap().name, "items");
    }
}

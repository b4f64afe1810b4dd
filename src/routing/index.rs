//! Route records and the published route index.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::RouteConfig;
use crate::routing::trie::PatternTrie;

/// A resolved routing table entry. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Route tag, used in logs and `{{route.name}}`.
    pub name: String,

    /// The configured pattern that matched, as written.
    pub matched_path: String,

    /// Upstream origin URL template.
    pub upstream: String,

    /// Buffer chunked POST/PUT bodies before forwarding.
    pub aggregate_chunks: bool,
}

/// The pattern trie built from the configured routes.
///
/// Built once per snapshot and read-only afterwards; reload builds a fresh
/// index off to the side and publishes it with an atomic pointer swap, so
/// lookups never observe a partially-built table.
#[derive(Debug, Default)]
pub struct RouteIndex {
    trie: PatternTrie,
}

impl RouteIndex {
    /// Build an index from the configured routing table.
    ///
    /// Each pattern is normalized to carry exactly one leading `/`. Within
    /// one index a pattern maps to exactly one route; later writes win.
    pub fn build(routes: &BTreeMap<String, RouteConfig>) -> Self {
        let start = Instant::now();
        let mut trie = PatternTrie::new();

        for (name, entry) in routes {
            for path in &entry.paths {
                let route = Arc::new(Route {
                    name: name.clone(),
                    matched_path: path.clone(),
                    upstream: entry.upstream.clone(),
                    aggregate_chunks: entry.aggregate_chunked_requests,
                });

                trie.insert(&normalize_path(path), route);

                tracing::debug!(
                    route.name = %name,
                    route.path = %path,
                    route.upstream = %entry.upstream,
                    route.aggregate_chunked_requests = entry.aggregate_chunked_requests,
                    "Added route"
                );
            }
        }

        tracing::debug!(duration = ?start.elapsed(), "Route index loaded");
        Self { trie }
    }

    /// Look up the route for a request path.
    pub fn lookup(&self, path: &str) -> Option<Arc<Route>> {
        self.trie.lookup(path)
    }
}

/// Ensure a pattern carries exactly one leading `/`.
pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;

    fn table(entries: &[(&str, &[&str], &str)]) -> BTreeMap<String, RouteConfig> {
        entries
            .iter()
            .map(|(name, paths, upstream)| {
                (
                    name.to_string(),
                    RouteConfig {
                        paths: paths.iter().map(|p| p.to_string()).collect(),
                        upstream: upstream.to_string(),
                        aggregate_chunked_requests: false,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn normalize_adds_missing_leading_slash() {
        assert_eq!(normalize_path("v1/items"), "/v1/items");
        assert_eq!(normalize_path("/v1/items"), "/v1/items");
        assert_eq!(normalize_path("//v1"), "/v1");
        assert_eq!(normalize_path("*"), "/*");
    }

    #[test]
    fn build_and_lookup() {
        let index = RouteIndex::build(&table(&[
            ("api", &["/v1/*"], "http://backend:80"),
            ("assets", &["/static/*", "/favicon.ico"], "http://cdn:80"),
        ]));

        assert_eq!(index.lookup("/v1/items").unwrap().name, "api");
        assert_eq!(index.lookup("/static/app.css").unwrap().name, "assets");
        assert_eq!(index.lookup("/favicon.ico").unwrap().name, "assets");
        assert!(index.lookup("/admin").is_none());
    }

    #[test]
    fn every_inserted_pattern_looks_itself_up() {
        let index = RouteIndex::build(&table(&[
            ("api", &["/v1/*", "/v2/items"], "http://backend:80"),
            ("root", &["/health"], "http://backend:81"),
        ]));

        for pattern in ["/v1/*", "/v2/items", "/health"] {
            let found = index.lookup(pattern).expect("pattern should match itself");
            assert_eq!(found.matched_path, pattern);
        }
    }

    #[test]
    fn route_record_carries_flags() {
        let mut routes = table(&[("upload", &["/upload/*"], "http://files:80")]);
        routes.get_mut("upload").unwrap().aggregate_chunked_requests = true;

        let index = RouteIndex::build(&routes);
        let route = index.lookup("/upload/video").unwrap();
        assert!(route.aggregate_chunks);
        assert_eq!(route.matched_path, "/upload/*");
        assert_eq!(route.upstream, "http://files:80");
    }

    #[test]
    fn missing_leading_slash_in_pattern_still_matches() {
        let index = RouteIndex::build(&table(&[("api", &["v1/*"], "http://backend:80")]));
        assert_eq!(index.lookup("/v1/items").unwrap().name, "api");
    }
}

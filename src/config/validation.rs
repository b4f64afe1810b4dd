//! Configuration validation logic.

use std::net::IpAddr;

use crate::config::schema::ConfigSnapshot;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a decoded snapshot for semantic correctness.
pub fn validate_config(config: &ConfigSnapshot) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 1. Routes need at least one pattern and an upstream template.
    for (name, route) in &config.routes {
        if route.paths.is_empty() {
            errors.push(ValidationError(format!(
                "Route '{}' has no path patterns",
                name
            )));
        }
        if route.upstream.is_empty() {
            errors.push(ValidationError(format!(
                "Route '{}' has no upstream",
                name
            )));
        }
    }

    // 2. DNS resolvers must be IP literals (queried over UDP, not resolved).
    for resolver in &config.dns.resolvers {
        if resolver.parse::<IpAddr>().is_err() {
            errors.push(ValidationError(format!(
                "dns.resolvers entry '{}' is not an IP literal",
                resolver
            )));
        }
    }

    // 3. Error pages need real status codes.
    for (section, page) in [
        ("response.not_found", &config.response.not_found),
        ("response.server_error", &config.response.server_error),
    ] {
        if !(100..=599).contains(&page.code) {
            errors.push(ValidationError(format!(
                "{}.code {} is not a valid status code",
                section, page.code
            )));
        }
    }

    // 4. TLS needs both halves of the key material.
    if config.server.tls.enabled
        && (config.server.tls.cert.is_empty() || config.server.tls.key.is_empty())
    {
        errors.push(ValidationError(
            "server.tls.enabled requires server.tls.cert and server.tls.key".to_string(),
        ));
    }

    if config.network.timeouts.connect == 0 {
        tracing::warn!("network.timeouts.connect is 0, upstream dials will not time out");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::*;

    #[test]
    fn test_valid_config() {
        let mut config = ConfigSnapshot::default();
        config.routes.insert(
            "api".into(),
            RouteConfig {
                paths: vec!["/v1/*".into()],
                upstream: "http://backend:80".into(),
                aggregate_chunked_requests: false,
            },
        );

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_route_without_paths() {
        let mut config = ConfigSnapshot::default();
        config.routes.insert(
            "api".into(),
            RouteConfig {
                paths: vec![],
                upstream: "http://backend:80".into(),
                aggregate_chunked_requests: false,
            },
        );

        let errs = validate_config(&config).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].0.contains("'api' has no path patterns"));
    }

    #[test]
    fn test_non_ip_resolver() {
        let mut config = ConfigSnapshot::default();
        config.dns.resolvers = vec!["10.0.0.1".into(), "ns1.example.com".into()];

        let errs = validate_config(&config).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].0.contains("ns1.example.com"));
    }

    #[test]
    fn test_tls_requires_material() {
        let mut config = ConfigSnapshot::default();
        config.server.tls.enabled = true;

        let errs = validate_config(&config).unwrap_err();
        assert!(errs[0].0.contains("server.tls"));
    }

    #[test]
    fn test_bad_error_page_code() {
        let mut config = ConfigSnapshot::default();
        config.response.not_found.code = 99;

        let errs = validate_config(&config).unwrap_err();
        assert!(errs[0].0.contains("response.not_found"));
    }
}

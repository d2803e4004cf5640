// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Maps a request's target environment to a broker service URL.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use std::collections::HashMap;

/// Request header naming the target environment.
pub const ENVIRONMENT_HEADER: &str = "environment";

/// A resolved broker environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    pub name: String,
    pub service_url: String,
}

/// Environment table built from the configuration.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentResolver {
    environments: HashMap<String, String>,
    default: Option<String>,
}

impl EnvironmentResolver {
    pub fn new(default: Option<String>) -> Self {
        Self {
            environments: HashMap::new(),
            default,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut resolver = Self::new(config.default_environment.clone());
        for env in &config.environments {
            resolver.insert(&env.name, &env.service_url);
        }
        resolver
    }

    pub fn insert(&mut self, name: impl Into<String>, service_url: impl Into<String>) {
        self.environments.insert(name.into(), service_url.into());
    }

    /// Resolve the requested environment, or the default when none is given.
    pub fn resolve(&self, requested: Option<&str>) -> Result<ResolvedEnvironment, GatewayError> {
        let name = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name,
            None => self.default.as_deref().ok_or_else(|| {
                GatewayError::validation(format!(
                    "no '{}' header and no default environment configured",
                    ENVIRONMENT_HEADER
                ))
            })?,
        };

        let service_url = self
            .environments
            .get(name)
            .ok_or_else(|| GatewayError::validation(format!("unknown environment '{}'", name)))?;

        Ok(ResolvedEnvironment {
            name: name.to_string(),
            service_url: service_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> EnvironmentResolver {
        let mut r = EnvironmentResolver::new(Some("prod".into()));
        r.insert("prod", "http://prod:8080");
        r.insert("staging", "http://staging:8080");
        r
    }

    #[test]
    fn test_resolve_by_header() {
        let env = resolver().resolve(Some("staging")).unwrap();
        assert_eq!(env.name, "staging");
        assert_eq!(env.service_url, "http://staging:8080");
    }

    #[test]
    fn test_resolve_default() {
        assert_eq!(resolver().resolve(None).unwrap().name, "prod");
        assert_eq!(resolver().resolve(Some("  ")).unwrap().name, "prod");
    }

    #[test]
    fn test_unknown_environment() {
        let err = resolver().resolve(Some("qa")).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(err.to_string().contains("qa"));
    }

    #[test]
    fn test_no_header_and_no_default() {
        let mut r = EnvironmentResolver::new(None);
        r.insert("prod", "http://prod:8080");
        assert!(matches!(r.resolve(None), Err(GatewayError::Validation(_))));
    }

    #[test]
    fn test_from_config() {
        let r = EnvironmentResolver::from_config(&GatewayConfig::example());
        assert_eq!(
            r.resolve(None).unwrap().service_url,
            "http://127.0.0.1:8080"
        );
    }
}

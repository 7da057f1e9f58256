//! Resource policy registry
//!
//! An ordered list of `(matcher, required level, allow_anonymous)` entries.
//! The first entry whose matcher accepts a path governs it; paths no entry
//! accepts are not gated at all.

use crate::{ApplicationError, ApplicationResult};
use gatekeeper_core::{AccessLevel, MatcherConfig, PolicyConfig};
use std::collections::HashSet;

/// Decides whether a request path belongs to a policy
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Case-insensitive equality against a fixed set, stored lower-cased
    Exact(HashSet<String>),
    /// Case-sensitive glob
    Glob(glob::Pattern),
    /// Case-sensitive prefix
    Prefix(String),
}

impl PathMatcher {
    pub fn exact<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PathMatcher::Exact(
            paths
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        )
    }

    pub fn glob(pattern: &str) -> ApplicationResult<Self> {
        glob::Pattern::new(pattern)
            .map(PathMatcher::Glob)
            .map_err(|e| ApplicationError::config(format!("Invalid glob '{}': {}", pattern, e)))
    }

    pub fn prefix<S: Into<String>>(prefix: S) -> Self {
        PathMatcher::Prefix(prefix.into())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(paths) => paths.contains(&path.to_lowercase()),
            PathMatcher::Glob(pattern) => pattern.matches_with(
                path,
                glob::MatchOptions {
                    case_sensitive: true,
                    require_literal_separator: true,
                    require_literal_leading_dot: false,
                },
            ),
            PathMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// One registry entry
#[derive(Debug, Clone)]
pub struct ResourcePolicy {
    pub name: String,
    pub matcher: PathMatcher,
    pub required: AccessLevel,
    /// An absent or expired session still counts as `Level0` here
    pub allow_anonymous: bool,
}

impl ResourcePolicy {
    pub fn new<S: Into<String>>(name: S, matcher: PathMatcher, required: AccessLevel) -> Self {
        Self {
            name: name.into(),
            matcher,
            required,
            allow_anonymous: false,
        }
    }

    pub fn allowing_anonymous(mut self) -> Self {
        self.allow_anonymous = true;
        self
    }
}

/// Ordered policy list, immutable once built
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: Vec<ResourcePolicy>,
}

impl PolicyRegistry {
    pub fn new(policies: Vec<ResourcePolicy>) -> Self {
        Self { policies }
    }

    /// Build from configuration.
    ///
    /// `static_dir` matchers must be resolved beforehand; `resolve_dir` maps
    /// each directory name to the request paths of the files beneath it.
    pub fn from_config<F>(configs: &[PolicyConfig], mut resolve_dir: F) -> ApplicationResult<Self>
    where
        F: FnMut(&str) -> ApplicationResult<Vec<String>>,
    {
        let mut policies = Vec::with_capacity(configs.len());
        for config in configs {
            let matcher = match &config.matcher {
                MatcherConfig::Paths { paths } => PathMatcher::exact(paths),
                MatcherConfig::StaticDir { dir } => PathMatcher::exact(resolve_dir(dir)?),
                MatcherConfig::Glob { pattern } => PathMatcher::glob(pattern)?,
                MatcherConfig::Prefix { prefix } => PathMatcher::prefix(prefix.clone()),
            };
            policies.push(ResourcePolicy {
                name: config.name.clone(),
                matcher,
                required: config.required,
                allow_anonymous: config.allow_anonymous,
            });
        }
        Ok(Self::new(policies))
    }

    /// First policy governing `path`, if any
    pub fn match_for(&self, path: &str) -> Option<&ResourcePolicy> {
        self.policies.iter().find(|p| p.matcher.matches(path))
    }

    pub fn policies(&self) -> &[ResourcePolicy] {
        &self.policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PolicyRegistry {
        PolicyRegistry::new(vec![
            ResourcePolicy::new(
                "public",
                PathMatcher::exact(["/public/index.html", "/public/css/site.css"]),
                AccessLevel::Level0,
            )
            .allowing_anonymous(),
            ResourcePolicy::new(
                "level1",
                PathMatcher::glob("/Level1/**").unwrap(),
                AccessLevel::Level1,
            ),
            ResourcePolicy::new("level2", PathMatcher::prefix("/Level2/"), AccessLevel::Level2),
            ResourcePolicy::new("catch-all", PathMatcher::prefix("/"), AccessLevel::Level2),
        ])
    }

    #[test]
    fn test_exact_matching_ignores_case() {
        let registry = registry();
        let policy = registry.match_for("/PUBLIC/Index.HTML").unwrap();
        assert_eq!(policy.name, "public");
        assert!(policy.allow_anonymous);
    }

    #[test]
    fn test_glob_is_case_sensitive() {
        let registry = registry();
        assert_eq!(
            registry.match_for("/Level1/low/access.html").unwrap().name,
            "level1"
        );
        assert_eq!(
            registry.match_for("/level1/low/access.html").unwrap().name,
            "catch-all"
        );
    }

    #[test]
    fn test_first_match_wins() {
        let registry = registry();
        assert_eq!(registry.match_for("/Level2/high_access.html").unwrap().name, "level2");
        assert_eq!(registry.match_for("/anything").unwrap().name, "catch-all");
    }

    #[test]
    fn test_unmatched_path_is_ungoverned() {
        let registry = PolicyRegistry::new(vec![ResourcePolicy::new(
            "level1",
            PathMatcher::glob("/Level1/**").unwrap(),
            AccessLevel::Level1,
        )]);
        assert!(registry.match_for("/home").is_none());
    }

    #[test]
    fn test_from_config_resolves_static_dirs() {
        let config = gatekeeper_core::GatekeeperConfig::default();
        let registry = PolicyRegistry::from_config(&config.policies, |dir| {
            assert_eq!(dir, "public");
            Ok(vec!["/public/index.html".to_string()])
        })
        .unwrap();

        assert_eq!(registry.policies().len(), 3);
        assert_eq!(registry.match_for("/public/index.html").unwrap().name, "public");
        assert_eq!(
            registry.match_for("/Level2/high_access.html").unwrap().required,
            AccessLevel::Level2
        );
    }
}

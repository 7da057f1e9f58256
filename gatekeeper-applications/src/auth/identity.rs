//! Identity provider contract

use async_trait::async_trait;
use gatekeeper_core::{AccessLevel, Principal};
use std::collections::HashMap;

/// Verifies credentials and reports the authenticated principal.
///
/// The username may carry the requested tier, e.g. `"1#bob"`; how it is
/// interpreted is up to the provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when the credentials are not accepted
    async fn authenticate(&self, username: &str, password: &str) -> Option<Principal>;
}

/// Split a `"<level>#<name>"` username into its parts
pub fn split_level_username(username: &str) -> Option<(AccessLevel, &str)> {
    let (level, name) = username.split_once('#')?;
    if name.is_empty() {
        return None;
    }
    Some((AccessLevel::find(level)?, name))
}

/// Provider over a fixed in-memory table of plain-text credentials.
///
/// Intended for tests and embedding; the web crate ships an argon2-backed one.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, (String, AccessLevel)>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, name: &str, password: &str, max_level: AccessLevel) -> Self {
        self.users
            .insert(name.to_string(), (password.to_string(), max_level));
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn authenticate(&self, username: &str, password: &str) -> Option<Principal> {
        let (level, name) = split_level_username(username)?;
        let (expected, max_level) = self.users.get(name)?;
        if expected != password || level > *max_level {
            return None;
        }
        Some(Principal::new(name, level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_level_username() {
        assert_eq!(
            split_level_username("1#bob"),
            Some((AccessLevel::Level1, "bob"))
        );
        assert_eq!(split_level_username("bob"), None);
        assert_eq!(split_level_username("7#bob"), None);
        assert_eq!(split_level_username("1#"), None);
    }

    #[tokio::test]
    async fn test_static_provider_enforces_max_level() {
        let provider = StaticIdentityProvider::new().with_user("bob", "12341", AccessLevel::Level1);

        let principal = provider.authenticate("1#bob", "12341").await.unwrap();
        assert_eq!(principal, Principal::new("bob", AccessLevel::Level1));

        assert!(provider.authenticate("2#bob", "12341").await.is_none());
        assert!(provider.authenticate("1#bob", "wrong").await.is_none());
        assert!(provider.authenticate("1#eve", "12341").await.is_none());
    }
}

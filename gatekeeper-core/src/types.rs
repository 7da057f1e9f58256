//! Core data types: access tiers, principals and session records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization tier attached to a session.
///
/// Tiers are totally ordered: `Level0 < Level1 < Level2`. `Level0` is the tier
/// every anonymous session carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum AccessLevel {
    #[default]
    Level0,
    Level1,
    Level2,
}

impl AccessLevel {
    /// All tiers, lowest first
    pub const ALL: [AccessLevel; 3] = [AccessLevel::Level0, AccessLevel::Level1, AccessLevel::Level2];

    /// The tier granted to anonymous sessions
    pub fn lowest() -> Self {
        AccessLevel::Level0
    }

    /// Numeric rank of this tier
    pub fn rank(&self) -> u8 {
        match self {
            AccessLevel::Level0 => 0,
            AccessLevel::Level1 => 1,
            AccessLevel::Level2 => 2,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.rank() == rank)
    }

    /// Look a tier up by its numeric rank (`"1"` -> `Level1`)
    pub fn find(rank: &str) -> Option<Self> {
        Self::from_rank(rank.trim().parse().ok()?)
    }

    /// True when `held` is not enough to satisfy `self` as a requirement.
    ///
    /// An absent held level never satisfies a requirement.
    pub fn exceeds(&self, held: Option<AccessLevel>) -> bool {
        match held {
            None => true,
            Some(held) => *self > held,
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessLevel::Level0 => write!(f, "Level0"),
            AccessLevel::Level1 => write!(f, "Level1"),
            AccessLevel::Level2 => write!(f, "Level2"),
        }
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "level0" => Ok(AccessLevel::Level0),
            "level1" => Ok(AccessLevel::Level1),
            "level2" => Ok(AccessLevel::Level2),
            other => AccessLevel::find(other).ok_or_else(|| format!("Unknown access level: {}", s)),
        }
    }
}

/// An authenticated caller as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque user identifier
    pub id: String,
    /// Tier the caller authenticated at
    pub level: AccessLevel,
}

impl Principal {
    pub fn new<S: Into<String>>(id: S, level: AccessLevel) -> Self {
        Self {
            id: id.into(),
            level,
        }
    }
}

/// A persisted session row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque random token, unique across the store
    pub token: String,
    /// Bound principal, `None` for anonymous sessions
    pub principal_id: Option<String>,
    /// Tier granted to this session
    pub grant: AccessLevel,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create an anonymous session at the lowest tier
    pub fn anonymous(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            principal_id: None,
            grant: AccessLevel::lowest(),
            expires_at,
        }
    }

    /// Check whether the session has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Seconds left before expiry, rounded up so a live session never
    /// reports zero; zero once expired
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        let left = self.expires_at - now;
        if left <= chrono::Duration::zero() {
            return 0;
        }
        let whole = left.num_seconds();
        if left > chrono::Duration::seconds(whole) {
            whole + 1
        } else {
            whole
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.principal_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_exceeds_matches_ordering_for_every_pair() {
        for required in AccessLevel::ALL {
            assert!(required.exceeds(None), "{} vs absent", required);
            for held in AccessLevel::ALL {
                assert_eq!(
                    required.exceeds(Some(held)),
                    held < required,
                    "required {} held {}",
                    required,
                    held
                );
            }
        }
    }

    #[test]
    fn test_find_by_rank() {
        assert_eq!(AccessLevel::find("0"), Some(AccessLevel::Level0));
        assert_eq!(AccessLevel::find("2"), Some(AccessLevel::Level2));
        assert_eq!(AccessLevel::find("3"), None);
        assert_eq!(AccessLevel::find("x"), None);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Level1".parse::<AccessLevel>(), Ok(AccessLevel::Level1));
        assert_eq!("level2".parse::<AccessLevel>(), Ok(AccessLevel::Level2));
        assert_eq!("0".parse::<AccessLevel>(), Ok(AccessLevel::Level0));
        assert!("admin".parse::<AccessLevel>().is_err());
        assert_eq!(AccessLevel::Level2.to_string(), "Level2");
    }

    #[test]
    fn test_session_expiry_boundary() {
        let now = Utc::now();
        let session = Session::anonymous("abc".to_string(), now + Duration::seconds(10));

        assert!(session.is_anonymous());
        assert_eq!(session.grant, AccessLevel::Level0);
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::seconds(10)));
        assert_eq!(session.remaining_seconds(now), 10);
        assert_eq!(session.remaining_seconds(now + Duration::seconds(30)), 0);
    }

    #[test]
    fn test_remaining_seconds_rounds_up_partial_seconds() {
        let now = Utc::now();
        let session = Session::anonymous("T".to_string(), now + Duration::seconds(10));

        assert_eq!(
            session.remaining_seconds(now + Duration::milliseconds(9_500)),
            1
        );
        assert_eq!(
            session.remaining_seconds(now + Duration::milliseconds(9_999)),
            1
        );
        assert_eq!(
            session.remaining_seconds(now + Duration::milliseconds(500)),
            10
        );
        assert_eq!(session.remaining_seconds(now + Duration::seconds(10)), 0);
    }
}

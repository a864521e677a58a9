//! Role based access decisions
//!
//! Authorities are plain role names. The admin role passes every check.

use crate::error::{ClumanError, Result};
use serde::{Deserialize, Serialize};

/// Authority granting everything
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

/// Authority for read-only cluster queries
pub const CLUSTER_READ_ROLE: &str = "ROLE_CLUSTER_READ";

/// Prefix marking an attribute as a role requirement
pub const ROLE_PREFIX: &str = "ROLE_";

/// Outcome of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Granted,
    Denied,
    /// None of the required attributes are roles
    Abstain,
}

/// Grants when the caller holds any of the required roles
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleVoter;

impl RoleVoter {
    pub fn new() -> Self {
        Self
    }

    /// Vote on `required` given the caller's `authorities`
    pub fn vote<A: AsRef<str>>(&self, authorities: &[A], required: &[&str]) -> Vote {
        if authorities.iter().any(|a| a.as_ref() == ADMIN_ROLE) {
            return Vote::Granted;
        }

        let mut vote = Vote::Abstain;
        for attribute in required.iter().filter(|r| r.starts_with(ROLE_PREFIX)) {
            if authorities.iter().any(|a| a.as_ref() == *attribute) {
                return Vote::Granted;
            }
            vote = Vote::Denied;
        }
        vote
    }

    /// Fail with `AccessDenied` unless the vote grants access
    pub fn require<A: AsRef<str>>(&self, authorities: &[A], required: &[&str]) -> Result<()> {
        match self.vote(authorities, required) {
            Vote::Granted => Ok(()),
            Vote::Denied | Vote::Abstain => Err(ClumanError::AccessDenied(format!(
                "requires one of: {}",
                required.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_always_granted() {
        let voter = RoleVoter::new();
        assert_eq!(voter.vote(&[ADMIN_ROLE], &["ROLE_SOMETHING_ELSE"]), Vote::Granted);
        assert_eq!(voter.vote(&[ADMIN_ROLE], &[]), Vote::Granted);
        assert!(voter.require(&[ADMIN_ROLE], &[CLUSTER_READ_ROLE]).is_ok());
    }

    #[test]
    fn test_matching_role() {
        let voter = RoleVoter::new();
        let authorities = vec!["ROLE_USER".to_string(), CLUSTER_READ_ROLE.to_string()];
        assert_eq!(voter.vote(&authorities[..], &[CLUSTER_READ_ROLE]), Vote::Granted);
    }

    #[test]
    fn test_missing_role_denied() {
        let voter = RoleVoter::new();
        assert_eq!(voter.vote(&["ROLE_USER"], &[CLUSTER_READ_ROLE]), Vote::Denied);
        let empty: [&str; 0] = [];
        assert!(matches!(
            voter.require(&empty, &[CLUSTER_READ_ROLE]),
            Err(ClumanError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_non_role_attributes_abstain() {
        let voter = RoleVoter::new();
        assert_eq!(voter.vote(&["ROLE_USER"], &["IS_AUTHENTICATED"]), Vote::Abstain);
        assert!(voter.require(&["ROLE_USER"], &["IS_AUTHENTICATED"]).is_err());
    }
}

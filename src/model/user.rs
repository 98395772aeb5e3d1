//! User identity and the scope key that namespaces everything a user owns.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The person whose data is being read or written.
///
/// `email` is the durable key. `display_name` is cosmetic and may change on re-sign-in.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserIdentity {
    pub(crate) email: String,
    #[serde(default, alias = "displayName", alias = "name")]
    pub(crate) display_name: String,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            display_name: display_name.into().trim().to_string(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// True when `other` names the same person. Emails are compared without regard to case,
    /// matching the way the scope key folds case.
    pub fn is_email(&self, other: &str) -> bool {
        self.email.eq_ignore_ascii_case(other.trim())
    }
}

/// A key-safe identifier derived from an email.
///
/// The email is lower-cased and every character outside `[a-zA-Z0-9._-]` becomes `_`. Applying
/// the normalization to an existing scope key gives the same key back.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ScopeKey(String);

impl ScopeKey {
    pub fn new(email: &str) -> Self {
        Self(normalize(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ScopeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScopeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lower-cases `s` and replaces every character outside `[a-zA-Z0-9._-]` with `_`.
pub fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

/// The identity and scope that every ledger call runs under.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserContext {
    identity: UserIdentity,
    scope: ScopeKey,
}

impl UserContext {
    pub fn new(identity: UserIdentity) -> Self {
        let scope = ScopeKey::new(identity.email());
        Self { identity, scope }
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn email(&self) -> &str {
        self.identity.email()
    }

    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }
}

impl From<UserIdentity> for UserContext {
    fn from(identity: UserIdentity) -> Self {
        UserContext::new(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Alice.Smith+club@Example.com"), "alice.smith_club_example.com");
        assert_eq!(normalize("bob_o-neil@x.io"), "bob_o-neil_x.io");
        assert_eq!(normalize("  sp ace@x"), "__sp_ace_x");
    }

    #[test]
    fn test_normalize_non_ascii() {
        // Each non-ASCII character becomes exactly one underscore.
        assert_eq!(normalize("zoë@café.fr"), "zo__caf_.fr");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "Alice@Example.com",
            "weird!#$%^&*()chars@@",
            "ÄÖÜ@umlaut.de",
            "already_normal.key-1",
            "tab\tand\nnewline",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_context_scope() {
        let ctx = UserContext::new(UserIdentity::new(" Treasurer@Club.org ", "T"));
        assert_eq!(ctx.email(), "Treasurer@Club.org");
        assert_eq!(ctx.scope().as_str(), "treasurer_club.org");
    }

    #[test]
    fn test_is_email() {
        let user = UserIdentity::new("a@b.com", "");
        assert!(user.is_email("A@B.com"));
        assert!(!user.is_email("c@b.com"));
    }
}

//! Username rules and recipient list helpers.
//!
//! Usernames travel as single whitespace-delimited tokens inside the wire
//! frames, so the only hard rules are that a name is non-empty and contains
//! no whitespace.

use std::collections::HashSet;

use thiserror::Error;

/// Reasons a username is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    /// The username is empty.
    #[error("username must not be empty")]
    Empty,

    /// The username contains whitespace and would split into several tokens.
    #[error("username must not contain whitespace: {0:?}")]
    Whitespace(String),
}

/// Checks that `name` can be carried as a single token.
pub fn validate_username(name: &str) -> Result<(), UsernameError> {
    if name.is_empty() {
        return Err(UsernameError::Empty);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(UsernameError::Whitespace(name.to_string()));
    }
    Ok(())
}

/// Removes repeated names, keeping the first occurrence of each.
///
/// ```
/// use udpchat_core::dedup_preserving_order;
///
/// let names = dedup_preserving_order(["bob", "bob", "carol", "bob"]);
/// assert_eq!(names, vec!["bob", "carol"]);
/// ```
pub fn dedup_preserving_order<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let name = name.as_ref();
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_42").is_ok());
    }

    #[test]
    fn empty_username_rejected() {
        assert_eq!(validate_username(""), Err(UsernameError::Empty));
    }

    #[test]
    fn whitespace_username_rejected() {
        assert!(matches!(
            validate_username("al ice"),
            Err(UsernameError::Whitespace(_))
        ));
        assert!(matches!(
            validate_username("tab\there"),
            Err(UsernameError::Whitespace(_))
        ));
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let names = dedup_preserving_order(["carol", "bob", "carol", "alice", "bob"]);
        assert_eq!(names, vec!["carol", "bob", "alice"]);
    }

    #[test]
    fn dedup_of_unique_list_is_identity() {
        let names = dedup_preserving_order(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn dedup_is_case_sensitive() {
        let names = dedup_preserving_order(["Bob", "bob"]);
        assert_eq!(names, vec!["Bob", "bob"]);
    }
}

//! Newtypes for values that are easy to mix up at call sites.

use std::fmt;

/// Thread ID as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tid(pub u32);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// Process selection rule: a process name pattern or a decimal PID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule(String);

impl Rule {
    pub fn new(rule: impl Into<String>) -> Self {
        Self(rule.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the rule names a PID rather than a process name.
    #[must_use]
    pub fn is_pid(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl From<&str> for Rule {
    fn from(rule: &str) -> Self {
        Self::new(rule)
    }
}

impl From<String> for Rule {
    fn from(rule: String) -> Self {
        Self(rule)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_is_pid() {
        assert!(Rule::from("1234").is_pid());
        assert!(!Rule::from("livetrace.exe").is_pid());
        assert!(!Rule::from("").is_pid());
    }

    #[test]
    fn test_tid_display() {
        assert_eq!(Tid(7).to_string(), "TID:7");
    }
}

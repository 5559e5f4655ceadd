use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, str::FromStr};

/// Identity of a user as stored by the session collaborator.
///
/// Stored records carry either numeric or string ids; both are accepted and
/// written back in the form they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for UserId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl FromStr for UserId {
    type Err = Infallible;

    /// Digits become a numeric id, anything else stays text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Number))
    }
}

/// The acting identity: who creates tickets and owns comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role: None,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Role label for display, `"User"` when none was recorded.
    #[must_use]
    pub fn role_label(&self) -> &str {
        self.role.as_deref().unwrap_or("User")
    }
}

/// Authorship stamp copied onto records at creation time.
///
/// An absent current user produces an anonymous stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub id: Option<UserId>,
    pub username: Option<String>,
    pub role: Option<String>,
}

impl From<Option<&CurrentUser>> for Author {
    fn from(user: Option<&CurrentUser>) -> Self {
        user.map_or_else(Self::default, |u| Self {
            id: Some(u.id.clone()),
            username: Some(u.username.clone()),
            role: u.role.clone(),
        })
    }
}

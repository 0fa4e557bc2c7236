use serde::{Deserialize, Serialize};
use std::fmt;

/// What a signed token may be used for. Carried in the `scope` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    AccessToken,
    RefreshToken,
    EmailToken,
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::EmailToken => "email_token",
        };
        f.write_str(name)
    }
}

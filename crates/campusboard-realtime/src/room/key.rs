//! Typed room keys.

use std::fmt;
use std::str::FromStr;

use campusboard_core::error::AppError;
use campusboard_core::types::id::{NoticeId, UserId};

/// A membership key. Targeted sends reach only connections joined to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKey {
    /// Personal room of one user, `user:<id>`.
    User(UserId),
    /// Viewers of one notice, `notice:<id>`.
    Notice(NoticeId),
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Notice(id) => write!(f, "notice:{id}"),
        }
    }
}

impl FromStr for RoomKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid room key: '{s}'"));
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        match kind {
            "user" => id.parse().map(Self::User).map_err(|_| invalid()),
            "notice" => id.parse().map(Self::Notice).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let user = UserId::new();
        let key = RoomKey::User(user);
        assert_eq!(key.to_string(), format!("user:{user}"));
        assert_eq!(key.to_string().parse::<RoomKey>().unwrap(), key);

        let notice = RoomKey::Notice(NoticeId::new());
        assert_eq!(notice.to_string().parse::<RoomKey>().unwrap(), notice);
    }

    #[test]
    fn test_rejects_free_form_strings() {
        assert!("user-42".parse::<RoomKey>().is_err());
        assert!("notice:42".parse::<RoomKey>().is_err());
        assert!("channel:00000000-0000-0000-0000-000000000000".parse::<RoomKey>().is_err());
    }
}

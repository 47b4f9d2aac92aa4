//! Data types exchanged with the SpamWatch API.
//!
//! # Design
//! These mirror the server's JSON shapes and are defined independently from
//! the mock-server crate; the integration tests catch schema drift. User ids
//! are Telegram ids, which exceed `i32`, so every id is an `i64`.
//!
//! Response types keep fields they do not model in `extra`, so a record
//! serializes back to the body the server sent. Token fields other than `id`
//! are optional because listings may omit them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Privilege tier of a token. Variants are declared from lowest to highest so
/// the derived ordering matches the server's ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    User,
    Admin,
    Root,
}

/// An API credential issued to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<i64>,
    #[serde(default)]
    pub retired: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A banned user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ban {
    #[serde(rename = "id")]
    pub user_id: i64,
    pub reason: String,
    /// Id of the token that issued the ban.
    pub admin: i64,
    /// Unix timestamp, seconds.
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for `POST banlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBan {
    #[serde(rename = "id")]
    pub user_id: i64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AddBan {
    pub fn new(user_id: i64, reason: impl Into<String>) -> Self {
        Self {
            user_id,
            reason: reason.into(),
            message: None,
        }
    }

    /// Attach the offending message text to the ban.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Payload for `POST tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateToken {
    #[serde(rename = "id")]
    pub user_id: i64,
    pub permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_ban_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_ranks_root_highest() {
        assert!(Permission::Root > Permission::Admin);
        assert!(Permission::Admin > Permission::User);
        assert_eq!(
            [Permission::Root, Permission::User, Permission::Admin]
                .into_iter()
                .max(),
            Some(Permission::Root)
        );
    }

    #[test]
    fn permission_uses_capitalized_names() {
        assert_eq!(serde_json::to_string(&Permission::Admin).unwrap(), r#""Admin""#);
        let p: Permission = serde_json::from_str(r#""Root""#).unwrap();
        assert_eq!(p, Permission::Root);
        assert!(serde_json::from_str::<Permission>(r#""root""#).is_err());
    }

    #[test]
    fn ban_reads_id_as_user_id() {
        let ban: Ban = serde_json::from_str(
            r#"{"id":777000,"reason":"spam","admin":1,"date":1577836800}"#,
        )
        .unwrap();
        assert_eq!(ban.user_id, 777000);
        assert!(ban.message.is_none());
    }

    #[test]
    fn add_ban_omits_missing_message() {
        let body = serde_json::to_value(AddBan::new(42, "spam")).unwrap();
        assert_eq!(body, serde_json::json!({"id": 42, "reason": "spam"}));

        let body = serde_json::to_value(AddBan::new(42, "spam").with_message("buy now")).unwrap();
        assert_eq!(body["message"], "buy now");
    }

    #[test]
    fn token_retired_defaults_to_false() {
        let token: Token = serde_json::from_str(
            r#"{"id":3,"permission":"User","token":"abc","userid":99}"#,
        )
        .unwrap();
        assert!(!token.retired);
        assert_eq!(token.permission, Some(Permission::User));
        assert_eq!(token.token.as_deref(), Some("abc"));
    }

    #[test]
    fn partial_token_round_trips() {
        let raw = serde_json::json!({"id": 2, "retired": false});
        let token: Token = serde_json::from_value(raw.clone()).unwrap();
        assert!(token.permission.is_none());
        assert!(token.userid.is_none());
        assert_eq!(serde_json::to_value(&token).unwrap(), raw);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = serde_json::json!({"total_ban_count": 5, "extra": "field"});
        let stats: Stats = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(stats.extra["extra"], "field");
        assert_eq!(serde_json::to_value(&stats).unwrap(), raw);

        let raw = serde_json::json!({"version": "0.6.0", "build": "abc123"});
        let version: Version = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&version).unwrap(), raw);

        let raw = serde_json::json!({"id": 1, "reason": "spam", "admin": 1, "date": 0, "source": "import"});
        let ban: Ban = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ban.extra["source"], "import");
        assert_eq!(serde_json::to_value(&ban).unwrap(), raw);
    }
}

//! Shared domain enumerations aligned with persisted database enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "listing_condition", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    New,
    Used,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::New => "NEW",
            Condition::Used => "USED",
        }
    }
}

impl FromStr for Condition {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(Condition::New),
            "USED" => Ok(Condition::Used),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog ordering. Every variant breaks ties by listing id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Oldest => "oldest",
            SortBy::PriceAsc => "priceAsc",
            SortBy::PriceDesc => "priceDesc",
        }
    }

    /// Unknown or missing values fall back to [`SortBy::Newest`].
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("oldest") => SortBy::Oldest,
            Some("priceAsc") => SortBy::PriceAsc,
            Some("priceDesc") => SortBy::PriceDesc,
            _ => SortBy::Newest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The caller performing a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: uuid::Uuid,
    pub role: Role,
}

impl Actor {
    pub fn user(user_id: uuid::Uuid) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    pub fn admin(user_id: uuid::Uuid) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_parses_case_insensitively() {
        assert_eq!("new".parse::<Condition>(), Ok(Condition::New));
        assert_eq!(" USED ".parse::<Condition>(), Ok(Condition::Used));
        assert!("mint".parse::<Condition>().is_err());
    }

    #[test]
    fn sort_by_falls_back_to_newest() {
        assert_eq!(SortBy::parse_lenient(None), SortBy::Newest);
        assert_eq!(SortBy::parse_lenient(Some("cheapest")), SortBy::Newest);
        assert_eq!(SortBy::parse_lenient(Some("priceDesc")), SortBy::PriceDesc);
        assert_eq!(SortBy::PriceAsc.as_str(), "priceAsc");
    }
}

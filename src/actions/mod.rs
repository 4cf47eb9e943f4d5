use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown Action")]
pub struct UnknownAction;

/// User mutations the dashboard can forward to Trakt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddChase,
    RemoveChase,
    AddHistory,
    AddCollection,
    RemoveCollection,
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_chase" => Ok(Action::AddChase),
            "remove_chase" => Ok(Action::RemoveChase),
            "add_history" => Ok(Action::AddHistory),
            "add_collection" => Ok(Action::AddCollection),
            "remove_collection" => Ok(Action::RemoveCollection),
            _ => Err(UnknownAction),
        }
    }
}

impl Action {
    pub fn endpoint(self) -> &'static str {
        match self {
            Action::AddChase => "sync/watchlist",
            Action::RemoveChase => "sync/watchlist/remove",
            Action::AddHistory => "sync/history",
            Action::AddCollection => "sync/collection",
            Action::RemoveCollection => "sync/collection/remove",
        }
    }
}

/// The item the client acted on: a TMDB id and its media type.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionItem {
    pub id: Value,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub item: Option<ActionItem>,
}

/// Minimal sync payload: one entry under `movies` or `shows`, keyed by TMDB id.
pub fn build_payload(item: &ActionItem) -> Value {
    let entry = json!({ "ids": { "tmdb": item.id } });
    if item.media_type.as_deref() == Some("movie") {
        json!({ "movies": [entry] })
    } else {
        json!({ "shows": [entry] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_action() {
        let cases = [
            ("add_chase", "sync/watchlist"),
            ("remove_chase", "sync/watchlist/remove"),
            ("add_history", "sync/history"),
            ("add_collection", "sync/collection"),
            ("remove_collection", "sync/collection/remove"),
        ];
        for (name, endpoint) in cases {
            let action: Action = name.parse().unwrap();
            assert_eq!(action.endpoint(), endpoint);
        }
    }

    #[test]
    fn rejects_unknown_action() {
        assert_eq!("bogus_action".parse::<Action>(), Err(UnknownAction));
        assert_eq!(UnknownAction.to_string(), "Unknown Action");
    }

    #[test]
    fn movie_payload_goes_under_movies() {
        let item = ActionItem {
            id: json!(603),
            media_type: Some("movie".to_string()),
        };
        assert_eq!(build_payload(&item), json!({"movies": [{"ids": {"tmdb": 603}}]}));
    }

    #[test]
    fn everything_else_goes_under_shows() {
        let item = ActionItem {
            id: json!(1399),
            media_type: None,
        };
        assert_eq!(build_payload(&item), json!({"shows": [{"ids": {"tmdb": 1399}}]}));
    }
}

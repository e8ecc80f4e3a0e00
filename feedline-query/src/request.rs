//! Typed feed requests
//!
//! Turns raw [`FeedParams`] into a [`FeedRequest`]. All validation happens
//! here, before any storage round-trip.

use crate::FeedParams;
use feedline_core::{
    Column, CursorToken, FeedConfig, Post, TimestampMs, TypeUri, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Which timestamp orders the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Order posts arrived at this server
    #[default]
    ReceivedAt,
    PublishedAt,
    VersionPublishedAt,
}

impl SortBy {
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw {
            None => Ok(SortBy::ReceivedAt),
            Some("received_at") => Ok(SortBy::ReceivedAt),
            Some("published_at") => Ok(SortBy::PublishedAt),
            Some("version.published_at") => Ok(SortBy::VersionPublishedAt),
            Some(other) => Err(ValidationError::InvalidValue {
                field: "sort_by".to_string(),
                reason: format!(
                    "unsupported sort {:?}; expected published_at or version.published_at",
                    other
                ),
            }),
        }
    }

    /// Timestamp column used for ordering and cursor ranges.
    pub fn column(&self) -> Column {
        match self {
            SortBy::ReceivedAt => Column::PostReceivedAt,
            SortBy::PublishedAt => Column::PostPublishedAt,
            SortBy::VersionPublishedAt => Column::PostVersionPublishedAt,
        }
    }

    pub fn timestamp_of(&self, post: &Post) -> TimestampMs {
        match self {
            SortBy::ReceivedAt => post.received_at,
            SortBy::PublishedAt => post.published_at,
            SortBy::VersionPublishedAt => post.version_published_at,
        }
    }
}

/// `"<entity>"` or `"<entity> <post>"` inside a mentions group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MentionToken {
    pub entity: String,
    pub post: Option<String>,
}

impl MentionToken {
    fn parse(raw: &str) -> Result<Self, ValidationError> {
        let mut parts = raw.split_whitespace();
        let entity = parts.next().ok_or_else(|| ValidationError::InvalidValue {
            field: "mentions".to_string(),
            reason: format!("empty mention in {:?}", raw),
        })?;
        let post = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return Err(ValidationError::InvalidValue {
                field: "mentions".to_string(),
                reason: format!("expected \"<entity> [<post>]\", got {:?}", raw),
            });
        }
        Ok(Self {
            entity: entity.to_string(),
            post,
        })
    }
}

/// A validated feed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRequest {
    pub sort_by: SortBy,
    /// Strictly-after cursor for incremental sync
    pub since: Option<CursorToken>,
    /// Strictly-after bound for a newest-first scan
    pub until: Option<CursorToken>,
    /// Strictly-before cursor for backward paging
    pub before: Option<CursorToken>,
    pub types: Option<Vec<TypeUri>>,
    pub entities: Option<Vec<String>>,
    /// Groups are ANDed; tokens within a group are ORed
    pub mentions: Option<Vec<Vec<MentionToken>>>,
    /// Effective page size after clamping
    pub limit: u32,
}

impl FeedRequest {
    pub fn parse(params: &FeedParams, config: &FeedConfig) -> Result<Self, ValidationError> {
        let sort_by = SortBy::parse(params.get("sort_by"))?;

        let since = cursor(params, "since")?;
        let until = cursor(params, "until")?;
        let before = cursor(params, "before")?;
        if since.is_some() && before.is_some() {
            return Err(ValidationError::ConflictingCursors {
                cursor_a: "since".to_string(),
                cursor_b: "before".to_string(),
            });
        }

        let types = {
            let mut types: Vec<TypeUri> = Vec::new();
            for raw in list_values(params, "types") {
                let ty = TypeUri::parse(raw)?;
                if !types.contains(&ty) {
                    types.push(ty);
                }
            }
            non_empty(types)
        };

        let entities = {
            let mut entities: Vec<String> = Vec::new();
            for raw in comma_values(params, "entities") {
                if !entities.iter().any(|e| e == raw) {
                    entities.push(raw.to_string());
                }
            }
            non_empty(entities)
        };

        let mentions = {
            let mut groups = Vec::new();
            for group in params.get_all("mentions") {
                let tokens = group
                    .split(',')
                    .filter(|t| !t.trim().is_empty())
                    .map(MentionToken::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                if !tokens.is_empty() {
                    groups.push(tokens);
                }
            }
            non_empty(groups)
        };

        let limit = match params.get("limit") {
            None => config.default_page_limit,
            Some(raw) => {
                let requested = raw.trim().parse::<i64>().map_err(|_| {
                    ValidationError::InvalidLimit {
                        value: raw.to_string(),
                    }
                })?;
                config.clamp_limit(requested)
            }
        };

        Ok(Self {
            sort_by,
            since,
            until,
            before,
            types,
            entities,
            mentions,
            limit,
        })
    }

    /// Every entity named by the mentions filter, de-duplicated in order.
    pub fn mention_entities(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for token in self.mentions.iter().flatten().flatten() {
            if !out.contains(&token.entity) {
                out.push(token.entity.clone());
            }
        }
        out
    }
}

fn cursor(params: &FeedParams, field: &str) -> Result<Option<CursorToken>, ValidationError> {
    params
        .get(field)
        .map(|raw| CursorToken::parse(field, raw))
        .transpose()
}

/// Values of a list parameter, blanks dropped. Commas are legal in URIs, so
/// values are taken whole.
fn list_values<'a>(params: &'a FeedParams, key: &str) -> Vec<&'a str> {
    params
        .get_all(key)
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// Values of a list parameter, each further split on commas, blanks dropped.
fn comma_values<'a>(params: &'a FeedParams, key: &str) -> Vec<&'a str> {
    params
        .get_all(key)
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

//! Argument handling for the `feed-query` binary.

use feedline_core::RowId;
use feedline_query::{FeedParams, Viewer};
use std::path::PathBuf;
use thiserror::Error;

pub const USAGE: &str =
    "usage: feed-query <fixture.json> [key=value ...] [--query QUERY] [--owner ID] [--anonymous]";

/// Errors in the command line itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("missing fixture path\n{}", USAGE)]
    MissingFixture,

    #[error("{flag} expects a value\n{}", USAGE)]
    MissingValue { flag: String },

    #[error("invalid owner id {value:?}: must be an integer")]
    InvalidOwner { value: String },

    #[error("unexpected argument {arg:?}: expected key=value\n{}", USAGE)]
    UnexpectedArgument { arg: String },
}

/// Parsed `feed-query` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub fixture: PathBuf,
    pub params: FeedParams,
    pub viewer: Viewer,
}

impl CliArgs {
    /// Parse arguments, program name excluded.
    pub fn parse<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fixture = None;
        let mut params = FeedParams::new();
        let mut owner: RowId = 1;
        let mut authenticated = true;

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            if arg == "--anonymous" {
                authenticated = false;
            } else if arg == "--query" {
                let value = args.next().ok_or_else(|| CliError::MissingValue {
                    flag: "--query".to_string(),
                })?;
                params.extend(FeedParams::from_query_string(&value));
            } else if arg == "--owner" {
                let value = args.next().ok_or_else(|| CliError::MissingValue {
                    flag: "--owner".to_string(),
                })?;
                owner = value
                    .parse()
                    .map_err(|_| CliError::InvalidOwner { value: value.clone() })?;
            } else if fixture.is_none() && !arg.starts_with("--") {
                fixture = Some(PathBuf::from(arg));
            } else {
                match arg.split_once('=') {
                    Some((key, value)) if !key.is_empty() => params.push(key, value),
                    _ => return Err(CliError::UnexpectedArgument { arg: arg.clone() }),
                }
            }
        }

        Ok(Self {
            fixture: fixture.ok_or(CliError::MissingFixture)?,
            params,
            viewer: Viewer {
                owner_user_id: owner,
                authenticated,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let args = CliArgs::parse([
            "feed.json",
            "limit=5",
            "mentions=alice post1,bob",
            "--owner",
            "7",
            "--anonymous",
        ])
        .unwrap();

        assert_eq!(args.fixture, PathBuf::from("feed.json"));
        assert_eq!(args.params.get("limit"), Some("5"));
        assert_eq!(args.params.get_all("mentions"), vec!["alice post1,bob"]);
        assert_eq!(args.viewer, Viewer::anonymous(7));
    }

    #[test]
    fn test_query_string_is_decoded_and_merged() {
        let args = CliArgs::parse([
            "feed.json",
            "limit=5",
            "--query",
            "?mentions=alice+post1%2Cbob&types[]=https%3A%2F%2Ftent.io%2Ftypes%2Fstatus%2Fv0",
        ])
        .unwrap();

        assert_eq!(args.params.get("limit"), Some("5"));
        assert_eq!(args.params.get_all("mentions"), vec!["alice post1,bob"]);
        assert_eq!(
            args.params.get_all("types"),
            vec!["https://tent.io/types/status/v0"]
        );
        assert!(matches!(
            CliArgs::parse(["feed.json", "--query"]),
            Err(CliError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_defaults_to_authenticated_owner_one() {
        let args = CliArgs::parse(["feed.json"]).unwrap();
        assert_eq!(args.viewer, Viewer::owner(1));
        assert_eq!(args.params, FeedParams::new());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(CliArgs::parse(Vec::<String>::new()), Err(CliError::MissingFixture));
        assert!(matches!(
            CliArgs::parse(["feed.json", "--owner"]),
            Err(CliError::MissingValue { .. })
        ));
        assert!(matches!(
            CliArgs::parse(["feed.json", "--owner", "me"]),
            Err(CliError::InvalidOwner { .. })
        ));
        assert!(matches!(
            CliArgs::parse(["feed.json", "limit"]),
            Err(CliError::UnexpectedArgument { .. })
        ));
    }
}

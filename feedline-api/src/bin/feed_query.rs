//! feed-query: run one feed request against a fixture file.
//!
//! Loads the fixture into an in-memory store, serves the request and prints
//! the resulting page as JSON. Errors are printed as JSON `ApiError`s and
//! the process exits non-zero.

use std::process::ExitCode;
use std::sync::Arc;

use feedline_api::{init_tracing, ApiError, ApiResult, CliArgs, FeedAssembler, TelemetryConfig};
use feedline_core::FeedConfig;
use feedline_storage::{FeedFixture, MockFeedStore};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };

    let telemetry_config = TelemetryConfig::default();
    if let Err(err) = init_tracing(&telemetry_config) {
        eprintln!("{}", err);
    }

    match run(args).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let body = serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string());
            println!("{}", body);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> ApiResult<String> {
    let fixture = FeedFixture::load(&args.fixture)?;
    let store = Arc::new(MockFeedStore::from_fixture(fixture));

    let config = FeedConfig::from_env();
    let assembler = FeedAssembler::with_store(store, config).map_err(ApiError::from)?;

    tracing::info!(
        fixture = %args.fixture.display(),
        owner = args.viewer.owner_user_id,
        default_page_limit = assembler.config().default_page_limit,
        max_page_limit = assembler.config().max_page_limit,
        "Serving feed request"
    );
    let page = assembler.handle(&args.params, args.viewer).await?;
    Ok(serde_json::to_string_pretty(&page)?)
}

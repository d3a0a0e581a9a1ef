use std::process::ExitCode;

use chrono::Utc;
use plugin_core::logging::init_logging_from_env;
use plugin_core::{parse_env_args, print_results};
use plugin_s3::handlers::fetch::{fetch_schema, handle_fetch, FetchRequest};
use plugin_s3::open_session;
use tracing::error;

fn run() -> Result<(), String> {
    let params =
        parse_env_args(&fetch_schema()).map_err(|error| format!("invalid plugin input: {error}"))?;
    let request = FetchRequest::from_params(params)
        .map_err(|error| format!("invalid fetch request: {error}"))?;

    let session = open_session().map_err(|error| format!("failed to open session: {error}"))?;
    let response = handle_fetch(&request, &session, Utc::now().to_rfc3339())
        .map_err(|error| error.to_string())?;

    print_results(&response).map_err(|error| error.to_string())
}

fn main() -> ExitCode {
    init_logging_from_env();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(error = %message, "s3 fetch plugin failed");
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

use plugin_core::logging::init_logging_from_env;
use plugin_core::{parse_env_args, print_results, ParamSchema, ParsedParams};
use serde_json::{json, Value};
use tracing::{error, info};

fn full_name(params: &ParsedParams) -> String {
    ["first", "middle", "last"]
        .iter()
        .filter_map(|key| params.get(*key).and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> ExitCode {
    init_logging_from_env();

    let schema = ParamSchema::new(["first", "last"], ["middle"]);
    let params = match parse_env_args(&schema) {
        Ok(value) => value,
        Err(err) => {
            error!(error = %err, "invalid plugin input");
            return ExitCode::FAILURE;
        }
    };
    let rendered = Value::Object(params.clone());
    info!(params = %rendered, "params provided");

    let results = json!({
        "full_name": full_name(&params),
        "success": true,
    });
    if let Err(err) = print_results(&results) {
        error!(error = %err, "failed to print plugin results");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

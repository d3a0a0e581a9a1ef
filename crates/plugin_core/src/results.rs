use std::io::Write;

use serde::Serialize;

use crate::error::PluginError;

/// Top-level key of the single result line.
pub const RESULTS_KEY: &str = "plugin_results";

#[derive(Serialize)]
struct ResultEnvelope<'a, R: Serialize + ?Sized> {
    plugin_results: &'a R,
}

/// Serializes `results` under [`RESULTS_KEY`] as compact JSON.
pub fn render_results<R: Serialize + ?Sized>(results: &R) -> Result<String, PluginError> {
    serde_json::to_string(&ResultEnvelope {
        plugin_results: results,
    })
    .map_err(PluginError::Serialization)
}

/// Writes the rendered envelope followed by a newline.
///
/// Nothing is written when serialization fails.
pub fn write_results<W, R>(writer: &mut W, results: &R) -> Result<(), PluginError>
where
    W: Write,
    R: Serialize + ?Sized,
{
    let line = render_results(results)?;
    writeln!(writer, "{line}")
        .and_then(|()| writer.flush())
        .map_err(|error| PluginError::Serialization(serde_json::Error::io(error)))
}

/// Prints the result line to standard output. Call once, at the end of the run.
pub fn print_results<R: Serialize + ?Sized>(results: &R) -> Result<(), PluginError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_results(&mut handle, results)
}

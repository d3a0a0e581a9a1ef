use std::ffi::OsString;
use std::io;

use serde_json::{Map, Value};

use crate::error::{PluginError, SchemaViolation};

/// Program name plus the single JSON argument.
pub const EXPECTED_ARG_COUNT: usize = 2;

/// Decoded plugin input. Values are left exactly as the caller sent them.
pub type ParsedParams = Map<String, Value>;

/// Keys a plugin accepts. Keys are case-sensitive.
///
/// A key listed in both sets behaves as required; see
/// [`ParamSchema::overlapping_keys`] for hosts that want to reject that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSchema {
    required: Vec<String>,
    optional: Vec<String>,
}

impl ParamSchema {
    pub fn new<R, O>(required: R, optional: O) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            optional: optional.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    pub fn allows(&self, key: &str) -> bool {
        self.required.iter().any(|value| value == key)
            || self.optional.iter().any(|value| value == key)
    }

    pub fn overlapping_keys(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|key| self.optional.contains(key))
            .map(String::as_str)
            .collect()
    }

    /// Checks presence of required keys and absence of unknown keys.
    ///
    /// Both checks always run so a single error describes every problem.
    pub fn validate(&self, provided: &ParsedParams) -> Result<(), SchemaViolation> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|key| !provided.contains_key(key.as_str()))
            .cloned()
            .collect();

        let mut unexpected: Vec<String> = provided
            .keys()
            .filter(|key| !self.allows(key))
            .cloned()
            .collect();
        unexpected.sort();

        let violation = SchemaViolation {
            missing,
            unexpected,
            required: self.required.clone(),
            optional: self.optional.clone(),
            provided: provided.clone(),
        };
        if violation.is_empty() {
            Ok(())
        } else {
            Err(violation)
        }
    }
}

/// Parses `args` (program name followed by one JSON object) and validates the
/// decoded keys against `schema`.
///
/// The decoded mapping is returned untouched: optional keys that were not
/// provided are not filled in.
pub fn parse_input<I, S>(args: I, schema: &ParamSchema) -> Result<ParsedParams, PluginError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    if args.len() != EXPECTED_ARG_COUNT {
        return Err(PluginError::ArgumentCount {
            provided: args.len(),
            expected: EXPECTED_ARG_COUNT,
        });
    }

    let raw = &args[1];
    let provided: ParsedParams =
        serde_json::from_str(raw).map_err(|source| PluginError::MalformedInput {
            input: raw.clone(),
            source,
        })?;

    schema
        .validate(&provided)
        .map_err(PluginError::SchemaViolation)?;

    let rendered = Value::Object(provided.clone());
    tracing::debug!(
        provided_keys = provided.len(),
        params = %rendered,
        "plugin input parsed"
    );
    Ok(provided)
}

/// [`parse_input`] over raw OS arguments.
///
/// An argument that is not valid Unicode cannot be JSON, so it is reported as
/// malformed input rather than aborting the process.
pub fn parse_os_args<I>(args: I, schema: &ParamSchema) -> Result<ParsedParams, PluginError>
where
    I: IntoIterator<Item = OsString>,
{
    let args: Vec<OsString> = args.into_iter().collect();
    if args.len() != EXPECTED_ARG_COUNT {
        return Err(PluginError::ArgumentCount {
            provided: args.len(),
            expected: EXPECTED_ARG_COUNT,
        });
    }

    let mut args = args.into_iter();
    let program = args.next().unwrap_or_default().to_string_lossy().into_owned();
    let raw = args.next().unwrap_or_default();
    let input = raw.into_string().map_err(|raw| PluginError::MalformedInput {
        input: raw.to_string_lossy().into_owned(),
        source: serde_json::Error::io(io::Error::new(
            io::ErrorKind::InvalidData,
            "argument is not valid UTF-8",
        )),
    })?;
    parse_input([program, input], schema)
}

/// [`parse_input`] applied to the current process arguments.
pub fn parse_env_args(schema: &ParamSchema) -> Result<ParsedParams, PluginError> {
    parse_os_args(std::env::args_os(), schema)
}

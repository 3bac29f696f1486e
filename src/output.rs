//! Rendering of extraction results for the command line.

use clap::ValueEnum;
use serde::Serialize;

use crate::errors::Result;

/// Text encoding of a rendered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON, compact unless pretty-printed
    #[default]
    Json,
    /// YAML, as shown by the flowchart editor
    Yaml,
}

/// Renders `value` in `format`. `pretty` only affects JSON; YAML is always
/// block-formatted.
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat, pretty: bool) -> Result<String> {
    let text = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(text)
}

use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::pipeline::RetrievedCaptions;

pub mod formatters;

pub use formatters::*;

/// Render captions in the requested format. Text output is normalized unless `raw`.
pub fn render(captions: &RetrievedCaptions, format: &OutputFormat, raw: bool) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format_as_text(captions, raw),
        OutputFormat::Json => format_as_json(captions)?,
        OutputFormat::Srt => format_as_srt(&captions.document),
        OutputFormat::Vtt => format_as_vtt(&captions.document),
    };

    Ok(content)
}

/// Save captions to file
pub async fn save_to_file(
    captions: &RetrievedCaptions,
    path: &Path,
    format: &OutputFormat,
    raw: bool,
) -> Result<()> {
    let content = render(captions, format, raw)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print captions to console
pub fn print_to_console(captions: &RetrievedCaptions, format: &OutputFormat, raw: bool) -> Result<()> {
    let content = render(captions, format, raw)?;
    println!("{}", content);
    Ok(())
}

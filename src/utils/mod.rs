use anyhow::{Context, Result};
use chrono::Duration;
use std::io::Read;

/// Format an offset as `HH:MM:SS<sep>mmm` (`,` for SRT, `.` for WebVTT)
pub fn format_timestamp(offset: Duration, millis_separator: char) -> String {
    let total_millis = offset.num_milliseconds().max(0);
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let seconds = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, seconds, millis_separator, millis
    )
}

/// Use the argument when given (and not `-`), otherwise read all of stdin
pub fn read_text_argument(argument: Option<String>) -> Result<String> {
    match argument {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read caption text from stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Duration::zero(), ','), "00:00:00,000");
        assert_eq!(format_timestamp(Duration::milliseconds(1500), ','), "00:00:01,500");
        assert_eq!(format_timestamp(Duration::milliseconds(3_661_007), '.'), "01:01:01.007");
    }

    #[test]
    fn test_format_timestamp_clamps_negative() {
        assert_eq!(format_timestamp(Duration::milliseconds(-20), ','), "00:00:00,000");
    }

    #[test]
    fn test_read_text_argument_prefers_argument() {
        assert_eq!(read_text_argument(Some("hello".to_string())).unwrap(), "hello");
    }
}

//! Output handling for CLI
//!
//! - Results go to stdout, one JSON object or one value per line
//! - Logs go to stderr and never mix with results
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;
use crate::record::Record;

/// Write one JSON value as a line to stdout
pub fn write_json_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write a plain text line to stdout
pub fn write_line(line: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_json_line(&json!({
        "status": "ok",
        "data": data
    }))
}

/// JSON form of a record as printed by `query`
pub fn record_json(record: &Record) -> Value {
    json!({
        "source": record.source().display().to_string(),
        "site": record.site(),
        "monitor": record.monitor_id(),
        "station": record.station_id(),
        "start": record.start().to_rfc3339(),
        "end": record.end().to_rfc3339(),
        "metadata": record.metadata(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_record_json_fields() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap();
        let record = Record::new("/data/a.txt", "SiteA", "M1", "StationX", start, end).unwrap();

        let value = record_json(&record);
        assert_eq!(value["source"], "/data/a.txt");
        assert_eq!(value["monitor"], "M1");
        assert_eq!(value["start"], "2024-01-01T03:00:00+00:00");
        assert!(value["metadata"].as_object().unwrap().is_empty());
    }
}

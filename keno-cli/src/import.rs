//! CSV draw import.
//!
//! Expected layout, with a header row: `draw_id,drawn_at,n1,...,n20`.
//! `drawn_at` is RFC 3339 or `YYYY-MM-DD HH:MM:SS` (taken as UTC).

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use keno_db::db::parse_timestamp;
use keno_db::models::{Draw, PICK_COUNT};
use keno_db::store::SqliteStore;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn parse_drawn_at(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = parse_timestamp(raw) {
        return Ok(at);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid draw time '{}'", raw))?;
    Ok(naive.and_utc())
}

fn parse_record(record: &csv::StringRecord) -> Result<Draw> {
    if record.len() != PICK_COUNT + 2 {
        bail!("expected {} fields, got {}", PICK_COUNT + 2, record.len());
    }

    let draw_id = record.get(0).map(str::trim).unwrap_or_default();
    if draw_id.is_empty() {
        bail!("empty draw id");
    }
    let drawn_at = parse_drawn_at(record.get(1).unwrap_or_default())?;

    let numbers = record
        .iter()
        .skip(2)
        .map(|field| {
            let field = field.trim();
            field
                .parse::<u8>()
                .with_context(|| format!("cannot parse '{}' as a number", field))
        })
        .collect::<Result<Vec<u8>>>()?;

    Ok(Draw::new(draw_id, drawn_at, &numbers)?)
}

/// Reads every row, then records the valid draws oldest first in one transaction.
pub fn import_csv(store: &mut SqliteStore, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("cannot open {:?}", path))?;

    let records: Vec<csv::Result<csv::StringRecord>> = reader.records().collect();
    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut result = ImportResult::default();
    let mut draws = Vec::with_capacity(records.len());

    for (line, record) in records.into_iter().enumerate() {
        result.total_records += 1;
        // header is line 1
        let line = line + 2;
        match record.context("unreadable row").and_then(|r| parse_record(&r)) {
            Ok(draw) => draws.push(draw),
            Err(e) => {
                warn!(line, error = %format!("{e:#}"), "row rejected");
                result.errors += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    result.inserted = store.record_batch(&draws)?;
    result.skipped = draws.len() as u32 - result.inserted;
    info!(
        file = %path.display(),
        inserted = result.inserted,
        skipped = result.skipped,
        errors = result.errors,
        "import finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use keno_db::store::DrawStore;
    use std::io::Write;

    fn row(id: &str, at: &str, first: u8) -> String {
        let numbers: Vec<String> = (first..first + 20).map(|n| n.to_string()).collect();
        format!("{},{},{}", id, at, numbers.join(","))
    }

    fn header() -> String {
        let cols: Vec<String> = (1..=20).map(|i| format!("n{i}")).collect();
        format!("draw_id,drawn_at,{}", cols.join(","))
    }

    fn write_csv(lines: &[String]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", header()).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_drawn_at() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(parse_drawn_at("2024-02-03T04:05:06Z").unwrap(), expected);
        assert_eq!(parse_drawn_at("2024-02-03 04:05:06").unwrap(), expected);
        assert_eq!(parse_drawn_at("2024-02-03T06:05:06+02:00").unwrap(), expected);
        assert!(parse_drawn_at("03/02/2024").is_err());
    }

    #[test]
    fn test_import_counts() {
        let file = write_csv(&[
            row("2", "2024-02-03 10:01:30", 21),
            row("1", "2024-02-03 10:00:00", 1),
            row("1", "2024-02-03 10:00:00", 1),
            row("3", "2024-02-03 10:03:00", 70),
            "4,2024-02-03 10:04:30,1,2,3".to_string(),
        ]);

        let mut store = SqliteStore::open_in_memory().unwrap();
        let result = import_csv(&mut store, file.path()).unwrap();
        assert_eq!(
            result,
            ImportResult {
                total_records: 5,
                inserted: 2,
                skipped: 1,
                errors: 2,
            }
        );
        assert_eq!(store.total_draws().unwrap(), 2);
    }

    #[test]
    fn test_import_is_chronological() {
        let file = write_csv(&[
            row("late", "2024-02-03 10:03:00", 41),
            row("early", "2024-02-03 10:00:00", 1),
        ]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        import_csv(&mut store, file.path()).unwrap();

        let stats = store.number_stats().unwrap();
        assert_eq!(stats[&41].hot_streak, 1);
        assert_eq!(stats[&1].cold_streak, 1);
        assert_eq!(stats[&1].total_appearances, 1);
    }

    #[test]
    fn test_reimport_skips_everything() {
        let file = write_csv(&[row("a", "2024-02-03 10:00:00", 1)]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        import_csv(&mut store, file.path()).unwrap();
        let again = import_csv(&mut store, file.path()).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 1);
    }

    #[test]
    fn test_missing_file() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(import_csv(&mut store, Path::new("/nonexistent/draws.csv")).is_err());
    }
}

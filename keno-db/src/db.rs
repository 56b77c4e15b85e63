use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use crate::models::{
    Draw, NumberStat, NumberStats, PredictionRecord, POOL_SIZE, parse_numbers, replay_draws, validate_draw,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_id    TEXT PRIMARY KEY,
    drawn_at   TEXT NOT NULL,
    numbers    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_draws_drawn_at ON draws (drawn_at);

CREATE TABLE IF NOT EXISTS number_stats (
    number             INTEGER PRIMARY KEY,
    total_appearances  INTEGER NOT NULL DEFAULT 0,
    last_seen          TEXT,
    hot_streak         INTEGER NOT NULL DEFAULT 0,
    cold_streak        INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS predictions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,
    kind        TEXT NOT NULL,
    very_high   TEXT NOT NULL,
    high        TEXT NOT NULL,
    confidence  REAL NOT NULL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("keno.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("migration failed")?;
    let mut seed = conn.prepare("INSERT OR IGNORE INTO number_stats (number) VALUES (?1)")?;
    for n in 1..=POOL_SIZE as u8 {
        seed.execute([n])?;
    }
    Ok(())
}

/// Timestamps are stored as fixed-width UTC RFC 3339 so that text ordering is time ordering.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let at = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp '{}'", raw))?;
    Ok(at.with_timezone(&Utc))
}

pub fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Inserts a draw and updates every number's statistics.
/// Returns `false` without touching statistics when the draw id already exists.
/// Callers wanting atomicity run this inside a transaction.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    Ok(insert_draws(conn, [draw])? == 1)
}

/// Inserts draws, best given oldest first, and returns how many were new.
///
/// Draws newer than everything stored advance the statistics in place. As soon
/// as one lands before an already stored draw, the remaining rows are inserted
/// and the statistics are replayed once from the whole table.
pub fn insert_draws<'a>(conn: &Connection, draws: impl IntoIterator<Item = &'a Draw>) -> Result<u32> {
    let mut inserted = 0;
    let mut replay = false;
    for draw in draws {
        if !insert_draw_row(conn, draw)? {
            continue;
        }
        inserted += 1;
        if replay {
            continue;
        }
        if has_later_draw(conn, draw)? {
            replay = true;
        } else {
            advance_stats(conn, draw)?;
        }
    }
    if replay {
        rebuild_number_stats(conn)?;
    }
    Ok(inserted)
}

fn insert_draw_row(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_id, drawn_at, numbers) VALUES (?1, ?2, ?3)",
        rusqlite::params![draw.draw_id, format_timestamp(&draw.drawn_at), join_numbers(&draw.numbers)],
    ).context("insert failed")?;
    Ok(changed > 0)
}

/// Whether a stored draw comes after `draw` in time-then-id order.
fn has_later_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let later: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM draws
                        WHERE drawn_at > ?1 OR (drawn_at = ?1 AND draw_id > ?2))",
        rusqlite::params![format_timestamp(&draw.drawn_at), draw.draw_id],
        |row| row.get(0),
    )?;
    Ok(later)
}

fn advance_stats(conn: &Connection, draw: &Draw) -> Result<()> {
    let drawn_at = format_timestamp(&draw.drawn_at);
    let mut hit = conn.prepare_cached(
        "UPDATE number_stats
         SET total_appearances = total_appearances + 1, last_seen = ?2,
             hot_streak = hot_streak + 1, cold_streak = 0
         WHERE number = ?1",
    )?;
    let mut miss = conn.prepare_cached(
        "UPDATE number_stats SET cold_streak = cold_streak + 1, hot_streak = 0 WHERE number = ?1",
    )?;
    for n in 1..=POOL_SIZE as u8 {
        if draw.contains(n) {
            hit.execute(rusqlite::params![n, drawn_at])?;
        } else {
            miss.execute([n])?;
        }
    }
    Ok(())
}

/// Recomputes `number_stats` by replaying every stored draw in chronological order.
pub fn rebuild_number_stats(conn: &Connection) -> Result<()> {
    let draws = fetch_all_draws(conn)?;
    let stats = replay_draws(&draws);

    let mut update = conn.prepare_cached(
        "UPDATE number_stats
         SET total_appearances = ?2, last_seen = ?3, hot_streak = ?4, cold_streak = ?5
         WHERE number = ?1",
    )?;
    for stat in stats.values() {
        update.execute(rusqlite::params![
            stat.number,
            stat.total_appearances,
            stat.last_seen.as_ref().map(format_timestamp),
            stat.hot_streak,
            stat.cold_streak,
        ])?;
    }
    debug!(draws = draws.len(), "number stats rebuilt");
    Ok(())
}

fn row_to_draw(draw_id: String, drawn_at: String, numbers: String) -> Result<Draw> {
    let parsed = parse_numbers(&numbers)
        .with_context(|| format!("corrupt numbers for draw {}", draw_id))?;
    let numbers = validate_draw(&parsed)
        .with_context(|| format!("corrupt numbers for draw {}", draw_id))?;
    Ok(Draw {
        drawn_at: parse_timestamp(&drawn_at)?,
        draw_id,
        numbers,
    })
}

/// Most recent first.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT draw_id, drawn_at, numbers FROM draws
         ORDER BY drawn_at DESC, draw_id DESC LIMIT ?1"
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
    })?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, at, numbers)| row_to_draw(id, at, numbers))
        .collect()
}

/// Every stored draw, oldest first.
pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT draw_id, drawn_at, numbers FROM draws ORDER BY drawn_at ASC, draw_id ASC"
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
    })?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, at, numbers)| row_to_draw(id, at, numbers))
        .collect()
}

/// Draws recorded at or after `since`, most recent first, at most `limit`.
pub fn fetch_recent_draws(conn: &Connection, since: &DateTime<Utc>, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(
        "SELECT draw_id, drawn_at, numbers FROM draws
         WHERE drawn_at >= ?1
         ORDER BY drawn_at DESC, draw_id DESC LIMIT ?2"
    )?;
    let rows = stmt.query_map(rusqlite::params![format_timestamp(since), limit], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
    })?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, at, numbers)| row_to_draw(id, at, numbers))
        .collect()
}

pub fn fetch_number_stats(conn: &Connection) -> Result<NumberStats> {
    let mut stmt = conn.prepare(
        "SELECT number, total_appearances, last_seen, hot_streak, cold_streak FROM number_stats"
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, u8>(0)?,
            row.get::<_, u32>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, u32>(3)?,
            row.get::<_, u32>(4)?,
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    let mut stats = NumberStats::with_capacity(rows.len());
    for (number, total_appearances, last_seen, hot_streak, cold_streak) in rows {
        let last_seen = last_seen.as_deref().map(parse_timestamp).transpose()?;
        stats.insert(number, NumberStat {
            number,
            total_appearances,
            last_seen,
            hot_streak,
            cold_streak,
        });
    }
    Ok(stats)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn latest_draw_time(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = conn
        .query_row("SELECT MAX(drawn_at) FROM draws", [], |row| row.get(0))
        .optional()?
        .flatten();
    raw.as_deref().map(parse_timestamp).transpose()
}

pub fn insert_prediction(conn: &Connection, record: &PredictionRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO predictions (created_at, kind, very_high, high, confidence)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            format_timestamp(&record.created_at),
            record.kind,
            join_numbers(&record.very_high),
            join_numbers(&record.high),
            record.confidence,
        ],
    ).context("failed to save prediction")?;
    Ok(conn.last_insert_rowid())
}

/// Most recent first.
pub fn fetch_last_predictions(conn: &Connection, limit: u32) -> Result<Vec<PredictionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT created_at, kind, very_high, high, confidence FROM predictions
         ORDER BY id DESC LIMIT ?1"
    )?;
    let rows = stmt.query_map([limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, f64>(4)?,
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(created_at, kind, very_high, high, confidence)| -> Result<PredictionRecord> {
            Ok(PredictionRecord {
                created_at: parse_timestamp(&created_at)?,
                kind,
                very_high: parse_numbers(&very_high)?,
                high: parse_numbers(&high)?,
                confidence,
            })
        })
        .collect()
}

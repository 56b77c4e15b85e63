use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use crate::import::ImportResult;
use keno_db::db::format_timestamp;
use keno_db::models::{Draw, NumberStats, POOL_SIZE, PredictionRecord};
use keno_engine::PredictionResult;
use keno_engine::scoring::ScoreBreakdown;
use keno_engine::scoring::confidence::ConfidenceLevel;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("No draws to show.");
        return;
    }

    let mut table = new_table(vec!["Draw", "Drawn at (UTC)", "Numbers"]);
    for draw in draws {
        let mut numbers = draw.numbers;
        numbers.sort_unstable();
        table.add_row(vec![
            draw.draw_id.clone(),
            format_timestamp(&draw.drawn_at),
            join(&numbers),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import finished:");
    println!("  Rows read          : {}", result.total_records);
    println!("  Inserted           : {}", result.inserted);
    println!("  Duplicates skipped : {}", result.skipped);
    if result.errors > 0 {
        println!("  Rejected rows      : {}", result.errors);
    }
}

/// Per-number statistics, most frequent first.
pub fn display_stats(stats: &NumberStats, total_draws: u32) {
    println!("\n📊 Statistics over {} draws\n", total_draws);

    let mut sorted: Vec<_> = stats.values().collect();
    sorted.sort_by(|a, b| {
        b.total_appearances
            .cmp(&a.total_appearances)
            .then(a.number.cmp(&b.number))
    });

    let mut table = new_table(vec!["Number", "Hits", "Frequency", "Hot", "Cold", "Last seen"]);
    for stat in sorted {
        let hot = if stat.hot_streak >= 2 {
            Cell::new(stat.hot_streak).fg(Color::Green)
        } else {
            Cell::new(stat.hot_streak)
        };
        let cold = if stat.cold_streak >= 5 {
            Cell::new(stat.cold_streak).fg(Color::Red)
        } else {
            Cell::new(stat.cold_streak)
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", stat.number)),
            Cell::new(stat.total_appearances),
            Cell::new(format!("{:.3}", stat.frequency(total_draws))),
            hot,
            cold,
            Cell::new(stat.last_seen.map(|t| format_timestamp(&t)).unwrap_or_else(|| "-".to_string())),
        ]);
    }
    println!("{table}");
}

fn level_color(level: ConfidenceLevel) -> Color {
    match level {
        ConfidenceLevel::High => Color::Green,
        ConfidenceLevel::Good => Color::Cyan,
        ConfidenceLevel::Moderate => Color::Yellow,
        ConfidenceLevel::Low => Color::Red,
    }
}

pub fn display_prediction(result: &PredictionResult) {
    println!("\n🎯 Prediction ({})\n", result.kind);

    let mut table = new_table(vec!["Tier", "Numbers"]);
    table.add_row(vec!["Very high".to_string(), join(&result.very_high)]);
    table.add_row(vec!["High".to_string(), join(&result.high)]);
    println!("{table}");

    let confidence = Cell::new(format!("{:.1}% {}", result.confidence * 100.0, result.level))
        .fg(level_color(result.level));
    let mut table = new_table(vec!["Confidence", "Total draws", "Draws used"]);
    table.add_row(vec![
        confidence,
        Cell::new(result.total_draws),
        Cell::new(result.recent_draws),
    ]);
    println!("{table}");
}

/// Top `limit` numbers with each signal's contribution.
pub fn display_breakdown(breakdown: &ScoreBreakdown, limit: usize) {
    if breakdown.components.is_empty() {
        println!("\nNot enough recent draws to score: every number at 1/{}.", POOL_SIZE);
        return;
    }

    let mut header = vec!["#", "Number", "Score"];
    header.extend(breakdown.components.iter().map(|c| c.name.as_str()));
    let mut table = new_table(header);

    for (rank, (number, score)) in breakdown.scores.ranked().into_iter().take(limit).enumerate() {
        let mut row = vec![
            Cell::new(rank + 1),
            Cell::new(format!("{:2}", number)),
            Cell::new(format!("{:.4}", score)),
        ];
        for component in &breakdown.components {
            row.push(Cell::new(format!("{:.2}", component.sub_scores[(number - 1) as usize])));
        }
        table.add_row(row);
    }

    let weights = breakdown
        .components
        .iter()
        .map(|c| format!("{} {:.2}", c.name, c.weight))
        .collect::<Vec<_>>()
        .join(", ");
    println!("\nScores (weights: {weights})");
    println!("{table}");
}

pub fn display_saved_predictions(records: &[PredictionRecord]) {
    if records.is_empty() {
        println!("No saved predictions yet.");
        return;
    }

    let mut table = new_table(vec!["Created (UTC)", "Kind", "Very high", "High", "Confidence"]);
    for record in records {
        table.add_row(vec![
            format_timestamp(&record.created_at),
            record.kind.clone(),
            join(&record.very_high),
            join(&record.high),
            format!("{:.1}%", record.confidence * 100.0),
        ]);
    }
    println!("{table}");
}

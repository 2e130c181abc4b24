use crate::journal::Journal;
use crate::types::{AggregateStats, Entry, Virtue};
use chrono::{Local, Utc};
use std::path::Path;

/// Run the init command
pub fn run_init(path: &str) -> Result<(), String> {
    let path = Path::new(path);
    let journal_path = path.join(crate::config::JOURNAL_DIR);

    if journal_path.exists() {
        return Err(format!(
            ".virtus already exists at {}",
            journal_path.display()
        ));
    }

    let journal = Journal::init(path).map_err(|e| e.to_string())?;
    println!("Initialized .virtus at {}", journal.journal_path().display());

    Ok(())
}

/// Run the checkin command
pub fn run_checkin(virtue: Virtue, reflection: &str) -> Result<(), String> {
    let mut journal = Journal::open().map_err(|e| e.to_string())?;

    println!("Analizando tu reflexión...");
    let entry = journal
        .check_in(virtue, reflection)
        .map_err(|e| format!("Failed to record entry: {}", e))?;

    println!("\nRegistrado [{}] {}\n", entry.id, entry.virtue);
    if let Some(f) = &entry.feedback {
        println!("  {}", f.encouragement);
        println!("  Tip: {}", f.practical_tip);
        println!("  {} {}/10", score_bar(f.score), f.score);
    }

    Ok(())
}

/// Run the list command
pub fn run_list(limit: usize) -> Result<(), String> {
    let journal = Journal::open().map_err(|e| e.to_string())?;
    let entries = journal.recent(limit);

    if entries.is_empty() {
        println!("No entries yet. Add one with: virtus checkin <virtue> \"...\"");
        return Ok(());
    }

    println!("Historial Reciente\n");
    for e in &entries {
        print_entry(e);
    }

    Ok(())
}

/// Run the stats command - the progress dashboard
pub fn run_stats(with_insight: bool) -> Result<(), String> {
    let mut journal = Journal::open().map_err(|e| e.to_string())?;
    let stats = journal
        .stats(Utc::now().date_naive())
        .map_err(|e| e.to_string())?;

    if stats.total_count == 0 {
        println!("Sin datos aún");
        println!("Realiza tu primer registro para ver tus estadísticas.");
        return Ok(());
    }

    print_summary(&stats);

    if with_insight {
        println!("\nInsight Semanal");
        let insight = journal.insight().map_err(|e| e.to_string())?;
        println!("  \"{}\"", insight);
    }

    println!("\nFrecuencia de Virtudes\n");
    let widest = stats.per_virtue_count.iter().map(|(_, c)| *c).max().unwrap_or(1);
    for (virtue, count) in &stats.per_virtue_count {
        let bar = "█".repeat(count * 20 / widest);
        println!("  {:16} {:3} {}", virtue.display_name(), count, bar);
    }

    Ok(())
}

/// Run the insight command
pub fn run_insight() -> Result<(), String> {
    let mut journal = Journal::open().map_err(|e| e.to_string())?;
    let insight = journal.insight().map_err(|e| e.to_string())?;
    println!("{}", insight);
    Ok(())
}

/// Run the virtues command
pub fn run_virtues() -> Result<(), String> {
    println!("¿Qué virtud practicaste hoy?\n");
    for v in Virtue::ALL {
        println!("  {:16} {}", v.display_name(), v.description());
    }
    Ok(())
}

/// Run the export command
pub fn run_export(format: &str) -> Result<(), String> {
    let journal = Journal::open().map_err(|e| e.to_string())?;
    let entries = journal.entries();

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(entries)
                .map_err(|e| format!("Failed to serialize: {}", e))?;
            println!("{}", json);
        }
        "md" => {
            for e in entries {
                println!("## {} - {}", e.timestamp.format("%Y-%m-%d"), e.virtue);
                println!("\n{}\n", e.reflection);
                if let Some(f) = &e.feedback {
                    println!("- **Ánimo:** {}", f.encouragement);
                    println!("- **Tip:** {}", f.practical_tip);
                    println!("- **Puntuación:** {}/10", f.score);
                }
                println!("\n---\n");
            }
        }
        _ => {
            return Err(format!("Unknown format: {}", format));
        }
    }

    Ok(())
}

fn print_summary(stats: &AggregateStats) {
    println!("Mi Progreso");
    println!("===========\n");

    println!("Total Registros: {}", stats.total_count);
    println!("Racha Actual:    {} días", stats.streak);
    println!("Días seguidos:   {}", stats.calendar_streak);
    println!("Virtud Top:      {}", stats.top_virtue_label());
}

// Helper to print an entry
fn print_entry(e: &Entry) {
    let local = e.timestamp.with_timezone(&Local);
    println!("[{}] {}  {}", e.id, e.virtue, local.format("%Y-%m-%d"));

    let preview: String = e.reflection.chars().take(200).collect();
    let preview = if e.reflection.chars().count() > 200 {
        format!("{}...", preview)
    } else {
        preview
    };
    println!("    \"{}\"", preview.replace('\n', " "));

    if let Some(f) = &e.feedback {
        println!("    Tip: {}", f.practical_tip);
        println!("    {} {}/10", score_bar(f.score), f.score);
    }
    println!();
}

/// Ten-cell bar for a 1-10 score
fn score_bar(score: u8) -> String {
    let filled = usize::from(score.min(10));
    format!("{}{}", "■".repeat(filled), "□".repeat(10 - filled))
}

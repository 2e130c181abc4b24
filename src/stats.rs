use crate::types::{AggregateStats, Entry, Virtue};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Compute journal statistics. Pure; recomputed on every call.
pub fn aggregate(entries: &[Entry], today: NaiveDate) -> AggregateStats {
    let per_virtue_count = count_by_virtue(entries);

    // Stable sort: equal counts keep first-occurrence order
    let mut ranked = per_virtue_count.clone();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let top_virtue = ranked.first().map(|(v, _)| *v);

    let total_count = entries.len();

    AggregateStats {
        per_virtue_count,
        top_virtue,
        total_count,
        streak: participation_streak(entries),
        calendar_streak: calendar_streak(entries, today),
    }
}

/// Counts per virtue, ordered by first occurrence
fn count_by_virtue(entries: &[Entry]) -> Vec<(Virtue, usize)> {
    let mut counts: Vec<(Virtue, usize)> = Vec::new();
    for entry in entries {
        match counts.iter_mut().find(|(v, _)| *v == entry.virtue) {
            Some((_, count)) => *count += 1,
            None => counts.push((entry.virtue, 1)),
        }
    }
    counts
}

/// Number of entries, not days. No gap detection.
fn participation_streak(entries: &[Entry]) -> usize {
    entries.len()
}

/// Consecutive UTC days with an entry, ending today or yesterday
pub fn calendar_streak(entries: &[Entry], today: NaiveDate) -> usize {
    let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.timestamp.date_naive()).collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, virtue: Virtue, date: &str) -> Entry {
        Entry {
            id: id.to_string(),
            timestamp: format!("{}T12:00:00Z", date).parse().unwrap(),
            virtue,
            reflection: "texto".to_string(),
            feedback: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    #[test]
    fn test_counts_and_top_virtue() {
        let entries = vec![
            entry("1", Virtue::Honesty, "2024-05-01"),
            entry("2", Virtue::Honesty, "2024-05-01"),
            entry("3", Virtue::Respect, "2024-05-02"),
        ];

        let stats = aggregate(&entries, today());
        assert_eq!(
            stats.per_virtue_count,
            vec![(Virtue::Honesty, 2), (Virtue::Respect, 1)]
        );
        assert_eq!(stats.top_virtue, Some(Virtue::Honesty));
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.streak, 3);
    }

    #[test]
    fn test_empty_history() {
        let stats = aggregate(&[], today());
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.calendar_streak, 0);
        assert_eq!(stats.top_virtue, None);
        assert_eq!(stats.top_virtue_label(), "N/A");
        assert!(stats.per_virtue_count.is_empty());
    }

    #[test]
    fn test_tie_goes_to_first_occurrence() {
        let entries = vec![
            entry("1", Virtue::Patience, "2024-05-01"),
            entry("2", Virtue::Gratitude, "2024-05-02"),
            entry("3", Virtue::Gratitude, "2024-05-03"),
            entry("4", Virtue::Patience, "2024-05-04"),
        ];
        assert_eq!(aggregate(&entries, today()).top_virtue, Some(Virtue::Patience));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let entries = vec![
            entry("1", Virtue::Humility, "2024-05-09"),
            entry("2", Virtue::Respect, "2024-05-10"),
        ];
        assert_eq!(aggregate(&entries, today()), aggregate(&entries, today()));
    }

    #[test]
    fn test_streak_ignores_calendar_gaps() {
        let entries = vec![
            entry("1", Virtue::Honesty, "2024-01-01"),
            entry("2", Virtue::Honesty, "2024-03-15"),
        ];
        let stats = aggregate(&entries, today());
        assert_eq!(stats.streak, 2);
        assert_eq!(stats.calendar_streak, 0);
    }

    #[test]
    fn test_calendar_streak_counts_consecutive_days() {
        let entries = vec![
            entry("1", Virtue::Honesty, "2024-05-06"),
            entry("2", Virtue::Honesty, "2024-05-08"),
            entry("3", Virtue::Respect, "2024-05-09"),
            entry("4", Virtue::Respect, "2024-05-09"),
            entry("5", Virtue::Respect, "2024-05-10"),
        ];
        assert_eq!(calendar_streak(&entries, today()), 3);
    }

    #[test]
    fn test_calendar_streak_alive_until_today_is_logged() {
        let entries = vec![
            entry("1", Virtue::Honesty, "2024-05-08"),
            entry("2", Virtue::Honesty, "2024-05-09"),
        ];
        assert_eq!(calendar_streak(&entries, today()), 2);
    }
}

// src/services/leaderboard.rs

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::leaderboard::LeaderboardEntry;

pub const CSV_HEADER: &str = "Rank,Name,Score,Percentage,Date";

/// Leaderboard row with its 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub timestamp_millis: i64,
}

/// Ratio as `(numerator, denominator)`; an empty assessment counts as 0%.
fn ratio(entry: &LeaderboardEntry) -> (u64, u64) {
    if entry.total == 0 {
        (0, 1)
    } else {
        (u64::from(entry.score), u64::from(entry.total))
    }
}

/// Best ratio first, then newest, then by name and id so the order is total.
fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    let (an, ad) = ratio(a);
    let (bn, bd) = ratio(b);

    (bn * ad)
        .cmp(&(an * bd))
        .then_with(|| b.timestamp_millis.cmp(&a.timestamp_millis))
        .then_with(|| a.username.cmp(&b.username))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Sorted, ranked view of the entries. `limit` truncates after sorting.
pub fn rank(mut entries: Vec<LeaderboardEntry>, limit: Option<usize>) -> Vec<RankedEntry> {
    entries.sort_by(compare);
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| RankedEntry {
            rank: i + 1,
            percentage: e.percentage(),
            user_id: e.user_id,
            username: e.username,
            score: e.score,
            total: e.total,
            timestamp_millis: e.timestamp_millis,
        })
        .collect()
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// CSV export of a ranked view. Dates are UTC `YYYY-MM-DD`.
pub fn to_csv(ranked: &[RankedEntry]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for entry in ranked {
        let date = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(entry.timestamp_millis)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{}/{},{}%,{}\n",
            entry.rank,
            quote(&entry.username),
            entry.score,
            entry.total,
            entry.percentage,
            date
        ));
    }

    out
}

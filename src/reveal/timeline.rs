use crate::config::RevealConfig;
use crate::models::RankedResult;
use serde::Serialize;
use std::time::Duration;

/// When one result appears during the list reveal.
///
/// All offsets are measured from the moment the list stage starts playing,
/// after `initial_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub result_id: i64,
    pub rank: u32,
    pub reveal_delay: Duration,
    pub badge_at: Duration,
    pub bar_at: Duration,
    pub trophy_at: Option<Duration>,
    pub count_up_ends_at: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealSchedule {
    /// Lowest rank first, the winner last.
    pub entries: Vec<ScheduleEntry>,
    pub total_reveal_duration: Duration,
    pub max_votes: i64,
    pub top_three: Vec<RankedResult>,
}

pub fn compute_reveal_schedule(results: &[RankedResult], config: &RevealConfig) -> RevealSchedule {
    let mut by_rank: Vec<&RankedResult> = results.iter().collect();
    by_rank.sort_by_key(|result| result.rank);

    let count = by_rank.len();
    let mut entries: Vec<ScheduleEntry> = by_rank
        .iter()
        .enumerate()
        .map(|(index, result)| {
            let steps = u32::try_from(count - 1 - index).unwrap_or(u32::MAX);
            let reveal_delay = config.stagger_interval.saturating_mul(steps);
            let bar_at = reveal_delay.saturating_add(config.bar_delay);
            ScheduleEntry {
                result_id: result.id,
                rank: result.rank,
                reveal_delay,
                badge_at: reveal_delay.saturating_add(config.badge_delay),
                bar_at,
                trophy_at: (result.rank <= 3).then(|| reveal_delay.saturating_add(config.trophy_delay)),
                count_up_ends_at: bar_at.saturating_add(config.count_up_duration),
            }
        })
        .collect();
    // Build-up climaxes on the winner
    entries.reverse();

    let steps = u32::try_from(count).unwrap_or(u32::MAX);
    let total_reveal_duration = config
        .initial_delay
        .saturating_add(config.stagger_interval.saturating_mul(steps))
        .saturating_add(config.bar_fill_duration);

    RevealSchedule {
        entries,
        total_reveal_duration,
        max_votes: max_votes(results),
        top_three: top_three(results),
    }
}

// Zero for an empty set
pub fn max_votes(results: &[RankedResult]) -> i64 {
    results.iter().map(|result| result.votes).max().unwrap_or(0)
}

/// Ranks 1 to 3 in rank order, fewer when the poll is smaller.
pub fn top_three(results: &[RankedResult]) -> Vec<RankedResult> {
    let mut podium: Vec<RankedResult> = results.iter().filter(|result| result.rank <= 3).cloned().collect();
    podium.sort_by_key(|result| result.rank);
    podium
}

/// Share of the longest bar, in `[0, 1]`.
pub fn bar_fraction(votes: i64, max_votes: i64) -> f64 {
    if max_votes <= 0 {
        return 0.0;
    }
    (votes.max(0) as f64 / max_votes as f64).clamp(0.0, 1.0)
}

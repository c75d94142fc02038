use crate::models::RankedResult;
use crate::reveal::{bar_fraction, Acquisition};
use std::collections::HashSet;

const BAR_WIDTH: usize = 16;
// Discord rejects message content over 2000 characters
const MAX_CONTENT: usize = 1990;

const CONFETTI: [&str; 4] = [
    "🎉 ✨ 🎊 ✨ 🎉 ✨ 🎊",
    "✨ 🎊 ✨ 🎉 ✨ 🎊 ✨",
    "🎊 ✨ 🎉 ✨ 🎊 ✨ 🎉",
    "✨ 🎉 ✨ 🎊 ✨ 🎉 ✨",
];

pub fn medal(rank: u32) -> &'static str {
    match rank {
        1 => "🏆",
        2 => "🥈",
        3 => "🥉",
        _ => "▫️",
    }
}

pub fn bar(votes: i64, max_votes: i64) -> String {
    let fraction = bar_fraction(votes, max_votes);
    let mut filled = (fraction * BAR_WIDTH as f64).round() as usize;
    if votes > 0 && filled == 0 {
        filled = 1;
    }
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// The ordered list with only `revealed` entries filled in.
pub fn list_frame(results: &[RankedResult], revealed: &HashSet<i64>, max_votes: i64) -> String {
    let mut by_rank: Vec<&RankedResult> = results.iter().collect();
    by_rank.sort_by_key(|result| result.rank);

    let mut frame = String::from("🎉 **Results** 🎉\n");
    for result in by_rank {
        if revealed.contains(&result.id) {
            frame.push_str(&format!(
                "{} `#{:>2}` **{}** · {}\n`{}` {} votes\n",
                medal(result.rank),
                result.rank,
                result.team_name,
                result.project_name,
                bar(result.votes, max_votes),
                result.votes
            ));
        } else {
            frame.push_str(&format!("▪️ `#{:>2}` ???\n", result.rank));
        }
    }
    frame
}

/// The top three; `frame` selects the confetti pattern while celebrating.
pub fn podium_frame(top_three: &[RankedResult], frame: Option<u32>) -> String {
    let mut text = String::new();
    if let Some(frame) = frame {
        text.push_str(CONFETTI[frame as usize % CONFETTI.len()]);
        text.push('\n');
    }
    text.push_str("🏁 **Podium** 🏁\n");

    if top_three.is_empty() {
        text.push_str("No projects took part in this poll.\n");
    }
    for result in top_three {
        text.push_str(&format!(
            "{} **{}** · {} · {} votes\n",
            medal(result.rank),
            result.team_name,
            result.project_name,
            result.votes
        ));
    }
    text
}

pub fn reveal_notice(acquisition: &Acquisition) -> Option<String> {
    match acquisition.failure {
        Some(failure) => Some(format!("⚠️ {} Showing sample data instead.", failure.user_message())),
        None if acquisition.use_sample => {
            Some("ℹ️ Showing sample data. Pass a poll id to `/poll reveal` to load real results.".to_string())
        }
        None => None,
    }
}

pub fn compose(notice: Option<&str>, frame: &str) -> String {
    let content = match notice {
        Some(notice) => format!("{}\n\n{}", notice, frame),
        None => frame.to_string(),
    };
    truncate(content)
}

fn truncate(mut content: String) -> String {
    if content.len() <= MAX_CONTENT {
        return content;
    }
    let mut cut = MAX_CONTENT - '…'.len_utf8();
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    content.truncate(cut);
    content.push('…');
    content
}

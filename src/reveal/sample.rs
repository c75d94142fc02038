use crate::models::ProjectVoteRecord;

// Shown whenever real results are unavailable
const SAMPLE_PROJECTS: [(i64, &str, &str, i64); 10] = [
    (1, "Team A", "Innovative AI App", 150),
    (2, "Team B", "Smart Voting System", 120),
    (3, "Team C", "Eco Management Tool", 95),
    (4, "Team D", "Task Optimizer", 80),
    (5, "Team E", "Education Support Platform", 65),
    (6, "Team F", "Health Tracker", 55),
    (7, "Team G", "Community Platform", 45),
    (8, "Team H", "Recipe Sharing Service", 38),
    (9, "Team I", "Study Helper", 30),
    (10, "Team J", "Event Manager", 1),
];

pub fn sample_records() -> Vec<ProjectVoteRecord> {
    SAMPLE_PROJECTS
        .iter()
        .map(|&(id, team_name, project_name, votes)| ProjectVoteRecord {
            id,
            team_name: team_name.to_string(),
            project_name: project_name.to_string(),
            description: None,
            votes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::ranking::compute_ranked_results;

    #[test]
    fn sample_ranks_follow_its_ids() {
        let ranked = compute_ranked_results(&sample_records()).unwrap();
        assert!(ranked.iter().all(|result| result.rank as i64 == result.id));
    }
}

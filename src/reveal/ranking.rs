use crate::errors::RankingError;
use crate::models::{ProjectVoteRecord, RankedResult};
use std::collections::HashSet;

/// Orders project records by votes and assigns dense, distinct ranks.
///
/// Equal vote counts keep their input order, so the first-seen project
/// takes the better rank and exactly one result holds rank 1.
pub fn compute_ranked_results(records: &[ProjectVoteRecord]) -> Result<Vec<RankedResult>, RankingError> {
    let mut seen_ids = HashSet::with_capacity(records.len());
    for record in records {
        if record.votes < 0 {
            return Err(RankingError::InvalidRecord {
                id: record.id,
                reason: format!("negative vote count {}", record.votes),
            });
        }
        if !seen_ids.insert(record.id) {
            return Err(RankingError::InvalidRecord {
                id: record.id,
                reason: "duplicate id within poll".to_string(),
            });
        }
    }

    // sort_by is stable: ties stay in input order
    let mut ordered: Vec<&ProjectVoteRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.votes.cmp(&a.votes));

    Ok(ordered
        .into_iter()
        .enumerate()
        .map(|(position, record)| RankedResult::from_record(record, position as u32 + 1))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, votes: i64) -> ProjectVoteRecord {
        ProjectVoteRecord {
            id,
            team_name: format!("Team {}", id),
            project_name: format!("Project {}", id),
            description: None,
            votes,
        }
    }

    fn ids_and_ranks(results: &[RankedResult]) -> Vec<(i64, u32)> {
        results.iter().map(|r| (r.id, r.rank)).collect()
    }

    #[test]
    fn ranks_by_votes_descending() {
        let records = vec![record(1, 45), record(2, 38), record(3, 52), record(4, 29)];
        let ranked = compute_ranked_results(&records).unwrap();
        assert_eq!(ids_and_ranks(&ranked), vec![(3, 1), (1, 2), (2, 3), (4, 4)]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let records = vec![record(7, 10), record(3, 20), record(5, 10), record(1, 10)];
        let ranked = compute_ranked_results(&records).unwrap();
        assert_eq!(ids_and_ranks(&ranked), vec![(3, 1), (7, 2), (5, 3), (1, 4)]);
    }

    #[test]
    fn all_zero_votes_rank_in_input_order() {
        let records = vec![record(9, 0), record(8, 0), record(7, 0)];
        let ranked = compute_ranked_results(&records).unwrap();
        assert_eq!(ids_and_ranks(&ranked), vec![(9, 1), (8, 2), (7, 3)]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(compute_ranked_results(&[]).unwrap().is_empty());
    }

    #[test]
    fn exactly_one_first_place_and_same_length() {
        let records: Vec<_> = (0..25).map(|i| record(i, (i * 7) % 5)).collect();
        let ranked = compute_ranked_results(&records).unwrap();
        assert_eq!(ranked.len(), records.len());
        assert_eq!(ranked.iter().filter(|r| r.rank == 1).count(), 1);
        let ranks: Vec<u32> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=25).collect::<Vec<u32>>());
        assert!(ranked.windows(2).all(|pair| pair[0].votes >= pair[1].votes));
    }

    #[test]
    fn negative_votes_are_rejected() {
        let err = compute_ranked_results(&[record(1, 3), record(2, -1)]).unwrap_err();
        assert!(matches!(err, RankingError::InvalidRecord { id: 2, .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = compute_ranked_results(&[record(4, 3), record(4, 5)]).unwrap_err();
        assert!(matches!(err, RankingError::InvalidRecord { id: 4, .. }));
    }

    #[test]
    fn keeps_project_details() {
        let mut input = record(1, 2);
        input.description = Some("Track your workout progress".to_string());
        let ranked = compute_ranked_results(&[input.clone()]).unwrap();
        assert_eq!(ranked[0].team_name, input.team_name);
        assert_eq!(ranked[0].description.as_deref(), Some("Track your workout progress"));
    }
}

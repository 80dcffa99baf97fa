//! Metabolic Resource Overlap: average pairwise Jaccard overlap between the
//! members' isolated minimal media. Quantifies competition for the same
//! external compounds, independent of any growth benefit.

use super::interaction_potential::IsolatedMedia;
use indexmap::IndexSet;
use itertools::Itertools;
use tracing::{debug, instrument};

/// Computes MRO over all unordered member pairs.
///
/// Returns `None` when the community has fewer than two members or any
/// participant's isolated minimal-medium solve failed.
#[instrument(skip_all, name = "resource_overlap_task", fields(members = isolated.media.len()))]
pub fn run(isolated: &IsolatedMedia) -> Option<f64> {
    if isolated.media.len() < 2 || !isolated.all_optimal() {
        return None;
    }

    let requirements: Vec<IndexSet<&str>> = isolated
        .media
        .values()
        .map(|m| m.exchanges.iter().map(String::as_str).collect())
        .collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for (first, second) in requirements.iter().tuple_combinations() {
        let intersection = first.intersection(second).count();
        let union = first.union(second).count();
        // two organisms requiring nothing overlap completely
        total += if union == 0 {
            1.0
        } else {
            intersection as f64 / union as f64
        };
        pairs += 1;
    }
    let overlap = total / pairs as f64;
    debug!(overlap, pairs, "resource overlap computed");
    Some(overlap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lp::SolverStatus;
    use crate::engine::tasks::minimal_medium::MinimalMedium;
    use approx::assert_relative_eq;
    use indexmap::IndexMap;

    fn medium(exchanges: &[&str]) -> MinimalMedium {
        MinimalMedium {
            exchanges: exchanges.iter().map(|e| e.to_string()).collect(),
            status: SolverStatus::Optimal,
            objective: Some(exchanges.len() as f64),
        }
    }

    fn isolated(media: Vec<(&str, MinimalMedium)>) -> IsolatedMedia {
        IsolatedMedia {
            media: media
                .into_iter()
                .map(|(id, m)| (id.to_string(), m))
                .collect::<IndexMap<_, _>>(),
        }
    }

    #[test]
    fn identical_media_overlap_completely() {
        let isolated = isolated(vec![
            ("A", medium(&["R_EX_glc_e", "R_EX_o2_e"])),
            ("B", medium(&["R_EX_glc_e", "R_EX_o2_e"])),
        ]);
        assert_relative_eq!(run(&isolated).unwrap(), 1.0);
    }

    #[test]
    fn disjoint_media_do_not_overlap() {
        let isolated = isolated(vec![
            ("A", medium(&["R_EX_glc_e"])),
            ("B", medium(&["R_EX_ac_e"])),
        ]);
        assert_relative_eq!(run(&isolated).unwrap(), 0.0);
    }

    #[test]
    fn partial_overlap_averages_over_pairs() {
        // AB share one of three compounds; AC disjoint; BC disjoint
        let isolated = isolated(vec![
            ("A", medium(&["R_EX_glc_e", "R_EX_o2_e"])),
            ("B", medium(&["R_EX_glc_e", "R_EX_nh4_e"])),
            ("C", medium(&["R_EX_ac_e"])),
        ]);
        let expected = (1.0 / 3.0 + 0.0 + 0.0) / 3.0;
        assert_relative_eq!(run(&isolated).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn failed_participant_makes_the_score_undefined() {
        let mut failing = medium(&[]);
        failing.status = SolverStatus::Infeasible;
        failing.objective = None;
        let isolated = isolated(vec![("A", medium(&["R_EX_glc_e"])), ("B", failing)]);
        assert_eq!(run(&isolated), None);
    }

    #[test]
    fn single_member_has_no_overlap_score() {
        let isolated = isolated(vec![("A", medium(&["R_EX_glc_e"]))]);
        assert_eq!(run(&isolated), None);
    }
}

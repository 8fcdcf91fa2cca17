//! # Selector
//!
//! Ranks a set of evaluated candidates. Feasible candidates are ranked first, in ascending order
//! of cost, followed by the infeasible candidates, also in ascending order of cost. Ties on cost
//! are broken by the smaller absolute start offset `|s0|`, then by position in the input set, so
//! that the ranking is fully deterministic.
//!
//! Ranks form a dense permutation of `0..N`. The infeasible candidates are ranked for diagnostic
//! purposes only: if there is no feasible candidate [`rank`] returns
//! [`SelectError::NoFeasibleTrajectory`] and nothing may be tracked.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ordered_float::OrderedFloat;

use super::Candidate;
use crate::curve::Curve;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("No candidates were provided for ranking")]
    NoCandidates,

    #[error("None of the {0} candidates is feasible")]
    NoFeasibleTrajectory(usize),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Rank the candidates in place, returning the index of the rank 0 candidate.
///
/// Costs must already have been populated. The rank of every candidate is overwritten, including
/// when an error is returned for an infeasible set.
pub fn rank<C: Curve>(candidates: &mut [Candidate<C>]) -> Result<usize, SelectError> {
    if candidates.is_empty() {
        return Err(SelectError::NoCandidates);
    }

    let order = ranking_order(candidates);

    for (rank, &idx) in order.iter().enumerate() {
        candidates[idx].rank = Some(rank);
    }

    let best = order[0];
    if candidates[best].is_feasible() {
        Ok(best)
    } else {
        Err(SelectError::NoFeasibleTrajectory(candidates.len()))
    }
}

/// Get the indices of the candidates in rank order without modifying them.
pub fn ranking_order<C: Curve>(candidates: &[Candidate<C>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();

    // Feasible before infeasible (false < true), then cost, then |s0|. NaN costs order after all
    // numeric costs. The sort is stable so identical keys keep their input order.
    order.sort_by_key(|&i| {
        let c = &candidates[i];
        (
            !c.is_feasible(),
            OrderedFloat(c.cost),
            OrderedFloat(c.s0.abs()),
        )
    });

    order
}

/// Get the index of the rank 0 candidate from an already ranked set, if it is feasible.
pub fn best<C: Curve>(candidates: &[Candidate<C>]) -> Option<usize> {
    candidates
        .iter()
        .position(|c| c.rank == Some(0))
        .filter(|&i| candidates[i].is_feasible())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::curve::Polynomial;

    fn candidate(cost: f64, feasible: bool) -> Candidate {
        let mut c = Candidate::new(Polynomial::constant(cost));
        c.cost = cost;
        c.hits_obstacle = !feasible;
        c
    }

    #[test]
    fn test_rank_mixed_set() {
        let mut cands = vec![
            candidate(5.0, true),
            candidate(2.0, true),
            candidate(2.0, true),
            candidate(8.0, false),
        ];

        let best_idx = rank(&mut cands).unwrap();

        assert_eq!(best_idx, 1);
        assert_eq!(cands[1].rank, Some(0));
        assert_eq!(cands[2].rank, Some(1));
        assert_eq!(cands[0].rank, Some(2));
        assert_eq!(cands[3].rank, Some(3));
        assert_eq!(best(&cands), Some(1));
    }

    #[test]
    fn test_infeasible_never_first() {
        // The cheapest candidate hits an obstacle, another is out of bounds
        let mut cands = vec![
            candidate(0.1, false),
            candidate(9.0, true),
            candidate(0.5, true),
        ];
        cands[2].hits_obstacle = false;
        cands[2].out_of_bounds = true;

        assert_eq!(rank(&mut cands), Ok(1));
        assert_eq!(cands[1].rank, Some(0));
        assert_eq!(cands[0].rank, Some(1));
        assert_eq!(cands[2].rank, Some(2));
    }

    #[test]
    fn test_tie_break_on_s0() {
        let mut cands = vec![candidate(3.0, true), candidate(3.0, true), candidate(3.0, true)];
        cands[0].s0 = -4.0;
        cands[1].s0 = 2.0;
        cands[2].s0 = 0.5;

        assert_eq!(rank(&mut cands), Ok(2));
        assert_eq!(cands[2].rank, Some(0));
        assert_eq!(cands[1].rank, Some(1));
        assert_eq!(cands[0].rank, Some(2));
    }

    #[test]
    fn test_rank_is_reproducible() {
        let make = || {
            vec![
                candidate(1.0, true),
                candidate(1.0, true),
                candidate(0.5, false),
                candidate(1.0, false),
            ]
        };

        let mut a = make();
        let mut b = make();
        rank(&mut a).unwrap();
        rank(&mut b).unwrap();

        let ranks_a: Vec<_> = a.iter().map(|c| c.rank).collect();
        let ranks_b: Vec<_> = b.iter().map(|c| c.rank).collect();
        assert_eq!(ranks_a, ranks_b);
        assert_eq!(ranks_a, vec![Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_no_feasible_trajectory() {
        let mut cands = vec![candidate(4.0, false), candidate(1.0, false)];

        assert_eq!(rank(&mut cands), Err(SelectError::NoFeasibleTrajectory(2)));

        // Diagnostic ranks are still dense
        assert_eq!(cands[1].rank, Some(0));
        assert_eq!(cands[0].rank, Some(1));

        // But nothing is usable for tracking
        assert_eq!(best(&cands), None);
    }

    #[test]
    fn test_nan_cost_ranked_last_among_feasible() {
        let mut cands = vec![candidate(f64::NAN, true), candidate(100.0, true)];

        assert_eq!(rank(&mut cands), Ok(1));
        assert_eq!(cands[0].rank, Some(1));
    }

    #[test]
    fn test_empty_set() {
        let mut cands: Vec<Candidate> = vec![];
        assert_eq!(rank(&mut cands), Err(SelectError::NoCandidates));
    }
}

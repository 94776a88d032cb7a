//! Weighted reservoir sampling: picks up to `N` A/AAAA answers out of
//! several weighted candidates in a single pass, with an explicit `Rng`
//! so selection is reproducible wherever a caller seeds one (spec §9).
use rand::Rng;

/// One candidate offered to the sampler: its weight and an opaque index
/// back into the caller's row list, so the caller doesn't have to clone
/// the row just to find out which one won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub weight: u32,
}

/// Selects one candidate with probability proportional to its weight.
/// Equivalent to `select_n(rng, candidates, 1)` but named for the common
/// single-winner case.
pub fn select<R: Rng + ?Sized>(rng: &mut R, candidates: &[Candidate]) -> Option<Candidate> {
    select_n(rng, candidates, 1).into_iter().next()
}

/// Fills a bounded reservoir of capacity `n` using the `key = u^(1/w)`
/// trick (Efraimidis–Spirakis): each candidate draws `u ~ Uniform(0,1)`
/// and computes `key = u^(1/w)`; while the reservoir has room the
/// candidate is kept outright, once full it replaces the current
/// smallest-key occupant only if its own key is larger. Single-candidate
/// input is special-cased to skip the draw entirely — there is nothing
/// to compare against, and a zero-weight singleton would otherwise
/// divide by zero. Returned in reservoir order, not sorted by key;
/// callers that need emission order to not leak selection strength
/// shuffle the result themselves.
pub fn select_n<R: Rng + ?Sized>(rng: &mut R, candidates: &[Candidate], n: usize) -> Vec<Candidate> {
    if candidates.is_empty() || n == 0 {
        return Vec::new();
    }
    if candidates.len() == 1 {
        return vec![candidates[0]];
    }

    let mut reservoir: Vec<(f64, Candidate)> = Vec::with_capacity(n.min(candidates.len()));
    for &c in candidates {
        let w = c.weight.max(1) as f64;
        let u: f64 = rng.gen_range(f64::EPSILON..1.0);
        let key = u.powf(1.0 / w);

        if reservoir.len() < n {
            reservoir.push((key, c));
        } else if let Some((min_idx, _)) = reservoir.iter().enumerate().min_by(|a, b| a.1.0.partial_cmp(&b.1.0).unwrap()) {
            if key > reservoir[min_idx].0 {
                reservoir[min_idx] = (key, c);
            }
        }
    }
    reservoir.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    #[test]
    fn single_candidate_always_wins_without_drawing() {
        let mut rng = seeded(1);
        let picked = select(&mut rng, &[Candidate { index: 0, weight: 0 }]).unwrap();
        assert_eq!(picked.index, 0);
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let mut rng = seeded(1);
        assert!(select(&mut rng, &[]).is_none());
    }

    #[test]
    fn zero_weight_candidate_can_still_be_chosen_among_others() {
        // a weight of 0 is clamped to 1 rather than given probability 0,
        // matching the data model's "weight 0 behaves like weight 1" note
        let mut rng = seeded(7);
        let candidates = [
            Candidate { index: 0, weight: 0 },
            Candidate { index: 1, weight: 1 },
        ];
        let mut saw_zero_weight_win = false;
        for seed in 0..200 {
            let mut r = seeded(seed);
            if select(&mut r, &candidates).unwrap().index == 0 {
                saw_zero_weight_win = true;
                break;
            }
        }
        let _ = &mut rng;
        assert!(saw_zero_weight_win);
    }

    #[test]
    fn heavier_weight_wins_more_often() {
        let candidates = [
            Candidate { index: 0, weight: 1 },
            Candidate { index: 1, weight: 99 },
        ];
        let mut heavy_wins = 0;
        for seed in 0..500 {
            let mut rng = seeded(seed);
            if select(&mut rng, &candidates).unwrap().index == 1 {
                heavy_wins += 1;
            }
        }
        assert!(heavy_wins > 400, "heavy candidate only won {heavy_wins}/500");
    }

    #[test]
    fn select_n_never_exceeds_capacity_and_keeps_distinct_candidates() {
        let candidates: Vec<Candidate> = (0..10).map(|i| Candidate { index: i, weight: 1 }).collect();
        let mut rng = seeded(5);
        let kept = select_n(&mut rng, &candidates, 3);
        assert_eq!(kept.len(), 3);
        let indices: std::collections::BTreeSet<usize> = kept.iter().map(|c| c.index).collect();
        assert_eq!(indices.len(), 3, "reservoir should not keep the same candidate twice");
    }

    #[test]
    fn select_n_returns_everything_when_fewer_candidates_than_capacity() {
        let candidates = [Candidate { index: 0, weight: 1 }, Candidate { index: 1, weight: 1 }];
        let mut rng = seeded(2);
        let kept = select_n(&mut rng, &candidates, 5);
        assert_eq!(kept.len(), 2);
    }
}

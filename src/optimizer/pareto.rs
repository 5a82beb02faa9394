//! Pareto ranking
//!
//! Fast non-dominated sorting, crowding distance and the NSGA-II survivor
//! cut. Functions work on fitness slices and return indices into them, so
//! the same code ranks populations, offspring pools and plain result sets.

use std::cmp::Ordering;

use crate::nas::Fitness;

use super::population::{EvaluatedArchitecture, Individual};

/// Partition `fitnesses` into Pareto fronts.
///
/// Front `k` holds the indices of individuals dominated only by members of
/// fronts `0..k`. Indices within a front are in ascending order.
pub fn non_dominated_sort(fitnesses: &[Fitness]) -> Vec<Vec<usize>> {
    let n = fitnesses.len();

    // Domination counts and dominated sets
    let mut domination_count = vec![0usize; n];
    let mut dominates: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            if fitnesses[i].dominates(&fitnesses[j]) {
                dominates[i].push(j);
                domination_count[j] += 1;
            } else if fitnesses[j].dominates(&fitnesses[i]) {
                dominates[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominates[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }

    fronts
}

/// Crowding distance of each member of `front`, aligned with `front`.
///
/// Boundary members on either objective get `+inf`; so does every member of
/// a front with two or fewer entries. Interior members accumulate the gap
/// between their neighbours, normalized by the objective's range.
pub fn crowding_distances(fitnesses: &[Fitness], front: &[usize]) -> Vec<f64> {
    let len = front.len();
    if len <= 2 {
        return vec![f64::INFINITY; len];
    }

    let mut distances = vec![0.0; len];
    let mut order: Vec<usize> = (0..len).collect();

    for m in 0..2 {
        let value = |pos: usize| fitnesses[front[pos]].objectives()[m];
        order.sort_by(|&a, &b| value(a).partial_cmp(&value(b)).unwrap_or(Ordering::Equal));

        let first = order[0];
        let last = order[len - 1];
        distances[first] = f64::INFINITY;
        distances[last] = f64::INFINITY;

        let range = value(last) - value(first);
        if range <= 0.0 || !range.is_finite() {
            continue;
        }

        for k in 1..(len - 1) {
            let gap = value(order[k + 1]) - value(order[k - 1]);
            distances[order[k]] += gap / range;
        }
    }

    distances
}

/// Result of ranking a pool
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Fronts as indices into the pool
    pub fronts: Vec<Vec<usize>>,
    /// Rank per pool index
    pub ranks: Vec<usize>,
    /// Crowding distance per pool index
    pub distances: Vec<f64>,
}

impl Ranking {
    /// Sort `fitnesses` into fronts and compute crowding per front
    pub fn compute(fitnesses: &[Fitness]) -> Self {
        let fronts = non_dominated_sort(fitnesses);
        let mut ranks = vec![usize::MAX; fitnesses.len()];
        let mut distances = vec![0.0; fitnesses.len()];

        for (rank, front) in fronts.iter().enumerate() {
            let crowding = crowding_distances(fitnesses, front);
            for (&idx, d) in front.iter().zip(crowding) {
                ranks[idx] = rank;
                distances[idx] = d;
            }
        }

        Self {
            fronts,
            ranks,
            distances,
        }
    }

    /// Pick `mu` survivors: whole fronts in rank order, then the overflowing
    /// front by descending crowding distance (ties keep pool order).
    pub fn select(&self, mu: usize) -> Vec<usize> {
        let mut chosen = Vec::with_capacity(mu);

        for front in &self.fronts {
            let remaining = mu - chosen.len();
            if remaining == 0 {
                break;
            }
            if front.len() <= remaining {
                chosen.extend_from_slice(front);
                continue;
            }

            let mut by_crowding = front.clone();
            by_crowding.sort_by(|&a, &b| {
                self.distances[b]
                    .partial_cmp(&self.distances[a])
                    .unwrap_or(Ordering::Equal)
            });
            chosen.extend_from_slice(&by_crowding[..remaining]);
            break;
        }

        chosen
    }
}

/// Rank `pool` in place and return the `mu` survivors in selection order
pub fn select_nsga2(mut pool: Vec<Individual>, mu: usize) -> (Vec<Individual>, Ranking) {
    let fitnesses: Vec<Fitness> = pool.iter().map(Individual::fitness_or_failed).collect();
    let ranking = Ranking::compute(&fitnesses);

    for (idx, ind) in pool.iter_mut().enumerate() {
        ind.rank = ranking.ranks[idx];
        ind.crowding_distance = ranking.distances[idx];
    }

    let mut slots: Vec<Option<Individual>> = pool.into_iter().map(Some).collect();
    let survivors = ranking
        .select(mu)
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();

    (survivors, ranking)
}

/// Non-dominated subset of a result set, in input order
pub fn pareto_front(results: &[EvaluatedArchitecture]) -> Vec<EvaluatedArchitecture> {
    let fitnesses: Vec<Fitness> = results.iter().map(|r| r.fitness).collect();
    non_dominated_sort(&fitnesses)
        .first()
        .map(|front| {
            front
                .iter()
                .map(|&i| results[i].clone())
                .filter(|r| !r.fitness.is_failure())
                .collect()
        })
        .unwrap_or_default()
}

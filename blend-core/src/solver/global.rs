//! Global fallback solver: differential evolution (best/1/bin).
//!
//! Runs only when every local attempt has failed. Candidates are kept
//! feasible by projecting through the same region the local solver
//! uses, so the population explores the bounded simplex directly.

use super::SolverSettings;
use crate::constraints::FeasibleRegion;
use crate::objective::PenaltyObjective;

/// Binomial crossover probability.
const CROSSOVER_RATE: f64 = 0.7;

/// Result of a global solve.
#[derive(Debug, Clone)]
pub struct GlobalOutcome {
    pub x: Vec<f64>,
    pub fval: f64,
    /// Population energies collapsed within tolerance of their mean.
    pub converged: bool,
    pub generations: usize,
}

/// Deterministic 64-bit LCG. Fixed seeding keeps the fallback path
/// reproducible across runs.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64) / ((1u64 << 53) as f64)
    }

    fn next_index(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        ((self.next_f64() * bound as f64) as usize).min(bound - 1)
    }
}

/// Minimize the objective over the region by differential evolution.
pub(crate) fn minimize(
    objective: &PenaltyObjective<'_>,
    region: &FeasibleRegion,
    settings: &SolverSettings,
) -> GlobalOutcome {
    let n = region.len();
    let np = (settings.de_popsize * n).max(8);
    let mut rng = Lcg::new(settings.de_seed);

    // Random population projected into the region, with the
    // equal-split point seeded at index 0.
    let mut pop: Vec<Vec<f64>> = (0..np)
        .map(|_| {
            let y: Vec<f64> = (0..n).map(|_| rng.next_f64()).collect();
            region.project(&y)
        })
        .collect();
    pop[0] = region.project(&vec![1.0 / n as f64; n]);

    let mut energy: Vec<f64> = pop.iter().map(|x| objective.value(x)).collect();
    let mut best = argmin(&energy);

    let mut converged = false;
    let mut generations = 0;
    for gen in 0..settings.de_max_iter {
        generations = gen + 1;

        // Dithered mutation factor, drawn once per generation.
        let f = 0.5 + 0.5 * rng.next_f64();

        for i in 0..np {
            let r1 = distinct_index(&mut rng, np, &[i, best]);
            let r2 = distinct_index(&mut rng, np, &[i, best, r1]);

            let mut trial = pop[i].clone();
            let j_forced = rng.next_index(n);
            for j in 0..n {
                if j == j_forced || rng.next_f64() < CROSSOVER_RATE {
                    trial[j] = pop[best][j] + f * (pop[r1][j] - pop[r2][j]);
                }
            }
            let trial = region.project(&trial);
            let e = objective.value(&trial);
            if e <= energy[i] {
                pop[i] = trial;
                energy[i] = e;
                if e < energy[best] {
                    best = i;
                }
            }
        }

        let mean = energy.iter().sum::<f64>() / np as f64;
        let var = energy
            .iter()
            .map(|e| (e - mean) * (e - mean))
            .sum::<f64>()
            / np as f64;
        if var.sqrt() <= settings.de_conv_tol * mean.abs() {
            converged = true;
            break;
        }
    }

    GlobalOutcome {
        x: pop[best].clone(),
        fval: energy[best],
        converged,
        generations,
    }
}

fn argmin(energy: &[f64]) -> usize {
    let mut best = 0;
    for (i, e) in energy.iter().enumerate() {
        if *e < energy[best] {
            best = i;
        }
    }
    best
}

/// Draw an index in `[0, bound)` avoiding the listed values.
fn distinct_index(rng: &mut Lcg, bound: usize, avoid: &[usize]) -> usize {
    // The population always has spare indices (np >= 8).
    loop {
        let i = rng.next_index(bound);
        if !avoid.contains(&i) {
            return i;
        }
    }
}

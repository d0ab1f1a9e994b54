//! Derivative-free minimisation for the conditional sum-of-squares objective

use std::cell::Cell;

/// Nelder-Mead settings
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Objective evaluations allowed
    pub max_evaluations: usize,
    /// Relative spread of simplex values treated as converged
    pub tolerance: f64,
    /// Offset of the initial simplex vertices from the start point
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 2000,
            tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

impl NelderMeadConfig {
    /// Evaluation cap scaled to the problem dimension
    pub fn for_dimension(dim: usize) -> Self {
        Self {
            max_evaluations: 1000 * (dim + 1),
            ..Default::default()
        }
    }
}

/// Outcome of a Nelder-Mead run
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub evaluations: usize,
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` from `start`.
///
/// The objective may return `f64::INFINITY` to mark infeasible points.
pub fn nelder_mead<F>(objective: F, start: &[f64], config: &NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let dim = start.len();
    let evaluations = Cell::new(0usize);
    let eval = |x: &[f64]| {
        evaluations.set(evaluations.get() + 1);
        let v = objective(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    if dim == 0 {
        let value = eval(start);
        return NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: value,
            evaluations: 1,
            converged: true,
        };
    }

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(dim + 1);
    let v0 = eval(start);
    simplex.push((start.to_vec(), v0));
    for i in 0..dim {
        let mut vertex = start.to_vec();
        vertex[i] += if vertex[i] >= 0.0 {
            config.initial_step
        } else {
            -config.initial_step
        };
        let value = eval(&vertex);
        simplex.push((vertex, value));
    }

    let mut converged = false;
    while evaluations.get() < config.max_evaluations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

        let best = simplex[0].1;
        let worst = simplex[dim].1;
        if best.is_finite() && worst.is_finite() {
            let spread = (worst - best).abs();
            let scale = best.abs() + worst.abs();
            let size = simplex
                .iter()
                .skip(1)
                .map(|(x, _)| {
                    x.iter()
                        .zip(&simplex[0].0)
                        .map(|(a, b)| (a - b).abs())
                        .fold(0.0, f64::max)
                })
                .fold(0.0, f64::max);
            if spread <= config.tolerance * scale + 1e-300 || size < 1e-10 {
                converged = true;
                break;
            }
        }

        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|(x, _)| x[j]).sum::<f64>() / dim as f64)
            .collect();
        let along = |coef: f64, from: &[f64]| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, w)| c + coef * (c - w))
                .collect()
        };

        let worst_point = simplex[dim].0.clone();
        let reflected = along(REFLECT, &worst_point);
        let f_reflected = eval(&reflected);

        if f_reflected < simplex[0].1 {
            let expanded = along(EXPAND, &worst_point);
            let f_expanded = eval(&expanded);
            simplex[dim] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }
        if f_reflected < simplex[dim - 1].1 {
            simplex[dim] = (reflected, f_reflected);
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < simplex[dim].1 {
            let outside = along(CONTRACT, &worst_point);
            let f = eval(&outside);
            (outside, f)
        } else {
            let inside = along(-CONTRACT, &worst_point);
            let f = eval(&inside);
            (inside, f)
        };
        if f_contracted < simplex[dim].1.min(f_reflected) {
            simplex[dim] = (contracted, f_contracted);
            continue;
        }

        let best_point = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk: Vec<f64> = best_point
                .iter()
                .zip(&vertex.0)
                .map(|(b, x)| b + SHRINK * (x - b))
                .collect();
            let value = eval(&shrunk);
            *vertex = (shrunk, value);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (optimal_point, optimal_value) = simplex.swap_remove(0);
    NelderMeadResult {
        optimal_point,
        optimal_value,
        evaluations: evaluations.get(),
        converged,
    }
}

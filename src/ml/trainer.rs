// ============================================================
// Layer 5 — Parallel Trainer
// ============================================================
// Fits the model weights by maximising the L2-regularised
// conditional log-likelihood of the scraped examples:
//
//   L(w) = Σ_i log P(cv_i | x_i)  −  (λ/2)·‖w‖²
//
// The optimiser is L-BFGS with a backtracking (Armijo) line
// search, run on −L(w).
//
// Threading protocol, once per objective evaluation:
//
//   1. the trainer holds the only writable weight vector
//   2. every worker copies that snapshot into its own model
//      replica                                  (broadcast)
//   3. every worker sums log P and ∇ log P over its own
//      partition into local accumulators        (parallel)
//   4. rayon joins all workers                  (barrier)
//   5. partials are summed in partition order and −λ·w is added
//      once                                     (reduction)
//   6. the trainer updates its weight vector    (update)
//
// Partitions are contiguous slices of the example list, fixed
// when the trainer is built; each worker caches its examples'
// per-label feature vectors at that point. The feature set is
// shared read-only through an Arc.
//
// Termination is checked only between iterations:
//   Converged         — ‖∇‖ / max(‖w‖, 1) < ε, or the relative
//                       objective change < ε
//   MaxIterations     — iteration budget spent (not an error)
//   LineSearchStalled — no step decreased the objective
// In every case the best weights found are returned.
//
// Reference: Nocedal & Wright (2006) Numerical Optimization §7.2
//            rayon documentation (ThreadPool::install)

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::data::example::LabeledExample;
use crate::ml::error::TrainError;
use crate::ml::features::FeatureExtractor;
use crate::ml::model::{accumulate_log_likelihood, dot, Llm};

/// Number of (s, y) pairs kept by L-BFGS
const HISTORY: usize = 8;
/// Armijo sufficient-decrease constant
const ARMIJO: f64 = 1e-4;
const MAX_LINE_SEARCH_STEPS: usize = 40;

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub max_iterations: usize,
    pub lambda:         f64,
    pub epsilon:        f64,
    pub threads:        usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            lambda:         0.01,
            epsilon:        1e-4,
            threads:        1,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.max_iterations == 0 {
            return Err(TrainError::invalid_config("max_iterations must be > 0"));
        }
        if !(self.lambda >= 0.0) || !self.lambda.is_finite() {
            return Err(TrainError::invalid_config("lambda must be a finite value >= 0"));
        }
        if !(self.epsilon > 0.0) || !self.epsilon.is_finite() {
            return Err(TrainError::invalid_config("epsilon must be a finite value > 0"));
        }
        if self.threads == 0 {
            return Err(TrainError::invalid_config("threads must be >= 1"));
        }
        Ok(())
    }
}

// ─── Reporting ────────────────────────────────────────────────────────────────
/// One row of optimiser progress, emitted after every iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationMetrics {
    pub iteration:     usize,
    /// Regularised log-likelihood L(w) (higher is better)
    pub objective:     f64,
    pub gradient_norm: f64,
    /// Accepted line-search step length
    pub step:          f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    MaxIterations,
    LineSearchStalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub iterations:    usize,
    /// Objective evaluations, including line-search trials
    pub evaluations:   usize,
    pub objective:     f64,
    pub gradient_norm: f64,
    pub termination:   Termination,
}

// ─── Workers ──────────────────────────────────────────────────────────────────
/// Per-label feature vectors of one example, computed once
struct CachedExample {
    label_index: usize,
    vectors:     Vec<Vec<f64>>,
}

/// Sums of one partition at one weight vector
struct Partial {
    log_likelihood: f64,
    gradient:       Vec<f64>,
}

struct GradientWorker<F: FeatureExtractor> {
    replica:  Llm<F>,
    examples: Vec<CachedExample>,
}

impl<F: FeatureExtractor> GradientWorker<F> {
    fn new(model: &Llm<F>, partition: &[LabeledExample<'_>]) -> Result<Self, TrainError> {
        let examples = partition
            .iter()
            .map(|example| {
                let cvs = example.context.cvs;
                let label_index = cvs
                    .iter()
                    .position(|&c| c == example.label)
                    .ok_or(TrainError::LabelOutsideCandidates { label: example.label })?;
                let vectors = cvs
                    .iter()
                    .map(|&cv| model.feature_vector(cv, &example.context))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CachedExample { label_index, vectors })
            })
            .collect::<Result<Vec<_>, TrainError>>()?;
        Ok(Self { replica: model.clone(), examples })
    }

    fn partial(&mut self, snapshot: &[f64]) -> Result<Partial, TrainError> {
        self.replica.set_weights(snapshot)?;
        let weights = self.replica.weights();

        let mut gradient = vec![0.0; weights.len()];
        let mut log_likelihood = 0.0;
        for example in &self.examples {
            log_likelihood += accumulate_log_likelihood(
                weights,
                &example.vectors,
                example.label_index,
                &mut gradient,
            );
        }
        Ok(Partial { log_likelihood, gradient })
    }
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<F: FeatureExtractor> {
    config:      TrainerConfig,
    pool:        rayon::ThreadPool,
    workers:     Vec<GradientWorker<F>>,
    dimension:   usize,
    evaluations: usize,
}

/// One L-BFGS correction pair
struct Correction {
    s:   Vec<f64>,
    y:   Vec<f64>,
    rho: f64,
}

impl<F: FeatureExtractor> Trainer<F> {
    /// Partition `examples`, start the worker pool and cache every
    /// feature vector. Fails on a bad config or on any feature
    /// vector whose length differs from the model's weights.
    pub fn new(
        model:    &Llm<F>,
        examples: &[LabeledExample<'_>],
        config:   TrainerConfig,
    ) -> Result<Self, TrainError> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;

        let chunk = examples.len().div_ceil(config.threads).max(1);
        let partitions: Vec<&[LabeledExample<'_>]> = examples.chunks(chunk).collect();
        let workers = pool.install(|| {
            partitions
                .par_iter()
                .map(|partition| GradientWorker::new(model, partition))
                .collect::<Result<Vec<_>, _>>()
        })?;

        tracing::info!(
            "Trainer ready: {} examples in {} partitions on {} threads, {} weights",
            examples.len(),
            workers.len(),
            config.threads,
            model.weights().len()
        );

        Ok(Self {
            config,
            pool,
            workers,
            dimension: model.weights().len(),
            evaluations: 0,
        })
    }

    /// Negated objective −L(w) and its gradient
    fn evaluate(&mut self, weights: &[f64]) -> Result<(f64, Vec<f64>), TrainError> {
        self.evaluations += 1;
        let Self { pool, workers, .. } = self;
        let partials = pool.install(|| {
            workers
                .par_iter_mut()
                .map(|worker| worker.partial(weights))
                .collect::<Result<Vec<_>, _>>()
        })?;

        // Fixed partition order keeps the sum reproducible
        let lambda = self.config.lambda;
        let mut log_likelihood = 0.0;
        let mut gradient = vec![0.0; self.dimension];
        for partial in &partials {
            log_likelihood += partial.log_likelihood;
            for (g, p) in gradient.iter_mut().zip(&partial.gradient) {
                *g += p;
            }
        }

        let value = -log_likelihood + 0.5 * lambda * dot(weights, weights);
        for (g, w) in gradient.iter_mut().zip(weights) {
            *g = -*g + lambda * w;
        }
        Ok((value, gradient))
    }

    /// Optimise `model`'s weights in place, starting from its current
    /// weights.
    pub fn train(&mut self, model: &mut Llm<F>) -> Result<TrainingReport, TrainError> {
        self.train_with_observer(model, |_| {})
    }

    pub fn train_with_observer<O>(
        &mut self,
        model:        &mut Llm<F>,
        mut observer: O,
    ) -> Result<TrainingReport, TrainError>
    where
        O: FnMut(&IterationMetrics),
    {
        if model.weights().len() != self.dimension {
            return Err(TrainError::dimension_mismatch(self.dimension, model.weights().len()));
        }
        let epsilon = self.config.epsilon;

        let mut w = model.weights().to_vec();
        let (mut f, mut g) = self.evaluate(&w)?;
        let mut history: VecDeque<Correction> = VecDeque::with_capacity(HISTORY);
        let mut iterations  = 0;
        let mut termination = Termination::MaxIterations;

        if gradient_converged(&g, &w, epsilon) {
            termination = Termination::Converged;
        } else {
            for iteration in 1..=self.config.max_iterations {
                let mut d  = direction(&g, &history);
                let mut gd = dot(&g, &d);
                if gd >= 0.0 {
                    // Not a descent direction: restart from steepest descent
                    history.clear();
                    d  = g.iter().map(|v| -v).collect();
                    gd = -dot(&g, &g);
                }

                let mut step = if history.is_empty() { 1.0 / norm(&d).max(1e-12) } else { 1.0 };
                let mut accepted = None;
                for _ in 0..MAX_LINE_SEARCH_STEPS {
                    let trial: Vec<f64> = w.iter().zip(&d).map(|(wi, di)| wi + step * di).collect();
                    let (f_trial, g_trial) = self.evaluate(&trial)?;
                    if f_trial.is_finite() && f_trial <= f + ARMIJO * step * gd {
                        accepted = Some((trial, f_trial, g_trial));
                        break;
                    }
                    step *= 0.5;
                }

                let Some((w_new, f_new, g_new)) = accepted else {
                    termination = Termination::LineSearchStalled;
                    break;
                };

                let s: Vec<f64> = w_new.iter().zip(&w).map(|(a, b)| a - b).collect();
                let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
                let sy = dot(&s, &y);
                if sy > 1e-12 {
                    if history.len() == HISTORY {
                        history.pop_front();
                    }
                    history.push_back(Correction { s, y, rho: 1.0 / sy });
                }

                let relative_change = (f - f_new).abs() / f.abs().max(1.0);
                w = w_new;
                f = f_new;
                g = g_new;
                iterations = iteration;

                let metrics = IterationMetrics {
                    iteration,
                    objective:     -f,
                    gradient_norm: norm(&g),
                    step,
                };
                tracing::debug!(
                    "iteration {:>4} | objective={:.6} | |g|={:.3e} | step={:.3e}",
                    iteration,
                    metrics.objective,
                    metrics.gradient_norm,
                    step
                );
                observer(&metrics);

                if gradient_converged(&g, &w, epsilon) || relative_change < epsilon {
                    termination = Termination::Converged;
                    break;
                }
            }
        }

        model.set_weights(&w)?;

        let report = TrainingReport {
            iterations,
            evaluations:   self.evaluations,
            objective:     -f,
            gradient_norm: norm(&g),
            termination,
        };
        match termination {
            Termination::Converged => tracing::info!(
                "Converged after {} iterations, objective {:.6}",
                iterations,
                report.objective
            ),
            Termination::MaxIterations => tracing::warn!(
                "Stopped at max_iterations={} without reaching epsilon={}, objective {:.6}",
                iterations,
                epsilon,
                report.objective
            ),
            Termination::LineSearchStalled => tracing::warn!(
                "Line search stalled after {} iterations, objective {:.6}",
                iterations,
                report.objective
            ),
        }
        Ok(report)
    }
}

/// Train `model` on `examples` in one call.
pub fn train<F: FeatureExtractor>(
    model:    &mut Llm<F>,
    examples: &[LabeledExample<'_>],
    config:   TrainerConfig,
) -> Result<TrainingReport, TrainError> {
    Trainer::new(model, examples, config)?.train(model)
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn gradient_converged(g: &[f64], w: &[f64], epsilon: f64) -> bool {
    norm(g) / norm(w).max(1.0) < epsilon
}

/// L-BFGS two-loop recursion: returns −H·g
fn direction(g: &[f64], history: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = g.to_vec();
    let mut alphas = Vec::with_capacity(history.len());
    for c in history.iter().rev() {
        let alpha = c.rho * dot(&c.s, &q);
        for (qi, yi) in q.iter_mut().zip(&c.y) {
            *qi -= alpha * yi;
        }
        alphas.push(alpha);
    }

    if let Some(last) = history.back() {
        let gamma = dot(&last.s, &last.y) / dot(&last.y, &last.y);
        q.iter_mut().for_each(|qi| *qi *= gamma);
    }

    for (c, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = c.rho * dot(&c.y, &q);
        for (qi, si) in q.iter_mut().zip(&c.s) {
            *qi += (alpha - beta) * si;
        }
    }

    q.iter().map(|v| -v).collect()
}

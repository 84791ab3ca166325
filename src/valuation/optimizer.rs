//! Single-period injection/withdrawal decision
//!
//! Maximises `df * cash_flow(q) + V_next(v - loss(v) + q)` over the signed
//! volume `q`, within the storage's rate bounds clipped so the next inventory
//! stays inside one of the next period's inventory intervals.

use super::config::{DecisionSearch, ValuationConfig};
use super::interp::ValueFunction;
use super::space::FEASIBILITY_TOLERANCE;
use crate::calendar::Period;
use crate::error::{Result, ValuationError};
use crate::storage::Storage;

/// 1/φ
const INV_GOLDEN_RATIO: f64 = 0.618_033_988_749_894_9;

/// Relative value difference within which doing nothing is preferred
const VALUE_TIE_TOLERANCE: f64 = 1e-10;

/// Everything the optimizer needs about one period
pub(crate) struct PeriodContext<'a, S: Storage + ?Sized> {
    pub storage: &'a S,
    pub period: Period,
    pub price: f64,
    /// Discount factor of the period's settlement date
    pub discount_factor: f64,
    pub next_values: &'a ValueFunction,
}

/// Outcome of the decision at one inventory level
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Decision {
    /// Signed volume, positive = injection
    pub inject_withdraw: f64,
    pub cmdty_consumed: f64,
    pub inventory_loss: f64,
    pub next_inventory: f64,
    /// Volume bought (negative) or sold (positive) in the market
    pub net_position: f64,
    /// Undiscounted cash flow for the period
    pub cash_flow: f64,
    /// Discounted cash flow plus continuation value
    pub value: f64,
}

/// Bounded one-dimensional maximiser for the period decision
#[derive(Debug, Clone)]
pub(crate) struct DecisionOptimizer {
    tolerance: f64,
    max_iterations: usize,
    search: DecisionSearch,
}

impl DecisionOptimizer {
    pub fn from_config(config: &ValuationConfig) -> Self {
        Self {
            tolerance: config.numerical_tolerance,
            max_iterations: config.max_search_iterations,
            search: config.search,
        }
    }

    /// Best decision at `inventory`
    pub fn optimize<S: Storage + ?Sized>(&self, ctx: &PeriodContext<'_, S>, inventory: f64) -> Result<Decision> {
        let storage = ctx.storage;
        let inventory_loss = storage.inventory_loss(ctx.period, inventory);
        let retained = inventory - inventory_loss;
        let rates = storage.inject_withdraw_range(ctx.period, inventory);
        let slack = FEASIBILITY_TOLERANCE * (1.0 + retained.abs() + rates.min.abs().max(rates.max.abs()));

        // decision volumes landing in each interval of the next period's space
        let windows: Vec<(f64, f64)> = ctx
            .next_values
            .intervals()
            .filter_map(|next| {
                let lower = rates.min.max(next.min - retained);
                let upper = rates.max.min(next.max - retained);
                if lower <= upper {
                    Some((lower, upper))
                } else if lower <= upper + slack {
                    let mid = 0.5 * (lower + upper);
                    Some((mid, mid))
                } else {
                    None
                }
            })
            .collect();

        if windows.is_empty() {
            return Err(ValuationError::invalid_at(
                format!(
                    "rate bounds [{}, {}] cannot reach next inventory range [{}, {}]",
                    rates.min,
                    rates.max,
                    ctx.next_values.min_inventory(),
                    ctx.next_values.max_inventory()
                ),
                ctx.period,
                Some(inventory),
            ));
        }

        let evaluate = |q: f64| -> Decision {
            let cmdty_consumed = storage.cmdty_consumed(ctx.period, inventory, q);
            let cost = if q > 0.0 {
                storage.injection_cost(ctx.period, inventory, q)
            } else if q < 0.0 {
                storage.withdrawal_cost(ctx.period, inventory, -q)
            } else {
                0.0
            };
            let net_position = -q - cmdty_consumed;
            let cash_flow = net_position * ctx.price - cost;
            let next_inventory = retained + q;
            Decision {
                inject_withdraw: q,
                cmdty_consumed,
                inventory_loss,
                next_inventory,
                net_position,
                cash_flow,
                value: ctx.discount_factor * cash_flow + ctx.next_values.value_at(next_inventory),
            }
        };
        let objective = |q: f64| evaluate(q).value;

        let mut candidates = Vec::new();
        for &(lower, upper) in &windows {
            candidates.extend(self.candidates(&objective, lower, upper, ctx.period, inventory)?);
        }

        let mut best = evaluate(candidates[0]);
        for &q in &candidates[1..] {
            let decision = evaluate(q);
            if decision.value > best.value {
                best = decision;
            }
        }

        let idle_allowed = windows.iter().any(|&(lower, upper)| lower <= 0.0 && 0.0 <= upper);
        if idle_allowed && best.inject_withdraw != 0.0 {
            let idle = evaluate(0.0);
            if idle.value >= best.value - VALUE_TIE_TOLERANCE * (1.0 + best.value.abs()) {
                best = idle;
            }
        }

        Ok(best)
    }

    /// Decisions worth evaluating within `[lower, upper]`
    fn candidates(
        &self,
        objective: &impl Fn(f64) -> f64,
        lower: f64,
        upper: f64,
        period: Period,
        inventory: f64,
    ) -> Result<Vec<f64>> {
        // forced single decision
        if upper - lower <= self.tolerance {
            return Ok(vec![if lower <= 0.0 && 0.0 <= upper { 0.0 } else { lower }]);
        }

        let mut candidates = vec![lower, upper];
        match self.search {
            DecisionSearch::GoldenSection => {
                candidates.push(self.golden_section(objective, lower, upper, period, inventory)?);
            }
            DecisionSearch::SampledGoldenSection { samples } => {
                let step = (upper - lower) / (samples - 1) as f64;
                let sample = |i: usize| if i == samples - 1 { upper } else { lower + step * i as f64 };
                let best = (0..samples)
                    .map(|i| (i, objective(sample(i))))
                    .fold((0, f64::NEG_INFINITY), |best, s| if s.1 > best.1 { s } else { best })
                    .0;
                let a = sample(best.saturating_sub(1));
                let b = sample((best + 1).min(samples - 1));
                candidates.push(sample(best));
                candidates.push(self.golden_section(objective, a, b, period, inventory)?);
            }
        }
        Ok(candidates)
    }

    /// Golden-section maximisation of a unimodal function on `[a, b]`
    ///
    /// Stops once the bracket is narrower than the tolerance or can no longer
    /// shrink in floating point.
    fn golden_section(
        &self,
        f: &impl Fn(f64) -> f64,
        mut a: f64,
        mut b: f64,
        period: Period,
        inventory: f64,
    ) -> Result<f64> {
        let mut c = b - INV_GOLDEN_RATIO * (b - a);
        let mut d = a + INV_GOLDEN_RATIO * (b - a);
        let mut fc = f(c);
        let mut fd = f(d);
        let mut iterations = 0;

        while b - a > self.tolerance {
            if !(a < c && c < d && d < b) {
                break;
            }
            if iterations == self.max_iterations {
                return Err(ValuationError::NumericalNonConvergence {
                    period,
                    inventory,
                    iterations,
                    bracket_width: b - a,
                });
            }
            iterations += 1;

            if fc >= fd {
                b = d;
                d = c;
                fd = fc;
                c = b - INV_GOLDEN_RATIO * (b - a);
                fc = f(c);
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + INV_GOLDEN_RATIO * (b - a);
                fd = f(d);
            }
        }

        Ok(if fc >= fd { c } else { d })
    }
}

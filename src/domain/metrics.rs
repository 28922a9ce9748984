//! Performance metrics over the equity path.

use super::simulation::EquityPath;

pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Deepest peak-to-trough decline, as a non-positive fraction.
    pub max_drawdown: f64,
    pub win_rate: f64,
}

impl Metrics {
    /// Every metric is zero when the path has fewer than two points.
    pub fn compute(equity: &EquityPath, periods_per_year: f64) -> Self {
        let returns = equity.returns();
        if returns.is_empty() {
            return Metrics::default();
        }

        let initial = equity.initial().unwrap_or(0.0);
        let final_capital = equity.final_capital().unwrap_or(initial);
        let total_return = if initial > 0.0 {
            final_capital / initial - 1.0
        } else {
            0.0
        };

        let n = returns.len() as f64;
        let annual_return = {
            let growth = (1.0 + total_return).powf(periods_per_year / n) - 1.0;
            if growth.is_finite() { growth } else { 0.0 }
        };

        let volatility = sample_stddev(&returns) * periods_per_year.sqrt();
        let sharpe_ratio = if volatility > 0.0 {
            annual_return / volatility
        } else {
            0.0
        };

        let wins = returns.iter().filter(|&&r| r > 0.0).count();

        Metrics {
            total_return,
            annual_return,
            volatility,
            sharpe_ratio,
            max_drawdown: compute_drawdown(&returns),
            win_rate: wins as f64 / n,
        }
    }
}

/// Standard deviation with an n-1 denominator; 0 for fewer than 2 values.
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// min over i of (cum_i - peak_i) / peak_i, where cum is the compounded
/// growth of `returns`.
fn compute_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for r in returns {
        cumulative *= 1.0 + r;
        peak = peak.max(cumulative);
        if peak > 0.0 {
            let dd = (cumulative - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

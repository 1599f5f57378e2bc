//! Rolling-window indicator primitives
//!
//! Every function returns one slot per input value; `None` marks positions
//! where the window does not yet have enough history. Training and inference
//! both go through these functions, so window lengths and the RSI gain/loss
//! decomposition cannot drift between the two.

/// Guard added to the average loss so a loss-free window does not divide by zero
pub const RSI_EPSILON: f64 = 1e-10;

/// Simple one-period return: `close[t] / close[t-1] - 1`
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(Some(values[i] / values[i - 1] - 1.0));
        }
    }
    out
}

/// Arithmetic mean of the trailing `window` values
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

/// Sample standard deviation (n - 1 denominator) of the trailing `window` values
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        if w.len() < 2 {
            return 0.0;
        }
        let m = mean(w);
        let var = w.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

/// Relative strength index over simple rolling averages of gains and losses.
///
/// The first delta is missing; like the reference data-frame code it counts
/// as neither a gain nor a loss, so the first value appears at index
/// `period - 1`.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        if i == 0 {
            gains.push(0.0);
            losses.push(0.0);
            continue;
        }
        let delta = closes[i] - closes[i - 1];
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => {
                let rs = g / (l + RSI_EPSILON);
                Some(100.0 - 100.0 / (1.0 + rs))
            }
            _ => None,
        })
        .collect()
}

fn rolling<F>(values: &[f64], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                Some(f(&values[i + 1 - window..=i]))
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_change() {
        let out = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(out[0], None);
        assert!((out[1].unwrap() - 0.10).abs() < 1e-12);
        assert!((out[2].unwrap() - (-0.10)).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_mean_window() {
        let values: Vec<f64> = (1..=6).map(|v| v as f64).collect();
        let out = rolling_mean(&values, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[5], Some(5.0));
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        // 2, 4, 4, 4, 5, 5, 7, 9 -> population std 2.0, sample std ~2.138
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_std(&values, 8);
        let std = out[7].unwrap();
        assert!((std - 2.138089935299395).abs() < 1e-9, "got {}", std);
    }

    #[test]
    fn test_rsi_first_value_at_period_minus_one() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&closes, 14);
        assert!(out[12].is_none());
        assert!(out[13].is_some());
    }

    #[test]
    fn test_rsi_all_gains_near_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let value = rsi(&closes, 14)[29].unwrap();
        assert!(value > 99.99 && value <= 100.0);
    }

    #[test]
    fn test_rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let value = rsi(&closes, 14)[29].unwrap();
        assert!(value.abs() < 1e-12);
    }
}

//! Binary classification metrics
//!
//! Per-class precision, recall, F1 and support for the DOWN (0) and UP (1)
//! classes, plus accuracy and macro/weighted averages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// 2x2 confusion counts with UP as the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_up: usize,
    pub false_up: usize,
    pub false_down: usize,
    pub true_down: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[f64], y_pred: &[f64]) -> Self {
        let mut m = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t > 0.5, p > 0.5) {
                (true, true) => m.true_up += 1,
                (false, true) => m.false_up += 1,
                (true, false) => m.false_down += 1,
                (false, false) => m.true_down += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_up + self.false_up + self.false_down + self.true_down
    }

    fn class(&self, up: bool) -> ClassMetrics {
        let (tp, fp, fn_) = if up {
            (self.true_up, self.false_up, self.false_down)
        } else {
            (self.true_down, self.false_down, self.false_up)
        };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub down: ClassMetrics,
    pub up: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn new(y_true: &[f64], y_pred: &[f64]) -> Self {
        let confusion = ConfusionMatrix::from_labels(y_true, y_pred);
        let down = confusion.class(false);
        let up = confusion.class(true);
        let total = confusion.total();

        let macro_avg = ClassMetrics {
            precision: (down.precision + up.precision) / 2.0,
            recall: (down.recall + up.recall) / 2.0,
            f1: (down.f1 + up.f1) / 2.0,
            support: total,
        };

        let weight = |d: f64, u: f64| {
            if total == 0 {
                0.0
            } else {
                (d * down.support as f64 + u * up.support as f64) / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(down.precision, up.precision),
            recall: weight(down.recall, up.recall),
            f1: weight(down.f1, up.f1),
            support: total,
        };

        Self {
            down,
            up,
            accuracy: ratio(confusion.true_up + confusion.true_down, total),
            macro_avg,
            weighted_avg,
            confusion,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (name, m) in [("DOWN", &self.down), ("UP", &self.up)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total()
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

//! Evaluation metrics for the binary classifier.

/// Confusion counts for a binary classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryConfusion {
    pub true_positive: u32,
    pub false_positive: u32,
    pub true_negative: u32,
    pub false_negative: u32,
}

impl BinaryConfusion {
    /// Record one prediction against the ground truth.
    pub fn add(&mut self, truth: bool, predicted: bool) {
        let counter = match (truth, predicted) {
            (true, true) => &mut self.true_positive,
            (false, true) => &mut self.false_positive,
            (false, false) => &mut self.true_negative,
            (true, false) => &mut self.false_negative,
        };
        *counter = counter.saturating_add(1);
    }

    /// Total number of recorded predictions.
    pub fn total(&self) -> u32 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// Fraction of correct predictions, 0 when empty.
    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positive + self.true_negative) as f32 / total as f32
    }

    /// `TP / (TP + FP)`, 0 when nothing was predicted positive.
    pub fn precision(&self) -> f32 {
        let predicted_positive = self.true_positive + self.false_positive;
        if predicted_positive == 0 {
            return 0.0;
        }
        self.true_positive as f32 / predicted_positive as f32
    }

    /// `TP / (TP + FN)`, 0 when no positives exist.
    pub fn recall(&self) -> f32 {
        let actual_positive = self.true_positive + self.false_negative;
        if actual_positive == 0 {
            return 0.0;
        }
        self.true_positive as f32 / actual_positive as f32
    }
}

/// Mean negative log-likelihood of `labels` under predicted `probs`.
///
/// Probabilities are clamped away from 0 and 1 so a confident miss stays
/// finite. Returns 0 for empty input.
pub fn log_loss(probs: &[f32], labels: &[f32]) -> f32 {
    if probs.is_empty() || probs.len() != labels.len() {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for (&p, &y) in probs.iter().zip(labels.iter()) {
        let p = f64::from(p).clamp(1e-7, 1.0 - 1e-7);
        sum -= if y > 0.5 { p.ln() } else { (1.0 - p).ln() };
    }
    (sum / probs.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_counts_route_correctly() {
        let mut cm = BinaryConfusion::default();
        cm.add(true, true);
        cm.add(true, false);
        cm.add(false, true);
        cm.add(false, false);
        assert_eq!(cm.true_positive, 1);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.true_negative, 1);
        assert_eq!(cm.accuracy(), 0.5);
        assert_eq!(cm.precision(), 0.5);
        assert_eq!(cm.recall(), 0.5);
    }

    #[test]
    fn empty_confusion_reports_zero() {
        let cm = BinaryConfusion::default();
        assert_eq!(cm.accuracy(), 0.0);
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
    }

    #[test]
    fn log_loss_rewards_confident_correct_predictions() {
        let confident = log_loss(&[0.99, 0.01], &[1.0, 0.0]);
        let hedged = log_loss(&[0.6, 0.4], &[1.0, 0.0]);
        assert!(confident < hedged);
    }

    #[test]
    fn log_loss_is_finite_on_confident_misses() {
        let loss = log_loss(&[1.0], &[0.0]);
        assert!(loss.is_finite());
        assert!(loss > 10.0);
    }
}

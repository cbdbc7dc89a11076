//! Binary classification metrics
//!
//! Labels are `f64` values where anything above 0.5 counts as positive.
//! Ratios with a zero denominator are reported as 0.

use ndarray::Array1;

/// Confusion counts for binary labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionCounts {
    pub fn from_labels(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut counts = Self::default();
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        counts
    }

    /// Rows are truth, columns prediction, label order 0 then 1
    pub fn matrix(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn harmonic(p: f64, r: f64) -> f64 {
    if p + r > 0.0 {
        2.0 * p * r / (p + r)
    } else {
        0.0
    }
}

pub fn confusion_matrix(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> [[usize; 2]; 2] {
    ConfusionCounts::from_labels(y_true, y_pred).matrix()
}

pub fn precision_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    ratio(c.tp, c.tp + c.fp)
}

pub fn recall_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    ratio(c.tp, c.tp + c.fn_)
}

pub fn f1_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    harmonic(precision_score(y_true, y_pred), recall_score(y_true, y_pred))
}

pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    ratio(c.tp + c.tn, c.total())
}

fn class_counts(y_true: &Array1<f64>) -> (usize, usize) {
    let pos = y_true.iter().filter(|&&t| t > 0.5).count();
    (pos, y_true.len() - pos)
}

/// Area under the ROC curve from the rank-sum statistic, ties averaged.
///
/// `None` unless both classes are present.
pub fn roc_auc_score(y_true: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    let (n_pos, n_neg) = class_counts(y_true);
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share their mean
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|&(&t, _)| t > 0.5)
        .map(|(_, &r)| r)
        .sum();
    let n_pos_f = n_pos as f64;
    Some((pos_rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64))
}

/// Average precision: step-wise area under the precision/recall curve.
///
/// `None` unless both classes are present.
pub fn average_precision_score(y_true: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    let (n_pos, n_neg) = class_counts(y_true);
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut prev_recall = 0.0;
    let mut ap = 0.0;
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if y_true[order[i]] > 0.5 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        let precision = tp as f64 / (tp + fp) as f64;
        let recall = tp as f64 / n_pos as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    Some(ap)
}

/// Per-class precision, recall, f1 and support with accuracy and averages.
///
/// Laid out like scikit-learn's `classification_report` with `digits`
/// decimals.
pub fn classification_report(y_true: &Array1<f64>, y_pred: &Array1<f64>, digits: usize) -> String {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    let total = c.total();

    // (label, precision, recall, support)
    let rows = [
        ("0", ratio(c.tn, c.tn + c.fn_), ratio(c.tn, c.tn + c.fp), c.tn + c.fp),
        ("1", ratio(c.tp, c.tp + c.fp), ratio(c.tp, c.tp + c.fn_), c.tp + c.fn_),
    ];
    // Only labels present in truth or prediction are listed
    let present: Vec<_> = rows
        .iter()
        .filter(|row| {
            let positive = row.0 == "1";
            let predicted = if positive { c.tp + c.fp } else { c.tn + c.fn_ };
            row.3 > 0 || predicted > 0
        })
        .collect();

    let width = "weighted avg".len();
    let d = digits;
    let mut out = format!(
        "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n\n",
        "", "precision", "recall", "f1-score", "support"
    );

    let mut macro_sums = (0.0, 0.0, 0.0);
    let mut weighted_sums = (0.0, 0.0, 0.0);
    for (label, p, r, support) in &present {
        let f = harmonic(*p, *r);
        out.push_str(&format!(
            "{:>width$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}\n",
            label, p, r, f, support
        ));
        macro_sums = (macro_sums.0 + p, macro_sums.1 + r, macro_sums.2 + f);
        let s = *support as f64;
        weighted_sums = (
            weighted_sums.0 + p * s,
            weighted_sums.1 + r * s,
            weighted_sums.2 + f * s,
        );
    }

    let k = present.len().max(1) as f64;
    let n = total.max(1) as f64;
    out.push('\n');
    out.push_str(&format!(
        "{:>width$}  {:>9} {:>9} {:>9.d$} {:>9}\n",
        "accuracy",
        "",
        "",
        ratio(c.tp + c.tn, total),
        total
    ));
    out.push_str(&format!(
        "{:>width$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}\n",
        "macro avg",
        macro_sums.0 / k,
        macro_sums.1 / k,
        macro_sums.2 / k,
        total
    ));
    out.push_str(&format!(
        "{:>width$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}\n",
        "weighted avg",
        weighted_sums.0 / n,
        weighted_sums.1 / n,
        weighted_sums.2 / n,
        total
    ));
    out
}

/// Render a 2x2 matrix the way numpy prints integer arrays
pub fn format_confusion_matrix(m: &[[usize; 2]; 2]) -> String {
    let w = m
        .iter()
        .flatten()
        .map(|v| v.to_string().len())
        .max()
        .unwrap_or(1);
    format!(
        "[[{:>w$} {:>w$}]\n [{:>w$} {:>w$}]]",
        m[0][0], m[0][1], m[1][0], m[1][1]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_layout() {
        let y_true = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 0.0, 1.0, 1.0];
        assert_eq!(confusion_matrix(&y_true, &y_pred), [[1, 1], [1, 2]]);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let y_true = array![0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 0.0];
        assert_eq!(precision_score(&y_true, &y_pred), 0.0);
        assert_eq!(recall_score(&y_true, &y_pred), 0.0);
        assert_eq!(f1_score(&y_true, &y_pred), 0.0);
        assert!((accuracy_score(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_with_ties() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        assert!((roc_auc_score(&y_true, &scores).unwrap() - 0.75).abs() < 1e-12);

        let tied = array![0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc_score(&y_true, &tied).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_average_precision() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        // Thresholds 0.8 (P=1, R=.5), 0.4 (P=.5), 0.35 (P=2/3, R=1)
        let expected = 0.5 * 1.0 + 0.5 * (2.0 / 3.0);
        assert!((average_precision_score(&y_true, &scores).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_auc_undefined_for_one_class() {
        let y_true = array![1.0, 1.0];
        let scores = array![0.2, 0.9];
        assert!(roc_auc_score(&y_true, &scores).is_none());
        assert!(average_precision_score(&y_true, &scores).is_none());
    }

    #[test]
    fn test_classification_report_layout() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let report = classification_report(&y_true, &y_true, 4);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "              precision    recall  f1-score   support");
        assert_eq!(lines[2], "           0     1.0000    1.0000    1.0000         2");
        assert_eq!(lines[5], "    accuracy                         1.0000         4");
        assert_eq!(lines[7], "weighted avg     1.0000    1.0000    1.0000         4");
    }

    #[test]
    fn test_format_confusion_matrix() {
        assert_eq!(format_confusion_matrix(&[[10, 2], [1, 7]]), "[[10  2]\n [ 1  7]]");
    }
}

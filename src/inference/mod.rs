//! Single-transaction scoring
//!
//! Loads a persisted [`FraudPipeline`], turns caller input into a one-row
//! frame, applies the same feature derivation used in training and reports
//! a thresholded verdict.

use crate::error::{FraudGuardError, Result};
use crate::features::add_basic_features;
use crate::models::FraudPipeline;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name written by training and read by the predictor and the form
pub const DEFAULT_MODEL_NAME: &str = "fraud_model.json";

/// Probabilities above this, but below the threshold, are medium risk
pub const MEDIUM_RISK_PROBABILITY: f64 = 0.3;

/// Fields entered for one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub amount: f64,
    pub transaction_type: String,
    pub device_type: String,
    /// Timestamp such as `2025-01-01 12:34:56`
    pub transaction_time: String,
}

impl TransactionInput {
    pub fn new(
        amount: f64,
        transaction_type: impl Into<String>,
        device_type: impl Into<String>,
        transaction_time: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            transaction_type: transaction_type.into(),
            device_type: device_type.into(),
            transaction_time: transaction_time.into(),
        }
    }

    /// One-row frame with the derived calendar features added
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = df!(
            "amount" => [self.amount],
            "transaction_type" => [self.transaction_type.as_str()],
            "device_type" => [self.device_type.as_str()],
            "transaction_time" => [self.transaction_time.as_str()],
        )?;
        add_basic_features(&df)
    }
}

/// Three-tier risk banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// High when flagged as fraud, medium above 30%, low otherwise
    pub fn classify(probability: f64, is_fraud: bool) -> Self {
        if is_fraud {
            RiskLevel::High
        } else if probability > MEDIUM_RISK_PROBABILITY {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW RISK",
            RiskLevel::Medium => "MEDIUM RISK",
            RiskLevel::High => "HIGH RISK",
        };
        f.write_str(label)
    }
}

/// Scored transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability of fraud rounded to 4 decimals
    pub fraud_probability: f64,
    pub prediction: u8,
    pub is_fraud: bool,
    pub threshold: f64,
    pub risk_level: RiskLevel,
    pub input: TransactionInput,
}

impl Prediction {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Multi-line report for terminals
    pub fn render_text(&self) -> String {
        self.render_text_with(self.verdict())
    }

    /// `FRAUD` or `LEGITIMATE`
    pub fn verdict(&self) -> &'static str {
        if self.is_fraud {
            "FRAUD"
        } else {
            "LEGITIMATE"
        }
    }

    /// Text report with `verdict` on the prediction line, e.g. a styled
    /// form of [`verdict`](Self::verdict) for terminals
    pub fn render_text_with(&self, verdict: &str) -> String {
        let heavy = "=".repeat(40);
        let light = "-".repeat(40);
        let p = self.fraud_probability;

        let mut out = String::new();
        out.push('\n');
        out.push_str(&format!("{}\n", heavy));
        out.push_str("FraudGuard Prediction Result\n");
        out.push_str(&format!("{}\n", heavy));
        out.push_str(&format!("Amount:            {}\n", format_amount(self.input.amount)));
        out.push_str(&format!("Transaction type:  {}\n", self.input.transaction_type));
        out.push_str(&format!("Device type:       {}\n", self.input.device_type));
        out.push_str(&format!("Time:              {}\n", self.input.transaction_time));
        out.push_str(&format!("{}\n", light));
        out.push_str(&format!("Fraud probability: {:.4} ({:.1}%)\n", p, p * 100.0));
        out.push_str(&format!("Prediction:        {}\n", verdict));
        out.push_str(&format!("{}\n", heavy));
        out
    }
}

/// `$1,234.50` style amount
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac)
}

/// Path of `name` under `models_dir`
pub fn model_path(models_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    models_dir.as_ref().join(name)
}

/// Load `<models_dir>/<name>`, failing with [`FraudGuardError::ModelNotFound`] if absent
pub fn load_model(models_dir: impl AsRef<Path>, name: &str) -> Result<FraudPipeline> {
    let path = model_path(models_dir, name);
    if !path.exists() {
        return Err(FraudGuardError::ModelNotFound { path });
    }

    let model = FraudPipeline::load(&path)?;
    info!(path = %path.display(), model = model.model_type(), "Loaded model");
    Ok(model)
}

/// Score one transaction; fraud when the probability reaches `threshold`
pub fn score_transaction(
    model: &FraudPipeline,
    input: &TransactionInput,
    threshold: f64,
) -> Result<Prediction> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(FraudGuardError::invalid_parameter(
            "threshold",
            threshold,
            "must be in [0, 1]",
        ));
    }

    let frame = input.to_frame()?;
    let proba = model.predict_proba(&frame)?;
    let p = proba[[0, 1]];
    let is_fraud = p >= threshold;

    Ok(Prediction {
        fraud_probability: (p * 10_000.0).round() / 10_000.0,
        prediction: u8::from(is_fraud),
        is_fraud,
        threshold,
        risk_level: RiskLevel::classify(p, is_fraud),
        input: input.clone(),
    })
}

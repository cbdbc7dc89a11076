//! End-to-end training run

use crate::data::{load_raw_data, SplitConfig};
use crate::error::{FraudGuardError, Result};
use crate::evaluation::{evaluate_model, EvaluationResult, DEFAULT_THRESHOLD};
use crate::features::{add_basic_features, build_preprocessor, FeatureConfig};
use crate::inference::DEFAULT_MODEL_NAME;
use crate::models::{build_forest_model, build_logreg_model, ForestParams, FraudPipeline, LogRegParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Which model families to train
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    Logreg,
    Forest,
    #[default]
    Both,
}

impl ModelChoice {
    /// Families in training order
    pub fn families(&self) -> &'static [ModelFamily] {
        match self {
            ModelChoice::Logreg => &[ModelFamily::Logreg],
            ModelChoice::Forest => &[ModelFamily::Forest],
            ModelChoice::Both => &[ModelFamily::Logreg, ModelFamily::Forest],
        }
    }
}

/// A single trainable model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Logreg,
    Forest,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Logreg => "logreg",
            ModelFamily::Forest => "forest",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelChoice::Logreg => "logreg",
            ModelChoice::Forest => "forest",
            ModelChoice::Both => "both",
        };
        f.write_str(name)
    }
}

impl FromStr for ModelChoice {
    type Err = FraudGuardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "logreg" => Ok(ModelChoice::Logreg),
            "forest" => Ok(ModelChoice::Forest),
            "both" => Ok(ModelChoice::Both),
            other => Err(FraudGuardError::invalid_parameter(
                "model",
                other,
                "expected one of logreg, forest, both",
            )),
        }
    }
}

/// Settings for [`run_training`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOptions {
    pub data_dir: PathBuf,
    /// File name under `<data_dir>/raw`
    pub data_file: String,
    pub target: String,
    pub model: ModelChoice,
    pub models_dir: PathBuf,
    /// Artifact file name under `models_dir`
    pub output: String,
    pub split: SplitConfig,
    pub logreg: LogRegParams,
    pub forest: ForestParams,
    pub threshold: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            data_file: "transactions.csv".to_string(),
            target: "isFraud".to_string(),
            model: ModelChoice::Both,
            models_dir: PathBuf::from("models"),
            output: DEFAULT_MODEL_NAME.to_string(),
            split: SplitConfig::default(),
            logreg: LogRegParams::default(),
            forest: ForestParams::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl TrainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_data_file(mut self, name: impl Into<String>) -> Self {
        self.data_file = name.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_model(mut self, model: ModelChoice) -> Self {
        self.model = model;
        self
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.output = name.into();
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn with_logreg(mut self, params: LogRegParams) -> Self {
        self.logreg = params;
        self
    }

    pub fn with_forest(mut self, params: ForestParams) -> Self {
        self.forest = params;
        self
    }

    /// Decision threshold used when evaluating on validation and test
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.output)
    }
}

/// What a training run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOutcome {
    /// Family of the persisted model
    pub selected: String,
    /// Validation F1 per family, in training order
    pub validation_f1: Vec<(String, f64)>,
    pub test_result: EvaluationResult,
    pub model_path: PathBuf,
}

/// Load, split, fit every requested family, keep the best by validation F1,
/// report it on the test split and persist it.
pub fn run_training(options: &TrainOptions) -> Result<TrainingOutcome> {
    if !(0.0..=1.0).contains(&options.threshold) {
        return Err(FraudGuardError::invalid_parameter(
            "threshold",
            options.threshold,
            "must be between 0 and 1",
        ));
    }

    let raw = load_raw_data(&options.data_dir, &options.data_file)?;
    let df = add_basic_features(&raw)?;

    let split = options.split.split(&df, &options.target)?;

    let feature_config = FeatureConfig::new().with_target(options.target.clone());
    let (plan, numeric, categorical) = build_preprocessor(&split.x_train, &feature_config)?;
    info!(
        numeric = ?numeric,
        categorical = ?categorical,
        "Built preprocessing plan"
    );

    let mut best: Option<(String, FraudPipeline, f64)> = None;
    let mut validation_f1 = Vec::new();

    for &family in options.model.families() {
        info!(model = family.as_str(), "Training model");
        let mut pipeline = match family {
            ModelFamily::Logreg => build_logreg_model(plan.clone(), &options.logreg),
            ModelFamily::Forest => build_forest_model(plan.clone(), &options.forest),
        };
        pipeline.fit(&split.x_train, &split.y_train)?;

        let result = evaluate_model(&pipeline, &split.x_valid, &split.y_valid, options.threshold)?;
        println!("\nValidation results for {}:", family);
        println!("{}", result);
        validation_f1.push((family.to_string(), result.f1));

        let improves = best.as_ref().map_or(true, |(_, _, f1)| result.f1 > *f1);
        if improves {
            best = Some((family.to_string(), pipeline, result.f1));
        }
    }

    let (selected, model, f1) = best.ok_or_else(|| {
        FraudGuardError::TrainingError("no model family was trained".to_string())
    })?;
    info!(model = %selected, f1 = %format!("{:.4}", f1), "Selected best model");

    let test_result = evaluate_model(&model, &split.x_test, &split.y_test, options.threshold)?;
    println!("\nTest results for {}:", selected);
    println!("{}", test_result);

    std::fs::create_dir_all(&options.models_dir)?;
    let model_path = options.model_path();
    model.save(&model_path)?;
    info!(path = %model_path.display(), "Saved model");

    Ok(TrainingOutcome {
        selected,
        validation_f1,
        test_result,
        model_path,
    })
}

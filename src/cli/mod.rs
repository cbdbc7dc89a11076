//! FraudGuard CLI
//!
//! `train`, `predict` and `serve` subcommands.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::SplitConfig;
use crate::evaluation::DEFAULT_THRESHOLD;
use crate::inference::{
    load_model, score_transaction, Prediction, TransactionInput, DEFAULT_MODEL_NAME,
};
use crate::models::{ForestParams, LogRegParams};
use crate::training::{run_training, ModelChoice, TrainOptions};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn alert(s: &str) -> ColoredString  { s.truecolor(240, 100, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_start(msg: &str) {
    println!("  {} {}...", accent("›"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "fraudguard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Transaction fraud scoring: train, predict and serve")]
#[command(long_about = None)]
pub struct Cli {
    /// Data directory; raw files are read from <data-dir>/raw
    #[arg(long, global = true, env = "FRAUDGUARD_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding trained models
    #[arg(long, global = true, env = "FRAUDGUARD_MODELS_DIR", default_value = "models")]
    pub models_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train fraud models and keep the best by validation F1
    Train {
        /// Data file name under <data-dir>/raw (CSV, JSON, or Parquet)
        #[arg(short, long, default_value = "transactions.csv")]
        data: String,

        /// Label column name
        #[arg(short, long, default_value = "isFraud")]
        target: String,

        /// Model family to train
        #[arg(short, long, value_enum, default_value_t = ModelChoice::Both)]
        model: ModelChoice,

        /// Output model file name under <models-dir>
        #[arg(short, long, default_value = DEFAULT_MODEL_NAME)]
        output: String,

        /// Number of trees in the random forest
        #[arg(long, default_value = "200")]
        n_estimators: usize,

        /// Seed for the split
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Decision threshold for the validation and test reports
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },

    /// Score a single transaction
    Predict {
        /// Transaction amount
        #[arg(long)]
        amount: f64,

        /// Transaction type (e.g. PAYMENT, TRANSFER, CASH_OUT)
        #[arg(long, alias = "transaction_type")]
        transaction_type: String,

        /// Device type (e.g. mobile, web, atm)
        #[arg(long, alias = "device_type")]
        device_type: String,

        /// Transaction time (e.g. '2025-01-01 12:34:56')
        #[arg(long, alias = "transaction_time")]
        transaction_time: String,

        /// Model file name under <models-dir>
        #[arg(short, long, default_value = DEFAULT_MODEL_NAME)]
        model: String,

        /// Classification threshold
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the web form
    Serve {
        /// Server host (defaults to FRAUDGUARD_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Server port (defaults to FRAUDGUARD_PORT or 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Model file name under <models-dir>
        #[arg(short, long, default_value = DEFAULT_MODEL_NAME)]
        model: String,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    data_dir: &PathBuf,
    models_dir: &PathBuf,
    data: &str,
    target: &str,
    model: ModelChoice,
    output: &str,
    n_estimators: usize,
    seed: u64,
    threshold: f64,
) -> anyhow::Result<()> {
    section("Train");

    let options = TrainOptions::new()
        .with_data_dir(data_dir)
        .with_data_file(data)
        .with_target(target)
        .with_model(model)
        .with_models_dir(models_dir)
        .with_output(output)
        .with_split(SplitConfig::default().with_random_state(seed))
        .with_logreg(LogRegParams::default())
        .with_forest(ForestParams::default().with_n_estimators(n_estimators))
        .with_threshold(threshold);

    println!("  {:<16} {}", muted("Data"), data_dir.join("raw").join(data).display().to_string().white());
    println!("  {:<16} {}", muted("Target"), target.white());
    println!("  {:<16} {}", muted("Models"), model.to_string().cyan());
    println!("  {:<16} {}", muted("Threshold"), format!("{:.2}", threshold).white());
    println!();

    step_start("Training");
    let start = Instant::now();
    let outcome = run_training(&options)?;

    section("Summary");
    for (family, f1) in &outcome.validation_f1 {
        let marker = if *family == outcome.selected { ok("●") } else { dim("○") };
        println!("  {} {:<14} {}", marker, family.white(), format!("F1 {:.4}", f1).white().bold());
    }
    println!();
    println!("  {:<16} {}", muted("Selected"), outcome.selected.cyan().bold());
    println!("  {:<16} {}", muted("Test F1"), format!("{:.4}", outcome.test_result.f1).white().bold());
    if let Some(auc) = outcome.test_result.roc_auc {
        println!("  {:<16} {}", muted("Test ROC-AUC"), format!("{:.4}", auc).white());
    }
    println!("  {:<16} {}", muted("Time"), format!("{:.3}s", start.elapsed().as_secs_f64()).white());
    println!();
    step_ok(&format!("Saved model to {}", outcome.model_path.display()));
    println!();

    Ok(())
}

pub fn cmd_predict(
    models_dir: &PathBuf,
    model: &str,
    input: TransactionInput,
    threshold: f64,
    json: bool,
) -> anyhow::Result<()> {
    let pipeline = load_model(models_dir, model)?;
    let prediction = score_transaction(&pipeline, &input, threshold)?;

    if json {
        println!("{}", prediction.to_json()?);
        return Ok(());
    }

    print!("{}", prediction.render_text_with(&styled_verdict(&prediction)));
    Ok(())
}

fn styled_verdict(prediction: &Prediction) -> String {
    let verdict = prediction.verdict();
    if prediction.is_fraud {
        alert(verdict).bold().to_string()
    } else {
        ok(verdict).bold().to_string()
    }
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    models_dir: &PathBuf,
    model: &str,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        models_dir: models_dir.clone(),
        model_name: model.to_string(),
    };

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "FraudGuard".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Web form", &format!("http://{}:{}", config.host, config.port)));
    line_box(&kv("Predict ", &format!("http://{}:{}/api/predict", config.host, config.port)));
    line_box(&kv("Health  ", &format!("http://{}:{}/api/health", config.host, config.port)));
    line_box(&kv("Model   ", &config.model_path().display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

//! Request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::evaluation::DEFAULT_THRESHOLD;
use crate::inference::{score_transaction, Prediction, TransactionInput};

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// Prediction
// ============================================================================

/// Body of `POST /api/predict`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(flatten)]
    pub input: TransactionInput,
    /// Defaults to 0.5
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Malformed bodies come back as JSON 400s like every other error
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Prediction>> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let model = state.model.as_ref().ok_or_else(|| {
        ServerError::ModelUnavailable(format!(
            "Model not found at {}. Please run 'fraudguard train' first",
            state.config.model_path().display()
        ))
    })?;

    if !request.input.amount.is_finite() || request.input.amount < 0.0 {
        return Err(ServerError::BadRequest("amount must be a non-negative number".to_string()));
    }

    let threshold = request.threshold.unwrap_or(DEFAULT_THRESHOLD);
    let model = Arc::clone(model);
    let input = request.input;

    // Forest scoring walks every tree; keep it off the async workers
    let prediction = tokio::task::spawn_blocking(move || score_transaction(&model, &input, threshold))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    info!(
        probability = prediction.fraud_probability,
        is_fraud = prediction.is_fraud,
        "Scored transaction"
    );
    Ok(Json(prediction))
}

// ============================================================================
// Model / health
// ============================================================================

pub async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let model = state.model.as_ref().ok_or_else(|| {
        ServerError::ModelUnavailable("No model loaded".to_string())
    })?;

    let importances = model.feature_importances().map(|pairs| {
        pairs
            .into_iter()
            .map(|(name, value)| json!({ "feature": name, "importance": value }))
            .collect::<Vec<_>>()
    });

    Ok(Json(json!({
        "path": state.config.model_path(),
        "metadata": model.metadata(),
        "feature_importances": importances,
    })))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": state.model_loaded(),
        "uptime_secs": chrono::Utc::now().signed_duration_since(state.started_at).num_seconds(),
    }))
}

// ============================================================================
// UI Handler
// ============================================================================

const MODEL_NOTICE_SLOT: &str = "<!--MODEL_NOTICE-->";

pub async fn serve_index(State(state): State<Arc<AppState>>) -> Html<String> {
    let notice = if state.model_loaded() {
        String::new()
    } else {
        format!(
            r#"<div class="notice error">Model not found at <code>{}</code>. Please run <code>fraudguard train</code> first.</div>"#,
            state.config.model_path().display()
        )
    };
    Html(EMBEDDED_INDEX_HTML.replace(MODEL_NOTICE_SLOT, &notice))
}

const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>FraudGuard - Transaction Fraud Detection</title>
    <style>
        body{font-family:system-ui,sans-serif;background:#111827;color:#f3f4f6;margin:0}
        main{max-width:960px;margin:0 auto;padding:2rem;display:grid;grid-template-columns:2fr 1fr;gap:2rem}
        h1{margin:0 0 .25rem}
        label{display:block;margin:.75rem 0 .25rem;font-size:.9rem;color:#9ca3af}
        input,select{width:100%;padding:.5rem;background:#1f2937;color:#f3f4f6;border:1px solid #374151;border-radius:6px}
        .row{display:grid;grid-template-columns:1fr 1fr;gap:1rem}
        button{margin-top:1.25rem;padding:.6rem 1.2rem;background:#3b82f6;color:#fff;border:0;border-radius:6px;cursor:pointer}
        .notice{padding:.75rem 1rem;border-radius:6px;margin:1rem 0}
        .error,.high{background:#7f1d1d}
        .medium{background:#78350f}
        .low{background:#14532d}
        .metric{font-size:2rem;font-weight:bold}
        aside{font-size:.9rem;color:#9ca3af}
        details{margin-top:1rem}
        pre{background:#1f2937;padding:1rem;border-radius:6px;overflow:auto}
    </style>
</head>
<body>
<main>
    <section>
        <h1>FraudGuard</h1>
        <p>Transaction fraud detection. Enter the transaction details below to get a fraud probability.</p>
        <!--MODEL_NOTICE-->
        <form id="tx-form">
            <div class="row">
                <div>
                    <label for="amount">Transaction amount ($)</label>
                    <input id="amount" name="amount" type="number" min="0" max="10000000" step="10" value="100" required>
                    <label for="transaction_type">Transaction type</label>
                    <select id="transaction_type" name="transaction_type">
                        <option>PAYMENT</option>
                        <option>CASH_OUT</option>
                        <option>TRANSFER</option>
                        <option>DEBIT</option>
                        <option>CASH_IN</option>
                    </select>
                </div>
                <div>
                    <label for="device_type">Device type</label>
                    <select id="device_type" name="device_type">
                        <option>mobile</option>
                        <option>web</option>
                        <option>pos-terminal</option>
                        <option>atm</option>
                    </select>
                    <label for="tx_date">Transaction date</label>
                    <input id="tx_date" name="tx_date" type="date" required>
                    <label for="tx_time">Transaction time</label>
                    <input id="tx_time" name="tx_time" type="time" step="1" required>
                </div>
            </div>
            <button type="submit">Check for fraud</button>
        </form>
        <div id="result"></div>
    </section>
    <aside>
        <h3>About</h3>
        <p>FraudGuard scores transactions with a model trained on historical labelled data.</p>
        <h3>Risk levels</h3>
        <ul>
            <li>&lt; 30%: low risk</li>
            <li>30-50%: medium risk</li>
            <li>&gt; 50%: high risk</li>
        </ul>
    </aside>
</main>
<script>
    const now = new Date();
    const pad = (n) => String(n).padStart(2, "0");
    document.getElementById("tx_date").value = `${now.getFullYear()}-${pad(now.getMonth() + 1)}-${pad(now.getDate())}`;
    document.getElementById("tx_time").value = `${pad(now.getHours())}:${pad(now.getMinutes())}:${pad(now.getSeconds())}`;

    const tiers = {
        high: "HIGH RISK - this transaction is likely fraudulent",
        medium: "MEDIUM RISK - this transaction needs review",
        low: "LOW RISK - this transaction appears legitimate",
    };

    document.getElementById("tx-form").addEventListener("submit", async (event) => {
        event.preventDefault();
        const form = event.target;
        let time = form.tx_time.value;
        if (time.length === 5) time += ":00";
        const body = {
            amount: parseFloat(form.amount.value),
            transaction_type: form.transaction_type.value,
            device_type: form.device_type.value,
            transaction_time: `${form.tx_date.value} ${time}`,
        };
        const out = document.getElementById("result");
        const res = await fetch("/api/predict", {
            method: "POST",
            headers: {"Content-Type": "application/json"},
            body: JSON.stringify(body),
        });
        const raw = await res.text();
        let data = null;
        try { data = JSON.parse(raw); } catch (_) { data = null; }
        if (!res.ok || data === null) {
            const notice = document.createElement("div");
            notice.className = "notice error";
            notice.textContent = (data && data.message) || raw || `Request failed (${res.status})`;
            out.replaceChildren(notice);
            return;
        }
        const pct = (data.fraud_probability * 100).toFixed(1);
        out.innerHTML = `
            <h2>Prediction result</h2>
            <div>Fraud probability</div>
            <div class="metric">${pct}%</div>
            <div class="notice ${data.risk_level}">${tiers[data.risk_level]}</div>
            <details><summary>Transaction details</summary><pre></pre></details>`;
        out.querySelector("pre").textContent = JSON.stringify(data.input, null, 2);
    });
</script>
</body>
</html>
"#;

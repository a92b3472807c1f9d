//! Compact JSON output for machine consumers

use serde::Serialize;
use serde_json::{Value, json};

/// Decimal places kept for probabilities printed by `math`
const PROBABILITY_DECIMALS: i32 = 6;

/// Serialize any output value as one compact JSON line.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(&format!("serialization failed: {}", e)))
}

/// `{"error": "..."}` payload printed for every failure
pub fn error_json(message: &str) -> String {
    json!({ "error": message }).to_string()
}

/// `{"probability": p}` rounded for display
pub fn probability_json(probability: f64) -> String {
    json!({ "probability": round(probability, PROBABILITY_DECIMALS) }).to_string()
}

/// `{"k": k}`
pub fn margin_json(k: u32) -> String {
    json!({ "k": k }).to_string()
}

/// `{"k_min": k, "target": t}`
pub fn minimum_k_json(k_min: u32, target: f64) -> String {
    json!({ "k_min": k_min, "target": target }).to_string()
}

/// JSON `null`, printed when a session has no state
pub fn null_json() -> String {
    Value::Null.to_string()
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

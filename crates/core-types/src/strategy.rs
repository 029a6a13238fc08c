use serde::Deserialize;
use toml::Value;

/// Selects a signal evaluator by name and carries its raw parameter table.
#[derive(Deserialize, Debug, Clone)]
pub struct EvaluatorConfig {
    pub name: String,
    // This will hold the `params = { ... }` table from the TOML
    #[serde(default = "default_params")]
    pub params: Value,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            name: "momentum_breakout".to_string(),
            params: default_params(),
        }
    }
}

fn default_params() -> Value {
    Value::Table(Default::default())
}

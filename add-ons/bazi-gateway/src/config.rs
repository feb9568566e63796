//! Gateway configuration. Precedence: env `BAZI_CONFIG` path >
//! `config/gateway.toml` > defaults, with `BAZI__*` environment overrides
//! on top.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// "mock" answers NLP requests locally; "live" delegates to the
    /// configured OpenAI-compatible endpoint.
    pub llm_mode: String,
    pub llm_api_url: String,
    pub llm_model: String,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("BAZI_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Bazi Gateway")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("llm_mode", "mock")?
            .set_default("llm_api_url", "https://openrouter.ai/api/v1")?
            .set_default("llm_model", "meta-llama/llama-3.3-70b-instruct")?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("BAZI").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    pub fn llm_is_live(&self) -> bool {
        self.llm_mode.eq_ignore_ascii_case("live")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = GatewayConfig::load().expect("defaults should build");
        assert_eq!("0.0.0.0", config.host);
        assert_eq!(8000, config.port);
        assert!(!config.llm_is_live());
    }
}

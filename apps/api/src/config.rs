use anyhow::{Context, Result};

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
///
/// Nothing is strictly required: without `LLM_API_KEY` the service runs on the
/// rule-based interpreter and canned commentary.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// Brand ids treated as Non-CV by the rule-based interpreter.
    pub non_cv_brands: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_api_key: optional_env("LLM_API_KEY"),
            llm_api_url: optional_env("LLM_API_URL")
                .unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_temperature: optional_env("LLM_TEMPERATURE")
                .map(|v| v.parse::<f32>())
                .transpose()
                .context("LLM_TEMPERATURE must be a number")?
                .unwrap_or(0.3),
            llm_max_tokens: optional_env("LLM_MAX_TOKENS")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("LLM_MAX_TOKENS must be a positive integer")?
                .unwrap_or(2000),
            non_cv_brands: optional_env("NON_CV_BRANDS")
                .map(|v| parse_brand_list(&v))
                .unwrap_or_else(crate::allocation::seed::default_non_cv_brands),
        })
    }

    /// Configuration used by tests: no credential, default model settings.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            llm_api_key: None,
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 2000,
            non_cv_brands: crate::allocation::seed::default_non_cv_brands(),
        }
    }
}

/// Reads an env var, treating empty or whitespace-only values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_brand_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brand_list_trims_and_skips_empty() {
        let brands = parse_brand_list(" glucorin, ,respira ,");
        assert_eq!(brands, vec!["glucorin", "respira"]);
    }

    #[test]
    fn test_test_config_has_no_credential() {
        assert!(Config::for_tests().llm_api_key.is_none());
    }
}

use secrecy::SecretString;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub profiles_collection: String,
    pub attempts_collection: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub model_api_base: String,
    pub model_api_key: SecretString,
    pub model_name: String,
    pub generation_timeout_secs: u64,
    pub feedback_timeout_secs: u64,
    pub allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "quizmill-local".to_string()),
            profiles_collection: env::var("PROFILES_COLLECTION")
                .unwrap_or_else(|_| "profiles".to_string()),
            attempts_collection: env::var("ATTEMPTS_COLLECTION")
                .unwrap_or_else(|_| "attempts".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            model_api_base: env::var("MODEL_API_BASE")
                .unwrap_or_else(|_| "https://api.perplexity.ai".to_string()),
            model_api_key: SecretString::from(
                env::var("MODEL_API_KEY").unwrap_or_default(),
            ),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| "sonar-pro".to_string()),
            generation_timeout_secs: env::var("GENERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            feedback_timeout_secs: env::var("FEEDBACK_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
            allowed_origin: env::var("ALLOWED_ORIGIN").ok(),
        }
    }

    pub fn api_key_configured(&self) -> bool {
        use secrecy::ExposeSecret;
        !self.model_api_key.expose_secret().is_empty()
    }

    /// Validate that production-critical configuration is set.
    /// Panics if required settings are missing or left at dev defaults.
    pub fn validate_for_production(&self) {
        if !self.api_key_configured() {
            panic!("FATAL: MODEL_API_KEY is not set! Question generation cannot work without it.");
        }

        if self.allowed_origin.is_none() {
            panic!(
                "FATAL: ALLOWED_ORIGIN is not set! Refusing to run with a wildcard CORS policy."
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizmill-test".to_string(),
            profiles_collection: "profiles".to_string(),
            attempts_collection: "attempts".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 4000,
            model_api_base: "https://api.perplexity.ai".to_string(),
            model_api_key: SecretString::from("test_api_key".to_string()),
            model_name: "sonar-pro".to_string(),
            generation_timeout_secs: 5,
            feedback_timeout_secs: 2,
            allowed_origin: None,
        }
    }
}

//! Server configuration: one CLI flag per setting, with environment-variable
//! overrides applied after parsing. Environment wins when both are set.

use clap::Parser;
use std::path::PathBuf;

/// Command-line flags. Defaults mirror a stock single-host deployment with
/// Whisper/Piper on port 5000 and Ollama on 11434.
#[derive(Debug, Parser)]
#[command(
    name = "sensecap-server",
    about = "Local stand-in for the SenseCAP Watcher cloud AI service",
    version
)]
pub struct Cli {
    /// Listen port
    #[arg(long, default_value_t = 8834)]
    pub port: u16,

    /// Listen host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Required Authorization header value (auth disabled when unset)
    #[arg(long)]
    pub token: Option<String>,

    /// SQLite database file
    #[arg(long = "db", default_value = "sensecap.db")]
    pub db_path: PathBuf,

    /// Whisper STT service base URL
    #[arg(long = "whisper-url", default_value = "http://localhost:5000")]
    pub whisper_url: String,

    /// Ollama base URL (text and vision generation)
    #[arg(long = "ollama-url", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Ollama text model
    #[arg(long = "ollama-model", default_value = "llama3.1:8b-instruct-q4_1")]
    pub ollama_model: String,

    /// Ollama vision model
    #[arg(long = "llava-model", default_value = "llava:7b")]
    pub llava_model: String,

    /// Piper TTS service base URL
    #[arg(long = "piper-url", default_value = "http://localhost:5000")]
    pub piper_url: String,

    /// URL schema advertised to devices (http or https)
    #[arg(long = "api-schema", default_value = "http")]
    pub api_schema: String,

    /// Base URL advertised to devices (defaults to {schema}://{host}:{port})
    #[arg(long = "api-base-url")]
    pub api_base_url: Option<String>,
}

/// Resolved runtime configuration.
///
/// | Env | Overrides flag |
/// |-----|----------------|
/// | PORT, HOST | --port, --host |
/// | AUTH_TOKEN | --token |
/// | DB_PATH | --db |
/// | WHISPER_URL, OLLAMA_URL, PIPER_URL | --whisper-url, --ollama-url, --piper-url |
/// | OLLAMA_MODEL, LLAVA_MODEL | --ollama-model, --llava-model |
/// | API_SCHEMA, API_BASE_URL | --api-schema, --api-base-url |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub auth_token: Option<String>,
    pub db_path: PathBuf,
    pub whisper_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llava_model: String,
    pub piper_url: String,
    pub api_schema: String,
    pub api_base_url: String,
}

impl ServerConfig {
    /// Resolve flags and environment into a validated configuration.
    pub fn from_cli(cli: Cli) -> Result<Self, String> {
        let port = match env_var("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| format!("PORT is not a valid port number: {v}"))?,
            None => cli.port,
        };
        let host = env_var("HOST").unwrap_or(cli.host);
        let api_schema = env_var("API_SCHEMA").unwrap_or(cli.api_schema);
        let api_base_url = env_var("API_BASE_URL")
            .or(cli.api_base_url)
            .unwrap_or_else(|| format!("{api_schema}://{host}:{port}"));

        let config = Self {
            port,
            host,
            auth_token: env_var("AUTH_TOKEN").or(cli.token),
            db_path: env_var("DB_PATH").map(PathBuf::from).unwrap_or(cli.db_path),
            whisper_url: env_var("WHISPER_URL").unwrap_or(cli.whisper_url),
            ollama_url: env_var("OLLAMA_URL").unwrap_or(cli.ollama_url),
            ollama_model: env_var("OLLAMA_MODEL").unwrap_or(cli.ollama_model),
            llava_model: env_var("LLAVA_MODEL").unwrap_or(cli.llava_model),
            piper_url: env_var("PIPER_URL").unwrap_or(cli.piper_url),
            api_schema,
            api_base_url,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_token.is_some()
    }

    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("listen host cannot be empty".to_string());
        }
        if self.db_path.as_os_str().is_empty() {
            return Err("database path cannot be empty".to_string());
        }
        for (name, url) in [
            ("whisper", &self.whisper_url),
            ("ollama", &self.ollama_url),
            ("piper", &self.piper_url),
        ] {
            if url.trim().is_empty() {
                return Err(format!("{name} URL cannot be empty"));
            }
        }
        if self.api_schema != "http" && self.api_schema != "https" {
            return Err(format!(
                "api schema must be http or https, got: {}",
                self.api_schema
            ));
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServerConfig {
        ServerConfig {
            port: 8834,
            host: "localhost".to_string(),
            auth_token: None,
            db_path: PathBuf::from("sensecap.db"),
            whisper_url: "http://localhost:5000".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1:8b-instruct-q4_1".to_string(),
            llava_model: "llava:7b".to_string(),
            piper_url: "http://localhost:5000".to_string(),
            api_schema: "http".to_string(),
            api_base_url: "http://localhost:8834".to_string(),
        }
    }

    #[test]
    fn cli_defaults_parse() {
        let cli = Cli::parse_from(["sensecap-server"]);
        assert_eq!(cli.port, 8834);
        assert_eq!(cli.host, "localhost");
        assert!(cli.token.is_none());
        assert_eq!(cli.db_path, PathBuf::from("sensecap.db"));
        assert_eq!(cli.ollama_model, "llama3.1:8b-instruct-q4_1");
    }

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "sensecap-server",
            "--port",
            "9000",
            "--token",
            "secret",
            "--llava-model",
            "llava:13b",
        ]);
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.token.as_deref(), Some("secret"));
        assert_eq!(cli.llava_model, "llava:13b");
    }

    #[test]
    fn validate_rejects_empty_urls() {
        let mut config = base_config();
        config.ollama_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_schema() {
        let mut config = base_config();
        config.api_schema = "ftp".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }
}

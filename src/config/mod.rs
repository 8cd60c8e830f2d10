//! Server configuration.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! .env file loaded at startup. Secret fields are zeroized when the config
//! is dropped.

use std::path::PathBuf;
use zeroize::Zeroize;

use crate::core::realtime::{OPENAI_REALTIME_URL, RealtimeModel, Voice};
use crate::summarize::DEFAULT_SUMMARY_MODEL;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidVar {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// TLS configuration for HTTPS and WSS.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// SendGrid delivery settings. Summaries are only emailed when all three
/// values are present.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    /// SendGrid API key
    pub api_key: String,
    /// Sender address
    pub from_email: String,
    /// Dynamic template id for the summary email
    pub template_id: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Public domain callers stream media back to, without scheme or
    /// trailing slashes
    pub domain: String,

    /// Twilio account SID
    pub twilio_account_sid: String,
    /// Twilio auth token
    pub twilio_auth_token: String,
    /// E.164 number outbound calls originate from
    pub phone_number_from: String,

    /// OpenAI API key, used for both the realtime socket and summarization
    pub openai_api_key: String,
    /// Realtime WebSocket endpoint, without the model query parameter
    pub realtime_endpoint: String,
    /// Realtime model dialed calls talk to
    pub realtime_model: RealtimeModel,
    /// Default voice when a call request does not specify one
    pub default_voice: Voice,
    /// Chat model used to summarize transcripts
    pub summary_model: String,

    /// SendGrid settings; `None` disables summary emails
    pub sendgrid: Option<SendGridConfig>,

    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

impl Drop for ServerConfig {
    fn drop(&mut self) {
        self.twilio_auth_token.zeroize();
        self.openai_api_key.zeroize();
        if let Some(ref mut sendgrid) = self.sendgrid {
            sendgrid.api_key.zeroize();
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Strip the URL scheme and trailing slashes from a configured domain.
fn normalize_domain(raw: &str) -> String {
    let without_scheme = match raw.find("://") {
        Some(idx) => &raw[idx + 3..],
        None => raw,
    };
    without_scheme.trim_end_matches('/').to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// A .env file, if any, must already have been loaded by the caller.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match optional("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
                name: "PORT",
                value: raw,
            })?,
            None => 6060,
        };

        let tls = match (optional("TLS_CERT_PATH"), optional("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::MissingVar(
                    "TLS_CERT_PATH and TLS_KEY_PATH must be set together",
                ));
            }
        };

        let domain = normalize_domain(&required("CUSTOM_DOMAIN")?);
        if domain.is_empty() {
            return Err(ConfigError::MissingVar("CUSTOM_DOMAIN"));
        }

        let sendgrid = match (
            optional("SENDGRID_API_KEY"),
            optional("CUSTOM_EMAIL_FROM"),
            optional("SENDGRID_SUMMARY_TEMPLATE_ID"),
        ) {
            (Some(api_key), Some(from_email), Some(template_id)) => Some(SendGridConfig {
                api_key,
                from_email,
                template_id,
            }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            tls,
            domain,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: required("TWILIO_AUTH_TOKEN")?,
            phone_number_from: required("PHONE_NUMBER_FROM")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            realtime_endpoint: optional("OPENAI_REALTIME_ENDPOINT")
                .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string()),
            realtime_model: RealtimeModel::from_str_or_default(
                optional("REALTIME_MODEL").as_deref().unwrap_or_default(),
            ),
            default_voice: Voice::from_str_or_default(
                optional("DEFAULT_VOICE").as_deref().unwrap_or_default(),
            ),
            summary_model: optional("SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            sendgrid,
            cors_allowed_origins: optional("CORS_ALLOWED_ORIGINS"),
        })
    }

    /// The bind address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether TLS is configured.
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }
}

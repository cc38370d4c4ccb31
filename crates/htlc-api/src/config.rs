//! # Service Configuration
//!
//! Loads [`AppConfig`] from environment variables at start-up. Malformed
//! values fail start-up with a [`ConfigError`]; nothing is silently
//! defaulted except unset variables.
//!
//! | Variable                | Default  | Format                         |
//! |-------------------------|----------|--------------------------------|
//! | `PORT`                  | `8080`   | `u16`                          |
//! | `HTLC_API_TOKENS`       | unset    | `account=token,account=token`  |
//! | `HTLC_GENESIS_BALANCES` | unset    | `account=amount,account=amount`|
//! | `LOG_FORMAT`            | `pretty` | `pretty` or `json`             |
//!
//! When `HTLC_API_TOKENS` is unset, authentication runs in development
//! mode: the bearer value names the calling account directly.

use std::collections::HashSet;

use htlc_core::{AccountId, Amount, ValidationError};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// A bearer token bound to the account it authenticates.
///
/// Custom `Debug` redacts the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken {
    /// The account this token authenticates as.
    pub account: AccountId,
    /// The bearer secret.
    pub secret: String,
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiToken")
            .field("account", &self.account)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Account-bound bearer tokens. `None` enables development mode.
    pub api_tokens: Option<Vec<ApiToken>>,
    /// Balances minted into the in-memory bank at start-up.
    pub genesis_balances: Vec<(AccountId, Amount)>,
    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_tokens: None,
            genesis_balances: Vec::new(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let api_tokens = match lookup("HTLC_API_TOKENS").filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Some(parse_tokens(&raw)?),
            None => None,
        };

        let genesis_balances = match lookup("HTLC_GENESIS_BALANCES") {
            Some(raw) => parse_balances(&raw)?,
            None => Vec::new(),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            port,
            api_tokens,
            genesis_balances,
            log_format,
        })
    }
}

/// Split `a=x,b=y` into validated `(AccountId, value)` pairs, rejecting
/// repeated accounts.
fn parse_pairs(var: &'static str, raw: &str) -> Result<Vec<(AccountId, String)>, ConfigError> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (account, value) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedEntry {
                var,
                reason: "expected account=value".to_string(),
            })?;
        let account = AccountId::new(account.trim())
            .map_err(|source| ConfigError::InvalidAccount { var, source })?;
        if !seen.insert(account.clone()) {
            return Err(ConfigError::DuplicateAccount { var, account });
        }
        pairs.push((account, value.trim().to_string()));
    }
    Ok(pairs)
}

fn parse_tokens(raw: &str) -> Result<Vec<ApiToken>, ConfigError> {
    const VAR: &str = "HTLC_API_TOKENS";
    let pairs = parse_pairs(VAR, raw)?;
    let mut secrets = HashSet::new();
    let mut tokens = Vec::with_capacity(pairs.len());
    for (account, secret) in pairs {
        if secret.is_empty() {
            return Err(ConfigError::MalformedEntry {
                var: VAR,
                reason: format!("empty token for {account}"),
            });
        }
        if !secrets.insert(secret.clone()) {
            return Err(ConfigError::MalformedEntry {
                var: VAR,
                reason: format!("token for {account} is shared with another account"),
            });
        }
        tokens.push(ApiToken { account, secret });
    }
    Ok(tokens)
}

fn parse_balances(raw: &str) -> Result<Vec<(AccountId, Amount)>, ConfigError> {
    const VAR: &str = "HTLC_GENESIS_BALANCES";
    parse_pairs(VAR, raw)?
        .into_iter()
        .map(|(account, value)| {
            Amount::parse(&value)
                .map(|amount| (account, amount))
                .map_err(|source| ConfigError::InvalidAmount { var: VAR, source })
        })
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `PORT` is not a valid `u16`.
    #[error("invalid PORT: \"{0}\"")]
    InvalidPort(String),

    /// An entry in a list variable is not `account=value`.
    #[error("malformed {var}: {reason}")]
    MalformedEntry {
        /// The variable being parsed.
        var: &'static str,
        /// What is wrong with the entry.
        reason: String,
    },

    /// An account name in a list variable is invalid.
    #[error("invalid account in {var}: {source}")]
    InvalidAccount {
        /// The variable being parsed.
        var: &'static str,
        /// The account validation failure.
        #[source]
        source: ValidationError,
    },

    /// An account appears more than once in a list variable.
    #[error("account {account} listed more than once in {var}")]
    DuplicateAccount {
        /// The variable being parsed.
        var: &'static str,
        /// The repeated account.
        account: AccountId,
    },

    /// A balance in `HTLC_GENESIS_BALANCES` is not a valid amount.
    #[error("invalid amount in {var}: {source}")]
    InvalidAmount {
        /// The variable being parsed.
        var: &'static str,
        /// The amount validation failure.
        #[source]
        source: ValidationError,
    },

    /// `LOG_FORMAT` is neither `pretty` nor `json`.
    #[error("invalid LOG_FORMAT: \"{0}\" (expected pretty or json)")]
    InvalidLogFormat(String),
}

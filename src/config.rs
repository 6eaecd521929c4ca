//! Application configuration loaded from environment variables.
//!
//! Every variable is optional:
//! - `QUOTELINE_API_URL` — exchange REST base URL
//! - `QUOTELINE_QUOTE_CURRENCY` — currency the catalog is filtered to
//! - `QUOTELINE_MAX_TICKER_AGE_SECS` — staleness threshold for cached tickers
//! - `QUOTELINE_STALENESS_ANCHOR` — `trade` or `fetch`, see [`StalenessAnchor`]
//! - `QUOTELINE_USER_AGENT` — sent with every request
//! - `QUOTELINE_NICK` — name the bot answers to in a channel
//! - `QUOTELINE_CHANNEL` — treat console input as traffic in this channel

use std::time::Duration;

use crate::QuotelineError;

/// Default public REST endpoint (formerly `api.gdax.com`).
pub const DEFAULT_API_URL: &str = "https://api.exchange.coinbase.com";

/// Default quote currency for the product catalog.
pub const DEFAULT_QUOTE_CURRENCY: &str = "USD";

/// Default maximum age of a cached ticker.
pub const DEFAULT_MAX_TICKER_AGE: Duration = Duration::from_secs(60);

const DEFAULT_NICK: &str = "bort";

/// Which clock a cached ticker's age is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessAnchor {
    /// Age is `now - trade time` as reported by the exchange. A quiet
    /// market whose last trade is older than the threshold is refetched on
    /// every request.
    #[default]
    TradeTime,
    /// Age is `now - local fetch time`.
    FetchTime,
}

impl StalenessAnchor {
    fn parse(value: &str) -> crate::Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "trade" | "trade_time" => Ok(Self::TradeTime),
            "fetch" | "fetch_time" => Ok(Self::FetchTime),
            other => Err(QuotelineError::Config(format!(
                "QUOTELINE_STALENESS_ANCHOR must be `trade` or `fetch`, got `{other}`"
            ))),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub cache: CacheConfig,
    pub chat: ChatConfig,
}

/// Exchange connection values.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub api_url: String,
    pub quote_currency: String,
    pub user_agent: String,
}

/// Ticker cache policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_ticker_age: Duration,
    pub anchor: StalenessAnchor,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_ticker_age: DEFAULT_MAX_TICKER_AGE,
            anchor: StalenessAnchor::default(),
        }
    }
}

/// Console chat values.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub nick: String,
    pub channel: Option<String>,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`QuotelineError::Config`] if the ticker age is not a positive
/// integer or the staleness anchor is unknown.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let api_url = non_empty_var("QUOTELINE_API_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let quote_currency = non_empty_var("QUOTELINE_QUOTE_CURRENCY")
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_else(|| DEFAULT_QUOTE_CURRENCY.to_string());

    let user_agent = non_empty_var("QUOTELINE_USER_AGENT")
        .unwrap_or_else(|| format!("quoteline/{}", env!("CARGO_PKG_VERSION")));

    let max_ticker_age = match non_empty_var("QUOTELINE_MAX_TICKER_AGE_SECS") {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(QuotelineError::Config(format!(
                    "QUOTELINE_MAX_TICKER_AGE_SECS must be a positive integer, got `{raw}`"
                )));
            }
        },
        None => DEFAULT_MAX_TICKER_AGE,
    };

    let anchor = match non_empty_var("QUOTELINE_STALENESS_ANCHOR") {
        Some(raw) => StalenessAnchor::parse(&raw)?,
        None => StalenessAnchor::default(),
    };

    let nick = non_empty_var("QUOTELINE_NICK").unwrap_or_else(|| DEFAULT_NICK.to_string());
    let channel = non_empty_var("QUOTELINE_CHANNEL");

    Ok(AppConfig {
        exchange: ExchangeConfig {
            api_url,
            quote_currency,
            user_agent,
        },
        cache: CacheConfig {
            max_ticker_age,
            anchor,
        },
        chat: ChatConfig { nick, channel },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 7] = [
        "QUOTELINE_API_URL",
        "QUOTELINE_QUOTE_CURRENCY",
        "QUOTELINE_MAX_TICKER_AGE_SECS",
        "QUOTELINE_STALENESS_ANCHOR",
        "QUOTELINE_USER_AGENT",
        "QUOTELINE_NICK",
        "QUOTELINE_CHANNEL",
    ];

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Helper that clears every config var, applies `vars`, runs `f`, then
    /// restores the originals.
    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = ALL_VARS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: ENV_LOCK serialises every test that touches these vars.
        unsafe {
            for k in ALL_VARS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values under the same lock.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&[], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.exchange.api_url, DEFAULT_API_URL);
            assert_eq!(config.exchange.quote_currency, "USD");
            assert!(config.exchange.user_agent.starts_with("quoteline/"));
            assert_eq!(config.cache, CacheConfig::default());
            assert_eq!(config.chat.nick, "bort");
            assert!(config.chat.channel.is_none());
        });
    }

    #[test]
    fn overrides_from_env() {
        with_env(
            &[
                ("QUOTELINE_API_URL", "http://127.0.0.1:9000/"),
                ("QUOTELINE_QUOTE_CURRENCY", "eur"),
                ("QUOTELINE_MAX_TICKER_AGE_SECS", "15"),
                ("QUOTELINE_STALENESS_ANCHOR", "fetch"),
                ("QUOTELINE_CHANNEL", "#markets"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.exchange.api_url, "http://127.0.0.1:9000");
                assert_eq!(config.exchange.quote_currency, "EUR");
                assert_eq!(config.cache.max_ticker_age, Duration::from_secs(15));
                assert_eq!(config.cache.anchor, StalenessAnchor::FetchTime);
                assert_eq!(config.chat.channel.as_deref(), Some("#markets"));
            },
        );
    }

    #[test]
    fn rejects_zero_ticker_age() {
        with_env(&[("QUOTELINE_MAX_TICKER_AGE_SECS", "0")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("positive integer"));
        });
    }

    #[test]
    fn rejects_unknown_anchor() {
        with_env(&[("QUOTELINE_STALENESS_ANCHOR", "server")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("`trade` or `fetch`"));
        });
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[("QUOTELINE_API_URL", ""), ("QUOTELINE_NICK", "")],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.exchange.api_url, DEFAULT_API_URL);
                assert_eq!(config.chat.nick, "bort");
            },
        );
    }
}

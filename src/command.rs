//! Chat command parsing and dispatch.
//!
//! Turns a raw chat line into a [`Command`] with a canonical product id and
//! runs it against a [`QuoteService`].

use tracing::{debug, warn};

use crate::service::QuoteService;

/// Product queried when a command has no argument.
const DEFAULT_BASE: &str = "BTC";

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `price` / `tlast`
    Price(String),
    /// `vol` / `volume`
    Volume(String),
    /// `products`
    Products,
    /// `all` / `tall`
    AllPrices,
    /// `stats`
    Stats(String),
}

impl Command {
    /// Maps a command name and argument string to a command.
    ///
    /// Returns `None` for names the bot does not answer to.
    pub fn from_parts(name: &str, args: &str, quote_currency: &str) -> Option<Self> {
        let product = || canonical_product(args, quote_currency);
        match name.to_ascii_lowercase().as_str() {
            "price" | "tlast" => Some(Self::Price(product())),
            "vol" | "volume" => Some(Self::Volume(product())),
            "products" => Some(Self::Products),
            "all" | "tall" => Some(Self::AllPrices),
            "stats" => Some(Self::Stats(product())),
            _ => None,
        }
    }
}

/// Extracts the command text from a message, or `None` if the message is
/// not addressed to the bot.
///
/// In a channel (a target starting with `#`) the message must begin with
/// `<nick>:` or `<nick>,`, `!`, or `;;`. Anything else sent to the bot
/// directly counts as addressed.
pub fn addressed_text<'a>(target: &str, nick: &str, msg: &'a str) -> Option<&'a str> {
    if target.is_empty() || msg.is_empty() {
        return None;
    }
    if !target.starts_with('#') {
        return Some(msg);
    }

    if let Some(rest) = msg.strip_prefix(nick)
        && let Some(rest) = rest.strip_prefix(':').or_else(|| rest.strip_prefix(','))
    {
        return Some(rest);
    }
    msg.strip_prefix('!').or_else(|| msg.strip_prefix(";;"))
}

/// Splits an addressed message into a command name and argument string.
///
/// Returns `None` when nothing but whitespace is addressed to the bot.
pub fn parse_command<'a>(target: &str, nick: &str, msg: &'a str) -> Option<(&'a str, &'a str)> {
    let text = addressed_text(target, nick, msg)?.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.split_once(' ').unwrap_or((text, "")))
}

/// Normalises a user-supplied product to an exchange id.
///
/// `""` becomes `BTC-<quote>`, input is uppercased, and a bare base
/// currency such as `eth` gets `-<quote>` appended.
pub fn canonical_product(args: &str, quote_currency: &str) -> String {
    let args = args.trim();
    if args.is_empty() {
        return format!("{DEFAULT_BASE}-{quote_currency}");
    }
    let product = args.to_ascii_uppercase();
    if product.contains('-') {
        product
    } else {
        format!("{product}-{quote_currency}")
    }
}

/// Runs a command and returns the reply, if any.
///
/// Single-product lookups that fail are logged and produce no reply.
pub async fn execute(service: &QuoteService, command: &Command) -> Option<String> {
    let result = match command {
        Command::Price(product) => service.price(product).await,
        Command::Volume(product) => service.volume(product).await,
        Command::Stats(product) => service.stats(product).await,
        Command::Products => return Some(service.list_products().await),
        Command::AllPrices => return Some(service.all_prices().await),
    };

    match result {
        Ok(reply) => Some(reply),
        Err(e) => {
            warn!(?command, error = %e, "command failed");
            None
        }
    }
}

/// Parses and runs one chat message.
pub async fn handle_message(
    service: &QuoteService,
    target: &str,
    nick: &str,
    msg: &str,
) -> Option<String> {
    let (name, args) = parse_command(target, nick, msg)?;
    let Some(command) = Command::from_parts(name, args, service.catalog().quote_currency())
    else {
        debug!(name, "ignoring unknown command");
        return None;
    };
    execute(service, &command).await
}

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quoteline::QuotelineError;
use quoteline::client::RestClient;
use quoteline::command::handle_message;
use quoteline::config::fetch_config;
use quoteline::service::QuoteService;

/// Target used for console input when no channel is configured.
const CONSOLE_SENDER: &str = "console";

#[tokio::main]
async fn main() -> Result<(), QuotelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let app_config = fetch_config()?;
    let client = RestClient::new(&app_config.exchange)?;
    let service = QuoteService::new(
        Arc::new(client),
        app_config.exchange.quote_currency.clone(),
        app_config.cache,
    );

    let chat_target = app_config
        .chat
        .channel
        .as_deref()
        .unwrap_or(CONSOLE_SENDER);
    info!(
        api_url = %app_config.exchange.api_url,
        nick = %app_config.chat.nick,
        chat_target,
        "ready to serve"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let reply = handle_message(&service, chat_target, &app_config.chat.nick, &line).await;
        if let Some(reply) = reply {
            println!("{reply}");
        }
    }

    Ok(())
}

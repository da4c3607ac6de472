use std::net::TcpListener;

use actix_web::web;
use anyhow::Context;
use portfolio_contact::{config::get_config, mail_dispatcher::MailDispatcher, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 遥测初始化
    let subscriber = telemetry::get_subscriber("portfolio-contact", "info", std::io::stdout);
    telemetry::init_subscriber(subscriber);

    let config = get_config().context("failed to read config.yaml.")?;
    let listener = TcpListener::bind(config.web.server_address())
        .with_context(|| format!("failed to bind {}.", config.web.server_address()))?;
    let dispatcher = web::Data::new(
        MailDispatcher::from_config(&config.relay).context("failed to build mail dispatcher.")?,
    );

    tracing::info!("listening on {}.", config.web.server_address());
    portfolio_contact::run(listener, dispatcher, config.rate_limit)?.await?;

    Ok(())
}

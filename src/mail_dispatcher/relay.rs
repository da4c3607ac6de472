use std::time::Duration;

use anyhow::Context;
use lettre::{transport::smtp::authentication::Credentials, Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::config::RelayConfig;

/// 出站邮件中继
///
/// 调用方保证只尝试一次，实现方不做重试。
pub trait MailRelay: Send + Sync {
    fn deliver(&self, message: &Message) -> Result<(), anyhow::Error>;
}

/// 通过 STARTTLS 连接的 SMTP 中继，每次发送都新建连接
pub struct SmtpRelay {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    timeout: Duration,
}

impl SmtpRelay {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: Duration::from_millis(config.timeout_milliseconds),
        }
    }

    fn credentials(&self) -> Result<Credentials, anyhow::Error> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::new(
                username.clone(),
                password.expose_secret().to_owned(),
            )),
            _ => anyhow::bail!("relay credentials are not configured."),
        }
    }
}

impl MailRelay for SmtpRelay {
    #[tracing::instrument(
        name = "Delivering message to relay",
        skip_all,
        fields(relay.host = %self.host, relay.port = self.port)
    )]
    fn deliver(&self, message: &Message) -> Result<(), anyhow::Error> {
        let credentials = self.credentials()?;
        let transport = SmtpTransport::starttls_relay(&self.host)
            .context("failed to create SMTP transport.")?
            .port(self.port)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build();

        let response = transport
            .send(message)
            .with_context(|| format!("relay {}:{} refused the message.", self.host, self.port))?;
        tracing::info!(code = %response.code(), "relay accepted the message.");

        Ok(())
    }
}

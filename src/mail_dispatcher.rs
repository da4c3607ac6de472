mod notification;
mod relay;

pub use relay::{MailRelay, SmtpRelay};

use std::{fmt::Debug, sync::Arc};

use anyhow::Context;
use lettre::{message::Mailbox, Address};

use crate::{
    config::RelayConfig,
    contact_form::ContactSender,
    domain::{ContactFormData, ContactPayload},
    telemetry::spawn_blocking_with_tracing,
    util::error_chain_fmt,
};

/// 中继接收邮件后返回给调用方
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SendReceipt {
    pub success: bool,
}

impl SendReceipt {
    pub fn success() -> Self {
        Self { success: true }
    }
}

#[derive(thiserror::Error)]
pub enum SendError {
    #[error("{0}")]
    ValidationError(String),
    /// 中继的错误细节只写入日志，不返回给调用方
    #[error("Failed to send email.")]
    DispatchError,
}

impl Debug for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// 固定的发件人与收件人
pub struct MailSettings {
    pub sender_name: String,
    /// 即中继的登录邮箱，未配置时每次发送都会失败
    pub sender_address: Option<Address>,
    pub recipient: Mailbox,
    pub carbon_copy: Vec<Mailbox>,
}

impl MailSettings {
    pub fn from_config(config: &RelayConfig) -> Result<Self, anyhow::Error> {
        let sender_address = config
            .username
            .as_deref()
            .map(|username| username.parse::<Address>())
            .transpose()
            .context("relay username is not a valid email address.")?;
        let recipient = config
            .recipient
            .parse()
            .context("failed to parse recipient address.")?;
        let carbon_copy = config
            .carbon_copy
            .iter()
            .map(|cc| cc.parse::<Mailbox>())
            .collect::<Result<Vec<_>, _>>()
            .context("failed to parse carbon copy address.")?;

        Ok(Self {
            sender_name: config.sender_name.clone(),
            sender_address,
            recipient,
            carbon_copy,
        })
    }
}

pub struct MailDispatcher {
    settings: MailSettings,
    relay: Arc<dyn MailRelay>,
}

impl MailDispatcher {
    pub fn new(settings: MailSettings, relay: Arc<dyn MailRelay>) -> Self {
        Self { settings, relay }
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, anyhow::Error> {
        let settings = MailSettings::from_config(config)?;
        if config.username.is_none() || config.password.is_none() {
            tracing::warn!("relay credentials are not configured, every submission will fail.");
        }

        Ok(Self::new(
            settings,
            Arc::new(SmtpRelay::from_config(config)),
        ))
    }

    /// 校验表单并通过中继发送一封通知邮件，只尝试一次
    #[tracing::instrument(
        name = "Dispatching contact notification",
        skip_all,
        fields(submission_id = %uuid::Uuid::new_v4())
    )]
    pub async fn send(&self, form: ContactFormData) -> Result<SendReceipt, SendError> {
        let payload = ContactPayload::try_from(form).map_err(|e| {
            tracing::warn!("contact submission rejected. {e}");
            SendError::ValidationError(e)
        })?;

        let message =
            notification::build_message(&payload, &self.settings).map_err(dispatch_failure)?;

        let relay = Arc::clone(&self.relay);
        let delivered = spawn_blocking_with_tracing(move || relay.deliver(&message))
            .await
            .context("failed to spawn blocking task.");
        match delivered {
            Ok(Ok(())) => {
                tracing::info!("contact notification sent.");
                Ok(SendReceipt::success())
            }
            Ok(Err(e)) | Err(e) => Err(dispatch_failure(e)),
        }
    }
}

#[async_trait::async_trait]
impl ContactSender for MailDispatcher {
    async fn send(&self, form: ContactFormData) -> Result<SendReceipt, SendError> {
        MailDispatcher::send(self, form).await
    }
}

fn dispatch_failure(e: anyhow::Error) -> SendError {
    tracing::error!(
        error.cause_chain = ?e,
        error.message = %e,
        "failed to dispatch contact notification."
    );
    SendError::DispatchError
}

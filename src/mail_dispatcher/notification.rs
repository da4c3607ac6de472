use anyhow::Context;
use askama::Template;
use lettre::{
    message::{Mailbox, MultiPart},
    Message,
};

use super::MailSettings;
use crate::domain::ContactPayload;

/// HTML 正文，三个字段均经过 HTML 转义
#[derive(Template)]
#[template(path = "contact_notification.html")]
struct HtmlBody<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

/// 纯文本正文，原样输出
#[derive(Template)]
#[template(path = "contact_notification.txt")]
struct TextBody<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

pub struct NotificationBody {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn render(payload: &ContactPayload, sender_name: &str) -> Result<NotificationBody, askama::Error> {
    let name = payload.name.as_ref();
    let email = payload.email.as_ref();
    let message = payload.message.as_ref();

    let html = HtmlBody {
        name,
        email,
        message,
    }
    .render()?;
    let text = TextBody {
        name,
        email,
        message,
    }
    .render()?;

    Ok(NotificationBody {
        subject: format!("New Inquiry from {name} - {sender_name}"),
        html,
        text,
    })
}

/// 构造发给站点主人的通知邮件
pub fn build_message(
    payload: &ContactPayload,
    settings: &MailSettings,
) -> Result<Message, anyhow::Error> {
    let sender = settings
        .sender_address
        .clone()
        .context("relay username is not configured, there is no sender identity.")?;
    let body = render(payload, &settings.sender_name)
        .context("failed to render notification templates.")?;

    let mut builder = Message::builder()
        .from(Mailbox::new(Some(settings.sender_name.clone()), sender))
        .to(settings.recipient.clone())
        .subject(body.subject);
    for cc in &settings.carbon_copy {
        builder = builder.cc(cc.clone());
    }

    builder
        .multipart(MultiPart::alternative_plain_html(body.text, body.html))
        .context("failed to build notification message.")
}

use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;

use crate::{
    contact_form::ContactSender,
    domain::ContactFormData,
    mail_dispatcher::{SendError, SendReceipt},
};

/// 服务端返回的错误响应
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// 通过 HTTP 调用远端 `POST /contact`
pub struct ContactClient {
    client: reqwest::Client,
    contact_url: reqwest::Url,
}

impl ContactClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build contact client.")?;
        // 相对路径拼接，保留 `base_url` 中的路径前缀
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let contact_url = reqwest::Url::parse(&base)
            .and_then(|url| url.join("contact"))
            .with_context(|| format!("`{base_url}` is not a valid base url."))?;

        Ok(Self {
            client,
            contact_url,
        })
    }

    async fn post(&self, form: &ContactFormData) -> Result<SendReceipt, SendError> {
        let response = self
            .client
            .post(self.contact_url.clone())
            .form(form)
            .send()
            .await
            .context("failed to reach the contact endpoint.")
            .map_err(unreachable_dispatcher)?;

        match response.status() {
            status if status.is_success() => response
                .json::<SendReceipt>()
                .await
                .context("failed to parse contact receipt.")
                .map_err(unreachable_dispatcher),
            StatusCode::BAD_REQUEST => {
                let body = response
                    .json::<ErrorBody>()
                    .await
                    .context("failed to parse validation error.")
                    .map_err(unreachable_dispatcher)?;
                Err(SendError::ValidationError(body.error))
            }
            status => Err(unreachable_dispatcher(anyhow::anyhow!(
                "contact endpoint responded with {status}."
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ContactSender for ContactClient {
    #[tracing::instrument(name = "Posting contact form", skip_all, fields(url = %self.contact_url))]
    async fn send(&self, form: ContactFormData) -> Result<SendReceipt, SendError> {
        self.post(&form).await
    }
}

fn unreachable_dispatcher(e: anyhow::Error) -> SendError {
    tracing::error!(
        error.cause_chain = ?e,
        error.message = %e,
        "contact submission did not reach the mail dispatcher."
    );
    SendError::DispatchError
}

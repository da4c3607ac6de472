//! 联系表单控制器
//!
//! 持有表单字段与提交状态机：
//!
//! ```text
//! idle    --submit()--> loading
//! loading --成功-->      success --(3s)--> idle
//! loading --失败-->      error   --(3s)--> idle
//! loading --submit()--> loading (忽略)
//! ```

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    domain::{ContactField, ContactFormData, SubmissionStatus},
    mail_dispatcher::{SendError, SendReceipt},
};

/// 终态回到 `idle` 之前的停留时间
pub const RESET_DELAY: Duration = Duration::from_millis(3000);

/// 表单的发送端：进程内的 [`MailDispatcher`](crate::mail_dispatcher::MailDispatcher)
/// 或通过 HTTP 调用的 [`ContactClient`](crate::contact_client::ContactClient)
#[async_trait::async_trait]
pub trait ContactSender: Send + Sync {
    async fn send(&self, form: ContactFormData) -> Result<SendReceipt, SendError>;
}

#[async_trait::async_trait]
impl<T: ContactSender + ?Sized> ContactSender for Arc<T> {
    async fn send(&self, form: ContactFormData) -> Result<SendReceipt, SendError> {
        (**self).send(form).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Failure,
}

/// 提交结束后展示给用户的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: &'static str,
    pub description: &'static str,
}

impl Notification {
    pub fn success() -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Message sent successfully!",
            description: "We'll get back to you as soon as possible.",
        }
    }

    pub fn failure() -> Self {
        Self {
            kind: NotificationKind::Failure,
            title: "Error sending message",
            description: "There was a problem. Please try again.",
        }
    }
}

pub struct ContactForm<S> {
    sender: S,
    fields: Mutex<ContactFormData>,
    status: Arc<watch::Sender<SubmissionStatus>>,
    pending_reset: Mutex<Option<JoinHandle<()>>>,
    reset_delay: Duration,
}

impl<S: ContactSender> ContactForm<S> {
    pub fn new(sender: S) -> Self {
        Self::with_reset_delay(sender, RESET_DELAY)
    }

    pub fn with_reset_delay(sender: S, reset_delay: Duration) -> Self {
        let (status, _) = watch::channel(SubmissionStatus::Idle);
        Self {
            sender,
            fields: Mutex::new(ContactFormData::default()),
            status: Arc::new(status),
            pending_reset: Mutex::new(None),
            reset_delay,
        }
    }

    pub fn update_field(&self, field: ContactField, value: impl Into<String>) {
        lock(&self.fields).set(field, value.into());
    }

    /// 按字段名更新，未知字段名返回错误
    pub fn update_field_by_name(&self, name: &str, value: impl Into<String>) -> Result<(), String> {
        let field = name.parse::<ContactField>()?;
        self.update_field(field, value);
        Ok(())
    }

    pub fn fields(&self) -> ContactFormData {
        lock(&self.fields).clone()
    }

    pub fn status(&self) -> SubmissionStatus {
        *self.status.borrow()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    /// 提交表单
    ///
    /// 已有提交进行中时直接返回 `None`，不会再次调用发送端。
    #[tracing::instrument(name = "Submitting contact form", skip(self))]
    pub async fn submit(&self) -> Option<Notification> {
        let started = self.status.send_if_modified(|status| {
            if *status == SubmissionStatus::Loading {
                return false;
            }
            *status = SubmissionStatus::Loading;
            true
        });
        if !started {
            tracing::warn!("a submission is already in flight, ignored.");
            return None;
        }
        self.cancel_pending_reset();
        // `submit` 的 future 在发送途中被丢弃时，由守卫把状态转为 `error`
        let in_flight = InFlight { form: self };

        let form = self.fields();
        let (status, notification) = match self.sender.send(form).await {
            Ok(SendReceipt { success: true }) => {
                *lock(&self.fields) = ContactFormData::default();
                (SubmissionStatus::Success, Notification::success())
            }
            Ok(SendReceipt { success: false }) => {
                tracing::error!("sender reported an unsuccessful submission.");
                (SubmissionStatus::Error, Notification::failure())
            }
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "failed to submit contact form."
                );
                (SubmissionStatus::Error, Notification::failure())
            }
        };
        std::mem::forget(in_flight);

        self.finish(status);
        Some(notification)
    }
}

impl<S> ContactForm<S> {
    fn finish(&self, status: SubmissionStatus) {
        tracing::info!(%status, "contact form submission finished.");
        self.status.send_replace(status);
        self.schedule_reset();
    }

    fn schedule_reset(&self) {
        let status = Arc::clone(&self.status);
        let reset_delay = self.reset_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(reset_delay).await;
            // 只从终态回到 `idle`，不打断进行中的提交
            status.send_if_modified(|status| {
                if !status.is_terminal() {
                    return false;
                }
                *status = SubmissionStatus::Idle;
                true
            });
        });

        if let Some(previous) = lock(&self.pending_reset).replace(handle) {
            previous.abort();
        }
    }

    fn cancel_pending_reset(&self) {
        if let Some(handle) = lock(&self.pending_reset).take() {
            handle.abort();
        }
    }
}

struct InFlight<'a, S> {
    form: &'a ContactForm<S>,
}

impl<S> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        tracing::warn!("contact form submission was abandoned before the sender replied.");
        if tokio::runtime::Handle::try_current().is_ok() {
            self.form.finish(SubmissionStatus::Error);
        } else {
            self.form.status.send_replace(SubmissionStatus::Error);
        }
    }
}

impl<S> Drop for ContactForm<S> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.pending_reset).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

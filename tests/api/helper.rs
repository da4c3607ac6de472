use std::{
    net::TcpListener,
    sync::{Arc, Mutex},
    time::Duration,
};

use actix_web::web;
use lettre::{address::Envelope, Message};
use once_cell::sync::Lazy;
use portfolio_contact::{
    config::{get_config, Config},
    contact_client::ContactClient,
    mail_dispatcher::{MailDispatcher, MailRelay, MailSettings},
    telemetry,
};

// `TEST_LOG=1 cargo test` 时输出日志
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        telemetry::init_subscriber(telemetry::get_subscriber("test", "debug", std::io::stdout));
    } else {
        telemetry::init_subscriber(telemetry::get_subscriber("test", "debug", std::io::sink));
    }
});

/// 模拟邮件中继
#[derive(Default)]
pub struct FakeRelay {
    delivered: Mutex<Vec<Envelope>>,
    failure: Option<String>,
}

impl FakeRelay {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting(detail: &str) -> Self {
        Self {
            failure: Some(detail.into()),
            ..Default::default()
        }
    }

    pub fn delivered(&self) -> Vec<Envelope> {
        self.delivered.lock().unwrap().clone()
    }
}

impl MailRelay for FakeRelay {
    fn deliver(&self, message: &Message) -> Result<(), anyhow::Error> {
        if let Some(failure) = &self.failure {
            return Err(anyhow::anyhow!(failure.clone()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push(message.envelope().clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub config: Config,
    pub relay: Arc<FakeRelay>,
}

impl TestApp {
    pub async fn post_contact(&self, body: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/contact", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_owned())
            .send()
            .await
            .expect("failed to execute request.")
    }

    pub fn contact_client(&self) -> ContactClient {
        ContactClient::new(&self.address, Duration::from_secs(5))
            .expect("failed to build contact client.")
    }

    /// 与 `config.yaml` 中的收件人、抄送人对应的投递地址
    pub fn recipients(&self) -> Vec<String> {
        let relay = &self.config.relay;
        std::iter::once(relay.recipient.clone())
            .chain(relay.carbon_copy.iter().cloned())
            .collect()
    }

    /// 使用配置中的收件人，但经由模拟中继发送
    pub fn dispatcher(&self, relay: Arc<FakeRelay>) -> MailDispatcher {
        let settings =
            MailSettings::from_config(&self.config.relay).expect("failed to parse mail settings.");
        MailDispatcher::new(settings, relay)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(FakeRelay::accepting(), |_| {}).await
}

pub async fn spawn_app_with(relay: FakeRelay, configure: impl FnOnce(&mut Config)) -> TestApp {
    Lazy::force(&TRACING);

    let mut config = get_config().expect("failed to read config.yaml.");
    config.relay.username = Some("relay@example.com".into());
    config.rate_limit.max_requests = 100;
    configure(&mut config);

    let listener =
        TcpListener::bind(format!("{}:0", &config.web.host)).expect("failed to bind web port.");
    // 获取绑定的随机端口
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://{}:{}", &config.web.host, port);

    let relay = Arc::new(relay);
    let settings =
        MailSettings::from_config(&config.relay).expect("failed to parse mail settings.");
    let dispatcher = web::Data::new(MailDispatcher::new(settings, relay.clone()));

    let server = portfolio_contact::run(listener, dispatcher, config.rate_limit.clone())
        .expect("failed to build server.");
    tokio::spawn(server);

    TestApp {
        address,
        config,
        relay,
    }
}

pub fn assert_delivered_to(envelope: &Envelope, recipients: &[String]) {
    let to: Vec<String> = envelope.to().iter().map(|a| a.to_string()).collect();
    assert_eq!(to.len(), recipients.len());
    for recipient in recipients {
        assert!(to.contains(recipient), "{recipient} did not receive the notification.");
    }
}

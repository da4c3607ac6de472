use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub relay: RelayConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(serde::Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl WebConfig {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 出站邮件中继配置
///
/// `username` 同时作为发件地址；`username`/`password` 缺失时服务仍可启动，
/// 但每次发送都会以 `DispatchError` 失败。
#[derive(serde::Deserialize, Clone)]
pub struct RelayConfig {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    pub sender_name: String,
    pub recipient: String,
    #[serde(default)]
    pub carbon_copy: Vec<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_requests: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub interval_seconds: u64,
}

/// 读取`config.yaml`，环境变量优先
///
/// - `APP__WEB__PORT=8080` 形式覆盖任意配置项
/// - `EMAIL_USER`/`EMAIL_PASSWORD` 提供中继邮箱凭证
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::new("config.yaml", config::FileFormat::Yaml))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .set_override_option("relay.username", std::env::var("EMAIL_USER").ok())?
        .set_override_option("relay.password", std::env::var("EMAIL_PASSWORD").ok())?
        .build()?
        .try_deserialize::<Config>()
}

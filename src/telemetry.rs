use tokio::task::JoinHandle;
use tracing::{subscriber, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// 构造 bunyan 格式的订阅器
///
/// `RUST_LOG` 未设置时使用 `default_filter`。
pub fn get_subscriber<Sink>(
    name: &str,
    default_filter: &str,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let formatting_layer = BunyanFormattingLayer::new(name.into(), sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// 只能调用一次
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    // 将`log`中的记录导入`trace`中，显示`actix-web`的日志
    LogTracer::init().expect("failed to set logger.");
    subscriber::set_global_default(subscriber).expect("failed to set subscriber.");
}

/// 在阻塞线程池中执行，并沿用当前 span
pub fn spawn_blocking_with_tracing<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let current_span = tracing::Span::current();
    tokio::task::spawn_blocking(move || current_span.in_scope(f))
}

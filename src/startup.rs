use std::{net::TcpListener, time::Duration};

use actix_extensible_rate_limit::{
    backend::{memory::InMemoryBackend, SimpleInputFunctionBuilder},
    RateLimiter,
};
use actix_web::{dev::Server, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::{
    config::RateLimitConfig,
    mail_dispatcher::MailDispatcher,
    routes::{contact, health_check},
};

pub fn run(
    listener: TcpListener,
    dispatcher: web::Data<MailDispatcher>,
    rate_limit: RateLimitConfig,
) -> std::io::Result<Server> {
    let interval = Duration::from_secs(rate_limit.interval_seconds);
    let max_requests = rate_limit.max_requests;
    // 所有 worker 共享同一份限流计数
    let backend = InMemoryBackend::builder().build();

    let server = HttpServer::new(move || {
        // 按对端地址计数，`X-Forwarded-For` 由客户端控制，不可信
        let input = SimpleInputFunctionBuilder::new(interval, max_requests)
            .peer_ip_key()
            .build();
        let limiter = RateLimiter::builder(backend.clone(), input).add_headers().build();

        App::new()
            .wrap(TracingLogger::default())
            .app_data(dispatcher.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/contact")
                    .wrap(limiter)
                    .route(web::post().to(contact)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

use annotation_webhook::{
    config::{Config, PolicySettings},
    AnnotationWebhook,
};
use axum::Router;
use std::net::SocketAddr;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        tls_config: None,
        policy: PolicySettings::default(),
        max_body_size: 3 * 1024 * 1024,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app(config: Config) -> Router {
    let webhook = AnnotationWebhook::new_from_config(config).await.unwrap();

    webhook.router()
}

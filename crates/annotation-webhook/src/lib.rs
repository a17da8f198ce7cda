pub mod admission;
pub mod api;
pub mod certs;
pub mod cli;
pub mod config;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::{self, TraceLayer};

use crate::{
    admission::{
        policy::{AdmissionPolicy, NamespaceAnnotator, PolicyChain},
        AdmissionPipeline,
    },
    api::{
        handlers::{mutate_handler, readiness_handler},
        state::ApiServerState,
    },
    certs::create_tls_config,
    config::{Config, PolicySettings},
};

pub struct AnnotationWebhook {
    router: Router,
    addr: SocketAddr,
    tls_config: Option<RustlsConfig>,
}

impl AnnotationWebhook {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let pipeline = build_pipeline(&config.policy);
        info!(
            namespace = config.policy.namespace.as_str(),
            annotation_key = config.policy.annotation_key.as_str(),
            patch_strategy = %pipeline.patch_strategy(),
            "admission pipeline ready"
        );

        let state = Arc::new(ApiServerState {
            pipeline,
            max_body_size: config.max_body_size,
        });

        let tls_config = match &config.tls_config {
            Some(tls_config) => Some(create_tls_config(tls_config).await?),
            None => None,
        };

        let router = Router::new()
            .route("/mutate", post(mutate_handler))
            .route("/readiness", get(readiness_handler))
            .with_state(state)
            .layer(
                TraceLayer::new_for_http()
                    .on_request(trace::DefaultOnRequest::new().level(::tracing::Level::DEBUG))
                    .on_response(trace::DefaultOnResponse::new().level(::tracing::Level::DEBUG)),
            );

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        match self.tls_config {
            Some(tls_config) => {
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, tls_config)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}

fn build_pipeline(settings: &PolicySettings) -> AdmissionPipeline {
    let annotator: Box<dyn AdmissionPolicy> = Box::new(NamespaceAnnotator::new(
        settings.namespace.as_str(),
        settings.annotation_key.as_str(),
        settings.annotation_value.as_str(),
    ));
    let chain = PolicyChain::new(vec![annotator]);
    info!(policies = ?chain.names(), "policy chain built");

    AdmissionPipeline::new(Box::new(chain), settings.patch_strategy)
}

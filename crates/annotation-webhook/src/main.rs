use annotation_webhook::{cli, config::Config, tracing::setup_tracing, AnnotationWebhook};
use anyhow::Result;
use std::process;
use tokio::runtime::Runtime;
use tracing::error;

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => fatal_error(format!("error initializing tokio runtime: {e}")),
    };

    runtime.block_on(async {
        let webhook = match AnnotationWebhook::new_from_config(config).await {
            Ok(webhook) => webhook,
            Err(e) => fatal_error(format!("error initializing the webhook: {e:?}")),
        };

        if let Err(e) = webhook.run().await {
            fatal_error(format!("webhook server stopped: {e:?}"));
        }
    });

    Ok(())
}

// the tracing subscriber is always installed by the time this is called
fn fatal_error(msg: String) -> ! {
    error!("{}", msg);
    process::exit(1);
}

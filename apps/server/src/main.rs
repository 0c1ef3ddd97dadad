use anyhow::Context;
use crumb_server::{Server, load_config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1);
    let cfg = load_config(path.as_deref()).context("Critical: Configuration is malformed")?;

    telemetry::init(&cfg.log)?;

    Server::builder().config(cfg).build()?.run().await
}

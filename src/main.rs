use rawhttp::config::Config;
use rawhttp::handlers::DemoHandler;
use rawhttp::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log_level()?)
        .init();

    let handler = DemoHandler::new(&cfg.upstream)?.with_video_path(&cfg.video_path);
    let server = server::serve_with(cfg.listen_addr.as_str(), handler, cfg.server_options()).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    server.close();
    server.wait().await;
    tracing::info!("Server gracefully stopped");

    Ok(())
}

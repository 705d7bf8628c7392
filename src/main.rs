use anyhow::Result;
use readmark::{api, app_state::AppState, config::Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    readmark::init_tracing();

    let config = Config::from_env()?;
    let app = api::router(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

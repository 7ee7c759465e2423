use userstore_axum::{StoreConfig, UserService, open_repository, userstore_router};

mod server;

use crate::server::{init_tracing, listen_addr, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = StoreConfig::from_env()?;
    let addr = listen_addr()?;

    let repository = open_repository(&config).await?;
    tracing::info!(backend = config.backend_name(), "User repository ready");

    let app = userstore_router(UserService::new(repository));
    serve(addr, app).await?;
    Ok(())
}

use listingd::{config, proto, router, services};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use listing_db::{Db, DbConfig};
use tokio::{io::AsyncWriteExt, net::TcpListener, net::TcpStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let server_cfg = config::ServerConfig::from_env();
    let search_cfg = config::SearchConfig::from_env();
    let db_cfg = DbConfig::from_env();
    let database_url = match db_cfg.database_url {
        Some(_) => "<set>",
        None => "<missing>",
    };
    info!(
        target: "listingd",
        database_url,
        index_credentials = search_cfg.index_credentials().is_some(),
        index_name = %search_cfg.index_name,
        "configuration loaded"
    );

    let db = Arc::new(Db::new(db_cfg));
    db.init().await.context("database init failed")?;

    let svc = services::Services::from_config(search_cfg, db)?;
    services::init(svc)?;

    let listener = TcpListener::bind(&server_cfg.addr)
        .await
        .with_context(|| format!("binding {}", server_cfg.addr))?;
    info!(target: "listingd", addr = %server_cfg.addr, "listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(err) = handle_conn(stream, peer).await {
                warn!(target: "listingd", %peer, error = %err, "connection error");
            }
        });
    }
}

async fn handle_conn(mut stream: TcpStream, peer: SocketAddr) -> Result<()> {
    let req = match proto::http_like::read_request(&mut stream).await {
        Ok(r) => r,
        Err(code) => {
            stream
                .write_all(&proto::http_like::make_empty_response(code))
                .await?;
            return Ok(());
        }
    };
    let route = req.route().to_string();

    let response = router::handle(req).await?;
    info!(target: "listingd", %peer, %route, status = response.code.as_u16(), "request");
    stream.write_all(&response.into_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

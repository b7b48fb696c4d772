//! Deletes every friend request, whatever its status. Friendships are kept.

use tandem::{db, store::RequestStore, Config};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let db_pool = db::connect(&config.database_url, 1).await?;

    let mut conn = db_pool.acquire().await?;
    let purged = conn.delete_all_requests().await?;
    info!("purged {purged} friend requests");

    let left = conn.count_requests().await?;
    info!("{left} friend requests left");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tandem::start_server().await
}

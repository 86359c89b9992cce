#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rejs::server::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    career_chat::run().await
}

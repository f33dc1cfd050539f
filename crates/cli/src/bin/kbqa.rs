use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    kbqa_cli::main_entry().await
}

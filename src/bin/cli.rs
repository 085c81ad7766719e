use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    feedstore::cli::run().await
}

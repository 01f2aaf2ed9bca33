use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    studylog_autofill::cli::app::run().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = langexam_rust::run().await {
        eprintln!("langexam-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

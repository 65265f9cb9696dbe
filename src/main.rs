use passerelle::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("❌ Erreur : {e:#}");
        std::process::exit(1);
    }
}

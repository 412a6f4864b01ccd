use colored::Colorize;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    opus_cli::logging::init();

    if let Err(e) = opus_cli::run(std::env::args().collect()).await {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

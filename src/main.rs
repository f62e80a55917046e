use resi_tracker::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = logging::init_logging() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("resi-tracker error: {:#}", err);
        std::process::exit(1);
    }
}

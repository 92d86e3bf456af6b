//
// main.rs
// Med2Image-rs
//
// Entry point: installs logging, runs the CLI and maps failures onto stable exit codes.
//
// Thales Matheus Mendonça Santos - November 2025

use clap::Parser;
use med2image::cli::{self, Cli};
use med2image::error::ConvertError;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {e}");
    }

    if let Err(err) = cli::run(cli) {
        let code = match err.downcast_ref::<ConvertError>() {
            Some(convert_error) => {
                error!("{}", convert_error.report());
                convert_error.exit_code()
            }
            None => {
                error!("{err:#}");
                1
            }
        };
        std::process::exit(code);
    }
}

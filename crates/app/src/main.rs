//! Pawcart CLI

use std::process;

use clap::Parser;

mod cli;

#[tokio::main(flavor = "current_thread")]
pub async fn main() {
    _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = cli.run().await {
        #[expect(
            clippy::print_stderr,
            reason = "errors go to stderr after the notifications are printed"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }
}

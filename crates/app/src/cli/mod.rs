use std::sync::Arc;

use clap::{Parser, Subcommand};
use pawcart_app::{
    config::{EngineConfig, logging::LoggingConfig},
    context::CartEngine,
    notifications::{FanOutNotifier, RecordingNotifier, TracingNotifier},
    observability,
};

mod add;
mod clear;
mod login;
mod output;
mod remove;
mod show;
mod update;

#[derive(Debug, Parser)]
#[command(name = "pawcart", about = "Pawcart cart CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    engine: EngineConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the current cart
    Show,

    /// Add a product to the cart
    Add(add::AddArgs),

    /// Change a line item's quantity or size
    Update(update::UpdateArgs),

    /// Remove a line item
    Remove(remove::RemoveArgs),

    /// Empty the cart
    Clear,

    /// Sign in and merge the guest cart into the customer's cart
    Login(login::LoginArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let notifier = Arc::new(RecordingNotifier::new());
        let fan_out = FanOutNotifier::new(vec![notifier.clone(), Arc::new(TracingNotifier)]);
        let engine = CartEngine::from_config(&self.engine, Arc::new(fan_out))
            .map_err(|error| format!("failed to start cart engine: {error}"))?;

        let result = match self.command {
            Commands::Show => show::run(&engine).await,
            Commands::Add(args) => add::run(&engine, args).await,
            Commands::Update(args) => update::run(&engine, args).await,
            Commands::Remove(args) => remove::run(&engine, args).await,
            Commands::Clear => clear::run(&engine).await,
            Commands::Login(args) => login::run(&engine, args).await,
        };

        output::print_notifications(&notifier.drain());

        result
    }
}

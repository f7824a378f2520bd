use clap::Args;
use pawcart::ids::CustomerId;
use pawcart_app::{context::CartEngine, sync::SyncReport};

use super::output::print_cart;

#[derive(Debug, Args)]
pub(crate) struct LoginArgs {
    /// Customer signing in
    #[arg(long)]
    customer: String,

    /// Bearer token issued to the customer
    #[arg(long)]
    token: String,
}

pub(crate) async fn run(engine: &CartEngine, args: LoginArgs) -> Result<(), String> {
    let pending = engine.guest_entry_count();

    match engine
        .login(CustomerId::new(args.customer), args.token)
        .await
    {
        SyncReport::Skipped => println!("no guest cart to merge"),
        SyncReport::Completed(summary) => println!("merged {pending} guest entries: {summary:?}"),
        SyncReport::Failed(error) => {
            return Err(format!("failed to merge guest cart: {error}"));
        }
    }

    let cart = engine
        .cart()
        .await
        .map_err(|error| format!("failed to load cart: {error}"))?;

    print_cart(&cart);

    Ok(())
}

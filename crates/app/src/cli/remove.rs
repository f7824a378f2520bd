use clap::Args;
use pawcart::items::LineItemId;
use pawcart_app::context::CartEngine;

use super::output::print_cart;

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    /// Line item to remove
    #[arg(long)]
    item: String,
}

pub(crate) async fn run(engine: &CartEngine, args: RemoveArgs) -> Result<(), String> {
    let cart = engine
        .remove_item(&LineItemId::new(args.item))
        .await
        .map_err(|error| format!("failed to remove item: {error}"))?;

    print_cart(&cart);

    Ok(())
}

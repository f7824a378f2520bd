use clap::Args;
use pawcart::{items::LineItemId, products::Size};
use pawcart_app::context::CartEngine;

use super::output::print_cart;

#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    /// Line item to change
    #[arg(long)]
    item: String,

    /// New quantity
    #[arg(long)]
    quantity: u32,

    /// New size; unchanged when omitted
    #[arg(long)]
    size: Option<String>,
}

pub(crate) async fn run(engine: &CartEngine, args: UpdateArgs) -> Result<(), String> {
    let cart = engine
        .update_item(
            &LineItemId::new(args.item),
            args.quantity,
            args.size.map(Size::new),
        )
        .await
        .map_err(|error| format!("failed to update item: {error}"))?;

    print_cart(&cart);

    Ok(())
}

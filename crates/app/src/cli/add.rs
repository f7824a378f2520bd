use clap::Args;
use pawcart::products::{ONE_SIZE, ProductId, Size};
use pawcart_app::context::CartEngine;

use super::output::print_cart;

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Product to add
    #[arg(long)]
    product: String,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Size to add
    #[arg(long, default_value = ONE_SIZE)]
    size: String,
}

pub(crate) async fn run(engine: &CartEngine, args: AddArgs) -> Result<(), String> {
    let cart = engine
        .add_item(ProductId::new(args.product), args.quantity, Size::new(args.size))
        .await
        .map_err(|error| format!("failed to add item: {error}"))?;

    print_cart(&cart);

    Ok(())
}

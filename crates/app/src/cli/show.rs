use pawcart_app::context::CartEngine;

use super::output::print_cart;

pub(crate) async fn run(engine: &CartEngine) -> Result<(), String> {
    let cart = engine
        .cart()
        .await
        .map_err(|error| format!("failed to load cart: {error}"))?;

    print_cart(&cart);

    Ok(())
}

use pawcart::{
    carts::{Cart, CartOwner},
    pricing::{format_amount, savings},
};
use pawcart_app::notifications::{Level, Notification};
use rust_decimal::Decimal;

pub(crate) fn print_cart(cart: &Cart) {
    match &cart.owner {
        CartOwner::Guest => println!("cart: guest"),
        CartOwner::Customer(customer) => println!("cart: customer {customer}"),
    }

    if cart.is_empty() {
        println!("(empty)");
        return;
    }

    for item in &cart.items {
        println!(
            "{}  {} ({}) x{} @ {} = {}",
            item.id,
            item.product.title,
            item.size,
            item.quantity,
            format_amount(item.price_at_time),
            format_amount(item.line_total())
        );
    }

    println!("subtotal: {}", format_amount(cart.subtotal));
    println!("tax: {}", format_amount(cart.tax));

    if cart.discount > Decimal::ZERO {
        println!("discount: -{}", format_amount(cart.discount));
    }

    println!("total: {}", format_amount(cart.total));

    let saved = savings(&cart.items);

    if saved > Decimal::ZERO {
        println!("you save: {}", format_amount(saved));
    }
}

pub(crate) fn print_notifications(notifications: &[Notification]) {
    for notification in notifications {
        let label = match notification.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };

        if notification.retryable {
            println!("[{label}] {} (retry possible)", notification.message);
        } else {
            println!("[{label}] {}", notification.message);
        }
    }
}

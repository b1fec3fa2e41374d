//! Checkout command.

use clap::Args;
use verdant_storefront::Storefront;
use verdant_storefront::checkout::{BillingDetails, TerminalAction};

/// Billing fields for `verdant checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub address: String,

    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub state: String,

    #[arg(long, default_value = "")]
    pub zip: String,

    #[arg(long, default_value = "")]
    pub country: String,

    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    #[arg(long, default_value = "")]
    pub company: String,
}

impl From<CheckoutArgs> for BillingDetails {
    fn from(args: CheckoutArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            phone: args.phone,
            company: args.company,
            address: args.address,
            city: args.city,
            state: args.state,
            zip: args.zip,
            country: args.country,
        }
    }
}

/// Place an order for the cart contents.
///
/// # Errors
///
/// Returns an error if validation fails or the order cannot be completed.
/// When the order was created but payment setup failed, the retained order
/// id is reported before returning.
pub async fn run(
    storefront: &Storefront,
    args: CheckoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let billing = BillingDetails::from(args);

    billing.validate()?;

    let summary = storefront.cart().summary();
    println!("Ship to: {}", billing.shipping_address());
    println!("Total:   {}", summary.grand_total.display());

    match storefront.place_order(&billing).await {
        Ok(outcome) => {
            println!("Order {} placed.", outcome.order_id);
            match outcome.action {
                TerminalAction::Redirect(url) => println!("Complete payment at: {url}"),
                TerminalAction::NavigateHome => println!("No payment page was returned."),
            }
            Ok(())
        }
        Err(e) => {
            if let Some(order_id) = storefront.orders().last_order_id() {
                println!("Order {order_id} was created, but payment could not be started.");
            }
            Err(e.user_message().into())
        }
    }
}

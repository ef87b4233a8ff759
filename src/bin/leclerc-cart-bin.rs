use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use log::log_enabled;
use rusqlite::Connection;

use leclerc_cart_rs::cart::{CartMode, CartProvider};
use leclerc_cart_rs::checkout::{available_slots, Availability, CheckoutState, CheckoutSummary};
use leclerc_cart_rs::data_backend::{
    crave_api::CraveClient,
    format_price,
    menu_catalog::{find_menu_item, menu_for, modifier_groups_for},
    CartApi,
};
use leclerc_cart_rs::data_types::{Address, CartItemOptions, ModifierGroup, OrderType};
use leclerc_cart_rs::fulfillment::{delivery_options, AddressState};
use leclerc_cart_rs::modifier_selection::ModifierSelection;
use leclerc_cart_rs::payment::create_payment_intent;
use leclerc_cart_rs::shared_main::{logger_init, AppConfig};

/// Shopping cart for the Leclerc sushi and bakery storefronts.
/// {n}Works offline; syncs with the order backend when it is reachable.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(flatten)]
    config: AppConfig,
    /// Enable verbose logging (request timings){n}[SETS env: RUST_LOG=debug]
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: CartCommand,
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    /// List the menu of the configured brand
    Menu,
    /// Add a product to the cart
    Add {
        product_id: String,
        #[arg(long)]
        gift_box: bool,
        #[arg(long)]
        warming: bool,
        #[arg(long)]
        packaging: bool,
        /// Modifier choice, repeat to add more{n}Example: --option rice:brown-rice
        #[arg(short, long = "option", value_name = "GROUP:OPTION")]
        options: Vec<String>,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a cart line
    Remove { cart_id: String },
    /// Change the quantity of a cart line, 0 removes it
    Qty { cart_id: String, quantity: u32 },
    /// Print the cart with totals
    Show {
        #[arg(long, value_enum, default_value_t = OrderType::Pickup)]
        order_type: OrderType,
    },
    /// Print the bookable times
    Slots {
        #[arg(long, value_enum, default_value_t = OrderType::Delivery)]
        order_type: OrderType,
    },
    /// Apply a promo code, or remove the current one
    Promo {
        #[arg(required_unless_present = "remove")]
        code: Option<String>,
        #[arg(long, conflicts_with = "code")]
        remove: bool,
    },
    /// Print the checkout summary and request a payment intent
    Pay {
        #[arg(long, value_enum, default_value_t = OrderType::Pickup)]
        order_type: OrderType,
        #[arg(long, required_if_eq("order_type", "delivery"))]
        street: Option<String>,
        #[arg(long)]
        apartment: Option<String>,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    logger_init(module_path!());

    if !log_enabled!(log::Level::Debug) {
        log::info!("Set env variable 'RUST_LOG=debug' for request timings");
    }

    let config = args.config;
    config.validate()?;

    if let CartCommand::Menu = args.command {
        for item in menu_for(config.brand) {
            println!(
                "{:<18} {:<28} {:>8}",
                item.id,
                item.name,
                format_price(item.price)
            );
        }
        return Ok(());
    }

    let api: Arc<dyn CartApi> = Arc::new(CraveClient::new(
        &config.api_base_url,
        &config.location_id,
        &config.marketplace_id,
        config.api_key.clone(),
    )?);
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("could not open cart database {}", config.db_path))?;
    let cart = CartProvider::new(api.clone(), &config.location_id, conn)?;

    if let CartMode::Local = cart.init().await {
        log::warn!("Backend unreachable, working on the offline cart");
    }

    match args.command {
        CartCommand::Menu => {}
        CartCommand::Add {
            product_id,
            gift_box,
            warming,
            packaging,
            options,
            quantity,
        } => {
            let item = find_menu_item(config.brand, &product_id)
                .ok_or_else(|| anyhow!("{} is not on the menu", product_id))?;
            let cart_options = CartItemOptions {
                warming,
                packaging,
                gift_box,
            };

            let groups = match api.get_product(&product_id).await {
                Ok(detail) if !detail.modifier_groups.is_empty() => detail.modifier_groups,
                Ok(_) => modifier_groups_for(config.brand, &product_id),
                Err(e) => {
                    log::warn!("Product details unavailable: {}", e);
                    modifier_groups_for(config.brand, &product_id)
                }
            };

            if groups.is_empty() && options.is_empty() && quantity == 1 {
                cart.add_to_cart(&item, cart_options).await?;
            } else {
                let mut selection = parse_selection(&groups, &options)?;
                cart.add_with_modifiers(&item, cart_options, &mut selection, &groups, quantity)
                    .await?;
            }
            println!("Added {}", item.name);
            print_cart(&cart, OrderType::Pickup, &config).await;
        }
        CartCommand::Remove { cart_id } => {
            cart.remove_item(&cart_id).await?;
            print_cart(&cart, OrderType::Pickup, &config).await;
        }
        CartCommand::Qty { cart_id, quantity } => {
            cart.update_quantity(&cart_id, quantity).await?;
            print_cart(&cart, OrderType::Pickup, &config).await;
        }
        CartCommand::Show { order_type } => {
            if let Err(e) = cart.refresh().await {
                log::warn!("Showing last known cart: {}", e);
            }
            print_cart(&cart, order_type, &config).await;
        }
        CartCommand::Slots { order_type } => {
            let cart_id = cart.cart_id().await;
            let now = chrono::Local::now();
            match available_slots(api.as_ref(), cart_id.as_deref(), order_type, &now).await {
                availability if availability.is_empty() => println!("No slots available"),
                Availability::Server(days) => {
                    for day in days {
                        for interval in day.intervals {
                            println!("{}, {}", day.label, interval.label);
                        }
                    }
                }
                Availability::Generated(slots) => {
                    for slot in slots {
                        println!("{}", slot.label);
                    }
                }
            }
        }
        CartCommand::Promo { code, remove } => {
            let res = match code {
                Some(code) if !remove => cart.apply_promo_code(&code).await,
                _ => cart.remove_promo_code().await,
            };
            if let Err(e) = res {
                bail!(cart.last_error().await.unwrap_or_else(|| e.to_string()));
            }
            print_cart(&cart, OrderType::Pickup, &config).await;
        }
        CartCommand::Pay {
            order_type,
            street,
            apartment,
        } => {
            if cart.item_count().await == 0 {
                bail!("The cart is empty");
            }

            let mut address = AddressState::new(config.brand);
            let option = delivery_options(config.brand, cart.subtotal().await)
                .into_iter()
                .find(|o| o.order_type == order_type)
                .ok_or_else(|| anyhow!("{:?} is not offered", order_type))?;
            address.set_delivery_data(
                option,
                street.map(|street| Address { street, apartment }),
            );

            let state = CheckoutState::new(order_type);
            let summary = CheckoutSummary::compute(&cart, &state, &address, config.brand).await;
            println!("{}", summary.display_address);
            println!("Estimated: {}", summary.estimated_time);
            println!("Total:     {}", format_price(summary.totals.total));

            let cart_id = cart.cart_id().await;
            let intent = create_payment_intent(
                api.as_ref(),
                cart_id.as_deref(),
                summary.totals.total,
                config.allow_demo_payments(),
            )
            .await?;
            println!("Payment intent ready: {}", intent.client_secret);
        }
        CartCommand::Clear => {
            cart.clear_cart().await?;
            println!("Cart cleared");
        }
    }

    Ok(())
}

/// Turns `GROUP:OPTION` arguments into a selection; naming an option twice
/// raises its quantity.
fn parse_selection(
    groups: &[ModifierGroup],
    options: &[String],
) -> anyhow::Result<ModifierSelection> {
    let mut selection = ModifierSelection::new();

    for arg in options {
        let (group_id, option_id) = arg
            .split_once(':')
            .ok_or_else(|| anyhow!("'{}' is not GROUP:OPTION", arg))?;
        let group = groups
            .iter()
            .find(|g| g.id == group_id)
            .ok_or_else(|| anyhow!("unknown modifier group {}", group_id))?;
        if group.option(option_id).is_none() {
            bail!("{} has no option {}", group.name, option_id);
        }

        let current = selection.quantity_of(group_id, option_id);
        if current == 0 {
            selection.toggle(group, option_id);
        } else {
            selection.change_option_quantity_clamped(group, option_id, current + 1);
        }
    }

    Ok(selection)
}

async fn print_cart(cart: &CartProvider, order_type: OrderType, config: &AppConfig) {
    let items = cart.items().await;
    if items.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in &items {
        println!(
            "{:<40} {:>3} x {:<28} {:>8}",
            line.cart_id,
            line.quantity,
            line.item.name,
            format_price(line.line_total())
        );
    }

    let totals = cart.totals(order_type, config.brand).await;
    println!("Subtotal: {:>10}", format_price(totals.subtotal));
    println!("Tax:      {:>10}", format_price(totals.tax));
    if totals.delivery_fee > 0.0 {
        println!("Delivery: {:>10}", format_price(totals.delivery_fee));
    }
    if let Some(code) = cart.discount_code().await {
        println!("{:<9} {:>10}", code, format!("-{}", format_price(totals.discount)));
    }
    println!("Total:    {:>10}", format_price(totals.total));
}

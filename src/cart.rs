use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{
    constants::{
        ADD_TO_CART_ERROR, FREE_DELIVERY_THRESHOLD, GIFT_BOX_INSTRUCTIONS, GIFT_BOX_PRICE,
        TAX_RATE_PER_100K, UPDATE_CART_ERROR,
    },
    data_backend::CartApi,
    data_types::{
        api_data_types::{AddCartItemRequest, ApiSelection, RemoteCart, RemoteCartItem},
        ApiError, Brand, CartError, CartItem, CartItemOptions, CartTotals, ConfigError, MenuItem,
        ModifierGroup, OrderType,
    },
    db_operations::{
        check_or_create_db_tables, clear_cart_storage, load_cart_id, load_cart_items,
        save_cart_id, save_cart_items,
    },
    modifier_selection::ModifierSelection,
};

const ITEM_UNAVAILABLE_ACTION: &str = "REMOVE_ITEM";

/// Where the cart lines live. Decided once by `init` and whenever a new
/// remote cart is provisioned; never switched back on a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMode {
    Local,
    Remote { cart_id: String },
}

/// Totals reported by the backend for the lines it last returned.
#[derive(Debug, Clone, PartialEq)]
struct RemoteTotals {
    subtotal: f64,
    tax: f64,
    total: f64,
    discount: f64,
    discount_code: Option<String>,
}

struct CartState {
    conn: Connection,
    items: Vec<CartItem>,
    mode: CartMode,
    // None whenever `items` was changed locally after the last fetch
    remote_totals: Option<RemoteTotals>,
    is_open: bool,
    last_error: Option<String>,
}

/// The cart shared by the whole application.
///
/// All mutations go through one async mutex, so at most one request against
/// the remote cart is in flight per provider.
pub struct CartProvider {
    api: Arc<dyn CartApi>,
    state: Mutex<CartState>,
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn subtotal_of(items: &[CartItem]) -> f64 {
    from_cents(
        items
            .iter()
            .map(|i| to_cents(i.item.price) * i64::from(i.quantity))
            .sum(),
    )
}

/// Tax at the fixed rate, rounded half up to the cent.
pub fn tax_of(subtotal: f64) -> f64 {
    from_cents((to_cents(subtotal) * TAX_RATE_PER_100K + 50_000) / 100_000)
}

pub fn delivery_fee(order_type: OrderType, subtotal: f64, brand: Brand) -> f64 {
    if order_type != OrderType::Delivery || subtotal >= FREE_DELIVERY_THRESHOLD {
        0.0
    } else {
        brand.delivery_fee()
    }
}

fn validate_item(item: &MenuItem) -> Result<(), CartError> {
    if item.id.trim().is_empty() {
        return Err(CartError::InvalidItem("missing id"));
    }
    if item.name.trim().is_empty() {
        return Err(CartError::InvalidItem("missing name"));
    }
    if !item.price.is_finite() || item.price < 0.0 {
        return Err(CartError::InvalidItem("price must be a non-negative number"));
    }

    Ok(())
}

fn local_cart_id(product_id: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    format!(
        "{}-{}-{}",
        product_id,
        chrono::Utc::now().timestamp_millis(),
        suffix.to_lowercase()
    )
}

fn special_instructions(options: &CartItemOptions) -> String {
    if options.gift_box {
        GIFT_BOX_INSTRUCTIONS.to_string()
    } else {
        String::new()
    }
}

/// Maps a backend line into a cart line, filling what the backend omits from
/// the menu data we already know about.
fn remote_to_cart_item(
    line: &RemoteCartItem,
    known: &[MenuItem],
    options: CartItemOptions,
) -> CartItem {
    let fallback = known.iter().find(|m| m.id == line.product_id);

    let item = MenuItem {
        id: line.product_id.clone(),
        name: line
            .name
            .clone()
            .or_else(|| fallback.map(|m| m.name.clone()))
            .unwrap_or_else(|| line.product_id.clone()),
        description: line
            .description
            .clone()
            .or_else(|| fallback.map(|m| m.description.clone()))
            .unwrap_or_default(),
        price: line.price,
        image: line
            .image_url
            .clone()
            .or_else(|| fallback.and_then(|m| m.image.clone())),
        category: fallback.map(|m| m.category).unwrap_or_default(),
        calories: fallback.map_or(0, |m| m.calories),
        is_new: fallback.is_some_and(|m| m.is_new),
        is_popular: fallback.is_some_and(|m| m.is_popular),
        is_gluten_free: fallback.is_some_and(|m| m.is_gluten_free),
    };

    CartItem {
        item,
        cart_id: line.id.clone(),
        quantity: line.quantity,
        options: CartItemOptions {
            gift_box: line.special_instructions == GIFT_BOX_INSTRUCTIONS,
            ..options
        },
    }
}

impl CartState {
    fn persist(&self) -> Result<(), CartError> {
        save_cart_items(&self.conn, &self.items)
    }

    /// Replaces the lines with the backend's. `added` is the line that was just
    /// posted, if any; new lines for its product inherit its local options.
    fn apply_remote(&mut self, cart: RemoteCart, added: Option<(&MenuItem, CartItemOptions)>) {
        let mut known: Vec<MenuItem> = self.items.iter().map(|i| i.item.clone()).collect();
        if let Some((item, _)) = added {
            known.push(item.clone());
        }

        let items = cart
            .items
            .iter()
            .map(|line| {
                let previous = self.items.iter().find(|i| i.cart_id == line.id);
                let options = match (previous, added) {
                    (Some(prev), _) => prev.options,
                    (None, Some((item, opts))) if item.id == line.product_id => opts,
                    _ => CartItemOptions::default(),
                };
                remote_to_cart_item(line, &known, options)
            })
            .collect();

        self.items = items;
        self.remote_totals = Some(RemoteTotals {
            subtotal: cart.sub_total.unwrap_or_else(|| subtotal_of(&self.items)),
            tax: cart.tax_total.unwrap_or_else(|| tax_of(subtotal_of(&self.items))),
            discount: cart.discount_total.unwrap_or(0.0),
            total: cart.order_total.unwrap_or_else(|| {
                let subtotal = subtotal_of(&self.items);
                subtotal + tax_of(subtotal)
            }),
            discount_code: cart.discount_code,
        });
    }

    fn fail(&mut self, message: &str, e: ApiError) -> CartError {
        log::error!("{}: {}", message, e);
        self.last_error = Some(match &e {
            ApiError::Validation { message, .. } => message.clone(),
            _ => message.to_string(),
        });
        e.into()
    }

    fn totals(&self, order_type: OrderType, brand: Brand) -> CartTotals {
        let item_count = self.items.iter().map(|i| u64::from(i.quantity)).sum();
        let (subtotal, tax, discount) = match &self.remote_totals {
            Some(remote) => (remote.subtotal, remote.tax, remote.discount),
            None => {
                let subtotal = subtotal_of(&self.items);
                (subtotal, tax_of(subtotal), 0.0)
            }
        };
        let delivery_fee = delivery_fee(order_type, subtotal, brand);

        CartTotals {
            item_count,
            subtotal,
            tax,
            delivery_fee,
            discount,
            total: from_cents(
                to_cents(subtotal) + to_cents(tax) + to_cents(delivery_fee) - to_cents(discount),
            ),
        }
    }
}

impl CartProvider {
    /// Opens the provider on `conn` and loads any persisted cart. Stays in
    /// local mode until [`CartProvider::init`] reaches the backend.
    pub fn new(
        api: Arc<dyn CartApi>,
        location_id: &str,
        conn: Connection,
    ) -> Result<Self, CartError> {
        if location_id.trim().is_empty() {
            return Err(ConfigError::MissingLocationId.into());
        }

        check_or_create_db_tables(&conn)?;
        let items = load_cart_items(&conn)?;
        log::debug!("Hydrated {} cart lines", items.len());

        Ok(CartProvider {
            api,
            state: Mutex::new(CartState {
                conn,
                items,
                mode: CartMode::Local,
                remote_totals: None,
                is_open: false,
                last_error: None,
            }),
        })
    }

    /// Creates or resumes the remote cart. Failures leave the provider in
    /// local mode and are only logged.
    ///
    /// Lines stored without a cart id were built offline and exist nowhere
    /// else, so such a cart stays local.
    pub async fn init(&self) -> CartMode {
        let mut state = self.state.lock().await;

        let stored_id = match load_cart_id(&state.conn) {
            Ok(id) => id,
            Err(e) => {
                log::error!("Could not read stored cart id: {}", e);
                None
            }
        };

        if stored_id.is_none() && !state.items.is_empty() {
            log::info!(
                "Keeping {} offline cart lines, staying offline",
                state.items.len()
            );
            return state.mode.clone();
        }

        let cart_id = match self.provision(&mut state, stored_id.as_deref()).await {
            Ok(cart_id) => cart_id,
            Err(e) => {
                log::error!("Cart initialization failed, continuing offline: {}", e);
                return state.mode.clone();
            }
        };

        if stored_id.as_deref() != Some(cart_id.as_str()) && !state.items.is_empty() {
            log::warn!(
                "Backend issued a new cart, dropping {} stored lines",
                state.items.len()
            );
            state.items.clear();
            state.remote_totals = None;
            if let Err(e) = state.persist() {
                log::error!("Could not persist cart: {}", e);
            }
        }

        match self.api.get_cart(&cart_id).await {
            Ok(cart) => {
                state.apply_remote(cart, None);
                if let Err(e) = state.persist() {
                    log::error!("Could not persist cart: {}", e);
                }
            }
            Err(e) => log::error!("Could not load cart {}, keeping stored lines: {}", cart_id, e),
        }

        state.mode.clone()
    }

    async fn provision(
        &self,
        state: &mut CartState,
        current_cart_id: Option<&str>,
    ) -> Result<String, CartError> {
        let cart_id = self.api.create_cart(current_cart_id).await?;
        save_cart_id(&state.conn, &cart_id)?;
        log::info!("Using cart {}", cart_id);
        state.mode = CartMode::Remote {
            cart_id: cart_id.clone(),
        };

        Ok(cart_id)
    }

    /// Adds one unit of `item` as a new line.
    pub async fn add_to_cart(
        &self,
        item: &MenuItem,
        options: CartItemOptions,
    ) -> Result<(), CartError> {
        validate_item(item)?;

        let surcharge = if options.gift_box { GIFT_BOX_PRICE } else { 0.0 };
        self.add_line(item, options, Vec::new(), 1, surcharge).await
    }

    /// Submits the product dialog. A selection the backend rejects marks the
    /// offending group on `selection`; a successful submission resets it.
    pub async fn add_with_modifiers(
        &self,
        item: &MenuItem,
        options: CartItemOptions,
        selection: &mut ModifierSelection,
        groups: &[ModifierGroup],
        quantity: u32,
    ) -> Result<(), CartError> {
        validate_item(item)?;
        if quantity == 0 {
            return Err(CartError::InvalidItem("quantity must be at least 1"));
        }
        if let Some(group_id) = selection.validate_required(groups) {
            return Err(CartError::MissingSelection(group_id));
        }

        let surcharge =
            selection.price_delta(groups) + if options.gift_box { GIFT_BOX_PRICE } else { 0.0 };

        match self
            .add_line(item, options, selection.flatten(), quantity, surcharge)
            .await
        {
            Ok(()) => {
                selection.reset();
                Ok(())
            }
            Err(CartError::Remote(ApiError::Validation {
                group_id: Some(group_id),
                message,
            })) => {
                selection.mark_invalid(&group_id);
                Err(ApiError::Validation {
                    group_id: Some(group_id),
                    message,
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }

    async fn add_line(
        &self,
        item: &MenuItem,
        options: CartItemOptions,
        selections: Vec<ApiSelection>,
        quantity: u32,
        local_surcharge: f64,
    ) -> Result<(), CartError> {
        let mut state = self.state.lock().await;

        // an empty offline cart may still go online
        if state.mode == CartMode::Local && state.items.is_empty() {
            if let Err(e) = self.provision(&mut state, None).await {
                log::warn!("No remote cart available, adding offline: {}", e);
            }
        }

        match state.mode.clone() {
            CartMode::Remote { cart_id } => {
                let request = AddCartItemRequest {
                    product_id: item.id.clone(),
                    quantity,
                    special_instructions: special_instructions(&options),
                    item_unavailable_action: ITEM_UNAVAILABLE_ACTION.to_string(),
                    selections,
                };

                if let Err(e) = self.api.add_cart_item(&cart_id, &request).await {
                    return Err(state.fail(ADD_TO_CART_ERROR, e));
                }
                let cart = match self.api.get_cart(&cart_id).await {
                    Ok(cart) => cart,
                    Err(e) => return Err(state.fail(ADD_TO_CART_ERROR, e)),
                };
                state.apply_remote(cart, Some((item, options)));
                log::info!("Added {} to cart {}", item.id, cart_id);
            }
            CartMode::Local => {
                let mut line_item = item.clone();
                line_item.price = from_cents(to_cents(item.price + local_surcharge));

                state.items.push(CartItem {
                    item: line_item,
                    cart_id: local_cart_id(&item.id),
                    quantity,
                    options,
                });
                log::info!("Added {} to offline cart", item.id);
            }
        }

        state.last_error = None;
        state.persist()?;
        state.is_open = true;

        Ok(())
    }

    /// Drops a line. A remote cart is told first; if it refuses, nothing
    /// changes locally.
    pub async fn remove_item(&self, cart_id: &str) -> Result<(), CartError> {
        let mut state = self.state.lock().await;

        if let CartMode::Remote { cart_id: remote_id } = state.mode.clone() {
            if let Err(e) = self.api.remove_cart_item(&remote_id, cart_id).await {
                return Err(state.fail(UPDATE_CART_ERROR, e));
            }
        }

        state.items.retain(|i| i.cart_id != cart_id);
        state.remote_totals = None;
        state.last_error = None;
        state.persist()
    }

    pub async fn update_quantity(&self, cart_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_item(cart_id).await;
        }

        let mut state = self.state.lock().await;

        if let CartMode::Remote { cart_id: remote_id } = state.mode.clone() {
            if let Err(e) = self
                .api
                .update_cart_item(&remote_id, cart_id, quantity)
                .await
            {
                return Err(state.fail(UPDATE_CART_ERROR, e));
            }
        }

        for line in state.items.iter_mut().filter(|i| i.cart_id == cart_id) {
            line.quantity = quantity;
        }
        state.remote_totals = None;
        state.last_error = None;
        state.persist()
    }

    pub async fn clear_cart(&self) -> Result<(), CartError> {
        let mut state = self.state.lock().await;
        state.items.clear();
        state.remote_totals = None;
        state.mode = CartMode::Local;
        clear_cart_storage(&state.conn)?;
        log::info!("Cart cleared");

        Ok(())
    }

    /// Re-reads the remote cart. A no-op offline.
    pub async fn refresh(&self) -> Result<(), CartError> {
        let mut state = self.state.lock().await;
        let CartMode::Remote { cart_id } = state.mode.clone() else {
            return Ok(());
        };

        match self.api.get_cart(&cart_id).await {
            Ok(cart) => {
                state.apply_remote(cart, None);
                state.persist()
            }
            Err(e) => Err(state.fail("Could not refresh your cart.", e)),
        }
    }

    pub async fn apply_promo_code(&self, code: &str) -> Result<(), CartError> {
        let mut state = self.state.lock().await;
        let CartMode::Remote { cart_id } = state.mode.clone() else {
            return Err(CartError::PromoUnavailable);
        };

        if let Err(e) = self.api.apply_promo_code(&cart_id, code).await {
            return Err(state.fail("This promo code could not be applied.", e));
        }
        match self.api.get_cart(&cart_id).await {
            Ok(cart) => {
                state.apply_remote(cart, None);
                state.persist()
            }
            Err(e) => Err(state.fail("Could not refresh your cart.", e)),
        }
    }

    pub async fn remove_promo_code(&self) -> Result<(), CartError> {
        let mut state = self.state.lock().await;
        let CartMode::Remote { cart_id } = state.mode.clone() else {
            return Err(CartError::PromoUnavailable);
        };

        if let Err(e) = self.api.remove_promo_code(&cart_id).await {
            return Err(state.fail("The promo code could not be removed.", e));
        }
        match self.api.get_cart(&cart_id).await {
            Ok(cart) => {
                state.apply_remote(cart, None);
                state.persist()
            }
            Err(e) => Err(state.fail("Could not refresh your cart.", e)),
        }
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.state.lock().await.items.clone()
    }

    pub async fn mode(&self) -> CartMode {
        self.state.lock().await.mode.clone()
    }

    pub async fn cart_id(&self) -> Option<String> {
        match &self.state.lock().await.mode {
            CartMode::Remote { cart_id } => Some(cart_id.clone()),
            CartMode::Local => None,
        }
    }

    pub async fn item_count(&self) -> u64 {
        self.state
            .lock()
            .await
            .items
            .iter()
            .map(|i| u64::from(i.quantity))
            .sum()
    }

    pub async fn subtotal(&self) -> f64 {
        let state = self.state.lock().await;
        match &state.remote_totals {
            Some(remote) => remote.subtotal,
            None => subtotal_of(&state.items),
        }
    }

    pub async fn tax(&self) -> f64 {
        let state = self.state.lock().await;
        match &state.remote_totals {
            Some(remote) => remote.tax,
            None => tax_of(subtotal_of(&state.items)),
        }
    }

    /// Subtotal plus tax less any promo discount, without the delivery fee.
    pub async fn total(&self) -> f64 {
        let state = self.state.lock().await;
        match &state.remote_totals {
            Some(remote) => remote.total,
            None => {
                let subtotal = subtotal_of(&state.items);
                from_cents(to_cents(subtotal) + to_cents(tax_of(subtotal)))
            }
        }
    }

    pub async fn discount_code(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .remote_totals
            .as_ref()
            .and_then(|r| r.discount_code.clone())
    }

    /// Checkout totals including delivery fee and discount.
    pub async fn totals(&self, order_type: OrderType, brand: Brand) -> CartTotals {
        self.state.lock().await.totals(order_type, brand)
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.is_open
    }

    pub async fn open(&self) {
        self.state.lock().await.is_open = true;
    }

    pub async fn close(&self) {
        self.state.lock().await.is_open = false;
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex as StdMutex,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::data_backend::menu_catalog::{find_menu_item, modifier_groups_for};
    use crate::data_types::{
        api_data_types::{PaymentIntent, ProductDetail, TimeIntervalDay},
        Category,
    };

    /// In-memory backend. Prices come from the sushi menu, every selected
    /// modifier unit adds 0.50, tax is a flat 10 %, `SAVE5` takes 5.00 off.
    /// `new_cart_id` makes it ignore the id a client asks to resume.
    #[derive(Default)]
    pub(crate) struct MockApi {
        pub fail_create: bool,
        pub fail_add: bool,
        pub fail_get: bool,
        pub fail_edit: AtomicBool,
        pub new_cart_id: Option<String>,
        pub resume_ids: StdMutex<Vec<Option<String>>>,
        pub reject_group: Option<String>,
        pub lines: StdMutex<Vec<RemoteCartItem>>,
        pub promo: StdMutex<Option<String>>,
        pub create_calls: AtomicUsize,
        pub add_calls: AtomicUsize,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    impl MockApi {
        fn snapshot(&self) -> RemoteCart {
            let items = self.lines.lock().unwrap().clone();
            let sub_total: f64 = items.iter().map(|l| l.price * l.quantity as f64).sum();
            let discount = if self.promo.lock().unwrap().is_some() { 5.0 } else { 0.0 };
            RemoteCart {
                items,
                sub_total: Some(sub_total),
                tax_total: Some(sub_total * 0.1),
                order_total: Some(sub_total * 1.1 - discount),
                discount_total: Some(discount),
                discount_code: self.promo.lock().unwrap().clone(),
            }
        }
    }

    #[async_trait]
    impl CartApi for MockApi {
        async fn create_cart(&self, current_cart_id: Option<&str>) -> Result<String, ApiError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.resume_ids
                .lock()
                .unwrap()
                .push(current_cart_id.map(str::to_string));
            if self.fail_create {
                return Err(ApiError::Status(503));
            }
            Ok(self
                .new_cart_id
                .clone()
                .unwrap_or_else(|| current_cart_id.unwrap_or("cart-1").to_string()))
        }

        async fn add_cart_item(
            &self,
            _cart_id: &str,
            request: &AddCartItemRequest,
        ) -> Result<(), ApiError> {
            let n = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(n, Ordering::SeqCst);
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let call = self.add_calls.fetch_add(1, Ordering::SeqCst);

            if self.fail_add {
                return Err(ApiError::Status(500));
            }
            if let Some(group) = &self.reject_group {
                return Err(ApiError::Validation {
                    group_id: Some(group.clone()),
                    message: "Please choose a rice".to_string(),
                });
            }

            let base = find_menu_item(Brand::Sushi, &request.product_id).map_or(1.0, |m| m.price);
            let modifiers: u32 = request.selections.iter().map(|s| s.quantity).sum();
            self.lines.lock().unwrap().push(RemoteCartItem {
                id: format!("line-{}", call),
                product_id: request.product_id.clone(),
                name: None,
                description: None,
                image_url: None,
                price: base + 0.5 * modifiers as f64,
                quantity: request.quantity,
                special_instructions: request.special_instructions.clone(),
            });
            Ok(())
        }

        async fn update_cart_item(
            &self,
            _cart_id: &str,
            line_id: &str,
            quantity: u32,
        ) -> Result<(), ApiError> {
            if self.fail_edit.load(Ordering::SeqCst) {
                return Err(ApiError::Status(500));
            }
            let mut lines = self.lines.lock().unwrap();
            let line = lines
                .iter_mut()
                .find(|l| l.id == line_id)
                .ok_or(ApiError::Status(404))?;
            line.quantity = quantity;
            Ok(())
        }

        async fn remove_cart_item(&self, _cart_id: &str, line_id: &str) -> Result<(), ApiError> {
            if self.fail_edit.load(Ordering::SeqCst) {
                return Err(ApiError::Status(500));
            }
            self.lines.lock().unwrap().retain(|l| l.id != line_id);
            Ok(())
        }

        async fn get_cart(&self, _cart_id: &str) -> Result<RemoteCart, ApiError> {
            if self.fail_get {
                return Err(ApiError::Status(504));
            }
            Ok(self.snapshot())
        }

        async fn get_product(&self, product_id: &str) -> Result<ProductDetail, ApiError> {
            Ok(ProductDetail {
                id: product_id.to_string(),
                modifier_groups: modifier_groups_for(Brand::Sushi, product_id),
            })
        }

        async fn get_time_intervals(
            &self,
            _cart_id: &str,
            _order_type: OrderType,
        ) -> Result<Vec<TimeIntervalDay>, ApiError> {
            Ok(Vec::new())
        }

        async fn apply_promo_code(&self, _cart_id: &str, code: &str) -> Result<(), ApiError> {
            if code != "SAVE5" {
                return Err(ApiError::Validation {
                    group_id: None,
                    message: "Unknown promo code".to_string(),
                });
            }
            *self.promo.lock().unwrap() = Some(code.to_string());
            Ok(())
        }

        async fn remove_promo_code(&self, _cart_id: &str) -> Result<(), ApiError> {
            *self.promo.lock().unwrap() = None;
            Ok(())
        }

        async fn create_payment_intent(&self, cart_id: &str) -> Result<PaymentIntent, ApiError> {
            Ok(PaymentIntent {
                client_secret: format!("secret-{}", cart_id),
                payment_intent_id: Some("pi_1".to_string()),
            })
        }

        async fn create_demo_payment_intent(
            &self,
            _amount: f64,
        ) -> Result<PaymentIntent, ApiError> {
            Ok(PaymentIntent {
                client_secret: "demo-secret".to_string(),
                payment_intent_id: None,
            })
        }
    }

    pub(crate) fn menu_item(id: &str, price: f64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            description: "Tasty".to_string(),
            price,
            image: Some(format!("/images/{}.jpg", id)),
            category: Category::Rolls,
            calories: 300,
            is_new: false,
            is_popular: true,
            is_gluten_free: false,
        }
    }

    fn offline_api() -> Arc<MockApi> {
        Arc::new(MockApi {
            fail_create: true,
            ..Default::default()
        })
    }

    fn provider(api: Arc<MockApi>) -> CartProvider {
        CartProvider::new(api, "loc-1", Connection::open_in_memory().unwrap()).unwrap()
    }

    /// A database that already holds one line of cart `cart_id`.
    fn stored_cart(cart_id: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        check_or_create_db_tables(&conn).unwrap();
        let line = CartItem {
            item: menu_item("edamame", 5.0),
            cart_id: "line-9".to_string(),
            quantity: 2,
            options: CartItemOptions::default(),
        };
        save_cart_items(&conn, &[line]).unwrap();
        save_cart_id(&conn, cart_id).unwrap();
        conn
    }

    fn temp_db() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("leclerc-cart-{}.sqlite", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_requires_location_id() {
        let res = CartProvider::new(offline_api(), " ", Connection::open_in_memory().unwrap());
        assert!(matches!(
            res,
            Err(CartError::Config(ConfigError::MissingLocationId))
        ));
    }

    #[test]
    fn test_tax_and_delivery_fee() {
        assert_eq!(tax_of(28.0), 2.49);
        assert_eq!(delivery_fee(OrderType::Pickup, 10.0, Brand::Sushi), 0.0);
        assert_eq!(delivery_fee(OrderType::DineIn, 10.0, Brand::Sushi), 0.0);
        assert_eq!(delivery_fee(OrderType::Delivery, 50.0, Brand::Sushi), 0.0);
        assert_eq!(delivery_fee(OrderType::Delivery, 49.99, Brand::Sushi), 5.99);
        assert_eq!(delivery_fee(OrderType::Delivery, 20.0, Brand::Bakery), 2.99);
    }

    #[tokio::test]
    async fn test_offline_totals_example() {
        let cart = provider(offline_api());
        assert_eq!(cart.init().await, CartMode::Local);

        cart.add_to_cart(&menu_item("a", 18.0), CartItemOptions::default())
            .await
            .unwrap();
        cart.add_to_cart(&menu_item("b", 5.0), CartItemOptions::default())
            .await
            .unwrap();
        let b_line = cart.items().await[1].cart_id.clone();
        cart.update_quantity(&b_line, 2).await.unwrap();

        let totals = cart.totals(OrderType::Pickup, Brand::Sushi).await;
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, 28.0);
        assert_eq!(totals.delivery_fee, 0.0);
        assert_eq!(totals.tax, 2.49);
        assert_eq!(totals.total, 30.49);

        let delivery = cart.totals(OrderType::Delivery, Brand::Sushi).await;
        assert_eq!(delivery.delivery_fee, 5.99);
        assert_eq!(delivery.total, 36.48);
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_subtotal() {
        let cart = provider(offline_api());
        cart.add_to_cart(&menu_item("a", 12.5), CartItemOptions::default())
            .await
            .unwrap();
        let before = cart.subtotal().await;

        cart.add_to_cart(&menu_item("x", 7.25), CartItemOptions::default())
            .await
            .unwrap();
        assert_eq!(cart.subtotal().await, 19.75);

        let added = cart.items().await[1].cart_id.clone();
        cart.remove_item(&added).await.unwrap();
        assert_eq!(cart.subtotal().await, before);
    }

    #[tokio::test]
    async fn test_invalid_item_fails_before_network() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api.clone());

        for item in [
            menu_item("a", -1.0),
            menu_item("", 3.0),
            menu_item("a", f64::NAN),
            MenuItem {
                name: String::new(),
                ..menu_item("a", 1.0)
            },
        ] {
            let res = cart.add_to_cart(&item, CartItemOptions::default()).await;
            assert!(matches!(res, Err(CartError::InvalidItem(_))));
        }

        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.add_calls.load(Ordering::SeqCst), 0);
        assert!(cart.items().await.is_empty());
    }

    #[tokio::test]
    async fn test_offline_gift_box_surcharge_and_line_ids() {
        let cart = provider(offline_api());
        let gift = CartItemOptions {
            gift_box: true,
            ..Default::default()
        };
        cart.add_to_cart(&menu_item("cake", 10.0), gift).await.unwrap();
        cart.add_to_cart(&menu_item("cake", 10.0), CartItemOptions::default())
            .await
            .unwrap();

        let items = cart.items().await;
        assert_eq!(items[0].item.price, 10.0 + GIFT_BOX_PRICE);
        assert!(items[0].options.gift_box);
        assert_eq!(items[1].item.price, 10.0);
        assert_ne!(items[0].cart_id, items[1].cart_id);
        assert!(items[0].cart_id.starts_with("cake-"));
        assert!(cart.is_open().await);
    }

    #[tokio::test]
    async fn test_update_quantity_zero_removes() {
        let cart = provider(offline_api());
        cart.add_to_cart(&menu_item("a", 3.0), CartItemOptions::default())
            .await
            .unwrap();
        let line = cart.items().await[0].cart_id.clone();

        cart.update_quantity(&line, 0).await.unwrap();
        assert!(cart.items().await.is_empty());
        assert_eq!(cart.total().await, 0.0);
    }

    #[tokio::test]
    async fn test_remote_add_maps_lines() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api.clone());
        assert_eq!(
            cart.init().await,
            CartMode::Remote {
                cart_id: "cart-1".to_string()
            }
        );

        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        let gift = CartItemOptions {
            gift_box: true,
            warming: true,
            ..Default::default()
        };
        cart.add_to_cart(&roll, gift).await.unwrap();

        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cart_id, "line-0");
        // enriched from the local menu item
        assert_eq!(items[0].item.name, roll.name);
        assert_eq!(items[0].item.category, Category::Rolls);
        assert_eq!(items[0].item.calories, roll.calories);
        assert!(items[0].options.gift_box);
        assert!(items[0].options.warming);

        let sent = api.lines.lock().unwrap()[0].clone();
        assert_eq!(sent.special_instructions, GIFT_BOX_INSTRUCTIONS);
        assert_eq!(sent.quantity, 1);

        // backend totals win while in sync
        assert_eq!(cart.subtotal().await, 18.0);
        assert_eq!(cart.tax().await, 18.0 * 0.1);
    }

    #[tokio::test]
    async fn test_local_edit_invalidates_remote_totals() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api);
        cart.init().await;
        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        cart.add_to_cart(&roll, CartItemOptions::default()).await.unwrap();

        cart.update_quantity("line-0", 2).await.unwrap();
        assert_eq!(cart.subtotal().await, 36.0);
        assert_eq!(cart.tax().await, tax_of(36.0));
    }

    #[tokio::test]
    async fn test_remote_failure_is_surfaced_not_hidden() {
        let api = Arc::new(MockApi {
            fail_add: true,
            ..Default::default()
        });
        let cart = provider(api);
        cart.init().await;

        let res = cart
            .add_to_cart(&menu_item("edamame", 5.0), CartItemOptions::default())
            .await;
        assert!(matches!(res, Err(CartError::Remote(ApiError::Status(500)))));
        assert_eq!(cart.last_error().await.as_deref(), Some(ADD_TO_CART_ERROR));
        assert!(cart.items().await.is_empty());
        assert!(!cart.is_open().await);
    }

    #[tokio::test]
    async fn test_empty_offline_cart_goes_online_on_add() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api.clone());

        cart.add_to_cart(&menu_item("edamame", 5.0), CartItemOptions::default())
            .await
            .unwrap();
        assert_eq!(cart.cart_id().await.as_deref(), Some("cart-1"));
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_adds_are_serialized() {
        let api = Arc::new(MockApi::default());
        let cart = Arc::new(provider(api.clone()));
        cart.init().await;

        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        let tuna = find_menu_item(Brand::Sushi, "spicy-tuna-roll").unwrap();
        let (a, b) = tokio::join!(
            cart.add_to_cart(&roll, CartItemOptions::default()),
            cart.add_to_cart(&tuna, CartItemOptions::default()),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(cart.items().await.len(), 2);
    }

    #[tokio::test]
    async fn test_modifier_submission() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api.clone());
        cart.init().await;

        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        let groups = modifier_groups_for(Brand::Sushi, "dragon-roll");
        let mut selection = ModifierSelection::new();

        // rice is required
        let res = cart
            .add_with_modifiers(&roll, CartItemOptions::default(), &mut selection, &groups, 1)
            .await;
        assert!(matches!(res, Err(CartError::MissingSelection(ref g)) if g == "rice"));
        assert_eq!(selection.validation_error(), Some("rice"));
        assert_eq!(api.add_calls.load(Ordering::SeqCst), 0);

        selection.toggle(&groups[0], "brown-rice");
        selection.toggle(&groups[1], "spicy-mayo");
        selection.change_option_quantity("extras", "spicy-mayo", 2);
        cart.add_with_modifiers(&roll, CartItemOptions::default(), &mut selection, &groups, 2)
            .await
            .unwrap();

        assert!(selection.is_empty());
        let items = cart.items().await;
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].item.price, 18.0 + 0.5 * 3.0);
    }

    #[tokio::test]
    async fn test_server_validation_marks_group() {
        let api = Arc::new(MockApi {
            reject_group: Some("rice".to_string()),
            ..Default::default()
        });
        let cart = provider(api);
        cart.init().await;

        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        let groups = modifier_groups_for(Brand::Sushi, "dragon-roll");
        let mut selection = ModifierSelection::new();
        selection.toggle(&groups[0], "soy-paper");

        let res = cart
            .add_with_modifiers(&roll, CartItemOptions::default(), &mut selection, &groups, 1)
            .await;
        assert!(res.is_err());
        assert_eq!(selection.validation_error(), Some("rice"));
        assert!(!selection.is_empty());
        assert_eq!(cart.last_error().await.as_deref(), Some("Please choose a rice"));
    }

    #[tokio::test]
    async fn test_offline_modifier_price() {
        let cart = provider(offline_api());
        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        let groups = modifier_groups_for(Brand::Sushi, "dragon-roll");
        let mut selection = ModifierSelection::new();
        selection.toggle(&groups[0], "soy-paper");
        selection.toggle(&groups[1], "extra-avocado");
        selection.change_option_quantity_clamped(&groups[1], "extra-avocado", 2);

        cart.add_with_modifiers(&roll, CartItemOptions::default(), &mut selection, &groups, 1)
            .await
            .unwrap();

        // 18.00 + soy paper 2.00 + 2 x avocado 1.50
        assert_eq!(cart.items().await[0].item.price, 23.0);
    }

    #[tokio::test]
    async fn test_promo_codes() {
        let cart = provider(offline_api());
        assert!(matches!(
            cart.apply_promo_code("SAVE5").await,
            Err(CartError::PromoUnavailable)
        ));

        let api = Arc::new(MockApi::default());
        let cart = provider(api);
        cart.init().await;
        let sashimi = find_menu_item(Brand::Sushi, "chef-sashimi").unwrap();
        cart.add_to_cart(&sashimi, CartItemOptions::default()).await.unwrap();

        assert!(cart.apply_promo_code("BOGUS").await.is_err());
        assert_eq!(cart.last_error().await.as_deref(), Some("Unknown promo code"));

        cart.apply_promo_code("SAVE5").await.unwrap();
        assert_eq!(cart.discount_code().await.as_deref(), Some("SAVE5"));
        let totals = cart.totals(OrderType::Pickup, Brand::Sushi).await;
        assert_eq!(totals.discount, 5.0);
        assert_eq!(totals.total, 30.2);

        cart.remove_promo_code().await.unwrap();
        assert_eq!(cart.discount_code().await, None);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api);
        cart.init().await;
        cart.add_to_cart(&menu_item("edamame", 5.0), CartItemOptions::default())
            .await
            .unwrap();

        cart.clear_cart().await.unwrap();
        assert!(cart.items().await.is_empty());
        assert_eq!(cart.mode().await, CartMode::Local);
        assert_eq!(cart.item_count().await, 0);
    }

    #[tokio::test]
    async fn test_hydrates_from_storage() {
        let path = temp_db();
        {
            let cart = CartProvider::new(offline_api(), "loc-1", Connection::open(&path).unwrap())
                .unwrap();
            cart.add_to_cart(&menu_item("a", 4.0), CartItemOptions::default())
                .await
                .unwrap();
        }

        let cart =
            CartProvider::new(offline_api(), "loc-1", Connection::open(&path).unwrap()).unwrap();
        assert_eq!(cart.item_count().await, 1);
        assert_eq!(cart.subtotal().await, 4.0);
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_offline_lines_survive_reconnect() {
        let path = temp_db();
        {
            let cart = CartProvider::new(offline_api(), "loc-1", Connection::open(&path).unwrap())
                .unwrap();
            cart.add_to_cart(&menu_item("a", 4.0), CartItemOptions::default())
                .await
                .unwrap();
        }

        let api = Arc::new(MockApi::default());
        let cart =
            CartProvider::new(api.clone(), "loc-1", Connection::open(&path).unwrap()).unwrap();
        assert_eq!(cart.init().await, CartMode::Local);
        assert_eq!(cart.item_count().await, 1);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);

        // still there on the next start
        drop(cart);
        let cart = CartProvider::new(api, "loc-1", Connection::open(&path).unwrap()).unwrap();
        cart.init().await;
        assert_eq!(cart.items().await[0].item.id, "a");
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_init_resumes_stored_cart() {
        let api = Arc::new(MockApi::default());
        let cart = CartProvider::new(api.clone(), "loc-1", stored_cart("cart-7")).unwrap();

        assert_eq!(
            cart.init().await,
            CartMode::Remote {
                cart_id: "cart-7".to_string()
            }
        );
        assert_eq!(
            *api.resume_ids.lock().unwrap(),
            vec![Some("cart-7".to_string())]
        );
    }

    #[tokio::test]
    async fn test_init_keeps_stored_lines_when_fetch_fails() {
        let api = Arc::new(MockApi {
            fail_get: true,
            ..Default::default()
        });
        let cart = CartProvider::new(api, "loc-1", stored_cart("cart-1")).unwrap();

        cart.init().await;
        assert_eq!(cart.cart_id().await.as_deref(), Some("cart-1"));
        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cart_id, "line-9");
        assert_eq!(cart.subtotal().await, 10.0);
    }

    #[tokio::test]
    async fn test_init_with_new_cart_drops_stale_lines() {
        let api = Arc::new(MockApi {
            new_cart_id: Some("cart-2".to_string()),
            fail_get: true,
            ..Default::default()
        });
        let cart = CartProvider::new(api, "loc-1", stored_cart("cart-old")).unwrap();

        assert_eq!(
            cart.init().await,
            CartMode::Remote {
                cart_id: "cart-2".to_string()
            }
        );
        assert!(cart.items().await.is_empty());
    }

    #[tokio::test]
    async fn test_remote_edits_survive_refresh() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api.clone());
        cart.init().await;
        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        let tuna = find_menu_item(Brand::Sushi, "spicy-tuna-roll").unwrap();
        cart.add_to_cart(&roll, CartItemOptions::default()).await.unwrap();
        cart.add_to_cart(&tuna, CartItemOptions::default()).await.unwrap();

        cart.remove_item("line-0").await.unwrap();
        cart.update_quantity("line-1", 3).await.unwrap();
        cart.refresh().await.unwrap();

        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cart_id, "line-1");
        assert_eq!(items[0].quantity, 3);
        assert_eq!(cart.subtotal().await, 14.5 * 3.0);
    }

    #[tokio::test]
    async fn test_rejected_remote_edit_changes_nothing() {
        let api = Arc::new(MockApi::default());
        let cart = provider(api.clone());
        cart.init().await;
        let roll = find_menu_item(Brand::Sushi, "dragon-roll").unwrap();
        cart.add_to_cart(&roll, CartItemOptions::default()).await.unwrap();

        api.fail_edit.store(true, Ordering::SeqCst);
        assert!(cart.remove_item("line-0").await.is_err());
        assert!(cart.update_quantity("line-0", 4).await.is_err());

        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);
        assert_eq!(cart.last_error().await.as_deref(), Some(UPDATE_CART_ERROR));
        // backend totals are still in sync
        assert_eq!(cart.tax().await, 18.0 * 0.1);
    }

    #[tokio::test]
    async fn test_item_count_does_not_overflow() {
        let cart = provider(offline_api());
        for id in ["a", "b"] {
            cart.add_to_cart(&menu_item(id, 0.0), CartItemOptions::default())
                .await
                .unwrap();
        }
        for line in cart.items().await {
            cart.update_quantity(&line.cart_id, u32::MAX).await.unwrap();
        }

        assert_eq!(cart.item_count().await, 2 * u64::from(u32::MAX));
        assert_eq!(
            cart.totals(OrderType::Pickup, Brand::Sushi).await.item_count,
            2 * u64::from(u32::MAX)
        );
    }
}

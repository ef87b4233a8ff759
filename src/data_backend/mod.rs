use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::data_types::{
    api_data_types::{
        AddCartItemRequest, PaymentIntent, ProductDetail, RemoteCart, TimeIntervalDay,
    },
    ApiError, OrderType,
};

pub mod crave_api;
pub mod menu_catalog;

const WEEK_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Remote cart/order backend, one location.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Create a cart, or resume `current_cart_id` if the backend still knows it.
    async fn create_cart(&self, current_cart_id: Option<&str>) -> Result<String, ApiError>;

    async fn add_cart_item(
        &self,
        cart_id: &str,
        request: &AddCartItemRequest,
    ) -> Result<(), ApiError>;

    async fn update_cart_item(
        &self,
        cart_id: &str,
        line_id: &str,
        quantity: u32,
    ) -> Result<(), ApiError>;

    async fn remove_cart_item(&self, cart_id: &str, line_id: &str) -> Result<(), ApiError>;

    async fn get_cart(&self, cart_id: &str) -> Result<RemoteCart, ApiError>;

    async fn get_product(&self, product_id: &str) -> Result<ProductDetail, ApiError>;

    async fn get_time_intervals(
        &self,
        cart_id: &str,
        order_type: OrderType,
    ) -> Result<Vec<TimeIntervalDay>, ApiError>;

    async fn apply_promo_code(&self, cart_id: &str, code: &str) -> Result<(), ApiError>;

    async fn remove_promo_code(&self, cart_id: &str) -> Result<(), ApiError>;

    async fn create_payment_intent(&self, cart_id: &str) -> Result<PaymentIntent, ApiError>;

    async fn create_demo_payment_intent(&self, amount: f64) -> Result<PaymentIntent, ApiError>;
}

pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => WEEK_DAYS[date.weekday().num_days_from_monday() as usize].to_string(),
    }
}

/// 12-hour clock, e.g. `9:15 AM`
pub fn clock_12h(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    format!(
        "{}:{:02} {}",
        hour,
        time.minute(),
        if pm { "PM" } else { "AM" }
    )
}

pub fn format_price(amount: f64) -> String {
    format!("${:.2}", amount)
}

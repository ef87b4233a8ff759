pub mod api_data_types;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BAKERY_DELIVERY_FEE, BAKERY_PICKUP_LOCATION, SUSHI_DELIVERY_FEE, SUSHI_PICKUP_LOCATION,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Brand {
    #[default]
    Sushi,
    Bakery,
}

impl Brand {
    pub fn delivery_fee(&self) -> f64 {
        match self {
            Brand::Sushi => SUSHI_DELIVERY_FEE,
            Brand::Bakery => BAKERY_DELIVERY_FEE,
        }
    }

    pub fn pickup_location(&self) -> &'static str {
        match self {
            Brand::Sushi => SUSHI_PICKUP_LOCATION,
            Brand::Bakery => BAKERY_PICKUP_LOCATION,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Rolls,
    Nigiri,
    Sashimi,
    Starters,
    Breads,
    Pastries,
    Cakes,
    Desserts,
    Drinks,
    #[default]
    Other,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    #[default]
    Delivery,
    Pickup,
    DineIn,
}

impl OrderType {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            OrderType::Delivery => "delivery",
            OrderType::Pickup => "pickup",
            OrderType::DineIn => "dine-in",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub calories: u32,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
}

/// A set of options attached to a menu item.
///
/// `quantity` is the number of selections the group takes: 1 means the group
/// behaves like a radio button, anything larger like a set of checkboxes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModifierGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    pub quantity: u32,
    #[serde(default)]
    pub options: Vec<ModifierItem>,
}

impl ModifierGroup {
    pub fn is_single_select(&self) -> bool {
        self.quantity <= 1
    }

    pub fn option(&self, option_id: &str) -> Option<&ModifierItem> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModifierItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
}

fn default_max_quantity() -> u32 {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    pub option_id: String,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedModifierTypes {
    pub group_id: String,
    pub options: Vec<SelectedOption>,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartItemOptions {
    pub warming: bool,
    pub packaging: bool,
    pub gift_box: bool,
}

/// One cart line. `item.price` already contains every surcharge applied when
/// the line was added.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub item: MenuItem,
    pub cart_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub options: CartItemOptions,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.item.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartTotals {
    pub item_count: u64,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    /// RFC 3339 timestamp of the slot start
    pub timestamp: String,
    pub label: String,
    pub date: NaiveDate,
    pub time: String,
    pub day_offset: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOption {
    pub order_type: OrderType,
    pub name: String,
    pub fee: f64,
    pub estimated_time: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub apartment: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("location id is not configured")]
    MissingLocationId,
    #[error("api base url is not configured")]
    MissingApiBaseUrl,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("cart api request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("cart api returned status {0}")]
    Status(u16),
    #[error("{message}")]
    Validation {
        group_id: Option<String>,
        message: String,
    },
    #[error("cart api response is missing {0}")]
    MissingField(&'static str),
}

#[derive(Error, Debug)]
pub enum CartError {
    #[error("invalid menu item: {0}")]
    InvalidItem(&'static str),
    #[error("please make a selection for {0}")]
    MissingSelection(String),
    #[error(transparent)]
    Remote(#[from] ApiError),
    #[error("local cart storage failed: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("cart could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("promo codes need an online cart")]
    PromoUnavailable,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("no cart to pay for")]
    NoCart,
    #[error("payment intent could not be created: {0}")]
    Intent(#[from] ApiError),
}

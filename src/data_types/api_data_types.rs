use serde::{Deserialize, Serialize};

use super::ModifierGroup;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartRequest<'a> {
    pub marketplace_id: &'a str,
    pub search_params: &'a str,
    pub current_cart_id: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartResponse {
    pub cart_id: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub quantity: u32,
    pub special_instructions: String,
    pub item_unavailable_action: String,
    pub selections: Vec<ApiSelection>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiSelection {
    pub modifier_group_id: String,
    pub modifier_item_id: String,
    pub quantity: u32,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    pub sub_total: Option<f64>,
    pub tax_total: Option<f64>,
    pub order_total: Option<f64>,
    pub discount_total: Option<f64>,
    pub discount_code: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartItem {
    pub id: String,
    pub product_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: String,
    #[serde(default)]
    pub modifier_groups: Vec<ModifierGroup>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeIntervalDay {
    pub date: String,
    pub label: String,
    #[serde(default)]
    pub intervals: Vec<TimeInterval>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub start: String,
    pub end: String,
    pub label: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeRequest<'a> {
    pub code: &'a str,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
    pub payment_intent_id: Option<String>,
}

/// Body of a 400/422 response from the cart-item endpoint.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorBody {
    pub message: Option<String>,
    pub modifier_group_id: Option<String>,
}

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::data_backend::CartApi;
use crate::data_types::{
    api_data_types::{
        AddCartItemRequest, CreateCartRequest, CreateCartResponse, PaymentIntent, ProductDetail,
        PromoCodeRequest, RemoteCart, TimeIntervalDay, UpdateCartItemRequest,
        ValidationErrorBody,
    },
    ApiError, ConfigError, OrderType,
};

/// HTTP client for the cart/order backend of a single location.
pub struct CraveClient {
    client: Client,
    base_url: String,
    location_id: String,
    marketplace_id: String,
    api_key: Option<String>,
}

impl CraveClient {
    pub fn new(
        base_url: &str,
        location_id: &str,
        marketplace_id: &str,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        if location_id.is_empty() {
            return Err(ConfigError::MissingLocationId);
        }
        if base_url.is_empty() {
            return Err(ConfigError::MissingApiBaseUrl);
        }

        Ok(CraveClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            location_id: location_id.to_string(),
            marketplace_id: marketplace_id.to_string(),
            api_key,
        })
    }

    fn location_url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/locations/{}{}",
            self.base_url, self.location_id, path
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("x-request-id", Uuid::new_v4().to_string());
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    async fn send(&self, what: &str, builder: RequestBuilder) -> Result<Response, ApiError> {
        let now = Instant::now();
        let resp = self.authorized(builder).send().await?;
        log::debug!("{} -> {} in {:.2?}", what, resp.status(), now.elapsed());

        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(status_error(resp).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        what: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        Ok(self.send(what, builder).await?.json::<T>().await?)
    }
}

async fn status_error(resp: Response) -> ApiError {
    let status = resp.status();
    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
        let body = resp
            .json::<ValidationErrorBody>()
            .await
            .unwrap_or_default();
        if body.message.is_some() || body.modifier_group_id.is_some() {
            return ApiError::Validation {
                group_id: body.modifier_group_id,
                message: body
                    .message
                    .unwrap_or_else(|| "Please check your selections".to_string()),
            };
        }
    }

    ApiError::Status(status.as_u16())
}

#[async_trait]
impl CartApi for CraveClient {
    async fn create_cart(&self, current_cart_id: Option<&str>) -> Result<String, ApiError> {
        let body = CreateCartRequest {
            marketplace_id: &self.marketplace_id,
            search_params: "",
            current_cart_id,
        };

        let resp: CreateCartResponse = self
            .send_json(
                "create cart",
                self.client.post(self.location_url("/carts")).json(&body),
            )
            .await?;

        resp.cart_id
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::MissingField("cartId"))
    }

    async fn add_cart_item(
        &self,
        cart_id: &str,
        request: &AddCartItemRequest,
    ) -> Result<(), ApiError> {
        self.send(
            "add cart item",
            self.client
                .post(self.location_url(&format!("/carts/{}/cart-item", cart_id)))
                .json(request),
        )
        .await?;

        Ok(())
    }

    async fn update_cart_item(
        &self,
        cart_id: &str,
        line_id: &str,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.send(
            "update cart item",
            self.client
                .put(self.location_url(&format!("/carts/{}/cart-item/{}", cart_id, line_id)))
                .json(&UpdateCartItemRequest { quantity }),
        )
        .await?;

        Ok(())
    }

    async fn remove_cart_item(&self, cart_id: &str, line_id: &str) -> Result<(), ApiError> {
        self.send(
            "remove cart item",
            self.client
                .delete(self.location_url(&format!("/carts/{}/cart-item/{}", cart_id, line_id))),
        )
        .await?;

        Ok(())
    }

    async fn get_cart(&self, cart_id: &str) -> Result<RemoteCart, ApiError> {
        self.send_json(
            "get cart",
            self.client
                .get(self.location_url(&format!("/carts/{}", cart_id))),
        )
        .await
    }

    async fn get_product(&self, product_id: &str) -> Result<ProductDetail, ApiError> {
        self.send_json(
            "get product",
            self.client
                .get(self.location_url(&format!("/products/{}", product_id))),
        )
        .await
    }

    async fn get_time_intervals(
        &self,
        cart_id: &str,
        order_type: OrderType,
    ) -> Result<Vec<TimeIntervalDay>, ApiError> {
        self.send_json(
            "get time intervals",
            self.client.get(self.location_url("/time-intervals")).query(&[
                ("cartId", cart_id),
                ("orderType", order_type.as_api_str()),
            ]),
        )
        .await
    }

    async fn apply_promo_code(&self, cart_id: &str, code: &str) -> Result<(), ApiError> {
        self.send(
            "apply promo code",
            self.client
                .post(self.location_url(&format!("/carts/{}/promo-code", cart_id)))
                .json(&PromoCodeRequest { code }),
        )
        .await?;

        Ok(())
    }

    async fn remove_promo_code(&self, cart_id: &str) -> Result<(), ApiError> {
        self.send(
            "remove promo code",
            self.client
                .delete(self.location_url(&format!("/carts/{}/promo-code", cart_id))),
        )
        .await?;

        Ok(())
    }

    async fn create_payment_intent(&self, cart_id: &str) -> Result<PaymentIntent, ApiError> {
        self.send_json(
            "create payment intent",
            self.client
                .get(format!("{}/api/v1/stripe/payment-intent", self.base_url))
                .query(&[("locationId", self.location_id.as_str()), ("cartId", cart_id)]),
        )
        .await
    }

    async fn create_demo_payment_intent(&self, amount: f64) -> Result<PaymentIntent, ApiError> {
        let amount_cents = (amount * 100.0).round() as i64;

        self.send_json(
            "create demo payment intent",
            self.client
                .post(format!("{}/api/demo-payment-intent", self.base_url))
                .json(&serde_json::json!({ "amount": amount_cents })),
        )
        .await
    }
}

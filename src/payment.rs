use serde::Deserialize;

use crate::{
    constants::GENERIC_PAYMENT_ERROR,
    data_backend::CartApi,
    data_types::{api_data_types::PaymentIntent, PaymentError},
};

/// Requests a payment intent for the cart. When `allow_demo` is set, a missing
/// cart or a failing backend falls back to the demo endpoint charging `amount`.
pub async fn create_payment_intent(
    api: &dyn CartApi,
    cart_id: Option<&str>,
    amount: f64,
    allow_demo: bool,
) -> Result<PaymentIntent, PaymentError> {
    let now = std::time::Instant::now();

    let intent = match (cart_id, allow_demo) {
        (Some(cart_id), _) => match api.create_payment_intent(cart_id).await {
            Ok(intent) => intent,
            Err(e) if allow_demo => {
                log::warn!("Payment intent for {} failed, using demo: {}", cart_id, e);
                api.create_demo_payment_intent(amount).await?
            }
            Err(e) => return Err(e.into()),
        },
        (None, true) => api.create_demo_payment_intent(amount).await?,
        (None, false) => return Err(PaymentError::NoCart),
    };

    log::debug!("Payment intent created in {:.2?}", now.elapsed());
    Ok(intent)
}

/// Error reported by the payment provider when confirming a card.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PaymentFailure {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl PaymentFailure {
    /// Card and validation errors are safe to show as-is, anything else is not.
    pub fn user_message(&self) -> String {
        match (self.kind.as_str(), &self.message) {
            ("card_error" | "validation_error", Some(message)) => message.clone(),
            _ => GENERIC_PAYMENT_ERROR.to_string(),
        }
    }
}

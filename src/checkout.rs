use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::{
    cart::CartProvider,
    data_backend::CartApi,
    data_types::{
        api_data_types::{TimeInterval, TimeIntervalDay},
        Brand, CartTotals, OrderType, TimeSlot,
    },
    fulfillment::AddressState,
    time_slots::generate_time_slots,
};

/// Scheduling choices on the checkout screen. Changing the order type always
/// drops the chosen day, time and interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutState {
    order_type: OrderType,
    selected_day: Option<String>,
    selected_time: Option<String>,
    selected_interval: Option<TimeInterval>,
}

impl CheckoutState {
    pub fn new(order_type: OrderType) -> Self {
        CheckoutState {
            order_type,
            ..Default::default()
        }
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn selected_day(&self) -> Option<&str> {
        self.selected_day.as_deref()
    }

    pub fn selected_time(&self) -> Option<&str> {
        self.selected_time.as_deref()
    }

    pub fn selected_interval(&self) -> Option<&TimeInterval> {
        self.selected_interval.as_ref()
    }

    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.order_type = order_type;
        self.selected_day = None;
        self.selected_time = None;
        self.selected_interval = None;
    }

    pub fn select_slot(&mut self, slot: &TimeSlot) {
        self.selected_day = Some(slot.date.format("%Y-%m-%d").to_string());
        self.selected_time = Some(slot.timestamp.clone());
        self.selected_interval = None;
    }

    pub fn select_interval(&mut self, day: &TimeIntervalDay, interval: &TimeInterval) {
        self.selected_day = Some(day.date.clone());
        self.selected_time = Some(interval.start.clone());
        self.selected_interval = Some(interval.clone());
    }

    pub fn is_scheduled(&self) -> bool {
        self.selected_time.is_some()
    }
}

/// Where the bookable times came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    Server(Vec<TimeIntervalDay>),
    Generated(Vec<TimeSlot>),
}

impl Availability {
    /// Callers must show a "no slots available" state when this is true.
    pub fn is_empty(&self) -> bool {
        match self {
            Availability::Server(days) => days.iter().all(|d| d.intervals.is_empty()),
            Availability::Generated(slots) => slots.is_empty(),
        }
    }
}

/// Server-computed intervals when the backend has them, otherwise slots
/// generated from the store hours.
pub async fn available_slots<Tz>(
    api: &dyn CartApi,
    cart_id: Option<&str>,
    order_type: OrderType,
    now: &DateTime<Tz>,
) -> Availability
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if let Some(cart_id) = cart_id {
        match api.get_time_intervals(cart_id, order_type).await {
            Ok(days) if days.iter().any(|d| !d.intervals.is_empty()) => {
                return Availability::Server(days)
            }
            Ok(_) => log::info!("Backend has no intervals, generating slots"),
            Err(e) => log::warn!("Time intervals unavailable, generating slots: {}", e),
        }
    }

    Availability::Generated(generate_time_slots(now, order_type))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    pub order_type: OrderType,
    pub totals: CartTotals,
    pub display_address: String,
    pub estimated_time: String,
    pub scheduled_for: Option<String>,
}

impl CheckoutSummary {
    pub async fn compute(
        cart: &CartProvider,
        state: &CheckoutState,
        address: &AddressState,
        brand: Brand,
    ) -> Self {
        CheckoutSummary {
            order_type: state.order_type,
            totals: cart.totals(state.order_type, brand).await,
            display_address: address.display_address(),
            estimated_time: address.estimated_time(),
            scheduled_for: state.selected_time.clone(),
        }
    }
}

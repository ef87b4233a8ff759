use crate::{
    cart::delivery_fee,
    constants::{
        DELIVERY_ESTIMATE, DINE_IN_LOCATION, NO_ESTIMATE_MSG, NO_OPTION_MSG, PICKUP_ESTIMATE,
    },
    data_types::{Address, Brand, DeliveryOption, OrderType},
};

/// The fulfillment choices offered for `brand`, with the fee that applies to
/// a cart of `subtotal`.
pub fn delivery_options(brand: Brand, subtotal: f64) -> Vec<DeliveryOption> {
    [
        (OrderType::Delivery, "Delivery", DELIVERY_ESTIMATE),
        (OrderType::Pickup, "Pickup", PICKUP_ESTIMATE),
        (OrderType::DineIn, "Dine in", PICKUP_ESTIMATE),
    ]
    .into_iter()
    .map(|(order_type, name, estimate)| DeliveryOption {
        order_type,
        name: name.to_string(),
        fee: delivery_fee(order_type, subtotal, brand),
        estimated_time: estimate.to_string(),
    })
    .collect()
}

/// Chosen fulfillment method plus, for delivery, where to deliver to.
/// Nothing chosen yet is represented by `delivery_option == None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressState {
    brand: Brand,
    delivery_option: Option<DeliveryOption>,
    address: Option<Address>,
}

impl AddressState {
    pub fn new(brand: Brand) -> Self {
        AddressState {
            brand,
            delivery_option: None,
            address: None,
        }
    }

    pub fn delivery_option(&self) -> Option<&DeliveryOption> {
        self.delivery_option.as_ref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn order_type(&self) -> Option<OrderType> {
        self.delivery_option.as_ref().map(|o| o.order_type)
    }

    /// Stores the option; an address is only kept for delivery.
    pub fn set_delivery_data(&mut self, delivery_option: DeliveryOption, address: Option<Address>) {
        self.address = match delivery_option.order_type {
            OrderType::Delivery => address,
            OrderType::Pickup | OrderType::DineIn => None,
        };
        log::debug!("Fulfillment set to {:?}", delivery_option.order_type);
        self.delivery_option = Some(delivery_option);
    }

    pub fn clear_address(&mut self) {
        self.delivery_option = None;
        self.address = None;
    }

    pub fn display_address(&self) -> String {
        match (&self.delivery_option, &self.address) {
            (None, _) => NO_OPTION_MSG.to_string(),
            (Some(opt), Some(address)) if opt.order_type == OrderType::Delivery => {
                match address.apartment.as_deref().filter(|a| !a.is_empty()) {
                    Some(apartment) => format!("{}, {}", address.street, apartment),
                    None => address.street.clone(),
                }
            }
            (Some(opt), None) if opt.order_type == OrderType::Delivery => {
                NO_OPTION_MSG.to_string()
            }
            (Some(opt), _) if opt.order_type == OrderType::DineIn => DINE_IN_LOCATION.to_string(),
            (Some(_), _) => self.brand.pickup_location().to_string(),
        }
    }

    pub fn delivery_fee(&self) -> f64 {
        self.delivery_option.as_ref().map_or(0.0, |o| o.fee)
    }

    pub fn estimated_time(&self) -> String {
        self.delivery_option
            .as_ref()
            .map_or_else(|| NO_ESTIMATE_MSG.to_string(), |o| o.estimated_time.clone())
    }
}

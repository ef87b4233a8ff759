pub const CART_ITEMS_KEY: &str = "leclerc-cart-items";
pub const CART_ID_KEY: &str = "leclerc-cart-id";
pub const CART_DB: &str = "leclerc-cart.sqlite";

/// 8.875 %, in parts per 100 000
pub const TAX_RATE_PER_100K: i64 = 8_875;
pub const FREE_DELIVERY_THRESHOLD: f64 = 50.0;
pub const GIFT_BOX_PRICE: f64 = 4.5;
pub const GIFT_BOX_INSTRUCTIONS: &str = "Please pack this item in a gift box";

pub const STORE_OPEN_HOUR: u32 = 9;
pub const STORE_CLOSE_HOUR: u32 = 21;
pub const SLOT_STEP_MINUTES: i64 = 15;
pub const DELIVERY_LEAD_MINUTES: i64 = 30;
pub const PICKUP_LEAD_MINUTES: i64 = 15;
pub const MAX_TIME_SLOTS: usize = 20;
pub const SLOT_DAYS: i64 = 7;

pub const SUSHI_DELIVERY_FEE: f64 = 5.99;
pub const BAKERY_DELIVERY_FEE: f64 = 2.99;

pub const SUSHI_PICKUP_LOCATION: &str = "Pickup at 210 Rivington St, New York, NY";
pub const BAKERY_PICKUP_LOCATION: &str = "Pickup at 47 Bedford Ave, Brooklyn, NY";
pub const DINE_IN_LOCATION: &str = "Dine in at the restaurant";
pub const DELIVERY_ESTIMATE: &str = "30-45 min";
pub const PICKUP_ESTIMATE: &str = "15-20 min";
pub const NO_OPTION_MSG: &str = "Choose a delivery option";
pub const NO_ESTIMATE_MSG: &str = "Select option";

pub const GENERIC_PAYMENT_ERROR: &str = "An unexpected error occurred.";
pub const ADD_TO_CART_ERROR: &str = "Could not add the item to your cart. Please try again.";
pub const UPDATE_CART_ERROR: &str = "Could not update your cart. Please try again.";

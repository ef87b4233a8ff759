pub mod cart;
pub mod checkout;
pub mod constants;
pub mod data_backend;
pub mod data_types;
pub mod db_operations;
pub mod fulfillment;
pub mod modifier_selection;
pub mod payment;
pub mod shared_main;
pub mod time_slots;

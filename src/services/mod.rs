pub mod parts;
pub mod quotes;
pub mod service_orders;
pub mod stock;
pub mod users;
pub mod vehicles;

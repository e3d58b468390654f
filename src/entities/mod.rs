pub mod part;
pub mod part_usage_line;
pub mod quote;
pub mod service_order;
pub mod user;
pub mod vehicle;

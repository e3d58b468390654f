pub mod approve_quote_command;
pub mod create_quote_command;
pub mod generate_service_order_command;
pub mod reject_quote_command;
pub mod update_quote_command;

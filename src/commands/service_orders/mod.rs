pub mod add_part_command;
pub mod cancel_service_order_command;
pub mod conclude_service_order_command;
pub mod hold_service_order_command;
pub mod remove_part_command;
pub mod start_service_order_command;

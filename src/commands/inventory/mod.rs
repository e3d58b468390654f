pub mod adjust_stock_command;

//! CLI subcommand implementations for the pricewatch binary.

pub mod add_cmd;
pub mod check_cmd;
pub mod doctor;
pub mod list_cmd;
pub mod output;
pub mod report_cmd;
pub mod start;

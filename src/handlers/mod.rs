pub mod api_client;
pub mod callbacks;
pub mod commands;
pub mod messages;
pub mod report;

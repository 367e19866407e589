//! Page acquisition over plain HTTP.

pub mod http_client;

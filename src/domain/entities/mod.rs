pub mod price_map;
pub mod webhook_event;

mod relay_config;
mod relay_service;
mod server;
mod ws_handler;

pub use relay_config::RelayConfig;
pub use relay_service::RelayService;
pub use server::{router, serve};
pub use ws_handler::ws_handler;

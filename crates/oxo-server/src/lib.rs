pub mod client;
pub mod dispatcher;
pub mod protocol;
pub mod server;

pub use dispatcher::Dispatcher;
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};

pub mod cleanup;
pub mod registry;

pub use cleanup::{schedule_cleanup, DEFAULT_CLEANUP_DELAY};
pub use registry::GameRegistry;

pub mod constants;
pub mod events;
pub mod models;
pub mod search;
pub mod store;
pub mod tracing_setup;

pub use events::{ClientCommand, ServerEvent};
pub use store::{EngineError, SyncEngine, ViewState, ViewUpdate};

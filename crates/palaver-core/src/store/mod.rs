pub mod directory;
pub mod echo;
pub mod engine;
pub mod selection;
pub mod streams;

pub use directory::ChatDirectory;
pub use echo::{EchoDecision, EchoReconciler, PendingEcho};
pub use engine::{EngineError, SyncEngine, ViewState, ViewUpdate};
pub use selection::{SelectionController, SelectionEffects, SelectionPhase};
pub use streams::{StreamAssembler, StreamBuffer};

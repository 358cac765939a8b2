//! Restricted DOM-mutation script interpreter and host bridge.

pub mod bridge;
pub mod events;
pub mod interpreter;

pub use bridge::{BridgeElement, MutationResult, QueryResult};
pub use events::{DomEvent, EventRegistry, EventType};
pub use interpreter::{ScriptResult, execute_script};

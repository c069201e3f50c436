pub mod list_state;

pub use list_state::{ListStateConfig, ListStateController, ListStateHandle, ListStateMessage};

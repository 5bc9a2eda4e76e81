pub mod engine;
pub mod states;

pub use engine::LifecycleManager;
pub use states::{NegotiationFields, TransitionOutcome};

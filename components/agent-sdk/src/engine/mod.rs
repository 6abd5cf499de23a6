//! Reasoning engine: the bounded `ReAct` loop, its state machine, and builder.

pub mod builder;
pub mod react_loop;
pub mod state;

pub use builder::AgentEngineBuilder;
pub use react_loop::AgentEngine;
pub use state::{LoopState, SessionOutcome, SessionReport};

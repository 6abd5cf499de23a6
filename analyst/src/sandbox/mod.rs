//! Code-execution sandbox backends.

pub mod docker;
pub mod harness;

pub use docker::DockerSandbox;

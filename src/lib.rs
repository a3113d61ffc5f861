// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod clock;
pub mod config;
pub mod outcome;
pub mod race;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod sync;
pub mod typing_policy;
pub mod words;

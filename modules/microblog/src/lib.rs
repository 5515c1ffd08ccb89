// === PUBLIC CONTRACT ===
// Only the contract module should be public for other crates to consume
pub mod contract;

// Re-export the public contract components
pub use contract::{client, error, model};

pub mod config;
pub use config::MicroblogConfig;

// === MODULE DEFINITION ===
pub mod module;
pub use module::{Collaborators, Microblog};

// === INTERNAL MODULES ===
// Exposed for integration tests and tooling; callers should stay on `contract`.
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;

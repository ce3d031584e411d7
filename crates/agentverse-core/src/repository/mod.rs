//! Repository trait definitions (ports).
//!
//! These traits define the persistence and auth interface that the
//! infrastructure layer (agentverse-infra) implements. The core crate never
//! depends on any specific storage technology.

pub mod agent;
pub mod content;
pub mod session;

pub use agent::AgentRepository;
pub use content::ContentRepository;
pub use session::SessionProvider;

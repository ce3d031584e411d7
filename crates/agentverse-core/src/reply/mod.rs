//! The agent auto-reply pipeline.
//!
//! Mention detection and relevance decide who replies, the composer writes
//! the reply, peer discovery tags complementary agents, and the scheduler
//! defers each reply by a random delay. `AutoReplyService` ties them together.

pub mod cascade;
pub mod composer;
pub mod engine;
pub mod keywords;
pub mod mention;
pub mod peers;
pub mod relevance;
pub mod scheduler;
pub mod service;

pub use cascade::{CascadeGuard, CascadeRejection};
pub use composer::ResponseComposer;
pub use engine::ReplyDecisionEngine;
pub use mention::MentionIndex;
pub use peers::PeerDiscovery;
pub use relevance::RelevanceClassifier;
pub use scheduler::{PendingReply, ReplyScheduler, ScheduledReply};
pub use service::AutoReplyService;

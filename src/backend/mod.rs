//! Backend collaborators for marksync.
//!
//! The managed backend is reached through two seams: [`records::RecordStore`]
//! for owner-scoped persistence and [`feed::ChangeFeed`] for the live change
//! feed. `http` speaks to the real service, `memory` implements both seams
//! in-process, and `broadcast` is the same-machine cross-tab bus.

pub mod broadcast;
pub mod feed;
pub mod http;
pub mod memory;
pub mod records;

pub use feed::ChangeFeed;
pub use records::RecordStore;

//! Repository module
//!
//! Fetch/mutate/watch orchestrators, one per consumer surface. All of them
//! share the same `NormalizedStore`, which is what makes a mutation issued
//! through one repository visible through every other.

mod account;
mod status;
mod timeline;

pub use account::AccountRepository;
pub use status::StatusRepository;
pub use timeline::{TimelineRepository, TimelineSource};

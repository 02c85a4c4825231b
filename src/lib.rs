//! Single-flight audio transcription queue.
//!
//! Tasks move Draft → Pending → Transcribing → Done/Error; at most one
//! transcription is in flight system-wide, enforced by conditional state
//! transitions at the storage layer rather than an in-process lock.

pub mod application;
pub mod domain;
pub mod infrastructure;

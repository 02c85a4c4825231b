pub mod audio;
pub mod observability;
pub mod persistence;
pub mod scheduling;
pub mod storage;

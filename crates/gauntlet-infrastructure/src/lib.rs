//! Gauntlet infrastructure: persistence implementations of the core's
//! memory-collaborator contracts.
//!
//! TOML file repositories for durable storage, in-memory repositories for
//! tests and embedded use, and unified path management.

pub mod dto;
pub mod memory_repository;
pub mod paths;
pub mod toml_profile_repository;
pub mod toml_record_repository;

pub use memory_repository::{InMemoryProfileRepository, InMemoryRecordRepository};
pub use paths::{GauntletPaths, PathError};
pub use toml_profile_repository::TomlProfileRepository;
pub use toml_record_repository::TomlRecordRepository;

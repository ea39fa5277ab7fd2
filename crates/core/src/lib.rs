//! Core lifecycle logic for Driftbox.
//!
//! This crate contains the ephemeral file lifecycle with ZERO web dependencies.
//! The object store is the system of record; this crate owns only the policy
//! (what counts as expired) and the orchestration (which store calls are
//! issued, and how their failures are handled).
//!
//! # Modules
//!
//! - `storage` - Object store adapter (OpenDAL and in-memory backends)
//! - `space` - Key scheme, expiry, listing, stats, cleanup and space clearing
//! - `clock` - Injectable time source

pub mod clock;
pub mod space;
pub mod storage;

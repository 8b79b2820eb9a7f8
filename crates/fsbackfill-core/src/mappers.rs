//! Hand-written per-collection mappers
//!
//! To backfill another collection, add a module here exposing a
//! `mapping()` and register it in `Registry::standard`.

pub mod users;

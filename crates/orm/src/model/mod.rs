//! Model System
//!
//! - `core_trait`: the [`Record`] trait a persisted type implements
//! - `instance`: [`Model`], the per-operation view over a record
//! - `naming`: table name convention

pub mod core_trait;
pub mod instance;
pub mod naming;

pub use core_trait::{Field, Record};
pub use instance::Model;

//! Persistence for the scheduling service.
//!
//! Every write path for users, appointments and the weekly availability
//! template goes through [`SchedulingStore`]. Two implementations exist: an
//! in-process store used for development and tests, and a PostgreSQL store.

pub mod database;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use postgres::PgSchedulingStore;
pub use store::SchedulingStore;

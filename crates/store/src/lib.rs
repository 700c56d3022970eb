//! Store implementations for the order service.
//!
//! Two implementations of the domain's `OrderStore`/`CustomerStore` ports:
//! - [`InMemoryStore`] for tests and local runs
//! - [`PostgresStore`] backed by sqlx with workspace migrations

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

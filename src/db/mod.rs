pub mod pool;
pub mod postgres;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use pool::{create_pool, run_migrations};
pub use postgres::PgStore;
pub use store::{SubscriptionStore, UserStore};

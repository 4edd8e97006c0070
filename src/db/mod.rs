pub mod memory;
pub mod pool;
pub mod postgres;
pub mod queries;
pub mod repository;

pub use memory::MemoryRepository;
pub use pool::{create_pool, run_migrations};
pub use postgres::PgRepository;
pub use repository::Repository;

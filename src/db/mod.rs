//! Database layer
//!
//! SQLite (default) or MySQL behind one [`DatabasePool`] handle, embedded
//! migrations, static table descriptors and the repositories built on them.
//!
//! ```ignore
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! let tables = SqlxTableRepository::boxed(pool.clone());
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod schema;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

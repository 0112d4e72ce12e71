//! Connection source boundary.
//!
//! The core never owns pooling logic: it borrows one connection per
//! execution from a [`ConnectionSource`] and the pooled object returns to its
//! pool when dropped, which guarantees release on every exit path, including
//! abandoned result iteration.

use crate::error::{Error, QueryResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// A connection borrowed for the duration of one execution.
///
/// Dropping it returns the connection to the pool.
pub type PooledConnection = deadpool_postgres::Object;

/// Supplier of live store connections.
///
/// `acquire` is the only crossing point between the query layer and physical
/// storage; it fails with [`Error::ConnectionUnavailable`] when the source is
/// exhausted or timed out.
pub trait ConnectionSource: Send + Sync {
    fn acquire(&self) -> impl Future<Output = QueryResult<PooledConnection>> + Send;
}

/// A [`ConnectionSource`] backed by a deadpool Postgres pool.
#[derive(Clone)]
pub struct PgSource {
    pool: Pool,
}

impl PgSource {
    /// Wrap an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (for host-side tuning/metrics).
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

impl ConnectionSource for PgSource {
    async fn acquire(&self) -> QueryResult<PooledConnection> {
        self.pool.get().await.map_err(Error::from)
    }
}

/// Create a connection source from a database URL.
///
/// Uses `NoTls` and small defaults, suitable for local/dev. For production
/// prefer [`create_source_with_tls`] or [`create_source_with_manager_config`].
pub fn create_source(database_url: &str) -> QueryResult<PgSource> {
    create_source_with_config(database_url, 16)
}

/// Create a connection source with a custom pool size.
pub fn create_source_with_config(database_url: &str, max_size: usize) -> QueryResult<PgSource> {
    create_source_with_manager_config(database_url, NoTls, default_manager_config(), |builder| {
        builder.max_size(max_size)
    })
}

/// Create a connection source using a custom TLS connector.
pub fn create_source_with_tls<T>(database_url: &str, tls: T) -> QueryResult<PgSource>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    create_source_with_manager_config(database_url, tls, default_manager_config(), |b| {
        b.max_size(16)
    })
}

/// Create a connection source with injected manager config and pool tuning.
pub fn create_source_with_manager_config<T>(
    database_url: &str,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> QueryResult<PgSource>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| Error::ConnectionUnavailable(e.to_string()))?;

    let mgr = Manager::from_config(pg_config, tls, manager_config);
    let pool = configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| Error::ConnectionUnavailable(e.to_string()))?;
    Ok(PgSource::new(pool))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}

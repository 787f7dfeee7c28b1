//! # Database Pool Management
//!
//! Connection pool creation and startup connection policy for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  API startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  connect_with_fallback(primary, fallback, RetryPolicy)                 │
//! │       │                                                                 │
//! │       ├── primary: attempt 1 ✗ ── sleep(delay) ── attempt 2 ✗ ...      │
//! │       │                                                                 │
//! │       └── fallback (local file) ✓                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ Database is Clone; every request task gets a handle            │
//! │       ▼                                                                 │
//! │  handler ──► db.invoices().save(...) ──► pool.begin() ──► commit       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode + Busy Timeout
//! Readers don't block writers and writers don't block readers. Concurrent
//! writers queue on the busy timeout instead of failing with `SQLITE_BUSY`,
//! which is what keeps the code counter and stock deductions safe under load.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::code_format::CodeFormatRepository;
use crate::repository::invoice::InvoiceRepository;
use crate::repository::party::{CustomerRepository, SupplierRepository};
use crate::repository::product::ProductRepository;
use crate::repository::purchase_order::PurchaseOrderRepository;
use crate::repository::report::ReportRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/shopfront/shopfront.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// sqlx connection URL (`sqlite://path?mode=rwc`, `sqlite::memory:`).
    pub url: String,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Pool acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections
    /// forever (required for in-memory databases).
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// How long a writer waits for the SQLite write lock.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Configuration for a database file, created if it doesn't exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_url(format!("sqlite://{}?mode=rwc", path.as_ref().display()))
    }

    /// Configuration from a connection string.
    ///
    /// Accepts a full `sqlite:` URL or a bare file path.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite:") {
            Self::with_url(url.to_string())
        } else {
            Self::new(url)
        }
    }

    fn with_url(url: String) -> Self {
        DbConfig {
            url,
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the pool acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the SQLite busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Every in-memory connection is its own database, so the pool is pinned
    /// to a single connection that is never reaped. Never call pool-based
    /// methods while holding a transaction on this config: the second
    /// acquire would wait on the only connection.
    pub fn in_memory() -> Self {
        DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

/// Bounded retry for the primary connection at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts against the primary, at least 1.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Which configured database the pool ended up connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOrigin {
    Primary,
    Fallback,
}

impl fmt::Display for ConnectionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionOrigin::Primary => f.write_str("primary"),
            ConnectionOrigin::Fallback => f.write_str("fallback"),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Holds the one `SqlitePool` of the process. Cloning is cheap (the pool is
/// reference counted); every repository receives its own clone, nothing is
/// stored in globals.
///
/// ## Usage in Handlers
/// ```rust,ignore
/// async fn get_product(
///     State(state): State<AppState>,
///     Path(sku): Path<String>,
/// ) -> ApiResult<Json<Product>> {
///     Ok(Json(state.db.products().get_by_sku(&sku).await?))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    origin: ConnectionOrigin,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Parses the URL, creating the file if it doesn't exist
    /// 2. Configures SQLite: WAL, NORMAL synchronous, foreign keys, busy timeout
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        Self::open(config, ConnectionOrigin::Primary).await
    }

    /// Connects to `primary`, retrying per `retry`, then falls back to
    /// `fallback` if every primary attempt failed.
    ///
    /// ## Returns
    /// * `Ok(Database)` - connected; see [`Database::origin`] for which one
    /// * `Err(DbError::ConnectionFailed)` - primary exhausted and no fallback
    ///   (or the fallback failed too)
    pub async fn connect_with_fallback(
        primary: DbConfig,
        fallback: Option<DbConfig>,
        retry: RetryPolicy,
    ) -> DbResult<Self> {
        let attempts = retry.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match Self::open(primary.clone(), ConnectionOrigin::Primary).await {
                Ok(db) => return Ok(db),
                Err(e) => {
                    warn!(
                        attempt,
                        attempts,
                        error = %e,
                        "Primary database connection failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(retry.delay).await;
                    }
                }
            }
        }

        match fallback {
            Some(config) => {
                warn!(url = %config.url, "Falling back to local database");
                Self::open(config, ConnectionOrigin::Fallback).await
            }
            None => Err(last_error.unwrap_or_else(|| {
                DbError::ConnectionFailed("no connection attempt made".to_string())
            })),
        }
    }

    async fn open(config: DbConfig, origin: ConnectionOrigin) -> DbResult<Self> {
        info!(url = %config.url, %origin, "Initializing database connection");

        let connect_options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout);
        if config.idle_timeout.is_none() {
            pool_options = pool_options.max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            %origin,
            "Database pool created"
        );

        let db = Database { pool, origin };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether this handle is on the primary or the fallback database.
    pub fn origin(&self) -> ConnectionOrigin {
        self.origin
    }

    pub fn code_formats(&self) -> CodeFormatRepository {
        CodeFormatRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let products = db.products().search("beans", 20).await?;
    /// ```
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn purchase_orders(&self) -> PurchaseOrderRepository {
        PurchaseOrderRepository::new(self.pool.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
        assert_eq!(db.origin(), ConnectionOrigin::Primary);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.url, "sqlite:///tmp/test.db?mode=rwc");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_from_url_accepts_path_or_url() {
        assert_eq!(DbConfig::from_url("sqlite::memory:").url, "sqlite::memory:");
        assert_eq!(
            DbConfig::from_url("data/shop.db").url,
            "sqlite://data/shop.db?mode=rwc"
        );
    }

    #[tokio::test]
    async fn test_falls_back_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so the primary can never open.
        let primary = DbConfig::new(dir.path().join("missing/dir/primary.db"))
            .connect_timeout(Duration::from_secs(1));
        let fallback = DbConfig::new(dir.path().join("fallback.db"));

        let retry = RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(10),
        };
        let db = Database::connect_with_fallback(primary, Some(fallback), retry)
            .await
            .unwrap();

        assert_eq!(db.origin(), ConnectionOrigin::Fallback);
        assert!(db.health_check().await);
        assert!(dir.path().join("fallback.db").exists());
    }

    #[tokio::test]
    async fn test_no_fallback_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let primary = DbConfig::new(dir.path().join("missing/primary.db"))
            .connect_timeout(Duration::from_secs(1));

        let retry = RetryPolicy {
            attempts: 1,
            delay: Duration::from_millis(1),
        };
        let err = Database::connect_with_fallback(primary, None, retry)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}

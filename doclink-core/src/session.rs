//! Connection lifecycle and database binding.
//!
//! A [`Session`] wraps a [`StoreClient`] and moves through the following states:
//!
//! ```text
//! Unconnected --open--> Connected <--health_check--> Healthy
//!      \                    |                           |
//!       `-------------------+-----------close-----------+--> Closed
//! ```
//!
//! A successful [`Session::health_check`] binds a handle to the configured database;
//! a failed one clears it. Collection accessors snapshot the binding once at the start of
//! every operation, so a concurrent health-check failure never leaves one operation half
//! bound and half unbound.
//!
//! # Example
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryClient};
//!
//! let session = Session::<InMemoryClient>::connect(SessionConfig::new("memory://", "app")).await?;
//! let ctx = session.context();
//!
//! session.open(&ctx).await?;
//! session.health_check(&ctx).await?;
//!
//! let guilds = session.collection("guilds");
//! ```

use mea::rwlock::RwLock;
use std::{fmt, sync::Arc};

use crate::{
    backend::StoreClient,
    collection::Collection,
    config::SessionConfig,
    context::Context,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Observable lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The client is constructed but no handshake happened yet.
    Unconnected,
    /// The handshake succeeded, but the last health check did not (or none ran yet).
    Connected,
    /// The last health check succeeded and a database handle is bound.
    Healthy,
    /// The session was closed. This state is terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unconnected => write!(f, "unconnected"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Healthy => write!(f, "healthy"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unconnected,
    Connected,
    Closed,
}

struct Binding<D> {
    phase: Phase,
    // Present iff the most recent health check succeeded.
    database: Option<Arc<D>>,
}

/// A connection to a document store plus, once healthy, a bound database handle.
///
/// `Session` is `Send + Sync`; share it between tasks with an `Arc`.
pub struct Session<C: StoreClient> {
    client: C,
    config: SessionConfig,
    binding: RwLock<Binding<C::Database>>,
}

impl<C: StoreClient> Session<C> {
    /// Constructs the store client from `config.uri`.
    ///
    /// No round trip is made; call [`Session::open`] next.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Configuration`] if the connection string is malformed or
    /// the client cannot be constructed.
    pub async fn connect(config: SessionConfig) -> DocumentStoreResult<Self> {
        let client = C::from_uri(&config.uri)
            .await
            .map_err(|source| DocumentStoreError::Configuration { source })?;

        tracing::debug!(database = %config.database, "store client constructed");

        Ok(Self::with_client(client, config))
    }

    /// Wraps an already constructed client.
    pub fn with_client(client: C, config: SessionConfig) -> Self {
        Self {
            client,
            config,
            binding: RwLock::new(Binding {
                phase: Phase::Unconnected,
                database: None,
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the name of the database bound by a successful health check.
    pub fn database_name(&self) -> &str {
        &self.config.database
    }

    /// Returns a fresh context carrying the configured default operation timeout.
    pub fn context(&self) -> Context {
        match self.config.operation_timeout_duration() {
            Some(timeout) => Context::new().with_timeout(timeout),
            None => Context::new(),
        }
    }

    pub async fn state(&self) -> SessionState {
        let binding = self.binding.read().await;

        match (binding.phase, &binding.database) {
            (Phase::Unconnected, _) => SessionState::Unconnected,
            (Phase::Closed, _) => SessionState::Closed,
            (Phase::Connected, Some(_)) => SessionState::Healthy,
            (Phase::Connected, None) => SessionState::Connected,
        }
    }

    pub async fn is_healthy(&self) -> bool {
        self.state().await == SessionState::Healthy
    }

    /// Performs the network handshake.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotReady`] if the session is closed
    /// - [`DocumentStoreError::Connection`] on network, auth, or protocol failure
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn open(&self, ctx: &Context) -> DocumentStoreResult<()> {
        const OP: &str = "open";

        if self.binding.read().await.phase == Phase::Closed {
            return Err(DocumentStoreError::NotReady { op: OP });
        }

        ctx.run(OP, self.client.connect())
            .await?
            .map_err(|source| DocumentStoreError::Connection { op: OP, source })?;

        let mut binding = self.binding.write().await;
        if binding.phase == Phase::Closed {
            return Err(DocumentStoreError::NotReady { op: OP });
        }
        binding.phase = Phase::Connected;

        tracing::info!(database = %self.config.database, "session opened");

        Ok(())
    }

    /// Tears down the connection. The session is `Closed` afterwards whatever the outcome.
    ///
    /// Treat a failure as best-effort cleanup: log it, but it need not be fatal.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::Connection`] if the underlying teardown fails
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn close(&self, ctx: &Context) -> DocumentStoreResult<()> {
        const OP: &str = "close";

        let previous = {
            let mut binding = self.binding.write().await;
            binding.database = None;
            std::mem::replace(&mut binding.phase, Phase::Closed)
        };

        if previous == Phase::Connected {
            ctx.run(OP, self.client.disconnect())
                .await?
                .map_err(|source| DocumentStoreError::Connection { op: OP, source })?;
        }

        tracing::info!(database = %self.config.database, "session closed");

        Ok(())
    }

    /// Probes the store and, on success, binds the configured database.
    ///
    /// On failure any previously bound handle is cleared before the error is returned, so
    /// collection accessors fail with [`DocumentStoreError::NotReady`] until a later health
    /// check succeeds.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotReady`] if the session was never opened or is closed
    /// - [`DocumentStoreError::Connection`] if the probe fails
    /// - [`DocumentStoreError::Cancelled`] if `ctx` finishes first
    pub async fn health_check(&self, ctx: &Context) -> DocumentStoreResult<()> {
        const OP: &str = "health_check";

        if self.binding.read().await.phase != Phase::Connected {
            return Err(DocumentStoreError::NotReady { op: OP });
        }

        let probe = match ctx.run(OP, self.client.ping()).await {
            Ok(result) => result.map_err(|source| DocumentStoreError::Connection { op: OP, source }),
            Err(err) => Err(err),
        };

        let mut binding = self.binding.write().await;

        if let Err(err) = probe {
            if binding.database.take().is_some() {
                tracing::warn!(database = %self.config.database, error = %err, "health check failed, database unbound");
            }
            return Err(err);
        }

        if binding.phase != Phase::Connected {
            return Err(DocumentStoreError::NotReady { op: OP });
        }

        binding.database = Some(Arc::new(self.client.database(&self.config.database)));
        tracing::debug!(database = %self.config.database, "health check passed, database bound");

        Ok(())
    }

    /// Returns an accessor for the named collection of the bound database.
    ///
    /// The name is not validated; the binding is checked when an operation runs.
    pub fn collection(&self, name: impl Into<String>) -> Collection<'_, C> {
        Collection::new(name.into(), self)
    }

    /// Snapshots the bound database handle without any I/O.
    pub(crate) async fn bound_database(&self, op: &'static str) -> DocumentStoreResult<Arc<C::Database>> {
        self.binding
            .read()
            .await
            .database
            .clone()
            .ok_or(DocumentStoreError::NotReady { op })
    }
}

impl<C: StoreClient> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

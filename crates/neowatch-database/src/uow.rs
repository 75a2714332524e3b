//! Unit-of-work transaction scope.
//!
//! A [`UnitOfWork`] owns exactly one database transaction. Repositories
//! handed out by [`UnitOfWork::repository`] all run on that transaction, so
//! every write staged inside the scope becomes durable together on
//! [`UnitOfWork::commit`] or disappears together otherwise. Dropping an
//! uncommitted scope rolls the transaction back.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Transaction};

use neowatch_core::error::{AppError, ErrorKind};
use neowatch_core::observe::{EventObserver, TracingObserver};
use neowatch_core::result::AppResult;
use neowatch_core::types::Entity;

use crate::repository::Repository;

/// One transactional scope over the store.
pub struct UnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
    observer: Arc<dyn EventObserver>,
    label: String,
}

impl UnitOfWork {
    /// Open a scope with the default tracing observer.
    pub async fn begin(pool: &PgPool, label: impl Into<String>) -> AppResult<Self> {
        Self::begin_with_observer(pool, label, Arc::new(TracingObserver)).await
    }

    /// Open a scope, starting a transaction on the pool.
    pub async fn begin_with_observer(
        pool: &PgPool,
        label: impl Into<String>,
        observer: Arc<dyn EventObserver>,
    ) -> AppResult<Self> {
        let tx = pool.begin().await?;
        Ok(Self {
            tx: Some(tx),
            observer,
            label: label.into(),
        })
    }

    /// A repository for `E`, bound to this scope's transaction.
    ///
    /// Handles borrow the scope mutably, so they are used one at a time;
    /// any number may be created over the scope's lifetime and all of them
    /// see the same staged state.
    pub fn repository<E: Entity>(&mut self) -> AppResult<Repository<'_, E>> {
        match self.tx.as_deref_mut() {
            Some(conn) => Ok(Repository::new(conn)),
            None => Err(AppError::transaction(format!(
                "scope '{}' is already finished",
                self.label
            ))),
        }
    }

    /// Make every write staged in this scope durable.
    ///
    /// A commit the store rejects (e.g. a deferred constraint) leaves the
    /// scope rolled back and surfaces as a transaction error.
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self.tx.take().ok_or_else(|| {
            AppError::transaction(format!("scope '{}' is already finished", self.label))
        })?;
        match tx.commit().await {
            Ok(()) => {
                self.observer.on_commit(&self.label);
                Ok(())
            }
            Err(e) => {
                self.observer.on_rollback(&self.label);
                Err(AppError::with_source(
                    ErrorKind::Transaction,
                    format!("commit of scope '{}' failed", self.label),
                    e,
                ))
            }
        }
    }

    /// Discard every write staged in this scope.
    pub async fn rollback(mut self) -> AppResult<()> {
        let tx = self.tx.take().ok_or_else(|| {
            AppError::transaction(format!("scope '{}' is already finished", self.label))
        })?;
        tx.rollback().await?;
        self.observer.on_rollback(&self.label);
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // An unfinished transaction rolls back when sqlx drops it; surface
        // that through the observer so abandoned scopes are visible.
        if self.tx.is_some() {
            self.observer.on_rollback(&self.label);
        }
    }
}

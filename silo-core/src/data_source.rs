use crate::{
    DbError, ExecResult, Operation, Output, Params, RecordDescriptor, Statement, TxSession, Value,
    executor::{self, ExecContext},
};
use anyhow::bail;
use futures::{FutureExt, future::BoxFuture};
use parking_lot::RwLock;
use sqlx::AnyPool;
use std::{
    any::Any,
    collections::HashMap,
    panic::AssertUnwindSafe,
    sync::Arc,
};

/// Custom scalar converter, consulted by out-of-core dynamic statement
/// construction.
pub type Converter = Arc<dyn Fn(Value) -> crate::Result<Value> + Send + Sync>;

/// Dynamic SQL builder: turns a call argument into SQL text plus positional
/// values. Registered by name, consulted out of core.
pub type DynamicBuilder = Arc<dyn Fn(&Params) -> crate::Result<(String, Vec<Value>)> + Send + Sync>;

/// Immutable compiled state of one data source: the pool plus every
/// compiled statement. Published atomically behind the handle; callers
/// holding an older `Arc` finish their work against the state they started
/// with.
pub(crate) struct Core {
    pub(crate) pool: AnyPool,
    pub(crate) statements: HashMap<String, Arc<Statement>>,
}

impl Core {
    pub(crate) fn statement(&self, id: &str) -> Result<&Statement, DbError> {
        self.statements
            .get(id)
            .map(Arc::as_ref)
            .ok_or_else(|| DbError::NoStatement { id: id.to_owned() })
    }
}

/// A named data source: the public CRUD surface plus the registration hooks
/// that must precede startup. Handles are created by the registry, possibly
/// before the definition documents are loaded; `start` publishes the
/// compiled state into the existing handle, so references obtained early
/// stay valid.
pub struct DataSource {
    name: String,
    core: RwLock<Option<Arc<Core>>>,
    records: RwLock<HashMap<String, Arc<RecordDescriptor>>>,
    converters: RwLock<HashMap<String, Converter>>,
    builders: RwLock<HashMap<String, DynamicBuilder>>,
}

impl DataSource {
    pub(crate) fn new(name: impl Into<String>) -> DataSource {
        DataSource {
            name: name.into(),
            core: RwLock::new(None),
            records: RwLock::new(HashMap::new()),
            converters: RwLock::new(HashMap::new()),
            builders: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn publish(&self, core: Arc<Core>) {
        *self.core.write() = Some(core);
    }

    fn core(&self) -> Result<Arc<Core>, DbError> {
        self.core.read().clone().ok_or_else(|| DbError::NotInitialized {
            name: self.name.clone(),
        })
    }

    /// Register the binding table for a record type referenced by result
    /// maps or direct-record statements. Must happen before `start`.
    pub fn register_record(&self, descriptor: RecordDescriptor) -> crate::Result<()> {
        let name = descriptor.type_name().to_owned();
        let mut records = self.records.write();
        if records.contains_key(&name) {
            bail!("duplicate record type `{name}` on data source `{}`", self.name);
        }
        records.insert(name, Arc::new(descriptor));
        Ok(())
    }

    pub fn register_converter(&self, name: impl Into<String>, converter: Converter) -> crate::Result<()> {
        let name = name.into();
        let mut converters = self.converters.write();
        if converters.contains_key(&name) {
            bail!("duplicate converter `{name}` on data source `{}`", self.name);
        }
        converters.insert(name, converter);
        Ok(())
    }

    pub fn register_builder(&self, name: impl Into<String>, builder: DynamicBuilder) -> crate::Result<()> {
        let name = name.into();
        let mut builders = self.builders.write();
        if builders.contains_key(&name) {
            bail!("duplicate dynamic builder `{name}` on data source `{}`", self.name);
        }
        builders.insert(name, builder);
        Ok(())
    }

    pub(crate) fn record(&self, name: &str) -> Option<Arc<RecordDescriptor>> {
        self.records.read().get(name).cloned()
    }

    pub fn converter(&self, name: &str) -> Option<Converter> {
        self.converters.read().get(name).cloned()
    }

    pub fn dynamic_builder(&self, name: &str) -> Option<DynamicBuilder> {
        self.builders.read().get(name).cloned()
    }

    /// Run a select expecting zero or one row. Zero rows is `None`, two or
    /// more is [`DbError::TooManyResults`].
    pub async fn query_one(&self, id: &str, params: &Params) -> Result<Option<Output>, DbError> {
        let core = self.core()?;
        guarded(
            id,
            executor::query_one(&core, ExecContext::Pool(&core.pool), id, params),
        )
        .await
    }

    /// Run a select and materialize every row, in order.
    pub async fn query_many(&self, id: &str, params: &Params) -> Result<Vec<Output>, DbError> {
        let core = self.core()?;
        guarded(
            id,
            executor::select_raw(&core, ExecContext::Pool(&core.pool), id, params),
        )
        .await
    }

    /// Run an insert-kind statement and return the generated identity.
    pub async fn insert(&self, id: &str, params: &Params) -> Result<i64, DbError> {
        let core = self.core()?;
        guarded(
            id,
            executor::insert(&core, ExecContext::Pool(&core.pool), id, params),
        )
        .await
    }

    /// Run an update-kind statement and return the affected-row count.
    pub async fn update(&self, id: &str, params: &Params) -> Result<u64, DbError> {
        let core = self.core()?;
        guarded(
            id,
            executor::exec_with_affected_rows(
                &core,
                ExecContext::Pool(&core.pool),
                Operation::Update,
                id,
                params,
            ),
        )
        .await
    }

    /// Run a delete-kind statement and return the affected-row count.
    pub async fn delete(&self, id: &str, params: &Params) -> Result<u64, DbError> {
        let core = self.core()?;
        guarded(
            id,
            executor::exec_with_affected_rows(
                &core,
                ExecContext::Pool(&core.pool),
                Operation::Delete,
                id,
                params,
            ),
        )
        .await
    }

    /// Run any statement without enforcing a kind match and return the raw
    /// driver write-result.
    pub async fn exec(&self, id: &str, params: &Params) -> Result<ExecResult, DbError> {
        let core = self.core()?;
        guarded(
            id,
            executor::raw_exec(&core, ExecContext::Pool(&core.pool), Operation::Generic, id, params),
        )
        .await
    }

    /// Wrap a unit of work in a begin/commit/rollback envelope. The
    /// callback receives a transaction-scoped session with the same public
    /// surface and decides the outcome: `true` commits, `false` rolls back.
    /// A returned error or a panic inside the callback rolls back
    /// unconditionally and becomes the reported outcome; if the rollback
    /// itself fails, both faults are reported together.
    pub async fn do_transaction<F>(&self, work: F) -> Result<(), DbError>
    where
        F: for<'s> FnOnce(&'s mut TxSession) -> BoxFuture<'s, Result<bool, DbError>>,
    {
        let core = self.core()?;
        let tx = core.pool.begin().await.map_err(|e| {
            DbError::internal(format!("cannot begin a transaction: {e}"))
        })?;
        let mut session = TxSession::new(core.clone(), tx);
        match AssertUnwindSafe(work(&mut session)).catch_unwind().await {
            Ok(Ok(true)) => session.commit().await,
            Ok(Ok(false)) => session.rollback().await,
            Ok(Err(error)) => match session.rollback().await {
                Ok(()) => Err(error),
                Err(rollback) => Err(DbError::internal(format!("{error}, {rollback}"))),
            },
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log::error!("recovered panic inside a transaction callback: {message}");
                match session.rollback().await {
                    Ok(()) => Err(DbError::internal(message)),
                    Err(rollback) => Err(DbError::internal(format!("{message}, {rollback}"))),
                }
            }
        }
    }
}

/// Explicit catch-and-convert boundary: no fault inside the compile, bind
/// or driver pipeline crosses a public operation unwrapped.
async fn guarded<T>(
    id: &str,
    work: impl Future<Output = Result<T, DbError>>,
) -> Result<T, DbError> {
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            log::error!("recovered panic while executing statement `{id}`: {message}");
            Err(DbError::internal(message))
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

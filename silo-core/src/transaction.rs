use crate::{
    DbError, ExecResult, Operation, Output, Params,
    data_source::Core,
    executor::{self, ExecContext},
};
use sqlx::{Any, AnyConnection, Transaction};
use std::sync::Arc;

/// Lifecycle of a transaction envelope. `Committed` and `RolledBack` are
/// terminal; a session in a terminal state refuses further statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Open,
    Committed,
    RolledBack,
}

/// Execution context scoped to one open transaction. Exposes the same
/// public surface as the data source, bound to the transaction's
/// connection. Exclusively owned by the callback that received it.
pub struct TxSession {
    core: Arc<Core>,
    tx: Option<Transaction<'static, Any>>,
    state: TxState,
}

impl TxSession {
    pub(crate) fn new(core: Arc<Core>, tx: Transaction<'static, Any>) -> TxSession {
        TxSession {
            core,
            tx: Some(tx),
            state: TxState::Open,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    fn connection(&mut self) -> Result<&mut AnyConnection, DbError> {
        if self.state != TxState::Open {
            return Err(DbError::internal("transaction is no longer open"));
        }
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(DbError::internal("transaction is no longer open")),
        }
    }

    pub async fn query_one(&mut self, id: &str, params: &Params) -> Result<Option<Output>, DbError> {
        let core = self.core.clone();
        executor::query_one(&core, ExecContext::Connection(self.connection()?), id, params).await
    }

    pub async fn query_many(&mut self, id: &str, params: &Params) -> Result<Vec<Output>, DbError> {
        let core = self.core.clone();
        executor::select_raw(&core, ExecContext::Connection(self.connection()?), id, params).await
    }

    pub async fn insert(&mut self, id: &str, params: &Params) -> Result<i64, DbError> {
        let core = self.core.clone();
        executor::insert(&core, ExecContext::Connection(self.connection()?), id, params).await
    }

    pub async fn update(&mut self, id: &str, params: &Params) -> Result<u64, DbError> {
        let core = self.core.clone();
        executor::exec_with_affected_rows(
            &core,
            ExecContext::Connection(self.connection()?),
            Operation::Update,
            id,
            params,
        )
        .await
    }

    pub async fn delete(&mut self, id: &str, params: &Params) -> Result<u64, DbError> {
        let core = self.core.clone();
        executor::exec_with_affected_rows(
            &core,
            ExecContext::Connection(self.connection()?),
            Operation::Delete,
            id,
            params,
        )
        .await
    }

    pub async fn exec(&mut self, id: &str, params: &Params) -> Result<ExecResult, DbError> {
        let core = self.core.clone();
        executor::raw_exec(
            &core,
            ExecContext::Connection(self.connection()?),
            Operation::Generic,
            id,
            params,
        )
        .await
    }

    pub(crate) async fn commit(&mut self) -> Result<(), DbError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::internal("transaction already finished"))?;
        tx.commit()
            .await
            .map_err(|e| DbError::internal(format!("cannot commit the transaction: {e}")))?;
        self.state = TxState::Committed;
        Ok(())
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), DbError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::internal("transaction already finished"))?;
        tx.rollback()
            .await
            .map_err(|e| DbError::internal(format!("cannot roll back the transaction: {e}")))?;
        self.state = TxState::RolledBack;
        Ok(())
    }
}

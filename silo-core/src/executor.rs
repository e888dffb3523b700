use crate::{
    DbError, Operation, Output, Params, Statement, binder, data_source::Core,
};
use futures::StreamExt;
use sqlx::{
    AnyConnection, AnyPool, Column, Executor as _, Row, Statement as _,
    any::AnyArguments,
};

/// Write outcome reported by the driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecResult {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific generated identity, when available.
    pub last_insert_id: Option<i64>,
}

/// Where a statement runs: a pool-acquired connection or the connection
/// owned by an open transaction.
pub(crate) enum ExecContext<'a> {
    Pool(&'a AnyPool),
    Connection(&'a mut AnyConnection),
}

/// Run a statement through the read path and materialize every row with the
/// statement's declared output shape.
pub(crate) async fn select_raw(
    core: &Core,
    ctx: ExecContext<'_>,
    id: &str,
    params: &Params,
) -> Result<Vec<Output>, DbError> {
    let statement = core.statement(id)?;
    let values = binder::bind(id, statement.parameters(), params)?;
    log::debug!(
        "executing statement `{}`. SQL: {}. params: {:?}",
        id,
        statement.sql(),
        values
    );
    match ctx {
        ExecContext::Pool(pool) => {
            let mut connection = pool.acquire().await.map_err(|e| DbError::PrepareFailed {
                id: id.to_owned(),
                source: e,
            })?;
            fetch_rows(statement, &mut connection, &values).await
        }
        ExecContext::Connection(connection) => fetch_rows(statement, connection, &values).await,
    }
}

async fn fetch_rows(
    statement: &Statement,
    connection: &mut AnyConnection,
    values: &[crate::Value],
) -> Result<Vec<Output>, DbError> {
    let id = statement.id();
    let prepared =
        connection
            .prepare(statement.sql())
            .await
            .map_err(|e| DbError::PrepareFailed {
                id: id.to_owned(),
                source: e,
            })?;
    let mut arguments = AnyArguments::default();
    for value in values {
        value
            .add_to(&mut arguments)
            .map_err(|e| DbError::internal(format!("cannot bind parameter: {e}")))?;
    }
    let mut rows = Vec::new();
    {
        let query = prepared.query_with(arguments);
        let mut stream = query.fetch(&mut *connection);
        let mut started = false;
        while let Some(item) = stream.next().await {
            match item {
                Ok(row) => {
                    started = true;
                    rows.push(row);
                }
                Err(source) if !started => {
                    return Err(DbError::QueryFailed {
                        id: id.to_owned(),
                        source,
                    });
                }
                Err(source) => {
                    return Err(DbError::RowIteratorFailed {
                        id: id.to_owned(),
                        source,
                    });
                }
            }
        }
    }
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns = first
        .columns()
        .iter()
        .map(|column| column.name().to_owned())
        .collect::<Vec<_>>();
    // Accessor resolution happens once, before any value is decoded.
    let plan = statement.shape.plan(id, &columns)?;
    rows.iter().map(|row| plan.materialize(id, row)).collect()
}

/// Run a statement through the write path, enforcing the declared operation
/// kind unless either side is generic.
pub(crate) async fn raw_exec(
    core: &Core,
    ctx: ExecContext<'_>,
    requested: Operation,
    id: &str,
    params: &Params,
) -> Result<ExecResult, DbError> {
    let statement = core.statement(id)?;
    if requested != Operation::Generic
        && statement.operation() != Operation::Generic
        && statement.operation() != requested
    {
        return Err(DbError::OperationMismatch {
            id: id.to_owned(),
            declared: statement.operation(),
            requested,
        });
    }
    let values = binder::bind(id, statement.parameters(), params)?;
    log::debug!(
        "executing statement `{}`. SQL: {}. params: {:?}",
        id,
        statement.sql(),
        values
    );
    match ctx {
        ExecContext::Pool(pool) => {
            let mut connection = pool.acquire().await.map_err(|e| DbError::PrepareFailed {
                id: id.to_owned(),
                source: e,
            })?;
            run_exec(statement, &mut connection, &values).await
        }
        ExecContext::Connection(connection) => run_exec(statement, connection, &values).await,
    }
}

async fn run_exec(
    statement: &Statement,
    connection: &mut AnyConnection,
    values: &[crate::Value],
) -> Result<ExecResult, DbError> {
    let id = statement.id();
    let prepared =
        connection
            .prepare(statement.sql())
            .await
            .map_err(|e| DbError::PrepareFailed {
                id: id.to_owned(),
                source: e,
            })?;
    let mut arguments = AnyArguments::default();
    for value in values {
        value
            .add_to(&mut arguments)
            .map_err(|e| DbError::internal(format!("cannot bind parameter: {e}")))?;
    }
    let result = prepared
        .query_with(arguments)
        .execute(&mut *connection)
        .await
        .map_err(|e| DbError::ExecFailed {
            id: id.to_owned(),
            source: e,
        })?;
    Ok(ExecResult {
        rows_affected: result.rows_affected(),
        last_insert_id: result.last_insert_id(),
    })
}

pub(crate) async fn query_one(
    core: &Core,
    ctx: ExecContext<'_>,
    id: &str,
    params: &Params,
) -> Result<Option<Output>, DbError> {
    let mut results = select_raw(core, ctx, id, params).await?;
    match results.len() {
        0 => Ok(None),
        1 => Ok(results.pop()),
        _ => Err(DbError::TooManyResults { id: id.to_owned() }),
    }
}

pub(crate) async fn insert(
    core: &Core,
    ctx: ExecContext<'_>,
    id: &str,
    params: &Params,
) -> Result<i64, DbError> {
    let result = raw_exec(core, ctx, Operation::Insert, id, params).await?;
    result.last_insert_id.ok_or_else(|| DbError::UnknownFault {
        id: id.to_owned(),
        detail: "driver did not report a generated identity".to_owned(),
    })
}

pub(crate) async fn exec_with_affected_rows(
    core: &Core,
    ctx: ExecContext<'_>,
    requested: Operation,
    id: &str,
    params: &Params,
) -> Result<u64, DbError> {
    let result = raw_exec(core, ctx, requested, id, params).await?;
    Ok(result.rows_affected)
}

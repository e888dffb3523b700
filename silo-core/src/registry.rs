use crate::{
    DataSource, Operation, Placeholder, Result, ScalarKind, Statement,
    data_source::Core,
    decode::{MappedColumn, MappedShape, ResultShape},
    definition::{DataSourceDoc, ResultMapDecl, SqlMapDoc, StatementDecl},
    template,
};
use anyhow::{Context, anyhow, bail};
use parking_lot::RwLock;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::{Arc, Once},
};

static DRIVERS: Once = Once::new();

/// Process table of named data-source handles. Handles are created lazily
/// by [`Registry::get`] so record descriptors, converters and dynamic
/// builders can be registered before the definition documents load;
/// [`Registry::start`] then compiles and publishes every data source
/// all-or-nothing.
#[derive(Default)]
pub struct Registry {
    sources: RwLock<HashMap<String, Arc<DataSource>>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Fetch the handle for `name`, creating an unstarted placeholder if it
    /// does not exist yet.
    pub fn get(&self, name: &str) -> Arc<DataSource> {
        let mut sources = self.sources.write();
        sources
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(DataSource::new(name)))
            .clone()
    }

    /// Discover every `db-*.toml` document under `location`, compile each
    /// data source in full and publish it into its handle. Any malformed
    /// definition, duplicate id or unreachable database fails the whole
    /// call; running it again republishes in place without invalidating
    /// outstanding handle references.
    pub async fn start(&self, location: impl AsRef<Path>) -> Result<()> {
        DRIVERS.call_once(install_default_drivers);
        let location = location.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(location).with_context(|| {
            format!(
                "cannot list data source documents under {}",
                location.display()
            )
        })? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if name.starts_with("db-") && name.ends_with(".toml") {
                files.push(path);
            }
        }
        files.sort();
        log::info!(
            "db startup: {} data source document(s) under {}",
            files.len(),
            location.display()
        );
        let mut seen_statements = HashSet::new();
        for file in &files {
            self.load_data_source(location, file, &mut seen_statements)
                .await
                .with_context(|| format!("cannot initialize data source from {}", file.display()))?;
        }
        log::info!("db startup complete");
        Ok(())
    }

    async fn load_data_source(
        &self,
        location: &Path,
        file: &Path,
        seen_statements: &mut HashSet<String>,
    ) -> Result<()> {
        let text = fs::read_to_string(file)?;
        let doc: DataSourceDoc = toml::from_str(&text).context("malformed data source document")?;
        let decl = doc.datasource;
        let handle = self.get(&decl.name);
        let placeholder = Placeholder::for_driver(&decl.driver);

        let mut maps = Vec::with_capacity(decl.sqlmaps.len());
        for resource in &decl.sqlmaps {
            let path = location.join(resource);
            let text = fs::read_to_string(&path)
                .with_context(|| format!("cannot read statement map {}", path.display()))?;
            let map: SqlMapDoc = toml::from_str(&text)
                .with_context(|| format!("malformed statement map {}", path.display()))?;
            maps.push((path, map));
        }

        // Result maps carry data-source scope: a statement may reference a
        // map declared in a sibling document.
        let mut result_maps = HashMap::new();
        for (path, map) in &maps {
            for decl in &map.result_map {
                let shape = compile_result_map(&handle, decl)
                    .with_context(|| format!("in statement map {}", path.display()))?;
                if result_maps.insert(decl.id.clone(), shape).is_some() {
                    bail!("duplicate result map id `{}`", decl.id);
                }
            }
        }

        let mut statements = HashMap::new();
        for (path, map) in &maps {
            let tagged = map
                .select
                .iter()
                .map(|decl| (decl, Operation::Select))
                .chain(map.insert.iter().map(|decl| (decl, Operation::Insert)))
                .chain(map.update.iter().map(|decl| (decl, Operation::Update)))
                .chain(map.delete.iter().map(|decl| (decl, Operation::Delete)))
                .chain(map.statement.iter().map(|decl| (decl, Operation::Generic)));
            for (decl, operation) in tagged {
                let statement =
                    compile_statement(&handle, placeholder, operation, decl, &result_maps)
                        .with_context(|| format!("in statement map {}", path.display()))?;
                if !seen_statements.insert(statement.id.clone()) {
                    bail!("duplicate statement id `{}`", statement.id);
                }
                statements.insert(statement.id.clone(), Arc::new(statement));
            }
        }

        let pool = AnyPoolOptions::new()
            .max_connections(decl.max_open)
            .min_connections(decl.max_idle)
            .connect(&decl.url)
            .await
            .with_context(|| {
                format!("data source `{}` is unreachable at {}", decl.name, decl.url)
            })?;
        log::info!(
            "data source `{}` ready: {} statement(s), {} result map(s)",
            decl.name,
            statements.len(),
            result_maps.len()
        );
        handle.publish(Arc::new(Core { pool, statements }));
        Ok(())
    }
}

fn compile_result_map(handle: &DataSource, decl: &ResultMapDecl) -> Result<Arc<MappedShape>> {
    let record_name = decl.record.trim_start_matches('*');
    let record = handle.record(record_name).ok_or_else(|| {
        anyhow!(
            "result map `{}` references unregistered record type `{record_name}`",
            decl.id
        )
    })?;
    let mut columns = HashMap::new();
    for column in &decl.columns {
        let accessor = record
            .field(&column.field)
            .ok_or_else(|| {
                anyhow!(
                    "result map `{}`: record `{}` has no field `{}`",
                    decl.id,
                    record.type_name(),
                    column.field
                )
            })?
            .clone();
        let kind = match &column.declared_type {
            Some(name) => ScalarKind::from_name(name).ok_or_else(|| {
                anyhow!(
                    "result map `{}`: unknown declared type `{name}` for column `{}`",
                    decl.id,
                    column.column
                )
            })?,
            None => accessor.kind(),
        };
        let nil_value = column
            .nil
            .as_deref()
            .map(|text| kind.parse_literal(text))
            .transpose()
            .with_context(|| {
                format!(
                    "result map `{}`: bad nil sentinel for column `{}`",
                    decl.id, column.column
                )
            })?;
        let previous = columns.insert(
            column.column.clone(),
            MappedColumn {
                accessor,
                kind,
                nil_value,
            },
        );
        if previous.is_some() {
            bail!(
                "result map `{}` declares column `{}` twice",
                decl.id,
                column.column
            );
        }
    }
    Ok(Arc::new(MappedShape { record, columns }))
}

fn compile_statement(
    handle: &DataSource,
    placeholder: Placeholder,
    operation: Operation,
    decl: &StatementDecl,
    result_maps: &HashMap<String, Arc<MappedShape>>,
) -> Result<Statement> {
    if decl.id.is_empty() {
        bail!("statement id must not be empty");
    }
    let raw = decl.sql.trim();
    let inferred = template::infer_operation(raw);
    if operation != inferred {
        log::warn!(
            "statement `{}` is declared as {operation} but its SQL reads as {inferred}",
            decl.id
        );
    }
    let (sql, parameters) = template::standardize(raw, placeholder)?;
    let shape = match (&decl.result_map, &decl.record) {
        (Some(..), Some(..)) => bail!(
            "statement `{}` must declare exactly one of result-map and record",
            decl.id
        ),
        (Some(map_id), None) => ResultShape::Mapped(
            result_maps
                .get(map_id)
                .ok_or_else(|| {
                    anyhow!("statement `{}` references unknown result map `{map_id}`", decl.id)
                })?
                .clone(),
        ),
        (None, Some(record_name)) => {
            let name = record_name.trim_start_matches('*');
            match ScalarKind::from_name(name) {
                Some(kind) => ResultShape::SingleColumn(kind),
                None => ResultShape::Record(handle.record(name).ok_or_else(|| {
                    anyhow!(
                        "statement `{}` references unregistered record type `{name}`",
                        decl.id
                    )
                })?),
            }
        }
        (None, None) => {
            if operation == Operation::Select {
                bail!(
                    "select statement `{}` must declare a result-map or a record",
                    decl.id
                );
            }
            ResultShape::None
        }
    };
    Ok(Statement {
        id: decl.id.clone(),
        operation,
        sql,
        parameters,
        shape,
        builder: decl.builder.clone(),
    })
}

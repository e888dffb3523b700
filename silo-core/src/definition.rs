use serde::Deserialize;

/// Declarative model of a `db-*.toml` data-source document.
///
/// ```toml
/// [datasource]
/// name = "main"
/// driver = "sqlite"
/// url = "sqlite://file:main?mode=memory&cache=shared"
/// max-idle = 2
/// max-open = 10
/// sqlmaps = ["people-sqlmap.toml"]
/// ```
#[derive(Debug, Deserialize)]
pub struct DataSourceDoc {
    pub datasource: DataSourceDecl,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataSourceDecl {
    pub name: String,
    pub driver: String,
    pub url: String,
    #[serde(default = "default_max_idle")]
    pub max_idle: u32,
    #[serde(default = "default_max_open")]
    pub max_open: u32,
    #[serde(default)]
    pub sqlmaps: Vec<String>,
}

fn default_max_idle() -> u32 {
    1
}

fn default_max_open() -> u32 {
    8
}

/// A statement-map document: statement declarations tagged by kind plus
/// result-map declarations, all compiled at startup.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SqlMapDoc {
    #[serde(default)]
    pub select: Vec<StatementDecl>,
    #[serde(default)]
    pub insert: Vec<StatementDecl>,
    #[serde(default)]
    pub update: Vec<StatementDecl>,
    #[serde(default)]
    pub delete: Vec<StatementDecl>,
    /// Statements with no particular kind, e.g. DDL.
    #[serde(default)]
    pub statement: Vec<StatementDecl>,
    #[serde(default)]
    pub result_map: Vec<ResultMapDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StatementDecl {
    pub id: String,
    /// Id of a declared result map; exclusive with `record`.
    #[serde(default)]
    pub result_map: Option<String>,
    /// Record type name for direct field matching, or a scalar type name
    /// for single-column statements. A leading `*` is accepted and ignored.
    #[serde(default)]
    pub record: Option<String>,
    /// Name of a registered dynamic SQL builder, carried for out-of-core
    /// statement construction.
    #[serde(default)]
    pub builder: Option<String>,
    pub sql: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResultMapDecl {
    pub id: String,
    pub record: String,
    #[serde(default)]
    pub columns: Vec<ColumnDecl>,
}

#[derive(Debug, Deserialize)]
pub struct ColumnDecl {
    pub column: String,
    /// Field path on the target record; may traverse nested records.
    pub field: String,
    /// Declared scalar type of the column; defaults to the field's own kind.
    #[serde(default, rename = "type")]
    pub declared_type: Option<String>,
    /// Sentinel literal that materializes as an absent value instead of
    /// itself.
    #[serde(default)]
    pub nil: Option<String>,
}

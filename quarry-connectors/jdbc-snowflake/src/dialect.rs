/// Schema holding Snowflake's own objects, never exposed to users
pub const SYSTEM_SCHEMA: &str = "SYSTEM";

// @see java.sql.Types
pub const JDBC_TYPE_BIGINT: i32 = -5;
pub const JDBC_TYPE_NUMERIC: i32 = 2;
pub const JDBC_TYPE_DECIMAL: i32 = 3;

/// How the planner discovers the columns of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFetchStrategy {
    /// Read the driver's catalog metadata
    CatalogQuery,
    /// Prepare a query which returns no rows and read its result metadata
    PreparedStatement,
}

/// A fully qualified table in the remote database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub database: String,
    pub schema: Option<String>,
    pub table: String,
}

impl TableName {
    pub fn new(
        database: impl Into<String>,
        schema: Option<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema,
            table: table.into(),
        }
    }

    /// The quoted, dot separated name used in queries
    pub fn to_sql(&self) -> String {
        [Some(&self.database), self.schema.as_ref(), Some(&self.table)]
            .into_iter()
            .flatten()
            .map(|id| quote_identifier(id))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Quotes an identifier so it is matched case-sensitively
pub fn quote_identifier(id: &str) -> String {
    // @see https://docs.snowflake.com/en/sql-reference/identifiers-syntax#double-quoted-identifiers
    format!("\"{}\"", id.replace('"', "\"\""))
}

impl SchemaFetchStrategy {
    /// The query prepared to read the columns of a table, if the strategy uses one
    pub fn column_metadata_query(&self, table: &TableName) -> Option<String> {
        match self {
            SchemaFetchStrategy::CatalogQuery => None,
            SchemaFetchStrategy::PreparedStatement => {
                Some(format!("SELECT * FROM {} WHERE 1 = 0", table.to_sql()))
            }
        }
    }
}

/// A column type as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// One of the java.sql.Types codes
    pub jdbc_type: i32,
    pub type_name: String,
    pub precision: u32,
    pub scale: i32,
}

impl ColumnType {
    pub fn new(jdbc_type: i32, type_name: impl Into<String>, precision: u32, scale: i32) -> Self {
        Self {
            jdbc_type,
            type_name: type_name.into(),
            precision,
            scale,
        }
    }

    fn is_integer_as_decimal(&self) -> bool {
        matches!(self.jdbc_type, JDBC_TYPE_DECIMAL | JDBC_TYPE_NUMERIC)
            && self.precision == 38
            && self.scale == 0
    }
}

/// Behaviour the planner applies on top of the generic JDBC dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectOverrides {
    /// Snowflake reports every integer column as NUMBER(38, 0)
    pub integer_precision_workaround: bool,
    pub supports_nested_aggregations: bool,
    pub schema_fetch: SchemaFetchStrategy,
    pub hidden_schemas: &'static [&'static str],
}

pub const SNOWFLAKE_DIALECT: DialectOverrides = DialectOverrides {
    integer_precision_workaround: true,
    supports_nested_aggregations: false,
    schema_fetch: SchemaFetchStrategy::PreparedStatement,
    hidden_schemas: &[SYSTEM_SCHEMA],
};

impl DialectOverrides {
    /// Whether an aggregate may be pushed down when it contains another aggregate
    pub fn supports_nested_aggregations(&self) -> bool {
        self.supports_nested_aggregations
    }

    pub fn hidden_schemas(&self) -> &'static [&'static str] {
        self.hidden_schemas
    }

    /// Schema names are compared case-insensitively as unquoted
    /// identifiers are folded to upper case
    pub fn is_hidden_schema(&self, schema: &str) -> bool {
        self.hidden_schemas
            .iter()
            .any(|hidden| hidden.eq_ignore_ascii_case(schema))
    }

    /// Maps a column type read through the catalog to the type exposed to the planner
    pub fn normalize_column_type(&self, col: ColumnType) -> ColumnType {
        if self.integer_precision_workaround && col.is_integer_as_decimal() {
            return ColumnType {
                jdbc_type: JDBC_TYPE_BIGINT,
                type_name: "BIGINT".into(),
                ..col
            };
        }

        col
    }
}

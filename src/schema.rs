//! Schema actions - typed descriptions of DDL mutations
//!
//! An [`Action`] is a closed, exhaustively-matchable description of one
//! schema change. Drivers render actions to SQL; the step layer checks them
//! against the live catalog before executing so that re-application is safe.

use serde::{Deserialize, Serialize};

/// Column types the migration system can describe.
///
/// Deliberately small: wide enough to express add/remove operations, not a
/// general type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    VarChar(u32),
    Integer,
    BigInt,
    Boolean,
    Timestamp,
    Uuid,
}

impl ColumnType {
    /// Canonical SQL rendering. Inspectors normalize catalog types to this
    /// same form, so equality on the rendered string is the conflict check.
    pub fn to_sql(&self) -> String {
        match self {
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::VarChar(len) => format!("VARCHAR({})", len),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Timestamp => "TIMESTAMPTZ".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
        }
    }
}

/// Definition of one column in an add-column or create-table action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn nullable(name: &str, ty: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            nullable: true,
        }
    }

    pub fn not_null(name: &str, ty: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            nullable: false,
        }
    }

    // Identifiers are quoted so the store preserves their exact case.
    // Unquoted, Postgres folds `videoURL` to `videourl`, the inspector then
    // reports a name the existence checks cannot match, and re-application
    // stops being safe.
    fn to_sql(&self) -> String {
        let constraint = if self.nullable { "" } else { " NOT NULL" };
        format!("\"{}\" {}{}", self.name, self.ty.to_sql(), constraint)
    }
}

/// What the inspector reports about one existing column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Canonical SQL type, same form as [`ColumnType::to_sql`].
    pub data_type: String,
    pub nullable: bool,
}

impl ColumnInfo {
    /// Whether an existing column satisfies a spec from an add action.
    pub fn matches(&self, spec: &ColumnSpec) -> bool {
        self.data_type == spec.ty.to_sql() && self.nullable == spec.nullable
    }
}

impl From<&ColumnSpec> for ColumnInfo {
    fn from(spec: &ColumnSpec) -> Self {
        Self {
            data_type: spec.ty.to_sql(),
            nullable: spec.nullable,
        }
    }
}

/// One schema mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    AddColumn { table: String, column: ColumnSpec },
    RemoveColumn { table: String, column: String },
    CreateTable { table: String, columns: Vec<ColumnSpec> },
    DropTable { table: String },
}

impl Action {
    pub fn add_column(table: &str, column: ColumnSpec) -> Self {
        Action::AddColumn {
            table: table.to_string(),
            column,
        }
    }

    pub fn remove_column(table: &str, column: &str) -> Self {
        Action::RemoveColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn create_table(table: &str, columns: Vec<ColumnSpec>) -> Self {
        Action::CreateTable {
            table: table.to_string(),
            columns,
        }
    }

    pub fn drop_table(table: &str) -> Self {
        Action::DropTable {
            table: table.to_string(),
        }
    }

    /// The table this action targets.
    pub fn table(&self) -> &str {
        match self {
            Action::AddColumn { table, .. }
            | Action::RemoveColumn { table, .. }
            | Action::CreateTable { table, .. }
            | Action::DropTable { table } => table,
        }
    }

    /// Render to a single Postgres DDL statement. All identifiers are
    /// quoted; see [`ColumnSpec`] rendering for why.
    pub fn to_sql(&self) -> String {
        match self {
            Action::AddColumn { table, column } => {
                format!("ALTER TABLE \"{}\" ADD COLUMN {};", table, column.to_sql())
            }
            Action::RemoveColumn { table, column } => {
                format!("ALTER TABLE \"{}\" DROP COLUMN \"{}\";", table, column)
            }
            Action::CreateTable { table, columns } => {
                let cols: Vec<String> = columns.iter().map(|c| c.to_sql()).collect();
                format!(
                    "CREATE TABLE \"{}\" (\n    {}\n);",
                    table,
                    cols.join(",\n    ")
                )
            }
            Action::DropTable { table } => format!("DROP TABLE \"{}\";", table),
        }
    }

    /// Short human-readable description for log lines and error context.
    pub fn describe(&self) -> String {
        match self {
            Action::AddColumn { table, column } => {
                format!("add column {} to {}", column.name, table)
            }
            Action::RemoveColumn { table, column } => {
                format!("remove column {} from {}", column, table)
            }
            Action::CreateTable { table, .. } => format!("create table {}", table),
            Action::DropTable { table } => format!("drop table {}", table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_column_sql() {
        let action = Action::add_column(
            "episodes",
            ColumnSpec::nullable("videoURL", ColumnType::Text),
        );

        let sql = action.to_sql();
        assert_eq!(sql, "ALTER TABLE \"episodes\" ADD COLUMN \"videoURL\" TEXT;");
    }

    #[test]
    fn test_not_null_column_sql() {
        let action = Action::add_column(
            "episodes",
            ColumnSpec::not_null("position", ColumnType::Integer),
        );

        assert_eq!(
            action.to_sql(),
            "ALTER TABLE \"episodes\" ADD COLUMN \"position\" INTEGER NOT NULL;"
        );
    }

    #[test]
    fn test_mixed_case_identifiers_are_quoted() {
        // Without quoting, the store would fold these to lowercase and the
        // existence checks could never see the names they were given.
        let add = Action::add_column(
            "podcastEpisodes",
            ColumnSpec::nullable("videoType", ColumnType::Text),
        );
        assert_eq!(
            add.to_sql(),
            "ALTER TABLE \"podcastEpisodes\" ADD COLUMN \"videoType\" TEXT;"
        );

        let remove = Action::remove_column("podcastEpisodes", "videoType");
        assert_eq!(
            remove.to_sql(),
            "ALTER TABLE \"podcastEpisodes\" DROP COLUMN \"videoType\";"
        );
    }

    #[test]
    fn test_create_table_sql() {
        let action = Action::create_table(
            "episodes",
            vec![
                ColumnSpec::not_null("id", ColumnType::Uuid),
                ColumnSpec::nullable("title", ColumnType::VarChar(255)),
                ColumnSpec::not_null("created_at", ColumnType::Timestamp),
            ],
        );

        let sql = action.to_sql();
        assert!(sql.contains("CREATE TABLE \"episodes\""));
        assert!(sql.contains("\"id\" UUID NOT NULL"));
        assert!(sql.contains("\"title\" VARCHAR(255)"));
        assert!(sql.contains("\"created_at\" TIMESTAMPTZ NOT NULL"));
    }

    #[test]
    fn test_remove_and_drop_sql() {
        assert_eq!(
            Action::remove_column("episodes", "videoURL").to_sql(),
            "ALTER TABLE \"episodes\" DROP COLUMN \"videoURL\";"
        );
        assert_eq!(
            Action::drop_table("episodes").to_sql(),
            "DROP TABLE \"episodes\";"
        );
    }

    #[test]
    fn test_column_info_matching() {
        let spec = ColumnSpec::nullable("videoURL", ColumnType::Text);
        let info = ColumnInfo::from(&spec);
        assert!(info.matches(&spec));

        let wrong_type = ColumnInfo {
            data_type: "INTEGER".to_string(),
            nullable: true,
        };
        assert!(!wrong_type.matches(&spec));

        let wrong_nullability = ColumnInfo {
            data_type: "TEXT".to_string(),
            nullable: false,
        };
        assert!(!wrong_nullability.matches(&spec));
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

/// One column as read from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub column: String,
    pub data_type: String,
}

/// Tables in name order, each with its columns in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaInfo {
    pub tables: BTreeMap<String, Vec<ColumnInfo>>,
}

/// Flat catalog row as served by `GET /schema`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaRow {
    #[serde(rename = "TABLE_NAME")]
    pub table_name: String,
    #[serde(rename = "COLUMN_NAME")]
    pub column_name: String,
    #[serde(rename = "DATA_TYPE")]
    pub data_type: String,
}

impl SchemaInfo {
    pub fn push(&mut self, table: impl Into<String>, column: impl Into<String>, data_type: impl Into<String>) {
        self.tables.entry(table.into()).or_default().push(ColumnInfo {
            column: column.into(),
            data_type: data_type.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn rows(&self) -> Vec<SchemaRow> {
        self.tables
            .iter()
            .flat_map(|(table, columns)| {
                columns.iter().map(move |c| SchemaRow {
                    table_name: table.clone(),
                    column_name: c.column.clone(),
                    data_type: c.data_type.clone(),
                })
            })
            .collect()
    }
}

/// Render the schema the way the SQL prompt expects it.
pub fn format_schema_for_prompt(schema: &SchemaInfo) -> String {
    let mut out = String::from("Database schema:\n");
    for (table, columns) in &schema.tables {
        out.push_str(&format!("Table: {table}\n"));
        for c in columns {
            out.push_str(&format!(" - Column: {} (Data Type: {})\n", c.column, c.data_type));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaInfo {
        let mut schema = SchemaInfo::default();
        schema.push("users", "id", "INTEGER");
        schema.push("users", "name", "TEXT");
        schema.push("orders", "total", "REAL");
        schema
    }

    #[test]
    fn test_format_schema_for_prompt() {
        assert_eq!(
            format_schema_for_prompt(&sample()),
            "Database schema:\n\
             Table: orders\n - Column: total (Data Type: REAL)\n\
             Table: users\n - Column: id (Data Type: INTEGER)\n - Column: name (Data Type: TEXT)\n"
        );
    }

    #[test]
    fn test_empty_schema_format() {
        assert_eq!(format_schema_for_prompt(&SchemaInfo::default()), "Database schema:\n");
    }

    #[test]
    fn test_rows_serialize_with_catalog_names() {
        let rows = sample().rows();
        assert_eq!(rows.len(), 3);
        let json = serde_json::to_value(&rows[1]).unwrap();
        assert_eq!(json["TABLE_NAME"], "users");
        assert_eq!(json["COLUMN_NAME"], "id");
        assert_eq!(json["DATA_TYPE"], "INTEGER");
    }
}

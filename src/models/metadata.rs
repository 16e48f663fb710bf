use serde::{Deserialize, Serialize};

/// Schema of the hospital database as discovered at runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub tables: Vec<Table>,
    pub views: Vec<View>,
}

impl DatabaseMetadata {
    pub fn new(tables: Vec<Table>, views: Vec<View>) -> Self {
        Self { tables, views }
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn view_names(&self) -> Vec<&str> {
        self.views.iter().map(|v| v.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// The CREATE statement stored in sqlite_master
    pub create_sql: Option<String>,
}

impl Table {
    /// CREATE statement for the prompt, rebuilt from the columns when
    /// sqlite_master has none
    pub fn definition(&self) -> String {
        if let Some(sql) = &self.create_sql {
            return sql.trim().to_string();
        }

        let mut lines = Vec::new();
        for column in &self.columns {
            let mut line = format!("\t\"{}\" {}", column.name, column.data_type);
            if !column.is_nullable {
                line.push_str(" NOT NULL");
            }
            if column.is_primary_key {
                line.push_str(" PRIMARY KEY");
            }
            lines.push(line);
        }
        for column in &self.columns {
            if let Some(target) = &column.references {
                lines.push(format!("\tFOREIGN KEY(\"{}\") REFERENCES {}", column.name, target));
            }
        }

        format!("CREATE TABLE \"{}\" (\n{}\n)", self.name, lines.join(",\n"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    /// `table(column)` this column points at, if it is a foreign key
    pub references: Option<String>,
}

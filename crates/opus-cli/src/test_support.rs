//! Fixtures shared by the generator tests.

use crate::prompt::Prompt;
use opus_schema::{
    ColumnDescriptor, ColumnType, DbSchema, ForeignKeyInfo, RelationKind, TableSchema,
};
use std::collections::VecDeque;
use std::io;

/// Answers questions from a script and records what was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    confirms: VecDeque<bool>,
    texts: VecDeque<String>,
    pub questions: Vec<String>,
    pub labels: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(mut self, answers: &[bool]) -> Self {
        self.confirms.extend(answers.iter().copied());
        self
    }

    pub fn text_with(mut self, answers: &[&str]) -> Self {
        self.texts.extend(answers.iter().map(|s| s.to_string()));
        self
    }

    /// Number of confirm questions that named `table`.
    pub fn asked_about(&self, table: &str) -> usize {
        let needle = format!("'{table}'");
        self.questions.iter().filter(|q| q.contains(&needle)).count()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str, _default: bool) -> io::Result<bool> {
        self.questions.push(question.to_string());
        self.confirms
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn prompt_text(&mut self, label: &str, default: &str) -> io::Result<String> {
        self.labels.push(label.to_string());
        Ok(self.texts.pop_front().unwrap_or_else(|| default.to_string()))
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// `(name, pg type, not null)`.
pub type Col<'a> = (&'a str, &'a str, bool);

pub fn table(name: &str, columns: &[Col<'_>], primary_key: Option<&str>) -> TableSchema {
    TableSchema {
        schema: "public".to_string(),
        name: name.to_string(),
        kind: RelationKind::Table,
        columns: columns
            .iter()
            .enumerate()
            .map(|(i, (col, ty, not_null))| ColumnDescriptor {
                name: col.to_string(),
                data_type: ty.to_string(),
                semantic: ColumnType::from_pg_type(ty, false),
                not_null: *not_null,
                default_expr: None,
                ordinal: i as i32 + 1,
            })
            .collect(),
        primary_key: primary_key.map(str::to_string),
    }
}

pub fn fk(table: &str, column: &str, referenced_table: &str, referenced_column: &str) -> ForeignKeyInfo {
    ForeignKeyInfo {
        schema: "public".to_string(),
        table: table.to_string(),
        column: column.to_string(),
        referenced_schema: "public".to_string(),
        referenced_table: referenced_table.to_string(),
        referenced_column: referenced_column.to_string(),
    }
}

pub fn schema(tables: Vec<TableSchema>, foreign_keys: Vec<ForeignKeyInfo>) -> DbSchema {
    DbSchema {
        schemas: vec!["public".to_string()],
        tables,
        foreign_keys,
    }
}

/// `customers` <- `orders` (customer_id), plus an unrelated `settings` table.
pub fn shop_schema() -> DbSchema {
    schema(
        vec![
            table(
                "customers",
                &[("id", "bigint", true), ("name", "text", true), ("active", "boolean", true)],
                Some("id"),
            ),
            table(
                "orders",
                &[
                    ("id", "bigint", true),
                    ("customer_id", "bigint", true),
                    ("note", "text", false),
                ],
                Some("id"),
            ),
            table("settings", &[("key", "text", true), ("value", "text", false)], Some("key")),
        ],
        vec![fk("orders", "customer_id", "customers", "id")],
    )
}

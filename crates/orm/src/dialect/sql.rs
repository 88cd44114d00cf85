//! Statement builders shared by the dialects
//!
//! Identifiers are quoted by the dialect and every value is a placeholder;
//! nothing from a record's data is ever written into the SQL text.

use super::Dialect;
use crate::columns::ColumnSet;

fn column_list<D: Dialect + ?Sized>(dialect: &D, columns: &ColumnSet) -> String {
    columns
        .iter()
        .map(|column| dialect.quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn insert<D: Dialect + ?Sized>(dialect: &D, table: &str, columns: &ColumnSet, id_column: &str) -> String {
    let table = dialect.quote_identifier(table);
    let returning = dialect.quote_identifier(id_column);

    if columns.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| dialect.placeholder(i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        column_list(dialect, columns),
        placeholders.join(", "),
        returning
    )
}

/// `UPDATE` binding the columns first and the identifier last
pub fn update<D: Dialect + ?Sized>(dialect: &D, table: &str, columns: &ColumnSet, id_column: &str) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = {}", dialect.quote_identifier(column), dialect.placeholder(i + 1)))
        .collect();

    format!(
        "UPDATE {} SET {} WHERE {} = {}",
        dialect.quote_identifier(table),
        assignments.join(", "),
        dialect.quote_identifier(id_column),
        dialect.placeholder(columns.len() + 1)
    )
}

pub fn delete<D: Dialect + ?Sized>(dialect: &D, table: &str, id_column: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = {}",
        dialect.quote_identifier(table),
        dialect.quote_identifier(id_column),
        dialect.placeholder(1)
    )
}

pub fn select_by_id<D: Dialect + ?Sized>(dialect: &D, table: &str, columns: &ColumnSet, id_column: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = {} LIMIT 1",
        column_list(dialect, columns),
        dialect.quote_identifier(table),
        dialect.quote_identifier(id_column),
        dialect.placeholder(1)
    )
}

#[derive(Clone, Copy, PartialEq)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Rewrite `?` placeholders into the dialect's style.
///
/// Quoted text and `--` / `/* */` comments are copied unchanged.
pub fn rebind<D: Dialect + ?Sized>(dialect: &D, sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut chars = sql.chars().peekable();
    let mut state = Scan::Code;
    let mut index = 0;

    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match state {
            Scan::Code => match (c, next) {
                ('\'' | '"', _) => state = Scan::Quoted(c),
                ('-', Some('-')) => state = Scan::LineComment,
                ('/', Some('*')) => {
                    out.push(c);
                    out.push('*');
                    chars.next();
                    state = Scan::BlockComment;
                    continue;
                }
                ('?', _) => {
                    index += 1;
                    out.push_str(&dialect.placeholder(index));
                    continue;
                }
                _ => {}
            },
            Scan::Quoted(quote) if c == quote => state = Scan::Code,
            Scan::LineComment if c == '\n' => state = Scan::Code,
            Scan::BlockComment if c == '*' && next == Some('/') => {
                out.push(c);
                out.push('/');
                chars.next();
                state = Scan::Code;
                continue;
            }
            _ => {}
        }
        out.push(c);
    }

    out
}

// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Renders a parsed statement back as canonical SQL text. Display only,
//! never fed back into the parser by the engine.

use super::ast::{
    ColumnDef, ColumnType, Expr, JoinKind, Op, Select, Statement, TableRef,
};

/// Canonical text of `statement`.
#[must_use]
pub fn statement(statement: &Statement) -> String {
    match statement {
        Statement::Select(select) => self::select(select),
        Statement::CreateTable(create) => {
            let columns = create
                .columns
                .iter()
                .map(column_definition)
                .collect::<Vec<_>>()
                .join(", ");
            let if_not_exists = if create.if_not_exists {
                "IF NOT EXISTS "
            } else {
                ""
            };
            format!(
                "CREATE TABLE {if_not_exists}{} ({columns})",
                create.table
            )
        }
        Statement::CreateIndex(create) => format!(
            "CREATE INDEX {} ON {} USING {} ({})",
            create.index,
            create.table,
            create.index_type.as_str(),
            create.columns.join(", ")
        ),
        Statement::DropTable { table } => format!("DROP TABLE {table}"),
        Statement::DropIndex { index, table } => format!("DROP INDEX {index} FROM {table}"),
        Statement::ShowTables => "SHOW TABLES".into(),
        Statement::ShowColumns { table } => format!("SHOW COLUMNS FROM {table}"),
        Statement::ShowIndex { table } => format!("SHOW INDEX FROM {table}"),
    }
}

fn select(select: &Select) -> String {
    let projection = select
        .projection
        .iter()
        .map(expression)
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = format!("SELECT {projection} FROM {}", table_ref(&select.from));
    if let Some(filter) = &select.filter {
        out.push_str(" WHERE ");
        out.push_str(&expression(filter));
    }
    out
}

fn expression(expr: &Expr) -> String {
    match expr {
        Expr::Star => "*".into(),
        Expr::Column { table, name } => match table {
            Some(table) => format!("{table}.{name}"),
            None => name.clone(),
        },
        Expr::IntLiteral(n) => n.to_string(),
        Expr::FloatLiteral(x) => x.to_string(),
        Expr::StringLiteral(s) => format!("'{s}'"),
        Expr::Function { name, arg } => format!("{name}({})", expression(arg)),
        Expr::Op { left, op, right } => {
            let op = match op {
                Op::And => "AND".into(),
                Op::Or => "OR".into(),
                Op::Cmp(c) => c.to_string(),
            };
            format!("{} {op} {}", expression(left), expression(right))
        }
        Expr::Not(inner) => format!("NOT {}", expression(inner)),
        Expr::Alias { expr, alias } => format!("{} AS {alias}", expression(expr)),
    }
}

fn table_ref(table: &TableRef) -> String {
    match table {
        TableRef::Name { name, alias } => match alias {
            Some(alias) => format!("{name} AS {alias}"),
            None => name.clone(),
        },
        TableRef::Join {
            left,
            right,
            kind,
            on,
        } => {
            let keyword = match kind {
                JoinKind::Inner => " JOIN ",
                JoinKind::Left => " LEFT JOIN ",
                JoinKind::Right => " RIGHT JOIN ",
                JoinKind::Natural => " NATURAL JOIN ",
            };
            let mut out = format!("{}{keyword}{}", table_ref(left), table_ref(right));
            if let Some(on) = on {
                out.push_str(" ON ");
                out.push_str(&expression(on));
            }
            out
        }
        TableRef::Cross(list) => list
            .iter()
            .map(table_ref)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn column_definition(column: &ColumnDef) -> String {
    let data_type = match column.data_type {
        ColumnType::Int => "INT",
        ColumnType::Text => "TEXT",
        ColumnType::Double => "DOUBLE",
        ColumnType::Boolean => "BOOLEAN",
    };
    format!("{} {data_type}", column.name)
}

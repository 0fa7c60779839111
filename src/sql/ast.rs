// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Parsed statement shapes. Identifiers are kept as the strings the user
//! wrote; validation happens when they reach the catalog.

/// A parsed SQL statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// `SELECT ... FROM ... [WHERE ...]`
    Select(Select),

    /// `CREATE TABLE [IF NOT EXISTS] name (col type, ...)`
    CreateTable(CreateTable),

    /// `CREATE INDEX name ON table [USING BTREE|HASH] (col, ...)`
    CreateIndex(CreateIndex),

    /// `DROP TABLE name`
    DropTable {
        /// Table to drop.
        table: String,
    },

    /// `DROP INDEX name FROM table`
    DropIndex {
        /// Index to drop.
        index: String,
        /// Table the index is on.
        table: String,
    },

    /// `SHOW TABLES`
    ShowTables,

    /// `SHOW COLUMNS FROM table`
    ShowColumns {
        /// Table to describe.
        table: String,
    },

    /// `SHOW INDEX FROM table`
    ShowIndex {
        /// Table whose indices to list.
        table: String,
    },
}

/// A SELECT statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    /// Select list.
    pub projection: Vec<Expr>,

    /// FROM clause.
    pub from: TableRef,

    /// WHERE clause, if any.
    pub filter: Option<Expr>,
}

/// A CREATE TABLE statement.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateTable {
    /// Table to create.
    pub table: String,

    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDef>,

    /// Whether `IF NOT EXISTS` was given.
    pub if_not_exists: bool,
}

/// A CREATE INDEX statement.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateIndex {
    /// Index to create.
    pub index: String,

    /// Table the index is on.
    pub table: String,

    /// Key columns, in listed order.
    pub columns: Vec<String>,

    /// Index type, BTREE unless `USING HASH` was given.
    pub index_type: IndexType,
}

/// Index types the dialect knows.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndexType {
    /// Ordered index; its key is unique for the relation.
    BTree,

    /// Hash index.
    Hash,
}

impl IndexType {
    /// The catalog spelling of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BTree => "BTREE",
            Self::Hash => "HASH",
        }
    }
}

/// One column of a CREATE TABLE statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,

    /// Declared type.
    pub data_type: ColumnType,
}

/// Column types the grammar accepts. The executor supports a subset.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    /// `INT`
    Int,

    /// `TEXT`
    Text,

    /// `DOUBLE`
    Double,

    /// `BOOLEAN`
    Boolean,
}

/// An expression in a select list or WHERE clause.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `*`
    Star,

    /// A column reference with optional table qualifier.
    Column {
        /// Qualifying table, as in `t.col`.
        table: Option<String>,
        /// Column name.
        name: String,
    },

    /// Integer literal.
    IntLiteral(i64),

    /// Float literal.
    FloatLiteral(f64),

    /// String literal.
    StringLiteral(String),

    /// A simple one-argument function call.
    Function {
        /// Function name.
        name: String,
        /// The argument.
        arg: Box<Expr>,
    },

    /// A binary operator application.
    Op {
        /// Left operand.
        left: Box<Expr>,
        /// The operator.
        op: Op,
        /// Right operand.
        right: Box<Expr>,
    },

    /// `NOT expr`
    Not(Box<Expr>),

    /// `expr AS alias`
    Alias {
        /// The aliased expression.
        expr: Box<Expr>,
        /// The alias.
        alias: String,
    },
}

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Op {
    /// `AND`
    And,

    /// `OR`
    Or,

    /// A single-character comparison: `<`, `=` or `>`.
    Cmp(char),
}

/// A FROM clause item.
#[derive(Clone, Debug, PartialEq)]
pub enum TableRef {
    /// A plain table name with optional alias.
    Name {
        /// Table name.
        name: String,
        /// Alias, as in `t AS a`.
        alias: Option<String>,
    },

    /// A join of two table references.
    Join {
        /// Left side.
        left: Box<TableRef>,
        /// Right side.
        right: Box<TableRef>,
        /// Join kind.
        kind: JoinKind,
        /// ON condition, if any.
        on: Option<Expr>,
    },

    /// A comma-separated cross product.
    Cross(Vec<TableRef>),
}

/// Join kinds the dialect knows.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JoinKind {
    /// `JOIN` (also `CROSS JOIN`)
    Inner,

    /// `LEFT JOIN`
    Left,

    /// `RIGHT JOIN`
    Right,

    /// `NATURAL JOIN`
    Natural,
}

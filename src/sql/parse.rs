// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Hand-written lexer and recursive-descent parser for the dialect.
//!
//! Keywords are case-insensitive; identifiers keep the case they were
//! written in. Statements are separated by `;`.

use super::ast::{
    ColumnDef, ColumnType, CreateIndex, CreateTable, Expr, IndexType, JoinKind, Op, Select,
    Statement, TableRef,
};
use std::fmt;

/// Keywords of the dialect.
const KEYWORDS: &[&str] = &[
    "AND", "AS", "BOOLEAN", "BTREE", "COLUMNS", "CREATE", "CROSS", "DOUBLE", "DROP", "EXISTS",
    "FROM", "HASH", "IF", "INDEX", "INT", "INTEGER", "JOIN", "LEFT", "NATURAL", "NOT", "ON", "OR",
    "RIGHT", "SELECT", "SHOW", "TABLE", "TABLES", "TEXT", "USING", "WHERE",
];

/// Whether `word` is a keyword of the dialect (case-insensitive).
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

/// Error produced when the input is not a statement the dialect knows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

/// Parser result
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parses a `;`-separated batch of statements.
pub fn parse(input: &str) -> ParseResult<Vec<Statement>> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, pos: 0 };

    let mut statements = Vec::new();
    while !parser.at_eof() {
        if parser.eat_punct(';') {
            continue;
        }
        statements.push(parser.statement()?);
        if !parser.at_eof() && !parser.eat_punct(';') {
            return Err(parser.unexpected("end of statement"));
        }
    }
    Ok(statements)
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(char),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "'{w}'"),
            Self::Int(n) => write!(f, "'{n}'"),
            Self::Float(x) => write!(f, "'{x}'"),
            Self::Str(s) => write!(f, "string '{s}'"),
            Self::Punct(c) => write!(f, "'{c}'"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_word_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn lex(input: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if is_word_start(c) {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if !is_word_part(c) {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Token::Word(word));
        } else if c.is_ascii_digit() {
            let mut number = String::new();
            let mut is_float = false;
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || (c == '.' && !is_float) {
                    is_float |= c == '.';
                    number.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            let token = if is_float {
                Token::Float(
                    number
                        .parse()
                        .map_err(|_| ParseError(format!("bad float literal '{number}'")))?,
                )
            } else {
                Token::Int(
                    number
                        .parse()
                        .map_err(|_| ParseError(format!("bad integer literal '{number}'")))?,
                )
            };
            tokens.push(token);
        } else if c == '\'' {
            chars.next();
            let mut s = String::new();
            loop {
                match chars.next() {
                    Some('\'') => break,
                    Some(c) => s.push(c),
                    None => return Err(ParseError("unterminated string literal".into())),
                }
            }
            tokens.push(Token::Str(s));
        } else {
            chars.next();
            tokens.push(Token::Punct(c));
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        *self.peek() == Token::Eof
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if *self.peek() == Token::Punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{c}'")))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if let Token::Word(w) = self.peek() {
            if w.eq_ignore_ascii_case(keyword) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            Token::Word(w) => {
                let w = w.clone();
                self.pos += 1;
                Ok(w)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        ParseError(format!("expected {what}, got {}", self.peek()))
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        if self.eat_keyword("CREATE") {
            self.s_create()
        } else if self.eat_keyword("DROP") {
            self.s_drop()
        } else if self.eat_keyword("SHOW") {
            self.s_show()
        } else if self.eat_keyword("SELECT") {
            self.s_select().map(Statement::Select)
        } else {
            Err(self.unexpected("a statement keyword"))
        }
    }

    fn s_create(&mut self) -> ParseResult<Statement> {
        if self.eat_keyword("TABLE") {
            let if_not_exists = if self.eat_keyword("IF") {
                self.expect_keyword("NOT")?;
                self.expect_keyword("EXISTS")?;
                true
            } else {
                false
            };
            let table = self.identifier()?;

            self.expect_punct('(')?;
            let mut columns = vec![self.column_def()?];
            while self.eat_punct(',') {
                columns.push(self.column_def()?);
            }
            self.expect_punct(')')?;

            Ok(Statement::CreateTable(CreateTable {
                table,
                columns,
                if_not_exists,
            }))
        } else if self.eat_keyword("INDEX") {
            let index = self.identifier()?;
            self.expect_keyword("ON")?;
            let table = self.identifier()?;

            let index_type = if self.eat_keyword("USING") {
                if self.eat_keyword("BTREE") {
                    IndexType::BTree
                } else if self.eat_keyword("HASH") {
                    IndexType::Hash
                } else {
                    return Err(self.unexpected("BTREE or HASH"));
                }
            } else {
                IndexType::BTree
            };

            self.expect_punct('(')?;
            let mut columns = vec![self.identifier()?];
            while self.eat_punct(',') {
                columns.push(self.identifier()?);
            }
            self.expect_punct(')')?;

            Ok(Statement::CreateIndex(CreateIndex {
                index,
                table,
                columns,
                index_type,
            }))
        } else {
            Err(self.unexpected("TABLE or INDEX"))
        }
    }

    fn column_def(&mut self) -> ParseResult<ColumnDef> {
        let name = self.identifier()?;
        let data_type = if self.eat_keyword("INT") || self.eat_keyword("INTEGER") {
            ColumnType::Int
        } else if self.eat_keyword("TEXT") {
            ColumnType::Text
        } else if self.eat_keyword("DOUBLE") {
            ColumnType::Double
        } else if self.eat_keyword("BOOLEAN") {
            ColumnType::Boolean
        } else {
            return Err(self.unexpected("a column type"));
        };
        Ok(ColumnDef { name, data_type })
    }

    fn s_drop(&mut self) -> ParseResult<Statement> {
        if self.eat_keyword("TABLE") {
            Ok(Statement::DropTable {
                table: self.identifier()?,
            })
        } else if self.eat_keyword("INDEX") {
            let index = self.identifier()?;
            self.expect_keyword("FROM")?;
            let table = self.identifier()?;
            Ok(Statement::DropIndex { index, table })
        } else {
            Err(self.unexpected("TABLE or INDEX"))
        }
    }

    fn s_show(&mut self) -> ParseResult<Statement> {
        if self.eat_keyword("TABLES") {
            Ok(Statement::ShowTables)
        } else if self.eat_keyword("COLUMNS") {
            self.expect_keyword("FROM")?;
            Ok(Statement::ShowColumns {
                table: self.identifier()?,
            })
        } else if self.eat_keyword("INDEX") {
            self.expect_keyword("FROM")?;
            Ok(Statement::ShowIndex {
                table: self.identifier()?,
            })
        } else {
            Err(self.unexpected("TABLES, COLUMNS or INDEX"))
        }
    }

    fn s_select(&mut self) -> ParseResult<Select> {
        let mut projection = vec![self.aliased_expr()?];
        while self.eat_punct(',') {
            projection.push(self.aliased_expr()?);
        }

        self.expect_keyword("FROM")?;
        let from = self.table_ref()?;

        let filter = if self.eat_keyword("WHERE") {
            Some(self.expr()?)
        } else {
            None
        };

        Ok(Select {
            projection,
            from,
            filter,
        })
    }

    fn table_ref(&mut self) -> ParseResult<TableRef> {
        let first = self.join_chain()?;
        if *self.peek() != Token::Punct(',') {
            return Ok(first);
        }

        let mut list = vec![first];
        while self.eat_punct(',') {
            list.push(self.join_chain()?);
        }
        Ok(TableRef::Cross(list))
    }

    fn join_chain(&mut self) -> ParseResult<TableRef> {
        let mut left = self.table_name()?;
        loop {
            let kind = if self.eat_keyword("JOIN") {
                JoinKind::Inner
            } else if self.eat_keyword("CROSS") {
                self.expect_keyword("JOIN")?;
                JoinKind::Inner
            } else if self.eat_keyword("LEFT") {
                self.expect_keyword("JOIN")?;
                JoinKind::Left
            } else if self.eat_keyword("RIGHT") {
                self.expect_keyword("JOIN")?;
                JoinKind::Right
            } else if self.eat_keyword("NATURAL") {
                self.expect_keyword("JOIN")?;
                JoinKind::Natural
            } else {
                return Ok(left);
            };

            let right = self.table_name()?;
            let on = if self.eat_keyword("ON") {
                Some(self.expr()?)
            } else {
                None
            };
            left = TableRef::Join {
                left: Box::new(left),
                right: Box::new(right),
                kind,
                on,
            };
        }
    }

    fn table_name(&mut self) -> ParseResult<TableRef> {
        let name = self.identifier()?;
        let alias = if self.eat_keyword("AS") {
            Some(self.identifier()?)
        } else {
            None
        };
        Ok(TableRef::Name { name, alias })
    }

    fn aliased_expr(&mut self) -> ParseResult<Expr> {
        let expr = self.expr()?;
        if self.eat_keyword("AS") {
            Ok(Expr::Alias {
                expr: Box::new(expr),
                alias: self.identifier()?,
            })
        } else {
            Ok(expr)
        }
    }

    fn expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("OR") {
            left = Expr::Op {
                left: Box::new(left),
                op: Op::Or,
                right: Box::new(self.and_expr()?),
            };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.not_expr()?;
        while self.eat_keyword("AND") {
            left = Expr::Op {
                left: Box::new(left),
                op: Op::And,
                right: Box::new(self.not_expr()?),
            };
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> ParseResult<Expr> {
        if self.eat_keyword("NOT") {
            Ok(Expr::Not(Box::new(self.not_expr()?)))
        } else {
            self.comparison()
        }
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let left = self.primary()?;
        if let Token::Punct(c @ ('<' | '=' | '>')) = *self.peek() {
            self.pos += 1;
            return Ok(Expr::Op {
                left: Box::new(left),
                op: Op::Cmp(c),
                right: Box::new(self.primary()?),
            });
        }
        Ok(left)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        match self.advance() {
            Token::Punct('*') => Ok(Expr::Star),
            Token::Int(n) => Ok(Expr::IntLiteral(n)),
            Token::Float(x) => Ok(Expr::FloatLiteral(x)),
            Token::Str(s) => Ok(Expr::StringLiteral(s)),
            Token::Word(w) => {
                if self.eat_punct('(') {
                    let arg = self.expr()?;
                    self.expect_punct(')')?;
                    Ok(Expr::Function {
                        name: w,
                        arg: Box::new(arg),
                    })
                } else if self.eat_punct('.') {
                    Ok(Expr::Column {
                        table: Some(w),
                        name: self.identifier()?,
                    })
                } else {
                    Ok(Expr::Column {
                        table: None,
                        name: w,
                    })
                }
            }
            token => Err(ParseError(format!("expected an expression, got {token}"))),
        }
    }
}

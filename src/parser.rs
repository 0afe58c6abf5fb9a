use std::mem;

use thiserror::Error;

use crate::{
    ast::{
        BinaryOp, Block, ConstDef, Expr, Function, FunctionArg, Statement, TypeDef, TypeExpr,
        TypeExprKind, VarDecl,
    },
    lexer::{self, Lexer},
    symbol::{Symbol, SymbolTable},
    token::{Token, TokenKind},
};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses a whole program, returning the top-level block and the symbol
/// table its identifiers were interned into.
pub fn parse(source: &str) -> Result<(Block, SymbolTable)> {
    let mut parser = Parser::new(Lexer::new(source))?;
    let program = parser.parse()?;
    Ok((program, parser.into_symbols()))
}

/// Recursive-descent parser with one-token lookahead.
///
/// The parser owns the [`SymbolTable`]; every identifier is interned on
/// the way into the tree.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    symbols: SymbolTable,
    current: Token,
}

impl<'src> Parser<'src> {
    pub fn new(mut lexer: Lexer<'src>) -> Result<Parser<'src>> {
        let current = lexer.lex()?;
        Ok(Parser {
            lexer,
            symbols: SymbolTable::new(),
            current,
        })
    }

    pub fn parse(&mut self) -> Result<Block> {
        let program = self.parse_block()?;
        self.expect(TokenKind::Period)?;
        Ok(program)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }
}

impl Parser<'_> {
    fn parse_block(&mut self) -> Result<Block> {
        let labels = if self.at(TokenKind::Label) {
            self.parse_label_decls()?
        } else {
            Vec::new()
        };
        let consts = if self.at(TokenKind::Const) {
            self.parse_const_defs()?
        } else {
            Vec::new()
        };
        let types = if self.at(TokenKind::Type) {
            self.parse_type_defs()?
        } else {
            Vec::new()
        };
        let vars = if self.at(TokenKind::Var) {
            self.parse_var_decls()?
        } else {
            Vec::new()
        };
        let functions = if self.at(TokenKind::Function) || self.at(TokenKind::Procedure) {
            self.parse_functions()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::Begin)?;
        let body = self.parse_compound()?;
        Ok(Block {
            labels,
            consts,
            types,
            vars,
            functions,
            body,
        })
    }

    fn parse_label_decls(&mut self) -> Result<Vec<Symbol>> {
        self.expect(TokenKind::Label)?;
        let mut labels = Vec::new();
        while !self.accept(TokenKind::SemiColon)? {
            if !labels.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            labels.push(self.expect_identifier()?);
        }
        Ok(labels)
    }

    fn parse_const_defs(&mut self) -> Result<Vec<ConstDef>> {
        self.expect(TokenKind::Const)?;
        let mut consts = Vec::new();
        // Any keyword starting a subsequent block section ends this one.
        while !self.at_section_start() && !self.at(TokenKind::Type) && !self.at(TokenKind::Var) {
            let name = self.expect_identifier()?;
            self.expect(TokenKind::Equal)?;
            let value = self.parse_const_expr()?;
            self.expect(TokenKind::SemiColon)?;
            consts.push(ConstDef { name, value });
        }
        Ok(consts)
    }

    fn parse_const_expr(&mut self) -> Result<Expr> {
        self.parse_primary_expr()
    }

    fn parse_type_defs(&mut self) -> Result<Vec<TypeDef>> {
        self.expect(TokenKind::Type)?;
        let mut types = Vec::new();
        while !self.at_section_start() && !self.at(TokenKind::Var) {
            let name = self.expect_identifier()?;
            self.expect(TokenKind::Equal)?;
            let ty = self.parse_type_expr()?;
            self.expect(TokenKind::SemiColon)?;
            types.push(TypeDef { name, ty });
        }
        Ok(types)
    }

    fn parse_type_expr(&mut self) -> Result<TypeExpr> {
        let is_pointer = self.accept(TokenKind::Hat)?;
        let kind = if self.at(TokenKind::Identifier) {
            let token = self.advance()?;
            match token.text() {
                "integer" => TypeExprKind::Integer,
                "boolean" => TypeExprKind::Boolean,
                "string" => TypeExprKind::String,
                name => TypeExprKind::Alias(self.symbols.intern(name)),
            }
        } else if self.accept(TokenKind::OpenParen)? {
            self.parse_enum_body()?
        } else if self.accept(TokenKind::Record)? {
            self.parse_record_body()?
        } else {
            return Err(self.unexpected(TokenKind::Identifier));
        };
        Ok(TypeExpr { kind, is_pointer })
    }

    fn parse_enum_body(&mut self) -> Result<TypeExprKind> {
        let mut tags = Vec::new();
        while !self.accept(TokenKind::CloseParen)? {
            if !tags.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            tags.push(self.expect_identifier()?);
        }
        Ok(TypeExprKind::Enum(tags))
    }

    fn parse_record_body(&mut self) -> Result<TypeExprKind> {
        let mut fields = Vec::new();
        while !self.at(TokenKind::End) && !self.at(TokenKind::Eof) {
            let field = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.expect_identifier()?;
            fields.push((field, ty));
            if !self.at(TokenKind::End) {
                self.expect(TokenKind::SemiColon)?;
            }
        }
        self.expect(TokenKind::End)?;
        Ok(TypeExprKind::Record(fields))
    }

    fn parse_var_decls(&mut self) -> Result<Vec<VarDecl>> {
        self.expect(TokenKind::Var)?;
        let mut vars = Vec::new();
        while !self.at_section_start() {
            let name = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.expect_identifier()?;
            self.expect(TokenKind::SemiColon)?;
            vars.push(VarDecl { name, ty });
        }
        Ok(vars)
    }

    /// True when the current token begins a section that terminates any
    /// declaration list: a routine, the block body, or end of input.
    fn at_section_start(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Function | TokenKind::Procedure | TokenKind::Begin | TokenKind::Eof
        )
    }

    fn parse_functions(&mut self) -> Result<Vec<Function>> {
        let mut functions = Vec::new();
        while !self.at(TokenKind::Begin) && !self.at(TokenKind::Eof) {
            let function = if self.accept(TokenKind::Procedure)? {
                self.parse_routine(false)?
            } else if self.accept(TokenKind::Function)? {
                self.parse_routine(true)?
            } else {
                return Err(Error::ExpectedFunctionOrProcedure);
            };
            functions.push(function);
        }
        Ok(functions)
    }

    fn parse_routine(&mut self, has_return: bool) -> Result<Function> {
        let name = self.expect_identifier()?;
        let args = self.parse_args_list()?;
        let return_ty = if has_return {
            self.expect(TokenKind::Colon)?;
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(TokenKind::SemiColon)?;
        let block = self.parse_block()?;
        self.expect(TokenKind::SemiColon)?;
        Ok(Function {
            name,
            args,
            block,
            return_ty,
        })
    }

    fn parse_args_list(&mut self) -> Result<Vec<FunctionArg>> {
        self.expect(TokenKind::OpenParen)?;
        let mut args = Vec::new();
        while !self.at(TokenKind::CloseParen) && !self.at(TokenKind::Eof) {
            if !args.is_empty() {
                self.expect(TokenKind::Comma)?;
            }
            let is_const = self.accept(TokenKind::Const)?;
            let name = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.expect_identifier()?;
            args.push(FunctionArg { name, ty, is_const });
        }
        self.expect(TokenKind::CloseParen)?;
        Ok(args)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if self.accept(TokenKind::Begin)? {
            self.parse_compound()
        } else if self.accept(TokenKind::If)? {
            self.parse_if()
        } else if self.accept(TokenKind::Case)? {
            self.parse_case()
        } else if self.accept(TokenKind::Repeat)? {
            self.parse_repeat()
        } else if self.accept(TokenKind::While)? {
            self.parse_while()
        } else if self.accept(TokenKind::For)? {
            self.parse_for()
        } else if self.accept(TokenKind::With)? {
            self.parse_with()
        } else {
            self.parse_identifier_statement()
        }
    }

    fn parse_compound(&mut self) -> Result<Statement> {
        let mut body = Vec::new();
        loop {
            if self.accept(TokenKind::End)? {
                break;
            }
            // A trailing semicolon after the last statement is legal.
            if self.accept(TokenKind::SemiColon)? && self.accept(TokenKind::End)? {
                break;
            }
            body.push(self.parse_statement()?);
        }
        Ok(Statement::Compound(body))
    }

    fn parse_if(&mut self) -> Result<Statement> {
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then = Box::new(self.parse_statement()?);
        let otherwise = if self.accept(TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_while(&mut self) -> Result<Statement> {
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While { cond, body })
    }

    fn parse_for(&mut self) -> Result<Statement> {
        let control = self.expect_identifier()?;
        self.expect(TokenKind::Assign)?;
        let begin = self.parse_expr()?;
        let ascending = self.accept(TokenKind::To)?;
        if !ascending {
            self.expect(TokenKind::DownTo)?;
        }
        let end = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For {
            control,
            begin,
            end,
            ascending,
            body,
        })
    }

    /// `case` is recognized but inert: the whole statement is consumed so
    /// the token stream stays consistent, and an empty statement is built.
    fn parse_case(&mut self) -> Result<Statement> {
        let _scrutinee = self.parse_expr()?;
        self.expect(TokenKind::Of)?;
        loop {
            if self.accept(TokenKind::End)? {
                break;
            }
            let _arm = self.parse_const_expr()?;
            self.expect(TokenKind::Colon)?;
            let _body = self.parse_statement()?;
            if !self.accept(TokenKind::SemiColon)? {
                self.expect(TokenKind::End)?;
                break;
            }
        }
        Ok(Statement::Empty)
    }

    /// `repeat` is recognized but inert, like `case`.
    fn parse_repeat(&mut self) -> Result<Statement> {
        loop {
            if self.accept(TokenKind::Until)? {
                break;
            }
            if self.accept(TokenKind::SemiColon)? && self.accept(TokenKind::Until)? {
                break;
            }
            let _body = self.parse_statement()?;
        }
        let _cond = self.parse_expr()?;
        Ok(Statement::Empty)
    }

    /// `with` is recognized but inert, like `case`.
    fn parse_with(&mut self) -> Result<Statement> {
        let _record = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let _body = self.parse_statement()?;
        Ok(Statement::Empty)
    }

    /// Either an entire call statement or the left hand side of an
    /// assignment.
    fn parse_identifier_statement(&mut self) -> Result<Statement> {
        let expr = self.parse_expr()?;
        if self.accept(TokenKind::Assign)? {
            let rhs = self.parse_expr()?;
            return Ok(Statement::Assignment { lhs: expr, rhs });
        }
        Ok(Statement::Call(expr))
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Equal => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                _ => return Ok(lhs),
            };
            self.advance()?;
            lhs = binary(op, lhs, self.parse_relational()?);
        }
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_addition()?;
        loop {
            let op = match self.current.kind {
                TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::LessThanEqual => BinaryOp::LessThanEqual,
                TokenKind::GreaterThanEqual => BinaryOp::GreaterThanEqual,
                _ => return Ok(lhs),
            };
            self.advance()?;
            lhs = binary(op, lhs, self.parse_addition()?);
        }
    }

    fn parse_addition(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplication()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Add => BinaryOp::Add,
                TokenKind::Subtract => BinaryOp::Subtract,
                _ => return Ok(lhs),
            };
            self.advance()?;
            lhs = binary(op, lhs, self.parse_multiplication()?);
        }
    }

    fn parse_multiplication(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_postfix()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Multiply => BinaryOp::Multiply,
                TokenKind::Divide => BinaryOp::Divide,
                _ => return Ok(lhs),
            };
            self.advance()?;
            lhs = binary(op, lhs, self.parse_postfix()?);
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary_expr()?;
        while self.accept(TokenKind::Period)? {
            let field = self.expect_identifier()?;
            expr = Expr::Member {
                base: Box::new(expr),
                field,
            };
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        match self.current.kind {
            TokenKind::Str => {
                let token = self.advance()?;
                Ok(Expr::Str(token.text.expect("string carries its lexeme")))
            }
            TokenKind::Number => {
                let token = self.advance()?;
                let value = token.text().parse().map_err(|_| Error::Conversion)?;
                Ok(Expr::Number(value))
            }
            TokenKind::Identifier => {
                let name = self.expect_identifier()?;
                if !self.accept(TokenKind::OpenParen)? {
                    return Ok(Expr::VarRef(name));
                }
                let mut args = Vec::new();
                while !self.accept(TokenKind::CloseParen)? {
                    if !args.is_empty() {
                        self.expect(TokenKind::Comma)?;
                    }
                    args.push(self.parse_expr()?);
                }
                Ok(Expr::Call {
                    function: name,
                    args,
                })
            }
            kind => Err(Error::InvalidPrimary(kind)),
        }
    }
}

// Token plumbing.
impl Parser<'_> {
    /// Replaces the current token with the next one, returning the old.
    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.lex()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consumes the current token if it matches.
    fn accept(&mut self, kind: TokenKind) -> Result<bool> {
        if self.at(kind) {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consumes the current token if it matches, failing otherwise.
    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(kind) {
            return self.advance();
        }
        Err(self.unexpected(kind))
    }

    /// Consumes an identifier token and interns its spelling.
    fn expect_identifier(&mut self) -> Result<Symbol> {
        let token = self.expect(TokenKind::Identifier)?;
        Ok(self.symbols.intern(token.text()))
    }

    fn unexpected(&self, want: TokenKind) -> Error {
        Error::Unexpected {
            want,
            got: self.current.kind,
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Lexer(#[from] lexer::Error),
    #[error("Unexpected token: expected {want:?}, got {got:?}")]
    Unexpected { want: TokenKind, got: TokenKind },
    #[error("Conversion error")]
    Conversion,
    #[error("Invalid primary expr: got {0:?}")]
    InvalidPrimary(TokenKind),
    #[error("Expected either procedure or function")]
    ExpectedFunctionOrProcedure,
}

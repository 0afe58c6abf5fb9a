// program    ::= block '.'
// block      ::= [label-decls] [const-defs] [type-defs] [var-decls]
//                {function} 'begin' compound
// label-decls::= 'label' ID (',' ID)* ';'
// const-defs ::= 'const' (ID '=' const-expr ';')*
// type-defs  ::= 'type' (ID '=' type-expr ';')*
// var-decls  ::= 'var' (ID ':' ID ';')*
// function   ::= ('procedure' | 'function') ID args-list [':' ID] ';'
//                block ';'
// args-list  ::= '(' [arg (',' arg)*] ')'
// arg        ::= ['const'] ID ':' ID
// type-expr  ::= ['^'] (ID | '(' ID (',' ID)* ')' | 'record' fields 'end')
// statement  ::= 'begin' compound
//              | 'if' expr 'then' statement ['else' statement]
//              | 'while' expr 'do' statement
//              | 'for' ID ':=' expr ('to' | 'downto') expr 'do' statement
//              | 'case' expr 'of' (const-expr ':' statement ';')* 'end'
//              | 'repeat' (statement ';')* 'until' expr
//              | 'with' expr 'do' statement
//              | expr [':=' expr]
// compound   ::= (statement (';' statement)*) [';'] 'end'
//
// Precedence, all left-associative, loosest first:
//
// = <>
// < > <= >=
// + -
// * /
// . (member access)

use crate::symbol::Symbol;

/// The unit of scoping: declaration sections, nested functions and a single
/// compound body. The program is a top-level `Block` terminated by a
/// period.
#[derive(Debug, PartialEq)]
pub struct Block {
    pub labels: Vec<Symbol>,
    pub consts: Vec<ConstDef>,
    pub types: Vec<TypeDef>,
    pub vars: Vec<VarDecl>,
    pub functions: Vec<Function>,
    pub body: Statement,
}

#[derive(Debug, PartialEq)]
pub struct ConstDef {
    pub name: Symbol,
    pub value: Expr,
}

#[derive(Debug, PartialEq)]
pub struct TypeDef {
    pub name: Symbol,
    pub ty: TypeExpr,
}

#[derive(Debug, PartialEq)]
pub struct VarDecl {
    pub name: Symbol,
    /// The declared type's name, resolved during semantic analysis.
    pub ty: Symbol,
}

#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: Symbol,
    pub args: Vec<FunctionArg>,
    pub block: Block,
    /// `None` for procedures.
    pub return_ty: Option<Symbol>,
}

#[derive(Debug, PartialEq)]
pub struct FunctionArg {
    pub name: Symbol,
    pub ty: Symbol,
    pub is_const: bool,
}

#[derive(Debug, PartialEq)]
pub enum Statement {
    Assignment {
        lhs: Expr,
        rhs: Expr,
    },
    Compound(Vec<Statement>),
    If {
        cond: Expr,
        then: Box<Statement>,
        otherwise: Option<Box<Statement>>,
    },
    While {
        cond: Expr,
        body: Box<Statement>,
    },
    For {
        control: Symbol,
        begin: Expr,
        end: Expr,
        /// `true` for `to`, `false` for `downto`.
        ascending: bool,
        body: Box<Statement>,
    },
    /// Wraps an [`Expr::Call`].
    Call(Expr),
    /// A recognized-but-inert statement (`case`, `repeat`, `with`).
    Empty,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Str(Box<str>),
    Number(i64),
    VarRef(Symbol),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Symbol,
        args: Vec<Expr>,
    },
    Member {
        base: Box<Expr>,
        field: Symbol,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
}

/// A syntactic type as written in a `type` section or declaration.
#[derive(Debug, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    /// A leading `^`.
    pub is_pointer: bool,
}

#[derive(Debug, PartialEq)]
pub enum TypeExprKind {
    Integer,
    Boolean,
    String,
    /// Ordered list of tag symbols.
    Enum(Vec<Symbol>),
    /// Ordered list of (field, type-name) pairs.
    Record(Vec<(Symbol, Symbol)>),
    /// A reference to another named type.
    Alias(Symbol),
}

//! Structured dump of a parsed block tree, for debugging. The rendering is
//! informative only; nothing downstream consumes it.

use std::io::{self, Write};

use crate::{
    ast::{Block, Expr, Function, Statement, TypeExpr, TypeExprKind},
    symbol::SymbolTable,
};

const INDENT_WIDTH: usize = 2;

pub fn print_block_string(symbols: &SymbolTable, block: &Block) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_block(&mut buf, symbols, block).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_block(w: &mut impl Write, symbols: &SymbolTable, block: &Block) -> io::Result<()> {
    block_at(w, symbols, 0, block)
}

fn block_at(w: &mut impl Write, symbols: &SymbolTable, i: usize, block: &Block) -> io::Result<()> {
    sp(w, i)?;
    writeln!(w, "Block")?;
    for label in &block.labels {
        sp(w, i + 1)?;
        writeln!(w, "LabelDecl {}", symbols.resolve(*label))?;
    }
    for def in &block.consts {
        sp(w, i + 1)?;
        writeln!(w, "ConstDef {}", symbols.resolve(def.name))?;
        expr_at(w, symbols, i + 2, &def.value)?;
    }
    for def in &block.types {
        sp(w, i + 1)?;
        writeln!(
            w,
            "TypeDef {} = {}",
            symbols.resolve(def.name),
            type_expr(symbols, &def.ty)
        )?;
    }
    for decl in &block.vars {
        sp(w, i + 1)?;
        writeln!(
            w,
            "VarDecl {} : {}",
            symbols.resolve(decl.name),
            symbols.resolve(decl.ty)
        )?;
    }
    for function in &block.functions {
        function_at(w, symbols, i + 1, function)?;
    }
    statement_at(w, symbols, i + 1, &block.body)
}

fn function_at(
    w: &mut impl Write,
    symbols: &SymbolTable,
    i: usize,
    function: &Function,
) -> io::Result<()> {
    sp(w, i)?;
    write!(w, "Function {}(", symbols.resolve(function.name))?;
    for (idx, arg) in function.args.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        if arg.is_const {
            write!(w, "const ")?;
        }
        write!(w, "{}: {}", symbols.resolve(arg.name), symbols.resolve(arg.ty))?;
    }
    write!(w, ")")?;
    if let Some(return_ty) = function.return_ty {
        write!(w, " : {}", symbols.resolve(return_ty))?;
    }
    writeln!(w)?;
    block_at(w, symbols, i + 1, &function.block)
}

fn statement_at(
    w: &mut impl Write,
    symbols: &SymbolTable,
    i: usize,
    statement: &Statement,
) -> io::Result<()> {
    sp(w, i)?;
    match statement {
        Statement::Assignment { lhs, rhs } => {
            writeln!(w, "Assignment")?;
            expr_at(w, symbols, i + 1, lhs)?;
            expr_at(w, symbols, i + 1, rhs)?;
        }
        Statement::Compound(body) => {
            writeln!(w, "Compound")?;
            for statement in body {
                statement_at(w, symbols, i + 1, statement)?;
            }
        }
        Statement::If {
            cond,
            then,
            otherwise,
        } => {
            writeln!(w, "If")?;
            expr_at(w, symbols, i + 1, cond)?;
            statement_at(w, symbols, i + 1, then)?;
            if let Some(otherwise) = otherwise {
                statement_at(w, symbols, i + 1, otherwise)?;
            }
        }
        Statement::While { cond, body } => {
            writeln!(w, "While")?;
            expr_at(w, symbols, i + 1, cond)?;
            statement_at(w, symbols, i + 1, body)?;
        }
        Statement::For {
            control,
            begin,
            end,
            ascending,
            body,
        } => {
            let direction = if *ascending { "to" } else { "downto" };
            writeln!(w, "For {} {direction}", symbols.resolve(*control))?;
            expr_at(w, symbols, i + 1, begin)?;
            expr_at(w, symbols, i + 1, end)?;
            statement_at(w, symbols, i + 1, body)?;
        }
        Statement::Call(call) => {
            writeln!(w, "CallStatement")?;
            expr_at(w, symbols, i + 1, call)?;
        }
        Statement::Empty => {
            writeln!(w, "Empty")?;
        }
    }
    Ok(())
}

fn expr_at(w: &mut impl Write, symbols: &SymbolTable, i: usize, expr: &Expr) -> io::Result<()> {
    sp(w, i)?;
    match expr {
        Expr::Str(literal) => writeln!(w, "StringLiteral {literal:?}")?,
        Expr::Number(value) => writeln!(w, "NumberLiteral {value}")?,
        Expr::VarRef(name) => writeln!(w, "VariableRef {}", symbols.resolve(*name))?,
        Expr::Binary { op, lhs, rhs } => {
            writeln!(w, "BinaryOp {op:?}")?;
            expr_at(w, symbols, i + 1, lhs)?;
            expr_at(w, symbols, i + 1, rhs)?;
        }
        Expr::Call { function, args } => {
            writeln!(w, "Call {}", symbols.resolve(*function))?;
            for arg in args {
                expr_at(w, symbols, i + 1, arg)?;
            }
        }
        Expr::Member { base, field } => {
            writeln!(w, "MemberRef {}", symbols.resolve(*field))?;
            expr_at(w, symbols, i + 1, base)?;
        }
    }
    Ok(())
}

fn type_expr(symbols: &SymbolTable, ty: &TypeExpr) -> String {
    let pointer = if ty.is_pointer { "^" } else { "" };
    let kind = match &ty.kind {
        TypeExprKind::Integer => "integer".to_string(),
        TypeExprKind::Boolean => "boolean".to_string(),
        TypeExprKind::String => "string".to_string(),
        TypeExprKind::Enum(tags) => {
            let tags: Vec<_> = tags.iter().map(|&tag| symbols.resolve(tag)).collect();
            format!("({})", tags.join(", "))
        }
        TypeExprKind::Record(fields) => {
            let fields: Vec<_> = fields
                .iter()
                .map(|&(name, ty)| format!("{}: {}", symbols.resolve(name), symbols.resolve(ty)))
                .collect();
            format!("record ({})", fields.join("; "))
        }
        TypeExprKind::Alias(name) => symbols.resolve(*name).to_string(),
    };
    format!("{pointer}{kind}")
}

fn sp(w: &mut impl Write, i: usize) -> io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn dumps_a_small_program() {
        let (program, symbols) = parser::parse(
            "const answer = 42; \
             type tpoint = record x: integer; y: integer end; \
             var p: tpoint; \
             function double(n: integer) : integer; \
             begin \
               double := n * 2 \
             end; \
             begin \
               p.x := double(answer); \
               if p.x > 42 then \
                 p.y := 0 \
             end.",
        )
        .unwrap();

        let expected = indoc! {"
            Block
              ConstDef answer
                NumberLiteral 42
              TypeDef tpoint = record (x: integer; y: integer)
              VarDecl p : tpoint
              Function double(n: integer) : integer
                Block
                  Compound
                    Assignment
                      VariableRef double
                      BinaryOp Multiply
                        VariableRef n
                        NumberLiteral 2
              Compound
                Assignment
                  MemberRef x
                    VariableRef p
                  Call double
                    VariableRef answer
                If
                  BinaryOp GreaterThan
                    MemberRef x
                      VariableRef p
                    NumberLiteral 42
                  Assignment
                    MemberRef y
                      VariableRef p
                    NumberLiteral 0
        "};
        assert_eq!(print_block_string(&symbols, &program), expected);
    }
}

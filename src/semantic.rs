use thiserror::Error;

use crate::{
    ast::{BinaryOp, Block, ConstDef, Expr, Function, Statement, TypeDef, TypeExprKind, VarDecl},
    env::{Environment, FunctionEntry, VarEntry},
    ir,
    symbol::{Symbol, SymbolTable},
    translate::Translate,
    types::{Type, TypeKind},
};

type Result<T, E = Error> = std::result::Result<T, E>;

/// The semantic analyzer: walks the block tree, populating the
/// [`Environment`] and checking types, while driving the [`Translate`]
/// builder to lower each routine body into an IR fragment.
///
/// Analysis consumes the analyzer; on failure no fragments are returned.
pub struct Semantic<'sym> {
    symbols: &'sym mut SymbolTable,
    env: Environment,
    translate: Translate,
}

impl<'sym> Semantic<'sym> {
    pub fn new(symbols: &'sym mut SymbolTable) -> Semantic<'sym> {
        let env = Environment::new(symbols);
        let translate = Translate::new(symbols);
        Semantic {
            symbols,
            env,
            translate,
        }
    }

    pub fn analyse(mut self, program: &Block) -> Result<Vec<ir::Fragment>> {
        self.env.enter_scope();
        let main = self.symbols.intern("main");
        self.translate.enter_level(main);
        let body = self.analyse_block(program)?;
        // An empty top-level body compiles to nothing.
        if !matches!(&body, ir::Statement::Sequence(seq) if seq.is_empty()) {
            self.translate.push_frag(body);
        }
        self.translate.exit_level();
        self.env.exit_scope();
        Ok(self.translate.into_frags())
    }

    fn analyse_block(&mut self, block: &Block) -> Result<ir::Statement> {
        self.analyse_const_defs(&block.consts)?;
        self.analyse_type_defs(&block.types)?;
        self.analyse_var_decls(&block.vars)?;
        self.analyse_functions(&block.functions)?;

        let Statement::Compound(body) = &block.body else {
            return Err(Error::BlockBodyNotCompound);
        };
        let mut seq = Vec::with_capacity(body.len());
        for statement in body {
            seq.push(self.analyse_statement(statement)?);
        }
        Ok(ir::Statement::Sequence(seq))
    }

    fn analyse_const_defs(&mut self, consts: &[ConstDef]) -> Result<()> {
        for def in consts {
            let (_, ty) = self.analyse_expr(&def.value)?;
            let access = self.translate.alloc_local();
            if !self.env.set_var(def.name, VarEntry { ty, access }) {
                return Err(Error::ConstAlreadyDefined);
            }
        }
        Ok(())
    }

    fn analyse_type_defs(&mut self, types: &[TypeDef]) -> Result<()> {
        for def in types {
            let resolved = match &def.ty.kind {
                // Aliases are chased eagerly; everything else becomes a
                // fresh resolved type, so each definition site has its own
                // identity.
                TypeExprKind::Alias(target) => self
                    .env
                    .resolved_type(*target)
                    .cloned()
                    .ok_or(Error::CouldNotResolveType)?,
                TypeExprKind::Integer => Type::new(TypeKind::Integer),
                TypeExprKind::Boolean => Type::new(TypeKind::Boolean),
                TypeExprKind::String => Type::new(TypeKind::String),
                TypeExprKind::Enum(tags) => Type::new(TypeKind::Enum(tags.clone())),
                TypeExprKind::Record(fields) => Type::new(TypeKind::Record(fields.clone())),
            };
            if !self.env.set_resolved_type(def.name, resolved) {
                return Err(Error::TypeAlreadyDefined);
            }
        }
        Ok(())
    }

    fn analyse_var_decls(&mut self, vars: &[VarDecl]) -> Result<()> {
        for decl in vars {
            let ty = self
                .env
                .resolved_type(decl.ty)
                .cloned()
                .ok_or(Error::CouldNotFindVariableType)?;
            let access = self.translate.alloc_local();
            if !self.env.set_var(decl.name, VarEntry { ty, access }) {
                return Err(Error::VariableAlreadyDefined);
            }
        }
        Ok(())
    }

    fn analyse_functions(&mut self, functions: &[Function]) -> Result<()> {
        // Signature pass, so bodies (including recursive ones) can resolve
        // any function of the block.
        for function in functions {
            let return_ty = function
                .return_ty
                .map(|name| {
                    self.env
                        .resolved_type(name)
                        .cloned()
                        .ok_or(Error::CouldNotResolveReturnType)
                })
                .transpose()?;
            let mut arg_tys = Vec::with_capacity(function.args.len());
            for arg in &function.args {
                let ty = self
                    .env
                    .resolved_type(arg.ty)
                    .cloned()
                    .ok_or(Error::CouldNotResolveArgumentType)?;
                arg_tys.push(ty);
            }
            self.env
                .set_function(function.name, FunctionEntry { return_ty, arg_tys });
        }

        // Body pass.
        for function in functions {
            self.env.enter_scope();
            self.translate.enter_level(function.name);
            let entry = self
                .env
                .function(function.name)
                .cloned()
                .expect("bound in the signature pass");
            if let Some(return_ty) = entry.return_ty {
                // A function's own name doubles as its result variable.
                let access = self.translate.alloc_local();
                if !self.env.set_var(
                    function.name,
                    VarEntry {
                        ty: return_ty,
                        access,
                    },
                ) {
                    return Err(Error::ReturnValueAlreadyDefined);
                }
            }
            for (arg, ty) in function.args.iter().zip(entry.arg_tys) {
                let access = self.translate.alloc_local();
                if !self.env.set_var(arg.name, VarEntry { ty, access }) {
                    return Err(Error::ArgumentAlreadyDefined);
                }
            }
            let body = self.analyse_block(&function.block)?;
            self.translate.push_frag(body);
            self.translate.exit_level();
            self.env.exit_scope();
        }
        Ok(())
    }

    fn analyse_statement(&mut self, statement: &Statement) -> Result<ir::Statement> {
        match statement {
            Statement::Assignment { lhs, rhs } => {
                let (lhs_ir, lhs_ty) = self.analyse_expr(lhs)?;
                let (rhs_ir, rhs_ty) = self.analyse_expr(rhs)?;
                if !lhs_ty.is_compatible_with(&rhs_ty) {
                    return Err(Error::AssignmentError);
                }
                Ok(self.translate.make_move(lhs_ir, rhs_ir))
            }
            Statement::Compound(body) => {
                let mut seq = Vec::with_capacity(body.len());
                for statement in body {
                    seq.push(self.analyse_statement(statement)?);
                }
                Ok(self.translate.make_sequence(seq))
            }
            Statement::If {
                cond,
                then,
                otherwise,
            } => {
                let (cond_ir, cond_ty) = self.analyse_expr(cond)?;
                if !cond_ty.is_boolean() {
                    return Err(Error::IfConditionNotBoolean);
                }
                let then_ir = self.analyse_statement(then)?;
                let otherwise_ir = otherwise
                    .as_deref()
                    .map(|statement| self.analyse_statement(statement))
                    .transpose()?;
                Ok(self
                    .translate
                    .make_if(self.symbols, cond_ir, then_ir, otherwise_ir))
            }
            Statement::While { cond, body } => {
                let (cond_ir, cond_ty) = self.analyse_expr(cond)?;
                if !cond_ty.is_boolean() {
                    return Err(Error::WhileConditionNotBoolean);
                }
                let body_ir = self.analyse_statement(body)?;
                Ok(self.translate.make_while(self.symbols, cond_ir, body_ir))
            }
            Statement::For {
                control,
                begin,
                end,
                ascending,
                body,
            } => {
                let entry = self.env.var(*control).ok_or(Error::UnknownVariable)?;
                if !entry.ty.is_integer() {
                    return Err(Error::ForControlNotInteger);
                }
                let access = entry.access;
                let (begin_ir, begin_ty) = self.analyse_expr(begin)?;
                let (end_ir, end_ty) = self.analyse_expr(end)?;
                if !begin_ty.is_integer() || !end_ty.is_integer() {
                    return Err(Error::ForBoundsNotInteger);
                }
                let body_ir = self.analyse_statement(body)?;
                self.translate
                    .make_for(self.symbols, access, begin_ir, end_ir, *ascending, body_ir)
                    .ok_or(Error::UnknownFrameAccess)
            }
            Statement::Call(expr) => {
                if !matches!(expr, Expr::Call { .. }) {
                    return Err(Error::NonCallInCallStatement);
                }
                let (call_ir, _) = self.analyse_call(expr)?;
                Ok(self.translate.make_call_statement(call_ir))
            }
            Statement::Empty => Ok(self.translate.make_sequence(Vec::new())),
        }
    }

    fn analyse_expr(&mut self, expr: &Expr) -> Result<(ir::Expr, Type)> {
        match expr {
            Expr::Str(literal) => {
                let ir = self.translate.make_name(self.symbols, literal);
                Ok((ir, self.env.string().clone()))
            }
            Expr::Number(value) => {
                let ir = self.translate.make_const(*value);
                Ok((ir, self.env.integer().clone()))
            }
            Expr::VarRef(name) => {
                let entry = self.env.var(*name).ok_or(Error::UnknownVariable)?;
                let ty = entry.ty.clone();
                let access = entry.access;
                let ir = self
                    .translate
                    .make_var_ref(access)
                    .ok_or(Error::UnknownFrameAccess)?;
                Ok((ir, ty))
            }
            Expr::Binary { op, lhs, rhs } => self.analyse_binary_op(*op, lhs, rhs),
            Expr::Call { .. } => {
                let (ir, return_ty) = self.analyse_call(expr)?;
                let ty = return_ty.ok_or(Error::ProcedureAsValue)?;
                Ok((ir, ty))
            }
            Expr::Member { base, field } => self.analyse_member_ref(base, *field),
        }
    }

    fn analyse_binary_op(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<(ir::Expr, Type)> {
        let (lhs_ir, lhs_ty) = self.analyse_expr(lhs)?;
        let (rhs_ir, rhs_ty) = self.analyse_expr(rhs)?;
        match op {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                if !lhs_ty.is_integer() || !rhs_ty.is_integer() {
                    return Err(Error::NonIntegerOperand);
                }
                let ir = self.translate.make_arith_op(op, lhs_ir, rhs_ir);
                Ok((ir, self.env.integer().clone()))
            }
            BinaryOp::LessThan
            | BinaryOp::GreaterThan
            | BinaryOp::LessThanEqual
            | BinaryOp::GreaterThanEqual => {
                if !lhs_ty.is_integer() || !rhs_ty.is_integer() {
                    return Err(Error::NonIntegerOperand);
                }
                let ir = self
                    .translate
                    .make_cond_jump(self.symbols, op, lhs_ir, rhs_ir);
                Ok((ir, self.env.boolean().clone()))
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                if !lhs_ty.same_kind(&rhs_ty) {
                    return Err(Error::MismatchingEqualityTypes);
                }
                if !lhs_ty.is_integer() && !lhs_ty.is_string() && !lhs_ty.is_boolean() {
                    return Err(Error::InvalidEqualityOperand);
                }
                let ir = self
                    .translate
                    .make_cond_jump(self.symbols, op, lhs_ir, rhs_ir);
                Ok((ir, self.env.boolean().clone()))
            }
        }
    }

    fn analyse_call(&mut self, expr: &Expr) -> Result<(ir::Expr, Option<Type>)> {
        let Expr::Call { function, args } = expr else {
            unreachable!("caller matched a call expression");
        };
        let entry = self
            .env
            .function(*function)
            .cloned()
            .ok_or(Error::UnknownFunction)?;
        if entry.arg_tys.len() != args.len() {
            return Err(Error::WrongNumberOfArgs);
        }
        let mut ir_args = Vec::with_capacity(args.len());
        for (arg, expected) in args.iter().zip(&entry.arg_tys) {
            let (ir, ty) = self.analyse_expr(arg)?;
            if !expected.is_compatible_with(&ty) {
                return Err(Error::WrongArgumentType);
            }
            ir_args.push(ir);
        }
        let ir = self.translate.make_call(*function, ir_args);
        Ok((ir, entry.return_ty))
    }

    fn analyse_member_ref(&mut self, base: &Expr, field: Symbol) -> Result<(ir::Expr, Type)> {
        let (base_ir, base_ty) = self.analyse_expr(base)?;
        let fields = base_ty.as_record().ok_or(Error::MemberOfNonRecord)?;
        let index = fields
            .iter()
            .position(|&(name, _)| name == field)
            .ok_or(Error::UnknownMember)?;
        let (_, field_ty_name) = fields[index];
        let ty = self
            .env
            .resolved_type(field_ty_name)
            .cloned()
            .ok_or(Error::MemberOfUnknownType)?;
        let ir = self.translate.make_member(base_ir, index);
        Ok((ir, ty))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Const already defined")]
    ConstAlreadyDefined,
    #[error("Type already defined")]
    TypeAlreadyDefined,
    #[error("Variable already defined")]
    VariableAlreadyDefined,
    #[error("Argument already defined")]
    ArgumentAlreadyDefined,
    #[error("Return value already defined")]
    ReturnValueAlreadyDefined,
    #[error("Could not resolve type")]
    CouldNotResolveType,
    #[error("Could not resolve return type")]
    CouldNotResolveReturnType,
    #[error("Could not resolve type of argument")]
    CouldNotResolveArgumentType,
    #[error("Could not find type of variable")]
    CouldNotFindVariableType,
    #[error("Referencing unknown variable")]
    UnknownVariable,
    #[error("Unknown function")]
    UnknownFunction,
    #[error("Wrong number of args")]
    WrongNumberOfArgs,
    #[error("Gave function wrong type")]
    WrongArgumentType,
    #[error("Assignment error")]
    AssignmentError,
    #[error("If condition must be boolean")]
    IfConditionNotBoolean,
    #[error("While condition must be a boolean")]
    WhileConditionNotBoolean,
    #[error("Expected integer in binary op")]
    NonIntegerOperand,
    #[error("Mismatching types in equality")]
    MismatchingEqualityTypes,
    #[error("Expected integer, string or boolean in equality")]
    InvalidEqualityOperand,
    #[error("Member ref access on non-record type")]
    MemberOfNonRecord,
    #[error("Can't find the right member on the record type")]
    UnknownMember,
    #[error("Member of unknown type")]
    MemberOfUnknownType,
    #[error("Block body must be a compound statement")]
    BlockBodyNotCompound,
    #[error("Call statement with a non-call node within")]
    NonCallInCallStatement,
    #[error("Could not find frame owning access")]
    UnknownFrameAccess,
    #[error("Procedure call used as a value")]
    ProcedureAsValue,
    #[error("For control variable must be an integer")]
    ForControlNotInteger,
    #[error("For bounds must be integers")]
    ForBoundsNotInteger,
}

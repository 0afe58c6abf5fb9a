use crate::{
    ast::BinaryOp,
    ir::{Access, ArithOp, CondJump, Expr, Fragment, Level, LevelId, RelOp, Statement, WORD_SIZE},
    symbol::{Symbol, SymbolTable},
};

/// The IR builder driven by the semantic analyzer.
///
/// Tracks a counter for fresh label generation, the stack of levels for the
/// functions currently under analysis, and the growing list of lowered
/// fragments. The initial frame pointer of the innermost level is the
/// distinguished name expression `fp`, a stand-in for whatever register the
/// target machine dedicates to it.
pub struct Translate {
    frame_pointer: Symbol,
    frags: Vec<Fragment>,
    levels: Vec<Level>,
    label_count: u32,
    level_count: u32,
}

impl Translate {
    pub fn new(symbols: &mut SymbolTable) -> Translate {
        Translate {
            frame_pointer: symbols.intern("fp"),
            frags: Vec::new(),
            levels: Vec::new(),
            label_count: 0,
            level_count: 0,
        }
    }

    /// Pushes a new level. Its static link is allocated immediately, so
    /// the first local always exists.
    pub fn enter_level(&mut self, name: Symbol) {
        let id = LevelId::new(self.level_count);
        self.level_count += 1;
        let mut level = Level::new(id, name);
        level.alloc_local();
        self.levels.push(level);
    }

    pub fn exit_level(&mut self) {
        self.levels.pop().expect("level stack underflow");
    }

    pub fn current_level(&self) -> &Level {
        self.levels.last().expect("no active level")
    }

    /// Allocates the next local slot in the innermost level.
    pub fn alloc_local(&mut self) -> Access {
        self.levels
            .last_mut()
            .expect("no active level")
            .alloc_local()
    }

    /// Records the lowered body of the innermost level as a fragment.
    pub fn push_frag(&mut self, body: Statement) {
        let level = self.current_level().clone();
        self.frags.push(Fragment { level, body });
    }

    pub fn into_frags(self) -> Vec<Fragment> {
        self.frags
    }

    /// Synthesizes a fresh label symbol (`L0`, `L1`, ...).
    fn make_label(&mut self, symbols: &mut SymbolTable) -> Symbol {
        let label = format!("L{}", self.label_count);
        self.label_count += 1;
        symbols.intern(&label)
    }

    pub fn make_name(&self, symbols: &mut SymbolTable, literal: &str) -> Expr {
        Expr::Name(symbols.intern(literal))
    }

    pub fn make_const(&self, value: i64) -> Expr {
        Expr::Const(value)
    }

    /// Lowers a variable access into a memory read relative to the frame
    /// pointer, chasing static links through every level between the
    /// current one and the one owning the access.
    ///
    /// Returns `None` when no active level owns the access.
    pub fn make_var_ref(&self, access: Access) -> Option<Expr> {
        let mut frame = Expr::Name(self.frame_pointer);
        for level in self.levels.iter().rev() {
            if level.id() == access.level {
                return Some(mem_at(frame, access.offset));
            }
            // Not this frame: the first local holds the address of the
            // enclosing one.
            frame = mem_at(frame, level.static_link().offset);
        }
        None
    }

    /// Lowers a record member access: the base address plus the field's
    /// slot offset.
    pub fn make_member(&self, base: Expr, field_index: usize) -> Expr {
        mem_at(base, field_index as i64 * WORD_SIZE)
    }

    pub fn make_arith_op(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::ArithOp {
            op: arith_op_kind(op),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Builds a conditional jump with two fresh labels, wrapped as an
    /// expression.
    pub fn make_cond_jump(
        &mut self,
        symbols: &mut SymbolTable,
        op: BinaryOp,
        lhs: Expr,
        rhs: Expr,
    ) -> Expr {
        let then_label = self.make_label(symbols);
        let else_label = self.make_label(symbols);
        Expr::CondExpr(Box::new(CondJump {
            op: rel_op_kind(op),
            lhs,
            rhs,
            then_label,
            else_label,
        }))
    }

    pub fn make_call(&self, function: Symbol, args: Vec<Expr>) -> Expr {
        Expr::Call { function, args }
    }

    pub fn make_move(&self, dst: Expr, src: Expr) -> Statement {
        Statement::Move { dst, src }
    }

    pub fn make_sequence(&self, statements: Vec<Statement>) -> Statement {
        Statement::Sequence(statements)
    }

    pub fn make_call_statement(&self, call: Expr) -> Statement {
        Statement::Call(call)
    }

    pub fn make_if(
        &mut self,
        symbols: &mut SymbolTable,
        cond: Expr,
        then: Statement,
        otherwise: Option<Statement>,
    ) -> Statement {
        let jump = self.as_cond_jump(symbols, cond);
        let then_label = jump.then_label;
        let else_label = jump.else_label;
        let mut seq = vec![Statement::CondJump(jump), Statement::Label(then_label), then];
        if let Some(otherwise) = otherwise {
            seq.push(Statement::Label(else_label));
            seq.push(otherwise);
        }
        Statement::Sequence(seq)
    }

    pub fn make_while(&mut self, symbols: &mut SymbolTable, cond: Expr, body: Statement) -> Statement {
        let jump = self.as_cond_jump(symbols, cond);
        let then_label = jump.then_label;
        let else_label = jump.else_label;
        let cond_label = self.make_label(symbols);
        Statement::Sequence(vec![
            Statement::Label(cond_label),
            Statement::CondJump(jump),
            Statement::Label(then_label),
            body,
            Statement::Jump(cond_label),
            Statement::Label(else_label),
        ])
    }

    /// Lowers a counted loop over an integer control variable: initialize,
    /// test against the limit, run the body, step towards the limit, jump
    /// back.
    pub fn make_for(
        &mut self,
        symbols: &mut SymbolTable,
        control: Access,
        begin: Expr,
        end: Expr,
        ascending: bool,
        body: Statement,
    ) -> Option<Statement> {
        let (limit_op, step_op) = if ascending {
            (RelOp::LessThanEqual, ArithOp::Add)
        } else {
            (RelOp::GreaterThanEqual, ArithOp::Subtract)
        };
        let init = Statement::Move {
            dst: self.make_var_ref(control)?,
            src: begin,
        };
        let cond_label = self.make_label(symbols);
        let body_label = self.make_label(symbols);
        let exit_label = self.make_label(symbols);
        let test = CondJump {
            op: limit_op,
            lhs: self.make_var_ref(control)?,
            rhs: end,
            then_label: body_label,
            else_label: exit_label,
        };
        let step = Statement::Move {
            dst: self.make_var_ref(control)?,
            src: Expr::ArithOp {
                op: step_op,
                lhs: Box::new(self.make_var_ref(control)?),
                rhs: Box::new(Expr::Const(1)),
            },
        };
        Some(Statement::Sequence(vec![
            init,
            Statement::Label(cond_label),
            Statement::CondJump(test),
            Statement::Label(body_label),
            body,
            step,
            Statement::Jump(cond_label),
            Statement::Label(exit_label),
        ]))
    }

    /// Normalizes a condition into a conditional jump: a plain value
    /// expression (a boolean variable, a call, ...) is compared against
    /// `1` under two fresh labels.
    fn as_cond_jump(&mut self, symbols: &mut SymbolTable, cond: Expr) -> CondJump {
        match cond {
            Expr::CondExpr(jump) => *jump,
            value => {
                let then_label = self.make_label(symbols);
                let else_label = self.make_label(symbols);
                CondJump {
                    op: RelOp::Equal,
                    lhs: value,
                    rhs: Expr::Const(1),
                    then_label,
                    else_label,
                }
            }
        }
    }
}

fn mem_at(base: Expr, offset: i64) -> Expr {
    Expr::Mem(Box::new(Expr::ArithOp {
        op: ArithOp::Add,
        lhs: Box::new(base),
        rhs: Box::new(Expr::Const(offset)),
    }))
}

fn arith_op_kind(op: BinaryOp) -> ArithOp {
    match op {
        BinaryOp::Add => ArithOp::Add,
        BinaryOp::Subtract => ArithOp::Subtract,
        BinaryOp::Multiply => ArithOp::Multiply,
        BinaryOp::Divide => ArithOp::Divide,
        _ => unreachable!("not an arithmetic operator: {op:?}"),
    }
}

fn rel_op_kind(op: BinaryOp) -> RelOp {
    match op {
        BinaryOp::Equal => RelOp::Equal,
        BinaryOp::NotEqual => RelOp::NotEqual,
        BinaryOp::LessThan => RelOp::LessThan,
        BinaryOp::GreaterThan => RelOp::GreaterThan,
        BinaryOp::LessThanEqual => RelOp::LessThanEqual,
        BinaryOp::GreaterThanEqual => RelOp::GreaterThanEqual,
        _ => unreachable!("not a relational operator: {op:?}"),
    }
}

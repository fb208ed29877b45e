//! The Rift abstract syntax tree.
//!
//! Deliberately small: a handful of expression forms, with the special
//! calls (`c`, `eval`, `length`, `type`) kept apart from user calls because
//! they lower to dedicated intrinsics.

use riftc_util::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Neq,
    Lt,
    Gt,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Exp {
    /// Numeric literal.
    Num(f64),
    /// String literal, by pool index.
    Str(Symbol),
    /// Variable read.
    Var(Symbol),
    /// Ordered statement list; its value is the last statement's value.
    Seq(Vec<Exp>),
    /// Function literal.
    Fun { params: Vec<Symbol>, body: Box<Exp> },
    BinExp {
        op: BinOp,
        lhs: Box<Exp>,
        rhs: Box<Exp>,
    },
    /// Call of a user value: `f(a, b)`.
    UserCall { callee: Box<Exp>, args: Vec<Exp> },
    /// `c(a, b, ...)`.
    CCall { args: Vec<Exp> },
    /// `eval(x)`.
    EvalCall(Box<Exp>),
    /// `type(x)`.
    TypeCall(Box<Exp>),
    /// `length(x)`.
    LengthCall(Box<Exp>),
    /// Indexed read: `a[i]`.
    Index { value: Box<Exp>, index: Box<Exp> },
    /// `name <- rhs`.
    SimpleAssignment { name: Symbol, rhs: Box<Exp> },
    /// `a[i] <- rhs`.
    IndexAssignment {
        value: Box<Exp>,
        index: Box<Exp>,
        rhs: Box<Exp>,
    },
    IfElse {
        guard: Box<Exp>,
        if_clause: Box<Exp>,
        else_clause: Box<Exp>,
    },
    WhileLoop { guard: Box<Exp>, body: Box<Exp> },
}

impl Exp {
    /// Number of statements if this is a sequence, 1 otherwise.
    pub fn statement_count(&self) -> usize {
        match self {
            Exp::Seq(body) => body.len(),
            _ => 1,
        }
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use crate::literal::Literal;
use crate::token::Token;

/// A stable identity for an expression node, used as the resolver's
/// annotation key: every expression node has a stable identity used as the
/// key for resolver annotations. Minted once per node at parse time from a
/// monotonic counter; two nodes never collide, even if their tokens happen
/// to look alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

pub fn next_node_id() -> NodeId {
    NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryData {
    pub operator: Token,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingData {
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableData {
    pub id: NodeId,
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignData {
    pub id: NodeId,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    pub callee: Box<Expr>,
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetData {
    pub object: Box<Expr>,
    pub name: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetData {
    pub object: Box<Expr>,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThisData {
    pub id: NodeId,
    pub keyword: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperData {
    pub id: NodeId,
    pub keyword: Token,
    pub method: Token,
}

/// The expression sum type. A tagged enum stands in for the
/// Visitor-over-class-hierarchy pattern of the reference implementation:
/// the evaluator, resolver, and printer are each a single exhaustive match
/// over `Expr` instead of a family of double-dispatching visitor methods.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Unary(UnaryData),
    Binary(BinaryData),
    Logical(LogicalData),
    Grouping(GroupingData),
    Variable(VariableData),
    Assign(AssignData),
    Call(CallData),
    Get(GetData),
    Set(SetData),
    This(ThisData),
    Super(SuperData),
}

pub trait ExprVisitor<T> {
    fn visit_literal_expr(&mut self, literal: &Literal) -> T;
    fn visit_unary_expr(&mut self, data: &UnaryData) -> T;
    fn visit_binary_expr(&mut self, data: &BinaryData) -> T;
    fn visit_logical_expr(&mut self, data: &LogicalData) -> T;
    fn visit_grouping_expr(&mut self, data: &GroupingData) -> T;
    fn visit_variable_expr(&mut self, data: &VariableData) -> T;
    fn visit_assign_expr(&mut self, data: &AssignData) -> T;
    fn visit_call_expr(&mut self, data: &CallData) -> T;
    fn visit_get_expr(&mut self, data: &GetData) -> T;
    fn visit_set_expr(&mut self, data: &SetData) -> T;
    fn visit_this_expr(&mut self, data: &ThisData) -> T;
    fn visit_super_expr(&mut self, data: &SuperData) -> T;
}

impl Expr {
    pub fn accept<T>(&self, visitor: &mut dyn ExprVisitor<T>) -> T {
        match self {
            Expr::Literal(data) => visitor.visit_literal_expr(data),
            Expr::Unary(data) => visitor.visit_unary_expr(data),
            Expr::Binary(data) => visitor.visit_binary_expr(data),
            Expr::Logical(data) => visitor.visit_logical_expr(data),
            Expr::Grouping(data) => visitor.visit_grouping_expr(data),
            Expr::Variable(data) => visitor.visit_variable_expr(data),
            Expr::Assign(data) => visitor.visit_assign_expr(data),
            Expr::Call(data) => visitor.visit_call_expr(data),
            Expr::Get(data) => visitor.visit_get_expr(data),
            Expr::Set(data) => visitor.visit_set_expr(data),
            Expr::This(data) => visitor.visit_this_expr(data),
            Expr::Super(data) => visitor.visit_super_expr(data),
        }
    }
}

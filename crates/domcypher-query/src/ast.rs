//! Query syntax tree.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub use_url: Option<String>,
    pub matches: Vec<Pattern>,
    pub predicate: Option<Predicate>,
    pub returns: ReturnClause,
}

/// One MATCH clause: `node (edge node)*`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub nodes: Vec<NodePattern>,
    pub edges: Vec<EdgePattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `-->`
    Right,
    /// `<--`
    Left,
    /// `--` or `<-->`
    Both,
}

/// `*min..max`; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HopRange {
    pub min: u32,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePattern {
    pub variable: Option<String>,
    pub edge_type: Option<String>,
    pub direction: Direction,
    pub hops: Option<HopRange>,
}

/// `var` or `var.property`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub variable: String,
    pub property: Option<String>,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(prop) => write!(f, "{}.{}", self.variable, prop),
            None => f.write_str(&self.variable),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Str(String),
    /// Literal text as written, sign included.
    Number(String),
    Bool(bool),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Number(n) => f.write_str(n),
            Value::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Null => f.write_str("NULL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Is,
    Contains,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::Eq => "=",
            Operator::Neq => "<>",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Is => "IS",
            Operator::Contains => "CONTAINS",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    Value(Value),
    Entity(EntityRef),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub entity: EntityRef,
    pub op: Operator,
    pub operand: Operand,
}

/// WHERE expression. AND binds tighter than OR.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    Condition(Condition),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    /// Leaf conditions, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Predicate::Condition(c) => vec![c],
            Predicate::And(l, r) | Predicate::Or(l, r) => {
                let mut out = l.conditions();
                out.extend(r.conditions());
                out
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnClause {
    pub items: Vec<EntityRef>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

//! Query expression tree
//!
//! Nodes are immutable and children are held behind `Arc`, so a rewrite pass
//! rebuilds only the path to a changed node and shares everything else with
//! the input tree.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    /// Regex match
    #[serde(rename = "=~")]
    Er,
    /// Regex non-match
    #[serde(rename = "!~")]
    Nr,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    /// Operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Er => "=~",
            CompareOp::Nr => "!~",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge
        )
    }
}

/// Literal operand of a comparison or function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Literal {
    pub fn string(value: impl Into<String>) -> Self {
        Literal::String(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Literal::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Number(value.into())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        }
    }
}

/// Query expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    And {
        children: Vec<Arc<Expr>>,
    },
    Or {
        children: Vec<Arc<Expr>>,
    },
    Not {
        child: Arc<Expr>,
    },
    Compare {
        op: CompareOp,
        field: String,
        literal: Literal,
    },
    /// Namespaced function call such as `filter:includeRegex(FIELD, 'x')`
    Function {
        namespace: String,
        name: String,
        #[serde(default)]
        args: Vec<Arc<Expr>>,
    },
    /// Bare identifier, used as a function argument
    Field {
        name: String,
    },
    /// Bare literal, used as a function argument
    Value {
        literal: Literal,
    },
}

impl Expr {
    pub fn compare(op: CompareOp, field: impl Into<String>, literal: impl Into<Literal>) -> Arc<Self> {
        Arc::new(Expr::Compare {
            op,
            field: field.into(),
            literal: literal.into(),
        })
    }

    pub fn eq(field: impl Into<String>, literal: impl Into<Literal>) -> Arc<Self> {
        Self::compare(CompareOp::Eq, field, literal)
    }

    pub fn and(children: Vec<Arc<Expr>>) -> Arc<Self> {
        Arc::new(Expr::And { children })
    }

    pub fn or(children: Vec<Arc<Expr>>) -> Arc<Self> {
        Arc::new(Expr::Or { children })
    }

    pub fn not(child: Arc<Expr>) -> Arc<Self> {
        Arc::new(Expr::Not { child })
    }

    /// Parses the JSON form of an expression tree
    pub fn from_json(json: &str) -> serde_json::Result<Arc<Self>> {
        serde_json::from_str(json)
    }

    /// Number of comparison nodes in the tree
    pub fn comparison_count(&self) -> usize {
        match self {
            Expr::And { children } | Expr::Or { children } => {
                children.iter().map(|c| c.comparison_count()).sum()
            }
            Expr::Not { child } => child.comparison_count(),
            Expr::Compare { .. } => 1,
            Expr::Function { args, .. } => args.iter().map(|a| a.comparison_count()).sum(),
            Expr::Field { .. } | Expr::Value { .. } => 0,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Arc<Expr>], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::And { children } => write_joined(f, children, "&&"),
            Expr::Or { children } => write_joined(f, children, "||"),
            Expr::Not { child } => write!(f, "!{}", child),
            Expr::Compare { op, field, literal } => {
                write!(f, "{} {} {}", field, op.symbol(), literal)
            }
            Expr::Function {
                namespace,
                name,
                args,
            } => {
                write!(f, "{}:{}(", namespace, name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Field { name } => write!(f, "{}", name),
            Expr::Value { literal } => write!(f, "{}", literal),
        }
    }
}

//! Predicate trees for SELECTION.  An atom compares a named column against a
//! string literal; a composite chains one atom and an optional right-hand
//! composite under AND or OR, so every predicate is a left spine.  A missing
//! right-hand side evaluates to true, which is what lets a single atom stand
//! alone under its operator.

use crate::row::{MissingColumn, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Lt,
    Gt,
    LtE,
    GtE,
}

impl CompOp {
    /// Operator names as they appear in query documents.
    pub fn parse(name: &str) -> Option<CompOp> {
        match name {
            "EQ" => Some(CompOp::Eq),
            "LT" => Some(CompOp::Lt),
            "GT" => Some(CompOp::Gt),
            "LT_E" => Some(CompOp::LtE),
            "GT_E" => Some(CompOp::GtE),
            _ => None,
        }
    }

    fn eval(self, left: &str, right: &str) -> bool {
        match self {
            CompOp::Eq => left == right,
            CompOp::Lt => left < right,
            CompOp::Gt => left > right,
            CompOp::LtE => left <= right,
            CompOp::GtE => left >= right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// One comparison: `column op literal`, compared lexicographically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub column: String,
    pub op: CompOp,
    pub literal: String,
}

impl Comparison {
    pub fn new(column: &str, op: CompOp, literal: &str) -> Comparison {
        Comparison {
            column: column.to_string(),
            op,
            literal: literal.to_string(),
        }
    }

    fn matches(&self, row: &Row) -> Result<bool, MissingColumn> {
        Ok(self.op.eval(row.require(&self.column)?, &self.literal))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub left: Comparison,
    pub op: BoolOp,
    pub right: Option<Box<Predicate>>,
}

impl Predicate {
    pub fn single(left: Comparison, op: BoolOp) -> Predicate {
        Predicate {
            left,
            op,
            right: None,
        }
    }

    pub fn chain(left: Comparison, op: BoolOp, right: Predicate) -> Predicate {
        Predicate {
            left,
            op,
            right: Some(Box::new(right)),
        }
    }

    /// Evaluates against one row.  Both sides evaluate before combining, so
    /// a missing column surfaces from either side of an OR.
    pub fn matches(&self, row: &Row) -> Result<bool, MissingColumn> {
        let left = self.left.matches(row)?;
        let right = match &self.right {
            None => true,
            Some(p) => p.matches(row)?,
        };
        Ok(match self.op {
            BoolOp::And => left && right,
            BoolOp::Or => left || right,
        })
    }
}

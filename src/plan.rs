//! Builds an operator pipeline from a JSON query document.
//!
//! A query is `{"head": {"name": ..., "args": ..., "child": ...}}`, one
//! node per operator, a null child ending the descent.  Constructors are
//! looked up in a registry keyed by operator name; the production set is
//! the seven built-ins, and [`Planner::register`] exists so tests can
//! splice in static sources.  A document that fails to build yields the
//! drained sentinel rather than an error: a bad plan returns no rows.

use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::ops::{
    BoxedRowIter, Count, Empty, FileScan, Limit, Projection, Scan, Selection, Sort, SortOrder,
};
use crate::predicate::{BoolOp, CompOp, Comparison, Predicate};
use crate::storage::{self, StorageReader};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The query document is not valid JSON: {0}.")]
    BadDocument(#[from] serde_json::Error),
    #[error("No operator named {0:?}.")]
    UnknownOperator(String),
    #[error("Operator {operator} needs a child node.")]
    MissingChild { operator: &'static str },
    #[error("Operator {operator} got malformed arguments: {reason}.")]
    BadArgs {
        operator: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

fn bad_args(operator: &'static str, reason: impl Into<String>) -> Error {
    Error::BadArgs {
        operator,
        reason: reason.into(),
    }
}

/// One operator in a plan document.  `args` stays untyped until the
/// operator's constructor interprets it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanNode {
    pub name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub child: Option<Box<PlanNode>>,
}

/// A parsed query document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryTree {
    pub head: Option<PlanNode>,
}

pub fn parse_tree(input: &str) -> Result<QueryTree, Error> {
    Ok(serde_json::from_str(input)?)
}

pub type Constructor = fn(&Planner, &PlanNode) -> Result<BoxedRowIter, Error>;

lazy_static! {
    static ref BUILTIN_OPERATORS: HashMap<&'static str, Constructor> = {
        let mut m: HashMap<&'static str, Constructor> = HashMap::new();
        m.insert("FILE_SCAN", build_file_scan as Constructor);
        m.insert("SCAN", build_scan);
        m.insert("PROJECTION", build_projection);
        m.insert("LIMIT", build_limit);
        m.insert("SELECTION", build_selection);
        m.insert("SORT", build_sort);
        m.insert("COUNT", build_count);
        m
    };
}

pub struct Planner {
    registry: HashMap<String, Constructor>,
}

impl Default for Planner {
    fn default() -> Planner {
        Planner::new()
    }
}

impl Planner {
    pub fn new() -> Planner {
        Planner {
            registry: BUILTIN_OPERATORS
                .iter()
                .map(|(name, c)| (name.to_string(), *c))
                .collect(),
        }
    }

    /// Adds or replaces a constructor.  Production plans only ever see the
    /// built-in set; tests register in-memory sources here.
    pub fn register(&mut self, name: &str, constructor: Constructor) {
        self.registry.insert(name.to_string(), constructor);
    }

    /// Builds the operator pipeline for one plan node.
    pub fn build(&self, node: &PlanNode) -> Result<BoxedRowIter, Error> {
        match self.registry.get(node.name.as_str()) {
            Some(constructor) => constructor(self, node),
            None => Err(Error::UnknownOperator(node.name.clone())),
        }
    }

    /// Builds the pipeline for a whole document, collapsing every failure
    /// to the drained sentinel.
    pub fn plan_or_empty(&self, input: &str) -> BoxedRowIter {
        let tree = match parse_tree(input) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "discarding unparseable query document");
                return Box::new(Empty);
            }
        };
        let head = match tree.head {
            Some(head) => head,
            None => return Box::new(Empty),
        };
        match self.build(&head) {
            Ok(it) => it,
            Err(e) => {
                warn!(error = %e, "discarding malformed plan");
                Box::new(Empty)
            }
        }
    }

    fn child(&self, node: &PlanNode, operator: &'static str) -> Result<BoxedRowIter, Error> {
        match &node.child {
            Some(child) => self.build(child),
            None => Err(Error::MissingChild { operator }),
        }
    }
}

fn build_file_scan(_: &Planner, node: &PlanNode) -> Result<BoxedRowIter, Error> {
    let args = node
        .args
        .as_object()
        .ok_or_else(|| bad_args("FILE_SCAN", "expected an object"))?;
    let dir = args
        .get("dir")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_args("FILE_SCAN", "missing \"dir\""))?;
    let file_number = args
        .get("file_number")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| bad_args("FILE_SCAN", "\"file_number\" must be a decimal string"))?;
    // A full scan never consults the index.
    let reader = StorageReader::open(Path::new(dir), file_number, false)?;
    Ok(Box::new(FileScan::new(reader)))
}

fn build_scan(planner: &Planner, node: &PlanNode) -> Result<BoxedRowIter, Error> {
    Ok(Box::new(Scan::new(planner.child(node, "SCAN")?)))
}

fn build_projection(planner: &Planner, node: &PlanNode) -> Result<BoxedRowIter, Error> {
    let columns = string_array(&node.args)
        .ok_or_else(|| bad_args("PROJECTION", "expected an array of column names"))?;
    Ok(Box::new(Projection::new(
        columns,
        planner.child(node, "PROJECTION")?,
    )))
}

fn build_limit(planner: &Planner, node: &PlanNode) -> Result<BoxedRowIter, Error> {
    let args = string_array(&node.args)
        .filter(|a| a.len() == 1)
        .ok_or_else(|| bad_args("LIMIT", "expected a one-element array"))?;
    let limit = args[0]
        .parse::<u32>()
        .map_err(|_| bad_args("LIMIT", "the limit must be a decimal string"))?;
    Ok(Box::new(Limit::new(limit, planner.child(node, "LIMIT")?)))
}

fn build_sort(planner: &Planner, node: &PlanNode) -> Result<BoxedRowIter, Error> {
    let args = node
        .args
        .as_object()
        .and_then(|o| o.get("sorted_args"))
        .and_then(Value::as_array)
        .ok_or_else(|| bad_args("SORT", "expected {\"sorted_args\": [...]}"))?;
    let mut keys = Vec::with_capacity(args.len());
    for arg in args {
        let pair = arg
            .as_str()
            .ok_or_else(|| bad_args("SORT", "sort keys must be strings"))?;
        let (column, order) = pair
            .split_once(':')
            .ok_or_else(|| bad_args("SORT", format!("expected col:ASC or col:DESC, got {:?}", pair)))?;
        let order = SortOrder::parse(order)
            .ok_or_else(|| bad_args("SORT", format!("unknown sort order in {:?}", pair)))?;
        keys.push((column.to_string(), order));
    }
    Ok(Box::new(Sort::new(keys, planner.child(node, "SORT")?)))
}

fn build_count(planner: &Planner, node: &PlanNode) -> Result<BoxedRowIter, Error> {
    let columns = string_array(&node.args)
        .ok_or_else(|| bad_args("COUNT", "expected an array of column names"))?;
    Ok(Box::new(Count::new(columns, planner.child(node, "COUNT")?)))
}

fn build_selection(planner: &Planner, node: &PlanNode) -> Result<BoxedRowIter, Error> {
    let args = node
        .args
        .as_object()
        .ok_or_else(|| bad_args("SELECTION", "expected an object"))?;
    let predicate = parse_predicates(args)?;
    Ok(Box::new(Selection::new(
        predicate,
        planner.child(node, "SELECTION")?,
    )))
}

fn string_array(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// `{"AND"|"OR": body}` where a body holds one comparison (`{"EQ": [col,
/// lit]}`) and at most one nested `"AND"`/`"OR"` body.  Only one operator
/// fits per level, so predicates stay left spines.
fn parse_predicates(args: &serde_json::Map<String, Value>) -> Result<Predicate, Error> {
    let (op, body) = if let Some(body) = args.get("AND") {
        (BoolOp::And, body)
    } else if let Some(body) = args.get("OR") {
        (BoolOp::Or, body)
    } else {
        return Err(bad_args("SELECTION", "expected an \"AND\" or \"OR\" key"));
    };
    let body = body
        .as_object()
        .ok_or_else(|| bad_args("SELECTION", "the predicate body must be an object"))?;
    let left = parse_comparison(body)?;
    let right = if body.contains_key("AND") || body.contains_key("OR") {
        Some(Box::new(parse_predicates(body)?))
    } else {
        None
    };
    Ok(Predicate { left, op, right })
}

fn parse_comparison(body: &serde_json::Map<String, Value>) -> Result<Comparison, Error> {
    for (name, value) in body {
        let op = match CompOp::parse(name) {
            Some(op) => op,
            None => continue,
        };
        let args = value
            .as_array()
            .filter(|a| a.len() == 2)
            .ok_or_else(|| bad_args("SELECTION", format!("{} needs [column, literal]", name)))?;
        let column = args[0]
            .as_str()
            .ok_or_else(|| bad_args("SELECTION", "the column must be a string"))?;
        let literal = args[1]
            .as_str()
            .ok_or_else(|| bad_args("SELECTION", "the literal must be a string"))?;
        return Ok(Comparison::new(column, op, literal));
    }
    Err(bad_args("SELECTION", "no comparison in the predicate body"))
}

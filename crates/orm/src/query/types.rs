//! Query Builder Types - clause slots and their enums

use crate::backends::Params;
use crate::error::ModelError;
use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted in `attr[op]` keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    NotEqualAlt,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
}

impl QueryOperator {
    pub fn is_equality(&self) -> bool {
        matches!(self, QueryOperator::Equal)
    }

    pub fn is_inequality(&self) -> bool {
        matches!(self, QueryOperator::NotEqual | QueryOperator::NotEqualAlt)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "<>"),
            QueryOperator::NotEqualAlt => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::NotLike => write!(f, "NOT LIKE"),
        }
    }
}

impl FromStr for QueryOperator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "=" => Ok(QueryOperator::Equal),
            "<>" => Ok(QueryOperator::NotEqual),
            "!=" => Ok(QueryOperator::NotEqualAlt),
            ">" => Ok(QueryOperator::GreaterThan),
            ">=" => Ok(QueryOperator::GreaterThanOrEqual),
            "<" => Ok(QueryOperator::LessThan),
            "<=" => Ok(QueryOperator::LessThanOrEqual),
            "LIKE" => Ok(QueryOperator::Like),
            "NOT LIKE" => Ok(QueryOperator::NotLike),
            _ => Err(ModelError::Query(format!("Unsupported operator '{}'", s))),
        }
    }
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

impl FromStr for OrderDirection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            _ => Err(ModelError::Query(format!("Unsupported order direction '{}'", s))),
        }
    }
}

/// Statement kind; renders as the leading clause
#[derive(Debug, Clone, PartialEq)]
pub enum QueryAction {
    Select { columns: String },
    Insert,
    Update,
    Delete,
}

impl QueryAction {
    pub fn is_mutation(&self) -> bool {
        matches!(self, QueryAction::Update | QueryAction::Delete)
    }
}

/// `SET` assignments with their parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetClause {
    /// `(column, parameter name)` pairs
    pub assignments: Vec<(String, String)>,
    pub params: Params,
}

/// Rendered `WHERE` body (without the keyword) with its parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pub conditions: String,
    pub params: Params,
}

/// One `ORDER BY` term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub column: String,
    pub direction: OrderDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parsing() {
        assert_eq!("=".parse::<QueryOperator>().unwrap(), QueryOperator::Equal);
        assert_eq!("not  like".parse::<QueryOperator>().unwrap(), QueryOperator::NotLike);
        assert_eq!(">=".parse::<QueryOperator>().unwrap().to_string(), ">=");
        assert!("; DROP TABLE x".parse::<QueryOperator>().is_err());
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("desc".parse::<OrderDirection>().unwrap(), OrderDirection::Desc);
        assert!("sideways".parse::<OrderDirection>().is_err());
    }
}

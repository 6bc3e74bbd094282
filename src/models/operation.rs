//! Operation catalog types and the pure arithmetic behind each operation type

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::services::ledger::round_to;

/// Decimal places kept for division and square root results
pub const RESULT_PRECISION: i32 = 4;

/// Operation types offered by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Addition,
    Subtraction,
    Division,
    SquareRoot,
    RandomString,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Addition => write!(f, "addition"),
            OperationType::Subtraction => write!(f, "subtraction"),
            OperationType::Division => write!(f, "division"),
            OperationType::SquareRoot => write!(f, "square_root"),
            OperationType::RandomString => write!(f, "random_string"),
        }
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "addition" => Ok(OperationType::Addition),
            "subtraction" => Ok(OperationType::Subtraction),
            "division" => Ok(OperationType::Division),
            "square_root" => Ok(OperationType::SquareRoot),
            "random_string" => Ok(OperationType::RandomString),
            _ => Err(format!("Unknown operation type: {}", s)),
        }
    }
}

/// Named numeric inputs of an arithmetic operation
pub type Operands = BTreeMap<String, f64>;

/// Pure arithmetic behind a numeric operation type
pub type ArithmeticFn = fn(&Operands) -> Result<f64, ArithmeticError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("square root of negative number {0}")]
    NegativeSquareRoot(f64),
    #[error("operand {0} is not declared for this operation")]
    MissingOperand(&'static str),
    #[error("result is out of range")]
    Overflow,
}

impl OperationType {
    /// Arithmetic for numeric operation types; `None` for types served by
    /// an external collaborator (random strings).
    pub fn arithmetic(self) -> Option<ArithmeticFn> {
        match self {
            OperationType::Addition => Some(addition),
            OperationType::Subtraction => Some(subtraction),
            OperationType::Division => Some(division),
            OperationType::SquareRoot => Some(square_root),
            OperationType::RandomString => None,
        }
    }
}

fn operand(operands: &Operands, name: &'static str) -> Result<f64, ArithmeticError> {
    operands
        .get(name)
        .copied()
        .ok_or(ArithmeticError::MissingOperand(name))
}

/// Results are persisted as text and returned as JSON numbers, neither of
/// which can carry an infinity
fn finite(value: f64) -> Result<f64, ArithmeticError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ArithmeticError::Overflow)
    }
}

pub fn addition(operands: &Operands) -> Result<f64, ArithmeticError> {
    finite(operand(operands, "A")? + operand(operands, "B")?)
}

pub fn subtraction(operands: &Operands) -> Result<f64, ArithmeticError> {
    finite(operand(operands, "A")? - operand(operands, "B")?)
}

pub fn division(operands: &Operands) -> Result<f64, ArithmeticError> {
    let divisor = operand(operands, "B")?;
    if divisor == 0.0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    finite(round_to(operand(operands, "A")? / divisor, RESULT_PRECISION))
}

pub fn square_root(operands: &Operands) -> Result<f64, ArithmeticError> {
    let radicand = operand(operands, "A")?;
    if radicand < 0.0 {
        return Err(ArithmeticError::NegativeSquareRoot(radicand));
    }
    Ok(round_to(radicand.sqrt(), RESULT_PRECISION))
}

/// Result of an executed operation, serialized as a bare JSON number or string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationOutcome {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationOutcome::Number(value) => write!(f, "{}", value),
            OperationOutcome::Text(value) => f.write_str(value),
        }
    }
}

/// Operation as exposed by GET /operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationEntry {
    pub id: i32,
    #[serde(rename = "type")]
    pub operation_type: String,
    pub cost: f64,
    pub fields: serde_json::Value,
}

impl From<crate::entities::operations::Model> for OperationEntry {
    fn from(model: crate::entities::operations::Model) -> Self {
        let fields = serde_json::from_str(&model.fields)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        Self {
            id: model.id,
            operation_type: model.operation_type,
            cost: model.cost,
            fields,
        }
    }
}

/// Query parameters for GET /operations
///
/// Everything arrives as raw text; page/size fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationListQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub filter: Option<String>,
    pub order: Option<String>,
}

/// Response for GET /operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationListResponse {
    pub data: Vec<OperationEntry>,
    pub total_pages: u64,
    pub page: u64,
    pub size: u64,
    pub filter: Option<String>,
    pub order: Option<String>,
}

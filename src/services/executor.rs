//! Metered operation execution
//!
//! `execute` resolves the operation, checks its cost against the caller's
//! balance, validates the variables, computes the result and writes the
//! record together with the new balance. Balance is checked before the
//! variables, so a broke caller sees 402 even when the payload is also wrong.
//! The debit is re-reserved under a row lock and written with the record in
//! one transaction; any failure rolls back both writes.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::entities::{operations, prelude::Operations, records};
use crate::error::ApiError;
use crate::models::operation::{OperationOutcome, OperationType, Operands};
use crate::services::ledger::{self, Reservation, UserLocks};
use crate::services::random_string::RandomStringProvider;

/// Metadata `type` of fields that are fed to arithmetic
const NUMERIC_FIELD: &str = "number";

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub operation_type: OperationType,
    pub result: OperationOutcome,
    /// Variables as supplied, echoed back to the caller
    pub variables: Map<String, Value>,
    pub record: records::Model,
}

#[derive(Clone)]
pub struct OperationExecutor {
    db: DatabaseConnection,
    random_strings: Arc<dyn RandomStringProvider>,
    locks: UserLocks,
}

impl OperationExecutor {
    pub fn new(
        db: DatabaseConnection,
        random_strings: Arc<dyn RandomStringProvider>,
        locks: UserLocks,
    ) -> Self {
        Self {
            db,
            random_strings,
            locks,
        }
    }

    pub async fn execute(
        &self,
        user_id: i32,
        operation_id: i32,
        raw_variables: Option<&Value>,
    ) -> Result<ExecutionResult, ApiError> {
        let operation = Operations::find_by_id(operation_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Operation {} not found", operation_id)))?;
        let operation_type: OperationType =
            operation.operation_type.parse().map_err(ApiError::unexpected)?;
        let variables = parse_variables(raw_variables);

        let _guard = self.locks.lock(user_id).await;

        // No transaction is open while the result is computed, so a slow
        // random string provider holds neither a connection nor the row lock.
        let balance = ledger::current_balance(&self.db, user_id).await?;
        let quote = Reservation::new(user_id, balance, operation.cost);
        if !quote.is_affordable() {
            return Err(insufficient_balance(&quote, operation_type));
        }

        let declared = declared_fields(&operation)?;
        let operands = check_variables(&variables, &declared, operation_type)?;
        let result = self.evaluate(operation_type, &operands).await?;

        let txn = self.db.begin().await?;
        // Checked again under the row lock; another process may have spent
        // the balance in the meantime.
        let reservation = ledger::reserve(&txn, user_id, operation.cost).await?;
        if !reservation.is_affordable() {
            txn.rollback().await?;
            return Err(insufficient_balance(&reservation, operation_type));
        }

        let record = records::ActiveModel {
            operation_id: Set(operation.id),
            user_id: Set(user_id),
            amount: Set(operation.cost),
            operation_response: Set(result.to_string()),
            user_balance: Set(reservation.new_balance),
            created_at: Set(Utc::now().fixed_offset()),
            deleted: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        ledger::commit(&txn, &reservation).await?;
        txn.commit().await?;

        info!(
            user_id,
            record_id = record.id,
            operation = %operation_type,
            cost = operation.cost,
            balance = reservation.new_balance,
            "Operation executed"
        );

        Ok(ExecutionResult {
            operation_type,
            result,
            variables,
            record,
        })
    }

    async fn evaluate(
        &self,
        operation_type: OperationType,
        operands: &Operands,
    ) -> Result<OperationOutcome, ApiError> {
        match operation_type.arithmetic() {
            Some(arithmetic) => Ok(OperationOutcome::Number(arithmetic(operands)?)),
            None => Ok(OperationOutcome::Text(self.random_strings.generate().await?)),
        }
    }
}

fn insufficient_balance(reservation: &Reservation, operation_type: OperationType) -> ApiError {
    warn!(
        user_id = reservation.user_id,
        balance = reservation.prior_balance,
        cost = reservation.cost,
        operation = %operation_type,
        "Insufficient balance"
    );
    ApiError::InsufficientBalance {
        balance: reservation.prior_balance,
        cost: reservation.cost,
        operation_type,
    }
}

/// Decode the caller's variables. Anything that is not a JSON object, or a
/// string holding one, counts as no variables at all.
pub fn parse_variables(raw: Option<&Value>) -> Map<String, Value> {
    match raw {
        Some(Value::String(text)) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

fn declared_fields(operation: &operations::Model) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_str(&operation.fields) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::unexpected(format!(
            "Operation {} has malformed fields: {}",
            operation.id, operation.fields
        ))),
    }
}

/// Require exactly the declared fields and pull out the numeric operands.
pub fn check_variables(
    variables: &Map<String, Value>,
    declared: &Map<String, Value>,
    operation_type: OperationType,
) -> Result<Operands, ApiError> {
    if declared.keys().any(|name| !variables.contains_key(name)) {
        return Err(ApiError::bad_request(format!(
            "Variables field doesn't have the required fields to proccess the operation {}",
            operation_type
        )));
    }

    let surplus: Vec<&str> = variables
        .keys()
        .filter(|name| !declared.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !surplus.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Variables field has fields not used by the operation {}: {}",
            operation_type,
            surplus.join(", ")
        )));
    }

    let mut operands = Operands::new();
    for (name, metadata) in declared {
        let kind = metadata
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(NUMERIC_FIELD);
        if kind != NUMERIC_FIELD {
            continue;
        }

        let number = match &variables[name] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "Variable {} of the operation {} must be a number",
                name, operation_type
            ))
        })?;
        operands.insert(name.clone(), number);
    }

    Ok(operands)
}

//! SeaORM implementation of [`QueryBuilder`]

use sea_orm::{
    sea_query::{Expr, Func, IntoIden, LikeExpr, SimpleExpr},
    Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select, Value,
};

use super::{FilterCondition, FilterOperator, OrderTerm, QueryBuilder, QueryError, SortDirection};

/// How a raw filter value is coerced before binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Float,
    Integer,
    Boolean,
}

/// Column expression a field path resolves to
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub expr: SimpleExpr,
    pub kind: FieldKind,
}

impl ResolvedField {
    /// Table-qualified column, so joined tables never make it ambiguous
    pub fn column<T, C>(table: T, column: C, kind: FieldKind) -> Self
    where
        T: IntoIden + 'static,
        C: IntoIden + 'static,
    {
        Self {
            expr: Expr::col((table, column)).into(),
            kind,
        }
    }
}

/// Entities that can sit behind a list endpoint
pub trait Listable: EntityTrait {
    /// Select with every relation needed by `resolve_field` already joined
    fn listing_select() -> Select<Self> {
        Self::find()
    }

    /// Map a `__`-separated field path to a column
    fn resolve_field(path: &str) -> Option<ResolvedField>;

    /// Creation timestamp used for the default newest-first ordering
    fn creation_column() -> Option<SimpleExpr> {
        None
    }
}

/// A `Select` being built from a parsed list query
pub struct SeaQuery<E: EntityTrait> {
    select: Select<E>,
}

impl<E: Listable> SeaQuery<E> {
    pub fn new(select: Select<E>) -> Self {
        Self { select }
    }

    pub fn into_select(self) -> Select<E> {
        self.select
    }

    fn resolve(path: &str) -> Result<ResolvedField, QueryError> {
        E::resolve_field(path).ok_or_else(|| QueryError::UnknownField(path.to_string()))
    }
}

impl<E: Listable> QueryBuilder for SeaQuery<E> {
    type Error = QueryError;

    fn search(self, term: &str, fields: &[&str]) -> Result<Self, QueryError> {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));

        let mut any = Condition::any();
        for path in fields {
            let field = Self::resolve(path)?;
            any = any.add(
                Expr::expr(Func::lower(field.expr)).like(LikeExpr::new(pattern.clone()).escape('\\')),
            );
        }

        Ok(Self {
            select: self.select.filter(any),
        })
    }

    fn filter(self, condition: &FilterCondition) -> Result<Self, QueryError> {
        let field = Self::resolve(&condition.field)?;
        let column = Expr::expr(field.expr);

        let expr = match condition.operator {
            FilterOperator::Contains => {
                if field.kind != FieldKind::Text {
                    return Err(QueryError::UnsupportedLookup(condition.field.clone()));
                }
                let pattern = format!("%{}%", escape_like(&condition.value));
                column.like(LikeExpr::new(pattern).escape('\\'))
            }
            operator => {
                let value = coerce(condition, field.kind)?;
                match operator {
                    FilterOperator::Gt => column.gt(value),
                    FilterOperator::Gte => column.gte(value),
                    FilterOperator::Lt => column.lt(value),
                    FilterOperator::Lte => column.lte(value),
                    _ => column.eq(value),
                }
            }
        };

        Ok(Self {
            select: self.select.filter(expr),
        })
    }

    fn order_by(self, term: &OrderTerm) -> Result<Self, QueryError> {
        let field = Self::resolve(&term.field)?;
        let order = match term.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        Ok(Self {
            select: self.select.order_by(field.expr, order),
        })
    }

    fn default_order(self) -> Self {
        match E::creation_column() {
            Some(column) => Self {
                select: self.select.order_by(column, Order::Desc),
            },
            // Store-defined order; not stable across pages
            None => self,
        }
    }
}

fn coerce(condition: &FilterCondition, kind: FieldKind) -> Result<Value, QueryError> {
    let raw = condition.value.as_str();
    let invalid = || QueryError::InvalidValue {
        field: condition.field.clone(),
        value: raw.to_string(),
    };

    match kind {
        FieldKind::Text => Ok(Value::from(raw.to_string())),
        FieldKind::Float => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Value::from)
            .ok_or_else(invalid),
        FieldKind::Integer => raw.parse::<i32>().map(Value::from).map_err(|_| invalid()),
        FieldKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::from(true)),
            "false" | "0" => Ok(Value::from(false)),
            _ => Err(invalid()),
        },
    }
}

/// Make `%`, `_` and `\` match literally under `ESCAPE '\'`
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

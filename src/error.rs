// 0.1: error taxonomy shared by every module. sequence exhaustion is not here,
// it is a normal pull outcome (see ladder::sequence::Pull).

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LadderError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Notional {notional} is outside every margin bracket")]
    OutOfRange { notional: Decimal },

    #[error("Compounding ladder did not converge within {steps} steps")]
    NonConvergent { steps: usize },

    #[error("Arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },
}

impl LadderError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type LadderResult<T> = Result<T, LadderError>;

// unwraps a checked decimal op into an Overflow error
pub(crate) fn checked(value: Option<Decimal>, operation: &'static str) -> LadderResult<Decimal> {
    value.ok_or(LadderError::Overflow { operation })
}

pub(crate) fn require_positive(name: &'static str, value: Decimal) -> LadderResult<Decimal> {
    if value > Decimal::ZERO {
        Ok(value)
    } else {
        Err(LadderError::invalid(name, format!("must be positive, got {value}")))
    }
}

pub(crate) fn require_non_negative(name: &'static str, value: Decimal) -> LadderResult<Decimal> {
    if value >= Decimal::ZERO {
        Ok(value)
    } else {
        Err(LadderError::invalid(name, format!("must not be negative, got {value}")))
    }
}

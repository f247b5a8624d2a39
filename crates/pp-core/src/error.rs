use thiserror::Error;

pub type PpResult<T> = Result<T, PpError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PpError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Negative value for {what}: {value}")]
    Negative { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Unknown unit '{unit}' for {quantity}")]
    UnknownUnit { quantity: &'static str, unit: String },
}

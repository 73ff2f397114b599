use thiserror::Error;

/// Raised when an engine is constructed from an invalid configuration
///
/// Construction errors are fatal for the engine being built; nothing is ever partially created
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{what} must be a power of two, got {value}")]
    NotPowerOfTwo { what: &'static str, value: u64 },
    #[error("{what} must be greater than zero")]
    Zero { what: &'static str },
    #[error("{what} ({value}) must be divisible by {divisor}")]
    NotDivisible {
        what: &'static str,
        value: u64,
        divisor: u64,
    },
    #[error("{what} ({count} x {size}) doesn't fit in a 64-bit address space")]
    Overflow {
        what: &'static str,
        count: u64,
        size: u64,
    },
    #[error("a translation pipeline needs exactly two cache levels, got {0}")]
    CacheLevels(usize),
    #[error("couldn't parse the configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raised when a trace or allocation script can't be read
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed input on line {line}: {content:?}")]
    Malformed { line: usize, content: String },
}

/// Checks a value is a non-zero power of two
pub(crate) fn require_power_of_two(what: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Zero { what });
    }
    if !value.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo { what, value });
    }
    Ok(value)
}

pub(crate) fn require_non_zero(what: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { what })
    } else {
        Ok(value)
    }
}

//! Configuration errors raised when constructing a primitive.

/// A primitive parameter outside of its valid range.
///
/// Raised by each primitive's `new` before anything is elaborated, naming the offending parameter and the value received.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A count or width that must be at least 1 was 0.
    #[error("{param} must be a positive integer, not {value}")]
    NotPositive {
        /// The name of the parameter.
        param: &'static str,
        /// The value received.
        value: u32,
    },

    /// A count that must be greater than some bound wasn't.
    #[error("{param} must be an integer > {bound}, not {value}")]
    TooSmall {
        /// The name of the parameter.
        param: &'static str,
        /// The exclusive lower bound.
        bound: u32,
        /// The value received.
        value: u32,
    },

    /// A bit width larger than a signal can carry.
    #[error("{param} must be at most {max} bits, not {value}")]
    TooWide {
        /// The name of the parameter.
        param: &'static str,
        /// The largest supported width.
        max: u32,
        /// The value received.
        value: u32,
    },

    /// A reset value that doesn't fit in the primitive's width.
    #[error("reset value {value} does not fit in {width} bit(s)")]
    ResetOutOfRange {
        /// The reset value received.
        value: u128,
        /// The width of the registers it was meant for.
        width: u32,
    },

    /// A clock domain name that was left empty.
    #[error("{param} must name a clock domain")]
    EmptyDomain {
        /// The name of the parameter.
        param: &'static str,
    },

    /// A clock domain name that the primitive uses for its own local domain.
    #[error("{param} must not be the reserved domain {value:?}")]
    ReservedDomain {
        /// The name of the parameter.
        param: &'static str,
        /// The domain name received.
        value: String,
    },
}

pub(super) fn check_positive(param: &'static str, value: u32) -> Result<(), ConfigError> {
    if value < 1 {
        return Err(ConfigError::NotPositive { param, value });
    }
    Ok(())
}

pub(super) fn check_greater_than(
    param: &'static str,
    bound: u32,
    value: u32,
) -> Result<(), ConfigError> {
    if value <= bound {
        return Err(ConfigError::TooSmall {
            param,
            bound,
            value,
        });
    }
    Ok(())
}

pub(super) fn check_width(param: &'static str, value: u32) -> Result<(), ConfigError> {
    check_positive(param, value)?;
    if value > crate::MAX_SIGNAL_BIT_WIDTH {
        return Err(ConfigError::TooWide {
            param,
            max: crate::MAX_SIGNAL_BIT_WIDTH,
            value,
        });
    }
    Ok(())
}

pub(super) fn check_domain(param: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyDomain { param });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_parameter_and_value() {
        assert_eq!(
            check_positive("n", 0).unwrap_err().to_string(),
            "n must be a positive integer, not 0"
        );
        assert_eq!(
            check_greater_than("sync_stages", 1, 1)
                .unwrap_err()
                .to_string(),
            "sync_stages must be an integer > 1, not 1"
        );
        assert_eq!(
            check_width("width", 129).unwrap_err().to_string(),
            "width must be at most 128 bits, not 129"
        );
        assert_eq!(
            check_domain("idomain", "").unwrap_err().to_string(),
            "idomain must name a clock domain"
        );
    }

    #[test]
    fn valid_values_pass() {
        assert!(check_positive("n", 1).is_ok());
        assert!(check_greater_than("depth", 1, 2).is_ok());
        assert!(check_width("width", 128).is_ok());
        assert!(check_domain("odomain", "sync").is_ok());
    }
}

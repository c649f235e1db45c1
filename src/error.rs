use std::fmt;

/// Reasons a quadratic surd cannot be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurdError {
    ZeroDenominator,
    NegativeRadicand,
}

impl fmt::Display for SurdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDenominator => write!(f, "denominator of the surd is zero"),
            Self::NegativeRadicand => write!(f, "radicand of the surd is negative"),
        }
    }
}

/// Errors raised while building or expanding a continued fraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The divisor is exactly zero, or a transform was started with a zero denominator
    DivisionByZero,
    /// The transform collapsed to 0/0, or no term could be decided within the ingest budget
    DegenerateTransform { ingested: usize },
    InvalidSurd(SurdError),
    /// A term list whose value is undefined, like `[1; 0]`
    InvalidTerm,
    /// NaN or infinite float input, or a value that overflows the term type
    NotFinite,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::DegenerateTransform { ingested } => write!(
                f,
                "transform is degenerate: no term decided after ingesting {} terms",
                ingested
            ),
            Self::InvalidSurd(e) => write!(f, "invalid quadratic surd: {}", e),
            Self::InvalidTerm => write!(f, "term sequence has no finite value"),
            Self::NotFinite => write!(f, "value is not finite in the term type"),
        }
    }
}

impl std::error::Error for Error {}

impl From<SurdError> for Error {
    fn from(e: SurdError) -> Self {
        Self::InvalidSurd(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_test() {
        assert_eq!(Error::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            Error::from(SurdError::NegativeRadicand).to_string(),
            "invalid quadratic surd: radicand of the surd is negative"
        );
        assert_eq!(
            Error::DegenerateTransform { ingested: 3 }.to_string(),
            "transform is degenerate: no term decided after ingesting 3 terms"
        );
        assert_eq!(Error::NotFinite.to_string(), "value is not finite in the term type");
    }
}

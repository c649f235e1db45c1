//! Exact arithmetic on simple continued fractions.
//!
//! A [ContinuedFraction] is a lazily evaluated sequence of terms
//! `a0 + 1/(a1 + 1/(a2 + ...))`. Values can be built from integers, rationals,
//! decimals, floats, periodic term lists, quadratic surds, the constants in
//! [symbols], or any restartable [TermSource](traits::TermSource).
//!
//! ```
//! use num_contfrac::{Constant, ContinuedFraction};
//!
//! let e = ContinuedFraction::<i64>::constant(Constant::E);
//! let one = ContinuedFraction::<i64>::from_integer(1);
//! assert_eq!((&e + &one).take_terms(5), Ok(vec![3, 1, 2, 1, 1]));
//!
//! // √2 · √2 is exactly 2
//! let sqrt2 = ContinuedFraction::<i64>::periodic(vec![1], vec![2]).unwrap();
//! assert_eq!((&sqrt2 * &sqrt2).take_terms(5), Ok(vec![2]));
//! ```

mod error;
mod limits;

pub mod cont_frac;
pub mod quadratic;
pub mod symbols;
pub mod traits;

pub use cont_frac::{ContinuedFraction, Expansion, GeneralContinuedFraction, InfiniteContinuedFraction};
pub use error::{Error, SurdError};
pub use limits::Limits;
pub use quadratic::QuadraticSurd;
pub use symbols::Constant;
pub use traits::{Approximation, Computable, FromSqrt};

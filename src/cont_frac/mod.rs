//! Data structures and algorithms implementations related to
//! regular and generalized continued fraction
//!
//! There are three abstractions of the continued fraction
//! 1. [ContinuedFraction][ContinuedFraction] represents a simple continued fraction whose terms are produced lazily,
//!    keeping the exact rational or quadratic surd value when it's known
//! 2. [InfiniteContinuedFraction][InfiniteContinuedFraction] provides homographic and bihomographic transforms on any iterator of terms
//! 3. [GeneralContinuedFraction][GeneralContinuedFraction] is a trait that provides method to operate on a general continued fraction.
//!
//! Stored expansions with a repeating block are represented by [Expansion].
//!
//! # References:
//! - <https://pi.math.cornell.edu/~gautam/ContinuedFractions.pdf>
//! - <https://crypto.stanford.edu/pbc/notes/contfrac/>
//! - <http://www.numbertheory.org/continued_fractions.html>
//! - <http://www.numbertheory.org/php/cfrac.html>
//! - <https://github.com/blynn/frac>
//!

mod block;
mod finite;
mod general;
mod infinite;
mod periodic;
mod simple;

pub(crate) use block::Block;

pub use finite::*;
pub use general::*;
pub use infinite::*;
pub use periodic::*;
pub use simple::*;

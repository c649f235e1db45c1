use crate::error::Error;
use dyn_clone::DynClone;
use num_integer::{Integer, Roots};
use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, FromPrimitive, NumRef, Signed};
use std::fmt;

/// Integer types that can serve as the terms of a continued fraction
pub trait TermBase:
    Integer
    + Signed
    + Clone
    + NumRef
    + Roots
    + CheckedAdd
    + CheckedSub
    + CheckedMul
    + FromPrimitive
    + fmt::Debug
    + fmt::Display
    + 'static
{
}

impl<T> TermBase for T where
    T: Integer
        + Signed
        + Clone
        + NumRef
        + Roots
        + CheckedAdd
        + CheckedSub
        + CheckedMul
        + FromPrimitive
        + fmt::Debug
        + fmt::Display
        + 'static
{
}

/// A possibly infinite sequence of continued fraction terms.
///
/// The first error ends the sequence. Cloning a source restarts it from the
/// current position, so a fresh clone always reproduces the same terms.
pub trait TermSource<T>: Iterator<Item = Result<T, Error>> + DynClone {}

impl<T, I: Iterator<Item = Result<T, Error>> + Clone> TermSource<T> for I {}

dyn_clone::clone_trait_object!(<T> TermSource<T>);

/// Adapter that turns an iterator of plain terms into a [TermSource]
#[derive(Debug, Clone)]
pub struct Lift<I>(pub I);

impl<I: Iterator> Iterator for Lift<I> {
    type Item = Result<I::Item, Error>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Ok)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Approximation<T> {
    Approximated(T),
    Exact(T),
}

impl<T> Approximation<T> {
    /// Get the computed value regardless of whether it's exact
    pub fn value(self) -> T {
        match self {
            Approximation::Approximated(v) => v,
            Approximation::Exact(v) => v,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Approximation::Exact(_))
    }
}

/// Represents a number that can be approximated by rationals
pub trait Computable<T> {
    /// Return the best convergent whose denominator is below `limit`,
    /// or the exact value if it has no such bound.
    fn approximated(&self, limit: &T) -> Result<Approximation<Ratio<T>>, Error>;
}

/// In case there are multiple solution for square root,
/// only canonical result will be returned
pub trait FromSqrt<T>: Sized {
    type Error;

    fn from_sqrt(t: T) -> Result<Self, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_source_clone_test() {
        let mut source: Box<dyn TermSource<i64>> = Box::new(Lift(vec![1i64, 2, 3].into_iter()));
        assert_eq!(source.next(), Some(Ok(1)));

        // a clone restarts from the current position
        let restarted = source.clone();
        assert_eq!(source.collect::<Vec<_>>(), vec![Ok(2), Ok(3)]);
        assert_eq!(restarted.collect::<Vec<_>>(), vec![Ok(2), Ok(3)]);
    }

    #[test]
    fn approximation_test() {
        assert_eq!(Approximation::Exact(3).value(), 3);
        assert!(!Approximation::Approximated(3).is_exact());
    }
}

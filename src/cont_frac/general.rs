use super::block::Block;
use crate::error::Error;
use num_integer::Integer;
use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, NumRef, RefNum};

/// This trait defines utility functions for generalized continued fraction number
/// `b_1 + a_2 / (b_2 + a_3 / (b_3 + a_4 / .. ))`. They are available for any
/// iterator that returns a pair of number. The first value will be regarded
/// as a_k while the second value as b_k. You need to make sure that a_1 = 1.
pub trait GeneralContinuedFraction<T>: Iterator<Item = (T, T)>
where
    T: Integer + NumRef + CheckedAdd + CheckedSub + CheckedMul,
    for<'r> &'r T: RefNum<T>,
{
    /// Compute the convergents of the generalized continued fraction
    fn convergents(self) -> GeneralConvergents<Self, T>
    where
        Self: Sized;

    /// Simplify the generalized continued fraction to simple continued fraction terms
    fn simplify(self) -> Simplified<Self, T>
    where
        Self: Sized;
}

/// Iterator of [GeneralContinuedFraction::convergents()] result.
/// Convergents with a zero denominator are skipped, and an overflow of the
/// integer type ends the iteration with [Error::NotFinite].
#[derive(Debug, Clone)]
pub struct GeneralConvergents<I: Iterator<Item = (T, T)>, T> {
    block: Block<T>,
    g_coeffs: I,
    finished: bool,
}

impl<I, T> Iterator for GeneralConvergents<I, T>
where
    I: Iterator<Item = (T, T)>,
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul,
    for<'r> &'r T: RefNum<T>,
{
    type Item = Result<Ratio<T>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let (a, b) = self.g_coeffs.next()?;
            let (p, q) = match self.block.gmove(a, b) {
                Ok(pq) => pq,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };
            self.block.update(p.clone(), q.clone());
            if !q.is_zero() {
                break Some(Ok(Ratio::new(p, q)));
            }
        }
    }
}

/// Iterator of [GeneralContinuedFraction::simplify()] result. It's a term source
/// by itself, an overflow of the integer type is reported as [Error::NotFinite].
#[derive(Debug, Clone)]
pub struct Simplified<I: Iterator<Item = (T, T)>, T> {
    block: Block<T>,
    g_coeffs: I,
    exhausted: bool,
    finished: bool,
}

impl<I, T> Iterator for Simplified<I, T>
where
    I: Iterator<Item = (T, T)>,
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul,
    for<'r> &'r T: RefNum<T>,
{
    type Item = Result<T, Error>;

    // use the magic table method described in https://crypto.stanford.edu/pbc/notes/contfrac/nonsimple.html
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.exhausted {
            return self.block.drain_integer().map(Ok);
        }
        loop {
            match self.g_coeffs.next() {
                Some((a, b)) => {
                    let (p, q) = match self.block.gmove(a, b) {
                        Ok(pq) => pq,
                        Err(e) => {
                            self.finished = true;
                            break Some(Err(e));
                        }
                    };
                    if let Some(i) = self.block.reduce_integer(p, q) {
                        break Some(Ok(i));
                    }
                }
                None => {
                    // the latest convergent is now the exact value
                    self.exhausted = true;
                    break self.block.drain_integer().map(Ok);
                }
            }
        }
    }
}

impl<I, T> GeneralContinuedFraction<T> for I
where
    I: Iterator<Item = (T, T)>,
    T: Integer + NumRef + CheckedAdd + CheckedSub + CheckedMul,
    for<'r> &'r T: RefNum<T>,
{
    fn convergents(self) -> GeneralConvergents<I, T> {
        GeneralConvergents {
            block: Block::<T>::identity(),
            g_coeffs: self,
            finished: false,
        }
    }

    fn simplify(self) -> Simplified<I, T> {
        Simplified {
            block: Block::<T>::identity(),
            g_coeffs: self,
            exhausted: false,
            finished: false,
        }
    }
}

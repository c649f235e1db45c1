//! Lazy homographic and bihomographic transforms on term sources (Gosper's algorithm)

use super::block::{Block, DualBlock};
use crate::error::Error;
use crate::limits::Limits;
use crate::traits::Lift;
use log::{trace, warn};
use num_integer::Integer;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, NumRef, RefNum};
use std::fmt;
use std::iter::Peekable;

/// Extension methods for any iterator of continued fraction terms.
pub trait InfiniteContinuedFraction: Iterator {
    /// Wrap plain terms so that they can be fed into the transforms
    fn lift(self) -> Lift<Self>
    where
        Self: Sized,
    {
        Lift(self)
    }

    /// This method returns a homographic function result on the fraction
    /// A homographic function is `(ax + b)/(cx + d)`
    fn homo<T>(self, a: T, b: T, c: T, d: T) -> Homographic<Self, T>
    where
        Self: Sized + Iterator<Item = Result<T, Error>>,
        T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul,
        for<'r> &'r T: RefNum<T>,
    {
        Homographic::new(self, Block::new(a, b, c, d))
    }

    /// This method returns a bihomographic function result on the fraction
    /// A bihomographic function is `(axy + bx + cy + d)/(exy + fx + gy + h)`
    #[allow(clippy::too_many_arguments)]
    fn bihomo<T, U>(
        self,
        rhs: U,
        a: T,
        b: T,
        c: T,
        d: T,
        e: T,
        f: T,
        g: T,
        h: T,
    ) -> Bihomographic<Self, U::IntoIter, T>
    where
        Self: Sized + Iterator<Item = Result<T, Error>>,
        U: IntoIterator<Item = Result<T, Error>>,
        T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul,
        for<'r> &'r T: RefNum<T>,
    {
        Bihomographic::new(
            self,
            rhs.into_iter(),
            DualBlock::new(a, b, c, d, e, f, g, h),
        )
    }
}

impl<I: Iterator> InfiniteContinuedFraction for I {}

// What the next term of an input tells about its tail
enum Tail {
    // the input is over, its tail is ∞
    Exhausted,
    // the tail is in [1, ∞]
    Bounded,
    // the next term is not positive (or an error), nothing is known
    Unbounded,
}

fn peek_tail<I, T>(input: &mut Peekable<I>) -> Tail
where
    I: Iterator<Item = Result<T, Error>>,
    T: Integer,
{
    match input.peek() {
        None => Tail::Exhausted,
        Some(Ok(t)) if *t >= T::one() => Tail::Bounded,
        Some(_) => Tail::Unbounded,
    }
}

/// Iterator of [InfiniteContinuedFraction::homo()] result
pub struct Homographic<I: Iterator, T> {
    block: Block<T>,
    coeffs: Peekable<I>,
    exhausted: bool,
    emitted: bool,
    finished: bool,
    limits: Limits,
}

impl<I, T> Homographic<I, T>
where
    I: Iterator<Item = Result<T, Error>>,
{
    pub(crate) fn new(coeffs: I, block: Block<T>) -> Self {
        Homographic {
            block,
            coeffs: coeffs.peekable(),
            exhausted: false,
            emitted: false,
            finished: false,
            limits: Limits::default(),
        }
    }

    /// Replace the iteration budgets
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

impl<I, T> Homographic<I, T>
where
    I: Iterator<Item = Result<T, Error>>,
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul + fmt::Debug,
    for<'r> &'r T: RefNum<T>,
{
    fn step(&mut self) -> Option<Result<T, Error>> {
        let mut ingested = 0usize;
        loop {
            if self.block.is_degenerate() {
                warn!("homographic transform collapsed to 0/0");
                return Some(Err(Error::DegenerateTransform { ingested }));
            }
            if self.block.is_infinite() {
                return if self.emitted {
                    None
                } else {
                    Some(Err(Error::DivisionByZero))
                };
            }

            let bounded = self.exhausted
                || match peek_tail(&mut self.coeffs) {
                    Tail::Exhausted => {
                        self.block.exhaust();
                        self.exhausted = true;
                        true
                    }
                    Tail::Bounded => true,
                    Tail::Unbounded => false,
                };

            if bounded {
                match self.block.bracket() {
                    Ok(Some(t)) => {
                        trace!("egest {:?} after {} ingests", t, ingested);
                        if let Err(e) = self.block.egest(&t) {
                            warn!("homographic transform overflowed while emitting {:?}", t);
                            return Some(Err(e));
                        }
                        self.block.normalize();
                        self.emitted = true;
                        return Some(Ok(t));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("homographic transform overflowed after {} ingests", ingested);
                        return Some(Err(e));
                    }
                }
                if self.exhausted {
                    // the value is exactly known, so this only happens for 0/0
                    return Some(Err(Error::DegenerateTransform { ingested }));
                }
            }

            if ingested >= self.limits.max_ingest {
                warn!("homographic transform undecided after {} ingests", ingested);
                return Some(Err(Error::DegenerateTransform { ingested }));
            }
            match self.coeffs.next() {
                Some(Ok(t)) => {
                    trace!("ingest {:?}", t);
                    if let Err(e) = self.block.ingest(t) {
                        warn!("homographic transform overflowed after {} ingests", ingested);
                        return Some(Err(e));
                    }
                    self.block.normalize();
                    ingested += 1;
                }
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.block.exhaust();
                    self.exhausted = true;
                }
            }
        }
    }
}

impl<I, T> Iterator for Homographic<I, T>
where
    I: Iterator<Item = Result<T, Error>>,
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul + fmt::Debug,
    for<'r> &'r T: RefNum<T>,
{
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.step();
        if !matches!(result, Some(Ok(_))) {
            self.finished = true;
        }
        result
    }
}

impl<I, T> Clone for Homographic<I, T>
where
    I: Iterator<Item = Result<T, Error>> + Clone,
    T: Clone,
{
    fn clone(&self) -> Self {
        Homographic {
            block: self.block.clone(),
            coeffs: self.coeffs.clone(),
            exhausted: self.exhausted,
            emitted: self.emitted,
            finished: self.finished,
            limits: self.limits,
        }
    }
}

/// Iterator of [InfiniteContinuedFraction::bihomo()] result
pub struct Bihomographic<X: Iterator, Y: Iterator, T> {
    block: DualBlock<T>,
    x_coeffs: Peekable<X>,
    y_coeffs: Peekable<Y>,
    x_exhausted: bool,
    y_exhausted: bool,
    emitted: bool,
    finished: bool,
    limits: Limits,
}

impl<X, Y, T> Bihomographic<X, Y, T>
where
    X: Iterator<Item = Result<T, Error>>,
    Y: Iterator<Item = Result<T, Error>>,
{
    pub(crate) fn new(x: X, y: Y, block: DualBlock<T>) -> Self {
        Bihomographic {
            block,
            x_coeffs: x.peekable(),
            y_coeffs: y.peekable(),
            x_exhausted: false,
            y_exhausted: false,
            emitted: false,
            finished: false,
            limits: Limits::default(),
        }
    }

    /// Replace the iteration budgets
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

impl<X, Y, T> Bihomographic<X, Y, T>
where
    X: Iterator<Item = Result<T, Error>>,
    Y: Iterator<Item = Result<T, Error>>,
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul + fmt::Debug,
    for<'r> &'r T: RefNum<T>,
{
    // fix x = ∞ or y = ∞ for inputs that are over, return whether (x, y)
    // tails are both known to be in [1, ∞]
    fn settle_tails(&mut self) -> (bool, bool) {
        let mut x_bounded = true;
        if !self.x_exhausted {
            match peek_tail(&mut self.x_coeffs) {
                Tail::Exhausted => {
                    self.block.exhaust_right();
                    self.x_exhausted = true;
                }
                Tail::Bounded => {}
                Tail::Unbounded => x_bounded = false,
            }
        }
        let mut y_bounded = true;
        if !self.y_exhausted {
            match peek_tail(&mut self.y_coeffs) {
                Tail::Exhausted => {
                    self.block.exhaust_down();
                    self.y_exhausted = true;
                }
                Tail::Bounded => {}
                Tail::Unbounded => y_bounded = false,
            }
        }
        (x_bounded, y_bounded)
    }

    fn ingest_x(&mut self) -> Result<(), Error> {
        match self.x_coeffs.next() {
            Some(Ok(t)) => {
                trace!("ingest x {:?}", t);
                self.block.ingest_right(t).map_err(|e| {
                    warn!("bihomographic transform overflowed while ingesting x");
                    e
                })
            }
            Some(Err(e)) => Err(e),
            None => {
                self.block.exhaust_right();
                self.x_exhausted = true;
                Ok(())
            }
        }
    }

    fn ingest_y(&mut self) -> Result<(), Error> {
        match self.y_coeffs.next() {
            Some(Ok(t)) => {
                trace!("ingest y {:?}", t);
                self.block.ingest_down(t).map_err(|e| {
                    warn!("bihomographic transform overflowed while ingesting y");
                    e
                })
            }
            Some(Err(e)) => Err(e),
            None => {
                self.block.exhaust_down();
                self.y_exhausted = true;
                Ok(())
            }
        }
    }

    fn step(&mut self) -> Option<Result<T, Error>> {
        let mut ingested = 0usize;
        loop {
            if self.block.is_degenerate() {
                warn!("bihomographic transform collapsed to 0/0");
                return Some(Err(Error::DegenerateTransform { ingested }));
            }
            if self.block.is_infinite() {
                return if self.emitted {
                    None
                } else {
                    Some(Err(Error::DivisionByZero))
                };
            }

            let (x_bounded, y_bounded) = self.settle_tails();
            let (mut right, mut down) = if x_bounded && y_bounded {
                match self.block.bracket() {
                    Ok(Ok(t)) => {
                        trace!("egest {:?} after {} ingests", t, ingested);
                        if let Err(e) = self.block.egest(&t) {
                            warn!("bihomographic transform overflowed while emitting {:?}", t);
                            return Some(Err(e));
                        }
                        self.block.normalize();
                        self.emitted = true;
                        return Some(Ok(t));
                    }
                    Ok(Err(flags)) => flags,
                    Err(e) => {
                        warn!("bihomographic transform overflowed after {} ingests", ingested);
                        return Some(Err(e));
                    }
                }
            } else {
                (!x_bounded, !y_bounded)
            };

            right &= !self.x_exhausted;
            down &= !self.y_exhausted;
            if !right && !down {
                // the undecided direction is already exact, refine the other one
                right = !self.x_exhausted;
                down = !right && !self.y_exhausted;
            }
            if !right && !down {
                return Some(Err(Error::DegenerateTransform { ingested }));
            }

            if ingested >= self.limits.max_ingest {
                warn!("bihomographic transform undecided after {} ingests", ingested);
                return Some(Err(Error::DegenerateTransform { ingested }));
            }
            if right {
                if let Err(e) = self.ingest_x() {
                    return Some(Err(e));
                }
                ingested += 1;
            }
            if down {
                if let Err(e) = self.ingest_y() {
                    return Some(Err(e));
                }
                ingested += 1;
            }
            self.block.normalize();
        }
    }
}

impl<X, Y, T> Iterator for Bihomographic<X, Y, T>
where
    X: Iterator<Item = Result<T, Error>>,
    Y: Iterator<Item = Result<T, Error>>,
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul + fmt::Debug,
    for<'r> &'r T: RefNum<T>,
{
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.step();
        if !matches!(result, Some(Ok(_))) {
            self.finished = true;
        }
        result
    }
}

impl<X, Y, T> Clone for Bihomographic<X, Y, T>
where
    X: Iterator<Item = Result<T, Error>> + Clone,
    Y: Iterator<Item = Result<T, Error>> + Clone,
    T: Clone,
{
    fn clone(&self) -> Self {
        Bihomographic {
            block: self.block.clone(),
            x_coeffs: self.x_coeffs.clone(),
            y_coeffs: self.y_coeffs.clone(),
            x_exhausted: self.x_exhausted,
            y_exhausted: self.y_exhausted,
            emitted: self.emitted,
            finished: self.finished,
            limits: self.limits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::E;

    fn terms(v: Vec<i64>) -> Lift<std::vec::IntoIter<i64>> {
        Lift(v.into_iter())
    }

    #[test]
    fn homographic_test() {
        let e = E {};

        // e - 2
        assert_eq!(
            e.cfrac::<i64>().lift().homo(1, -2, 0, 1).take(5).collect::<Result<Vec<_>, _>>(),
            Ok(vec![0, 1, 2, 1, 1])
        );
        // e + 1
        assert_eq!(
            e.cfrac::<i64>().lift().homo(1, 1, 0, 1).take(5).collect::<Result<Vec<_>, _>>(),
            Ok(vec![3, 1, 2, 1, 1])
        );
        // 2e = [5; 2, 3, 2, 3, 1, 2, 1, 3, 4, 3]
        assert_eq!(
            e.cfrac::<i64>().lift().homo(2, 0, 0, 1).take(6).collect::<Result<Vec<_>, _>>(),
            Ok(vec![5, 2, 3, 2, 3, 1])
        );
    }

    #[test]
    fn homographic_finite_test() {
        // 1 / (22/7) = 7/22 = [0; 3, 7]
        assert_eq!(
            terms(vec![3, 7]).homo(0, 1, 1, 0).collect::<Result<Vec<_>, _>>(),
            Ok(vec![0, 3, 7])
        );
        // identity folds the trailing one: [3; 1] = 4
        assert_eq!(
            terms(vec![3, 1]).homo(1, 0, 0, 1).collect::<Result<Vec<_>, _>>(),
            Ok(vec![4])
        );
        // zero terms are absorbed: [1; 0, 2] = [3]
        assert_eq!(
            terms(vec![1, 0, 2]).homo(1, 0, 0, 1).collect::<Result<Vec<_>, _>>(),
            Ok(vec![3])
        );
        // -(3/2) = [-2; 2]
        assert_eq!(
            terms(vec![1, 2]).homo(-1, 0, 0, 1).collect::<Result<Vec<_>, _>>(),
            Ok(vec![-2, 2])
        );
    }

    #[test]
    fn homographic_error_test() {
        assert_eq!(
            terms(vec![1, 2]).homo(1, 0, 0, 0).next(),
            Some(Err(Error::DivisionByZero))
        );
        assert_eq!(
            terms(vec![1, 2]).homo(0, 0, 0, 0).next(),
            Some(Err(Error::DegenerateTransform { ingested: 0 }))
        );

        // a structural run of zeros never decides
        let mut zeros = std::iter::once(1i64)
            .chain(std::iter::repeat(0))
            .lift()
            .homo(1, 0, 0, 1)
            .with_limits(Limits::default().with_max_ingest(10));
        assert_eq!(zeros.next(), Some(Err(Error::DegenerateTransform { ingested: 10 })));
        assert_eq!(zeros.next(), None);
    }

    #[test]
    fn bihomographic_test() {
        // 3/2 + 1/3 = 11/6 = [1; 1, 5]
        let sum = terms(vec![1, 2]).bihomo(terms(vec![0, 3]), 0, 1, 1, 0, 0, 0, 0, 1);
        assert_eq!(sum.collect::<Result<Vec<_>, _>>(), Ok(vec![1, 1, 5]));

        // 3/2 - 1/3 = 7/6 = [1; 6]
        let diff = terms(vec![1, 2]).bihomo(terms(vec![0, 3]), 0, 1, -1, 0, 0, 0, 0, 1);
        assert_eq!(diff.collect::<Result<Vec<_>, _>>(), Ok(vec![1, 6]));

        // 1/3 - 3/2 = -7/6 = [-2; 1, 5]
        let diff = terms(vec![0, 3]).bihomo(terms(vec![1, 2]), 0, 1, -1, 0, 0, 0, 0, 1);
        assert_eq!(diff.collect::<Result<Vec<_>, _>>(), Ok(vec![-2, 1, 5]));

        // 3/2 * 1/3 = 1/2 = [0; 2]
        let prod = terms(vec![1, 2]).bihomo(terms(vec![0, 3]), 1, 0, 0, 0, 0, 0, 0, 1);
        assert_eq!(prod.collect::<Result<Vec<_>, _>>(), Ok(vec![0, 2]));

        // (3/2) / (1/3) = 9/2 = [4; 2]
        let quot = terms(vec![1, 2]).bihomo(terms(vec![0, 3]), 0, 1, 0, 0, 0, 0, 1, 0);
        assert_eq!(quot.collect::<Result<Vec<_>, _>>(), Ok(vec![4, 2]));

        // e + e = 2e
        let e = E {};
        let double = e
            .cfrac::<i64>()
            .lift()
            .bihomo(e.cfrac::<i64>().lift(), 0, 1, 1, 0, 0, 0, 0, 1);
        assert_eq!(
            double.take(6).collect::<Result<Vec<_>, _>>(),
            Ok(vec![5, 2, 3, 2, 3, 1])
        );
    }

    #[test]
    fn bihomographic_error_test() {
        // x / 0
        let quot = terms(vec![1, 2]).bihomo(terms(vec![0]), 0, 1, 0, 0, 0, 0, 1, 0);
        assert_eq!(quot.collect::<Vec<_>>(), vec![Err(Error::DivisionByZero)]);

        // √2 * √2 from opaque terms straddles 2 forever
        let sqrt2 = || std::iter::once(1i64).chain(std::iter::repeat(2)).lift();
        let mut prod = sqrt2()
            .bihomo(sqrt2(), 1, 0, 0, 0, 0, 0, 0, 1)
            .with_limits(Limits::default().with_max_ingest(20));
        assert!(matches!(prod.next(), Some(Err(Error::DegenerateTransform { .. }))));
        assert_eq!(prod.next(), None);
    }

    #[test]
    fn clone_restart_test() {
        let mut e_plus_one = E {}.cfrac::<i64>().lift().homo(1, 1, 0, 1);
        assert_eq!(e_plus_one.next(), Some(Ok(3)));
        let copy = e_plus_one.clone();
        assert_eq!(
            e_plus_one.take(3).collect::<Vec<_>>(),
            copy.take(3).collect::<Vec<_>>()
        );
    }
}

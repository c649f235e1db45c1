//! Predefined irrational math constants

use crate::cont_frac::{GeneralContinuedFraction, Simplified};
use crate::quadratic::QuadraticSurd;
use num_integer::Integer;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, Num, NumRef, One, RefNum};
use std::iter::{repeat, Repeat};

/// Euler's number `e`
pub struct E {}

/// The circle constant `π`
pub struct Pi {}

/// The golden ratio `φ = (1 + √5) / 2`
pub struct Phi {}

/// The named constants a continued fraction can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    E,
    Pi,
    Phi,
}

impl E {
    /// `[2; 1, 2, 1, 1, 4, 1, 1, 6, ...]`
    pub fn cfrac<T: Num>(&self) -> ECoefficients<T> {
        ECoefficients { i: T::zero(), m: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct ECoefficients<T> {
    i: T,
    m: u8,
}

impl<T: Num + NumRef + Clone> Iterator for ECoefficients<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.i.is_zero() {
            self.i = T::one() + T::one();
            Some(T::one() + T::one()) // return 2
        } else {
            let result = match self.m {
                1 => Some(self.i.clone()),
                _ => Some(T::one()),
            };

            if self.m == 2 {
                self.m = 0;
                self.i = T::one() + T::one() + &self.i;
            } else {
                self.m += 1;
            }

            result
        }
    }
}

impl Pi {
    /// Generalized continued fraction `4 / (1 + 1² / (3 + 2² / (5 + 3² / (7 + ...))))`
    pub fn gcfrac<T: Num>(&self) -> PiCoefficients<T> {
        PiCoefficients { k: T::zero(), started: false }
    }

    /// Simple continued fraction `[3; 7, 15, 1, 292, ...]`
    pub fn cfrac<T>(&self) -> Simplified<PiCoefficients<T>, T>
    where
        T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul,
        for<'r> &'r T: RefNum<T>,
    {
        self.gcfrac::<T>().simplify()
    }
}

/// Pairs `(a_k, b_k)` of [Pi::gcfrac()]
#[derive(Debug, Clone)]
pub struct PiCoefficients<T> {
    k: T,
    started: bool,
}

impl<T: Num + NumRef + Clone> Iterator for PiCoefficients<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Item = (T, T);

    fn next(&mut self) -> Option<(T, T)> {
        if !self.started {
            self.started = true;
            return Some((T::one(), T::zero()));
        }
        if self.k.is_zero() {
            self.k = T::one();
            return Some((T::one() + T::one() + T::one() + T::one(), T::one()));
        }

        let a = &self.k * &self.k;
        let b = &self.k + &self.k + T::one();
        self.k = T::one() + &self.k;
        Some((a, b))
    }
}

impl Phi {
    /// `[1; 1, 1, 1, ...]`
    pub fn cfrac<T: One + Clone>(&self) -> Repeat<T> {
        repeat(T::one())
    }

    /// The closed form `(1 + √5) / 2`
    pub fn surd<T: Num + Clone>(&self) -> QuadraticSurd<T> {
        let two = T::one() + T::one();
        let five = two.clone() + two.clone() + T::one();
        QuadraticSurd::new_raw(T::one(), T::one(), two, five)
    }
}

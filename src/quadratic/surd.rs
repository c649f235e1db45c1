//! Implementation of quadratic irrational numbers

use crate::cont_frac::{Block, ContinuedFraction, EuclidTerms, Expansion, PeriodicTerms};
use crate::error::{Error, SurdError};
use crate::traits::{Approximation, Computable, FromSqrt, TermBase};
use core::ops::{Add, Mul, Neg, Sub};
use log::debug;
use num_integer::{sqrt, Integer};
use num_rational::Ratio;
use num_traits::{
    CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, FromPrimitive, One, RefNum, Signed, ToPrimitive,
    Zero,
};
use std::cmp::Ordering;
use std::fmt;

/// A quadratic number represented as `(a + b*√r) / c`. The common form `(p + √d) / q`
/// is constructed with [QuadraticSurd::new].
///
/// Note that the root is only reduced by small square factors. Two surds with
/// different roots are still compared by value as long as their roots can be unified.
///
/// The operators with integers and rationals panic on overflow like the primitive
/// integers do, the `checked_*` methods return `None` instead.
#[derive(Hash, Clone, Debug, Copy)]
pub struct QuadraticSurd<T> {
    a: T,
    b: T, // zero when reduced if the surd is a rational number
    c: T, // positive when reduced
    r: T, // zero when reduced if the surd is a rational number
}

impl<T> QuadraticSurd<T> {
    #[inline]
    pub(crate) const fn new_raw(a: T, b: T, c: T, r: T) -> Self {
        QuadraticSurd { a, b, c, r }
    }

    /// Get return-only references to the components `(a, b, c, r)`
    pub const fn parts(&self) -> (&T, &T, &T, &T) {
        (&self.a, &self.b, &self.c, &self.r)
    }
}

impl<T: Integer> QuadraticSurd<T> {
    /// Determine if the surd is an integer
    #[inline]
    pub fn is_integer(&self) -> bool {
        self.c.is_one() && self.b.is_zero()
    }

    /// Determine if the surd is a rational number
    #[inline]
    pub fn is_rational(&self) -> bool {
        self.b.is_zero() || self.r.is_zero()
    }

    /// Determine if the quadratic number has no rational part (i.e. a = 0, b != 0)
    #[inline]
    pub fn is_pure(&self) -> bool {
        self.a.is_zero() && !self.b.is_zero()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }
}

impl<T: Integer> From<T> for QuadraticSurd<T> {
    #[inline]
    fn from(t: T) -> Self {
        QuadraticSurd::new_raw(t, T::zero(), T::one(), T::zero())
    }
}

impl<T: Integer + Clone> From<Ratio<T>> for QuadraticSurd<T> {
    #[inline]
    fn from(t: Ratio<T>) -> Self {
        let (a, c) = t.into_raw();
        QuadraticSurd::new_raw(a, T::zero(), c, T::zero())
    }
}

// a * x + y
#[inline]
fn mul_add<T: TermBase>(a: &T, x: &T, y: &T) -> Option<T> {
    a.checked_mul(x)?.checked_add(y)
}

// a * b + c * d
#[inline]
fn dot<T: TermBase>(a: &T, b: &T, c: &T, d: &T) -> Option<T> {
    a.checked_mul(b)?.checked_add(&c.checked_mul(d)?)
}

// a * b - c * d
#[inline]
fn cross<T: TermBase>(a: &T, b: &T, c: &T, d: &T) -> Option<T> {
    a.checked_mul(b)?.checked_sub(&c.checked_mul(d)?)
}

#[cold]
fn overflow() -> ! {
    panic!("attempt to compute a quadratic surd with overflow")
}

impl<T: TermBase> QuadraticSurd<T>
where
    for<'r> &'r T: RefNum<T>,
{
    // Simplify the surd into normalized form, the denominator must be non-zero.
    // `None` if the rational part overflows.
    fn reduce(&mut self) -> Option<()> {
        // ensure b, r are zeros at the same time
        if self.b.is_zero() || self.r.is_zero() {
            self.b = T::zero();
            self.r = T::zero();
        }

        // test if the surd is rational
        let root = sqrt(self.r.clone());
        if &root * &root == self.r {
            self.a = mul_add(&self.b, &root, &self.a)?;
            self.b = T::zero();
            self.r = T::zero();
        }

        let g = self.a.gcd(&self.b).gcd(&self.c);
        if g > T::one() {
            self.a = &self.a / &g;
            self.b = &self.b / &g;
            self.c = &self.c / g;
        }

        // keep denom positive
        if self.c.is_negative() {
            self.a = -self.a.clone();
            self.b = -self.b.clone();
            self.c = -self.c.clone();
        }
        Some(())
    }

    // Eliminate square factors of the root by trial division with small primes
    fn reduce_root(&mut self) -> Option<()> {
        const SMALL_PRIMES: [u8; 54] = [
            2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83,
            89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179,
            181, 191, 193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
        ];
        for &p in SMALL_PRIMES.iter() {
            let p = match T::from_u8(p) {
                Some(p) => p,
                None => break,
            };
            let p2 = match p.checked_mul(&p) {
                Some(p2) => p2,
                None => break,
            };
            if self.r < p2 {
                break;
            }
            loop {
                let (quo, rem) = self.r.div_rem(&p2);
                if !rem.is_zero() {
                    break;
                }
                // common factors between a, b, c are handled by reduce()
                self.r = quo;
                self.b = self.b.checked_mul(&p)?;
            }
        }
        Some(())
    }

    fn reduced(a: T, b: T, c: T, r: T) -> Option<Self> {
        let mut ret = QuadraticSurd::new_raw(a, b, c, r);
        ret.reduce_root()?;
        ret.reduce()?;
        Some(ret)
    }

    /// Create the surd `(p + √d) / q`
    #[inline]
    pub fn new(p: T, d: T, q: T) -> Result<Self, Error> {
        Self::from_parts(p, T::one(), q, d)
    }

    /// Create a surd represented as `(a + b√r)) / c` where `a`, `b`, `c`, `r` are integers.
    pub fn from_parts(a: T, b: T, c: T, r: T) -> Result<Self, Error> {
        if c.is_zero() {
            return Err(SurdError::ZeroDenominator.into());
        }
        if r.is_negative() {
            return Err(SurdError::NegativeRadicand.into());
        }
        Self::reduced(a, b, c, r).ok_or(Error::NotFinite)
    }

    /// Create a surd represented as `a + b√r` where a, b, r are rationals.
    pub fn from_rationals(a: Ratio<T>, b: Ratio<T>, r: Ratio<T>) -> Result<Self, Error> {
        if r.is_negative() {
            return Err(SurdError::NegativeRadicand.into());
        }

        let mul = |x: &T, y: &T| x.checked_mul(y).ok_or(Error::NotFinite);
        let surd_r = mul(r.numer(), r.denom())?;
        let new_b_denom = mul(b.denom(), r.denom())?;
        let surd_a = mul(a.numer(), &new_b_denom)?;
        let surd_b = mul(b.numer(), a.denom())?;
        let surd_c = mul(a.denom(), &new_b_denom)?;
        Self::reduced(surd_a, surd_b, surd_c, surd_r).ok_or(Error::NotFinite)
    }

    /// Get the root of a quadratic equation `ax^2 + bx + c` with rational coefficients.
    /// This method only returns the root `(-b + √(b^2 - 4ac)) / 2a`, use `conj()` for the other one.
    /// `None` is returned if there is no real root or the coefficients overflow.
    pub fn from_equation(a: Ratio<T>, b: Ratio<T>, c: Ratio<T>) -> Option<Self> {
        // degraded cases
        if a.is_zero() {
            if b.is_zero() {
                return None;
            }
            return Some(Self::from((-c).checked_div(&b)?));
        }

        let two = T::one() + T::one();
        let four = Ratio::from(&two * &two);
        let delta = b.checked_mul(&b)?.checked_sub(&four.checked_mul(&a)?.checked_mul(&c)?)?;
        if delta.is_negative() {
            return None;
        }

        let aa = Ratio::from(two).checked_mul(&a)?.recip();
        Self::from_rationals((-b).checked_mul(&aa)?, aa, delta).ok()
    }

    /// Recover the surd from its periodic continued fraction expansion
    pub fn from_periodic(expansion: &Expansion<T>) -> Result<Self, Error> {
        let fold = |terms: &[T]| -> Result<(T, T, T, T), Error> {
            let mut block = Block::<T>::identity();
            for t in terms {
                let (p, q) = block.checked_rmove(t.clone()).ok_or(Error::NotFinite)?;
                block.update(p, q);
            }
            Ok(block.into_parts())
        };

        if expansion.is_rational() {
            let (p, _, q, _) = fold(expansion.aperiodic())?;
            if q.is_zero() {
                return Err(Error::InvalidTerm);
            }
            return Ok(Self::from(Ratio::new(p, q)));
        }

        // the periodic part x satisfies x = (ax + b) / (cx + d)
        let (a, b, c, d) = fold(expansion.periodic())?;
        let d_a = d.checked_sub(&a).ok_or(Error::NotFinite)?;
        let x = Self::from_equation(Ratio::from(c), Ratio::from(d_a), Ratio::from(-b))
            .ok_or(Error::NotFinite)?;
        if expansion.aperiodic().is_empty() {
            return Ok(x);
        }

        let (a, b, c, d) = fold(expansion.aperiodic())?;
        x.homographic(a, b, c, d)
    }

    // `None` if the surd is zero or the result overflows
    fn checked_recip(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let aa = self.a.checked_mul(&self.a)?;
        let bbr = self.b.checked_mul(&self.b)?.checked_mul(&self.r)?;
        Self::reduced(
            -self.c.checked_mul(&self.a)?,
            self.c.checked_mul(&self.b)?,
            bbr.checked_sub(&aa)?,
            self.r.clone(),
        )
    }

    /// Returns the reciprocal of the surd
    pub fn recip(&self) -> Result<Self, Error> {
        if self.is_zero() {
            return Err(Error::DivisionByZero);
        }
        self.checked_recip().ok_or(Error::NotFinite)
    }

    /// Return the conjugate of the surd, i.e. `(a - b√r) / c`
    #[inline]
    pub fn conj(&self) -> Self {
        QuadraticSurd::new_raw(self.a.clone(), -self.b.clone(), self.c.clone(), self.r.clone())
    }

    /// Rounds towards minus infinity
    ///
    /// # Panics
    /// If `b²r` overflows the integer type.
    pub fn floor(&self) -> T {
        let br = sqrt(&self.b * &self.b * &self.r);
        let num = if self.b >= T::zero() {
            &self.a + br
        } else {
            &self.a - br - T::one()
        };
        num.div_floor(&self.c)
    }

    /// The sign of the surd compared with zero, `None` if `a²` or `b²r` overflows
    pub fn checked_sign(&self) -> Option<Ordering> {
        let zero = T::zero();
        let a_sign = self.a.cmp(&zero);
        if self.is_rational() {
            return Some(a_sign);
        }
        let b_sign = self.b.cmp(&zero);
        if a_sign == Ordering::Equal || a_sign == b_sign {
            return Some(b_sign);
        }

        // the rational part and the root have different signs, compare a² with b²r
        let aa = self.a.checked_mul(&self.a)?;
        let bbr = self.b.checked_mul(&self.b)?.checked_mul(&self.r)?;
        Some(match aa.cmp(&bbr) {
            Ordering::Greater => a_sign,
            Ordering::Less => b_sign,
            Ordering::Equal => Ordering::Equal,
        })
    }

    /// Test if the surd number is positive
    ///
    /// # Panics
    /// If [checked_sign][QuadraticSurd::checked_sign] overflows.
    pub fn is_positive(&self) -> bool {
        self.checked_sign().unwrap_or_else(|| overflow()) == Ordering::Greater
    }

    /// Test if the surd number is negative
    ///
    /// # Panics
    /// If [checked_sign][QuadraticSurd::checked_sign] overflows.
    pub fn is_negative(&self) -> bool {
        self.checked_sign().unwrap_or_else(|| overflow()) == Ordering::Less
    }

    /// The exact rational value, if the surd is rational
    pub fn to_rational(&self) -> Option<Ratio<T>> {
        if self.is_rational() {
            Some(Ratio::new(self.a.clone(), self.c.clone()))
        } else {
            None
        }
    }

    /// Apply the homographic function `(ax + b)/(cx + d)` on the surd.
    /// Coefficients that overflow the integer type give [Error::NotFinite].
    pub fn homographic(&self, a: T, b: T, c: T, d: T) -> Result<Self, Error> {
        self.checked_homographic(&a, &b, &c, &d)
            .ok_or(Error::NotFinite)?
    }

    fn checked_homographic(&self, a: &T, b: &T, c: &T, d: &T) -> Option<Result<Self, Error>> {
        // (n0 + n1√r) / (m0 + m1√r), then multiply both with the conjugate of the denominator
        let n0 = dot(a, &self.a, b, &self.c)?;
        let n1 = a.checked_mul(&self.b)?;
        let m0 = dot(c, &self.a, d, &self.c)?;
        let m1 = c.checked_mul(&self.b)?;

        let m1r = m1.checked_mul(&self.r)?;
        let denom = cross(&m0, &m0, &m1, &m1r)?;
        if denom.is_zero() {
            return Some(Err(Error::DivisionByZero));
        }
        Self::reduced(
            cross(&n0, &m0, &n1, &m1r)?,
            cross(&n1, &m0, &n0, &m1)?,
            denom,
            self.r.clone(),
        )
        .map(Ok)
    }

    // Bring both operands to the same root, `None` if the roots cannot be matched
    // or the coefficients overflow. The results are not reduced.
    fn unify(&self, rhs: &Self) -> Option<(Self, Self)> {
        if self.r == rhs.r {
            return Some((self.clone(), rhs.clone()));
        }
        if self.is_rational() {
            let lhs = Self::new_raw(self.a.clone(), T::zero(), self.c.clone(), rhs.r.clone());
            return Some((lhs, rhs.clone()));
        }
        if rhs.is_rational() {
            let rhs = Self::new_raw(rhs.a.clone(), T::zero(), rhs.c.clone(), self.r.clone());
            return Some((self.clone(), rhs));
        }

        // b√r2 = (b·s/r1)·√r1 where s² = r1·r2
        let prod = self.r.checked_mul(&rhs.r)?;
        let s = sqrt(prod.clone());
        if &s * &s != prod {
            return None;
        }
        let rhs = Self::new_raw(
            rhs.a.checked_mul(&self.r)?,
            rhs.b.checked_mul(&s)?,
            rhs.c.checked_mul(&self.r)?,
            self.r.clone(),
        );
        Some((self.clone(), rhs))
    }

    /// Add two surds, `None` if their roots cannot be unified or the result overflows
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        let (l, r) = self.unify(rhs)?;
        Self::reduced(
            dot(&l.a, &r.c, &r.a, &l.c)?,
            dot(&l.b, &r.c, &r.b, &l.c)?,
            l.c.checked_mul(&r.c)?,
            r.r,
        )
    }

    /// Subtract two surds, `None` if their roots cannot be unified or the result overflows
    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        let (l, r) = self.unify(rhs)?;
        Self::reduced(
            cross(&l.a, &r.c, &r.a, &l.c)?,
            cross(&l.b, &r.c, &r.b, &l.c)?,
            l.c.checked_mul(&r.c)?,
            r.r,
        )
    }

    /// Multiply two surds, `None` if their roots cannot be unified or the result overflows
    pub fn checked_mul(&self, rhs: &Self) -> Option<Self> {
        let (l, r) = self.unify(rhs)?;
        let br = l.b.checked_mul(&r.r)?;
        Self::reduced(
            dot(&l.a, &r.a, &br, &r.b)?,
            dot(&l.a, &r.b, &l.b, &r.a)?,
            l.c.checked_mul(&r.c)?,
            r.r,
        )
    }

    /// Divide two surds, `None` if their roots cannot be unified, `rhs` is zero
    /// or the result overflows
    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        self.checked_mul(&rhs.checked_recip()?)
    }

    /// Expand the surd into its continued fraction. The expansion of an
    /// irrational surd always has a non-empty periodic part.
    /// [Error::NotFinite] is returned if the expansion overflows the integer type.
    pub fn expand(&self) -> Result<Expansion<T>, Error> {
        if self.is_rational() {
            let terms = EuclidTerms::new(Ratio::new(self.a.clone(), self.c.clone())).collect();
            return Ok(Expansion::new_raw(terms, Vec::new()));
        }
        self.checked_expand().ok_or(Error::NotFinite)
    }

    fn checked_expand(&self) -> Option<Expansion<T>> {
        // convert to form (p+√d)/q where q|d-p^2
        let mut d = self.r.checked_mul(&self.b)?.checked_mul(&self.b)?;
        let (mut p, mut q) = if self.b.is_negative() {
            (-self.a.clone(), -self.c.clone())
        } else {
            (self.a.clone(), self.c.clone())
        };
        if !cross(&d, &T::one(), &p, &p)?.is_multiple_of(&q) {
            let q_abs = q.abs();
            d = d.checked_mul(&q)?.checked_mul(&q)?;
            p = p.checked_mul(&q_abs)?;
            q = q.checked_mul(&q_abs)?;
        }

        let rd = sqrt(d.clone());
        let next = |p: &T, q: &T| -> Option<(T, T, T)> {
            let a = if q.is_positive() {
                rd.checked_add(p)?.div_floor(q)
            } else {
                rd.checked_add(p)?.checked_add(&T::one())?.div_floor(q)
            };
            let p = cross(&a, q, p, &T::one())?;
            let q = cross(&d, &T::one(), &p, &p)? / q;
            Some((a, p, q))
        };
        let is_reduced = |p: &T, q: &T| -> Option<bool> {
            Some(p <= &rd && rd < p.checked_add(q)? && q.checked_sub(p)? <= rd)
        };

        // find the reduced form and aperiodic coefficients
        let mut a_coeffs: Vec<T> = Vec::new();
        while a_coeffs.is_empty() || !is_reduced(&p, &q)? {
            let (a, new_p, new_q) = next(&p, &q)?;
            p = new_p;
            q = new_q;
            a_coeffs.push(a);
        }

        // find the periodic coefficients
        let mut p_coeffs: Vec<T> = Vec::new();
        let (init_p, init_q) = (p.clone(), q.clone());
        loop {
            let (a, new_p, new_q) = next(&p, &q)?;
            p = new_p;
            q = new_q;
            p_coeffs.push(a);
            if p == init_p && q == init_q {
                break;
            }
        }

        debug!(
            "surd {} expands with {} leading terms and period {}",
            self,
            a_coeffs.len(),
            p_coeffs.len()
        );
        Some(Expansion::new_raw(a_coeffs, p_coeffs))
    }

    /// Length of the repeating block of the expansion, zero for rational numbers
    pub fn period(&self) -> Result<usize, Error> {
        Ok(self.expand()?.period())
    }

    /// Iterate over the continued fraction terms
    pub fn terms(&self) -> Result<PeriodicTerms<T>, Error> {
        Ok(self.expand()?.terms())
    }
}

impl<T: TermBase> PartialEq for QuadraticSurd<T>
where
    for<'r> &'r T: RefNum<T>,
{
    fn eq(&self, other: &Self) -> bool {
        // shortcut if every components are matched
        if self.a == other.a && self.b == other.b && self.c == other.c && self.r == other.r {
            return true;
        }
        if self.r == other.r || self.is_rational() || other.is_rational() {
            return false;
        }

        match self.unify(other) {
            Some((l, mut r)) => {
                r.reduce().is_some() && l.a == r.a && l.b == r.b && l.c == r.c
            }
            None => false,
        }
    }
}

impl<T> From<QuadraticSurd<T>> for (T, T, T, T) {
    /// Deconstruct the quadratic surd `(a + b√r) / c` into tuple `(a,b,c,r)`
    fn from(s: QuadraticSurd<T>) -> Self {
        (s.a, s.b, s.c, s.r)
    }
}

impl<T: TermBase> Computable<T> for QuadraticSurd<T>
where
    for<'r> &'r T: RefNum<T>,
{
    fn approximated(&self, limit: &T) -> Result<Approximation<Ratio<T>>, Error> {
        ContinuedFraction::<T>::from_surd(self.clone()).approximated(limit)
    }
}

impl<T: Integer + Signed + Clone + fmt::Display> fmt::Display for QuadraticSurd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.b.is_zero() || self.r.is_zero() {
            return if self.c.is_one() {
                write!(f, "{}", self.a)
            } else {
                write!(f, "{}/{}", self.a, self.c)
            };
        }

        let root = if self.b.is_one() {
            format!("√{}", self.r)
        } else if (-self.b.clone()).is_one() {
            format!("-√{}", self.r)
        } else {
            format!("{}√{}", self.b, self.r)
        };
        let numer = if self.a.is_zero() {
            root
        } else if self.b.is_negative() {
            format!("{}{}", self.a, root)
        } else {
            format!("{}+{}", self.a, root)
        };

        if self.c.is_one() {
            write!(f, "{}", numer)
        } else if self.a.is_zero() {
            write!(f, "{}/{}", numer, self.c)
        } else {
            write!(f, "({})/{}", numer, self.c)
        }
    }
}

macro_rules! arith_impl {
    (impl $imp:ident, $method:ident, $checked:ident) => {
        impl<T: TermBase> $imp<Ratio<T>> for QuadraticSurd<T>
        where
            for<'r> &'r T: RefNum<T>,
        {
            type Output = QuadraticSurd<T>;

            #[inline]
            fn $method(self, rhs: Ratio<T>) -> QuadraticSurd<T> {
                self.$checked(&Self::from(rhs))
                    .unwrap_or_else(|| overflow())
            }
        }

        impl<T: TermBase> $imp<T> for QuadraticSurd<T>
        where
            for<'r> &'r T: RefNum<T>,
        {
            type Output = QuadraticSurd<T>;

            #[inline]
            fn $method(self, rhs: T) -> QuadraticSurd<T> {
                self.$checked(&Self::from(rhs))
                    .unwrap_or_else(|| overflow())
            }
        }
    };
}

arith_impl!(impl Add, add, checked_add);
arith_impl!(impl Sub, sub, checked_sub);
arith_impl!(impl Mul, mul, checked_mul);

impl<T: TermBase> Neg for QuadraticSurd<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Output = QuadraticSurd<T>;

    #[inline]
    fn neg(self) -> QuadraticSurd<T> {
        QuadraticSurd::new_raw(-self.a, -self.b, self.c, self.r)
    }
}

impl<T: TermBase + ToPrimitive> ToPrimitive for QuadraticSurd<T>
where
    for<'r> &'r T: RefNum<T>,
{
    #[inline]
    fn to_i64(&self) -> Option<i64> {
        if self.is_integer() {
            self.a.to_i64()
        } else {
            None
        }
    }

    #[inline]
    fn to_u64(&self) -> Option<u64> {
        if self.is_integer() {
            self.a.to_u64()
        } else {
            None
        }
    }

    #[inline]
    fn to_f64(&self) -> Option<f64> {
        Some((self.a.to_f64()? + self.b.to_f64()? * self.r.to_f64()?.sqrt()) / self.c.to_f64()?)
    }
}

impl<T: TermBase> FromSqrt<T> for QuadraticSurd<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Error = Error;

    #[inline]
    fn from_sqrt(target: T) -> Result<Self, Error> {
        Self::from_parts(T::zero(), T::one(), T::one(), target)
    }
}

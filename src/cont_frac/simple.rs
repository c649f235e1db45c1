//! The [ContinuedFraction] type, a lazily evaluated simple continued fraction
//! that remembers the exact closed form of its value whenever one is known.

use super::block::Block;
use super::finite::{EuclidTerms, Exact};
use super::infinite::InfiniteContinuedFraction;
use super::periodic::Expansion;
use crate::error::Error;
use crate::limits::Limits;
use crate::quadratic::QuadraticSurd;
use crate::symbols::{Constant, Pi, Phi, E};
use crate::traits::{Approximation, Computable, Lift, TermBase, TermSource};
use log::debug;
#[cfg(feature = "num-bigint")]
use num_bigint::BigInt;
use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, One, RefNum, Signed, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::iter::once;
use std::ops::{Add, Div, Mul, Neg, Sub};

// terms printed for values without a stored expansion
const DISPLAY_TERMS: usize = 10;

/// The closed form of a value, if known
#[derive(Debug, Clone)]
enum Form<T> {
    Rational(Ratio<T>),
    Surd(QuadraticSurd<T>),
    Opaque,
}

/// A simple continued fraction `a0 + 1/(a1 + 1/(a2 + ...))`.
///
/// The terms are produced on demand from a restartable [TermSource], so the value
/// can be infinite. Arithmetic between values with the same closed form (two
/// rationals, or two quadratic surds in the same field) is carried out exactly, and
/// the remaining cases are computed term by term with Gosper's algorithm.
///
/// Cloning a value is cheap and never consumes its terms.
#[derive(Clone)]
pub struct ContinuedFraction<T> {
    source: Box<dyn TermSource<T>>,
    form: Form<T>,
    simplified: bool,
    limits: Limits,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    // (axy + bx + cy + d) / (exy + fx + gy + h)
    fn coefficients<T: TermBase>(self) -> [T; 8] {
        let k: [i8; 8] = match self {
            Op::Add => [0, 1, 1, 0, 0, 0, 0, 1],
            Op::Sub => [0, 1, -1, 0, 0, 0, 0, 1],
            Op::Mul => [1, 0, 0, 0, 0, 0, 0, 1],
            Op::Div => [0, 1, 0, 0, 0, 0, 1, 0],
        };
        k.map(|v| match v {
            1 => T::one(),
            -1 => -T::one(),
            _ => T::zero(),
        })
    }
}

// a * n + b * m
#[inline]
fn lin<T: TermBase>(a: &T, b: &T, n: &T, m: &T) -> Option<T> {
    a.checked_mul(n)?.checked_add(&b.checked_mul(m)?)
}

fn rational_homographic<T: TermBase>(
    x: &Ratio<T>,
    a: &T,
    b: &T,
    c: &T,
    d: &T,
) -> Option<Result<Ratio<T>, Error>> {
    let (n, m) = (x.numer(), x.denom());
    let num = lin(a, b, n, m)?;
    let den = lin(c, d, n, m)?;
    if den.is_zero() {
        return Some(Err(Error::DivisionByZero));
    }
    Some(Ok(Ratio::new(num, den)))
}

fn rational_bihomographic<T: TermBase>(
    x: &Ratio<T>,
    y: &Ratio<T>,
    k: &[T; 8],
) -> Option<Result<Ratio<T>, Error>> {
    let xy = x.checked_mul(y)?;
    let eval = |a: &T, b: &T, c: &T, d: &T| -> Option<Ratio<T>> {
        Ratio::from(a.clone())
            .checked_mul(&xy)?
            .checked_add(&Ratio::from(b.clone()).checked_mul(x)?)?
            .checked_add(&Ratio::from(c.clone()).checked_mul(y)?)?
            .checked_add(&Ratio::from(d.clone()))
    };
    let num = eval(&k[0], &k[1], &k[2], &k[3])?;
    let den = eval(&k[4], &k[5], &k[6], &k[7])?;
    if den.is_zero() {
        return Some(Err(Error::DivisionByZero));
    }
    num.checked_div(&den).map(Ok)
}

fn surd_bihomographic<T: TermBase>(
    x: &QuadraticSurd<T>,
    y: &QuadraticSurd<T>,
    k: &[T; 8],
) -> Option<Result<QuadraticSurd<T>, Error>>
where
    for<'r> &'r T: RefNum<T>,
{
    let xy = x.checked_mul(y)?;
    let lift = |v: &T| QuadraticSurd::<T>::from(v.clone());
    let eval = |a: &T, b: &T, c: &T, d: &T| -> Option<QuadraticSurd<T>> {
        lift(a)
            .checked_mul(&xy)?
            .checked_add(&lift(b).checked_mul(x)?)?
            .checked_add(&lift(c).checked_mul(y)?)?
            .checked_add(&lift(d))
    };
    let num = eval(&k[0], &k[1], &k[2], &k[3])?;
    let den = eval(&k[4], &k[5], &k[6], &k[7])?;
    if den.is_zero() {
        return Some(Err(Error::DivisionByZero));
    }
    num.checked_div(&den).map(Ok)
}

impl<T: TermBase> ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    fn from_engine<S: TermSource<T> + 'static>(source: S, limits: Limits) -> Self {
        ContinuedFraction {
            source: Box::new(source),
            form: Form::Opaque,
            simplified: true,
            limits,
        }
    }

    // a value whose first term is the error
    fn from_error(e: Error, limits: Limits) -> Self {
        ContinuedFraction {
            source: Box::new(once(Err(e))),
            form: Form::Opaque,
            simplified: false,
            limits,
        }
    }

    #[inline]
    pub fn from_integer(t: T) -> Self {
        Self::from_ratio(Ratio::from_integer(t))
    }

    /// The canonical expansion of a rational number, computed by the Euclidean algorithm
    pub fn from_ratio(r: Ratio<T>) -> Self {
        ContinuedFraction {
            source: Box::new(Lift(EuclidTerms::new(r.clone()))),
            form: Form::Rational(r),
            simplified: true,
            limits: Limits::default(),
        }
    }

    pub fn from_exact(value: Exact<T>) -> Result<Self, Error> {
        value.to_ratio().map(Self::from_ratio)
    }

    /// The value `digits * 10^-scale`
    pub fn from_decimal(digits: T, scale: u32) -> Result<Self, Error> {
        Self::from_exact(Exact::Decimal { digits, scale })
    }

    /// The exact binary value of the float, without any rounding
    pub fn from_f64(f: f64) -> Result<Self, Error> {
        Self::from_exact(Exact::Float(f))
    }

    /// Create a finite continued fraction from the given terms. The terms are kept as they are,
    /// so zero or negative terms after the first one are allowed as long as the value is defined.
    pub fn from_terms(terms: Vec<T>) -> Result<Self, Error> {
        if terms.is_empty() {
            return Err(Error::InvalidTerm);
        }

        let mut block = Block::<T>::identity();
        for t in terms.iter() {
            let (p, q) = block.checked_rmove(t.clone()).ok_or(Error::NotFinite)?;
            block.update(p, q);
        }
        let (p, _, q, _) = block.into_parts();
        if q.is_zero() {
            return Err(Error::InvalidTerm);
        }

        let canonical = terms.iter().skip(1).all(|t| t.is_positive())
            && (terms.len() == 1 || terms.last().map_or(false, |t| *t > T::one()));
        Ok(ContinuedFraction {
            source: Box::new(Lift(terms.into_iter())),
            form: Form::Rational(Ratio::new(p, q)),
            simplified: canonical,
            limits: Limits::default(),
        })
    }

    /// Create `[a0; a1, ..., an, (p1, ..., pk)]` where the periodic part repeats forever.
    /// An empty periodic part gives a rational number.
    pub fn periodic(aperiodic: Vec<T>, periodic: Vec<T>) -> Result<Self, Error> {
        Self::from_expansion(Expansion::new(aperiodic, periodic)?)
    }

    pub fn from_expansion(expansion: Expansion<T>) -> Result<Self, Error> {
        if expansion.is_rational() {
            let (aperiodic, _) = expansion.into_parts();
            return Self::from_terms(aperiodic);
        }
        let surd = QuadraticSurd::<T>::from_periodic(&expansion)?;
        Ok(ContinuedFraction {
            source: Box::new(Lift(expansion.terms())),
            form: Form::Surd(surd),
            simplified: true,
            limits: Limits::default(),
        })
    }

    /// The stored expansion of the surd. If the expansion overflows the term type,
    /// the first term is [Error::NotFinite].
    pub fn from_surd(surd: QuadraticSurd<T>) -> Self {
        Self::try_from_surd(surd, Limits::default())
            .unwrap_or_else(|e| Self::from_error(e, Limits::default()))
    }

    fn try_from_surd(surd: QuadraticSurd<T>, limits: Limits) -> Result<Self, Error> {
        if let Some(r) = surd.to_rational() {
            return Ok(Self::from_ratio(r).with_limits(limits));
        }
        Ok(ContinuedFraction {
            source: Box::new(Lift(surd.expand()?.terms())),
            form: Form::Surd(surd),
            simplified: true,
            limits,
        })
    }

    pub fn constant(c: Constant) -> Self {
        match c {
            Constant::E => Self::from_engine(Lift(E {}.cfrac::<T>()), Limits::default()),
            Constant::Pi => Self::from_engine(Pi {}.cfrac::<T>(), Limits::default()),
            Constant::Phi => Self::from_surd(Phi {}.surd::<T>()),
        }
    }

    /// Wrap an arbitrary term source. Nothing is assumed about the terms, so the
    /// value will be simplified by the engine before comparison or approximation.
    pub fn from_source<S: TermSource<T> + 'static>(source: S) -> Self {
        ContinuedFraction {
            source: Box::new(source),
            form: Form::Opaque,
            simplified: false,
            limits: Limits::default(),
        }
    }

    /// Wrap a cloneable iterator of terms, see [ContinuedFraction::from_source]
    pub fn lazy<I: Iterator<Item = T> + Clone + 'static>(iter: I) -> Self {
        Self::from_source(Lift(iter))
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[inline]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Iterate the terms from the beginning
    pub fn terms(&self) -> Terms<T> {
        Terms(self.source.clone())
    }

    /// Collect the first `n` terms, or all of them for a shorter expansion
    pub fn take_terms(&self, n: usize) -> Result<Vec<T>, Error> {
        self.terms().take(n).collect()
    }

    pub fn convergents(&self) -> Convergents<T> {
        Convergents {
            terms: self.terms(),
            block: Block::<T>::identity(),
            finished: false,
        }
    }

    /// The convergent `p_n / q_n` after `n` terms. If the expansion is shorter, this is the exact value.
    pub fn approximation(&self, n: usize) -> Result<Ratio<T>, Error> {
        let mut block = Block::<T>::identity();
        for t in self.terms().take(n) {
            let (p, q) = block.checked_rmove(t?).ok_or(Error::NotFinite)?;
            block.update(p, q);
        }
        let (p, q) = block.convergent();
        if q.is_zero() {
            return Err(Error::InvalidTerm);
        }
        Ok(Ratio::new(p.clone(), q.clone()))
    }

    /// The exact value if it's known to be rational
    pub fn to_rational(&self) -> Option<Ratio<T>> {
        match &self.form {
            Form::Rational(r) => Some(r.clone()),
            _ => None,
        }
    }

    /// The exact value if it's known to be rational or a quadratic surd
    pub fn to_surd(&self) -> Option<QuadraticSurd<T>> {
        match &self.form {
            Form::Rational(r) => Some(QuadraticSurd::<T>::from(r.clone())),
            Form::Surd(s) => Some(s.clone()),
            Form::Opaque => None,
        }
    }

    /// The canonical stored expansion if the closed form is known
    pub fn expansion(&self) -> Option<Expansion<T>> {
        match &self.form {
            Form::Rational(r) => Some(Expansion::new_raw(
                EuclidTerms::new(r.clone()).collect(),
                Vec::new(),
            )),
            Form::Surd(s) => s.expand().ok(),
            Form::Opaque => None,
        }
    }

    /// Whether the terms are known to be canonical: every term after the first is
    /// positive and a finite expansion doesn't end with 1.
    #[inline]
    pub fn is_simplified(&self) -> bool {
        self.simplified
    }

    /// Whether the value is exactly zero. For values without a closed form, this
    /// evaluates the first two terms.
    pub fn is_zero(&self) -> Result<bool, Error> {
        match &self.form {
            Form::Rational(r) => Ok(r.is_zero()),
            Form::Surd(_) => Ok(false),
            Form::Opaque => {
                let mut terms = self.simplified().terms();
                match terms.next() {
                    Some(Ok(t)) if t.is_zero() => match terms.next() {
                        None => Ok(true),
                        Some(Ok(_)) => Ok(false),
                        Some(Err(e)) => Err(e),
                    },
                    Some(Ok(_)) => Ok(false),
                    Some(Err(e)) => Err(e),
                    None => Err(Error::InvalidTerm),
                }
            }
        }
    }

    /// Rewrite the terms into the canonical form. Rationals are expanded again by the
    /// Euclidean algorithm and the other values go through the identity transform.
    pub fn simplified(&self) -> Self {
        if self.simplified {
            return self.clone();
        }
        match &self.form {
            Form::Rational(r) => Self::from_ratio(r.clone()).with_limits(self.limits),
            Form::Surd(_) => self.clone(),
            Form::Opaque => Self::from_engine(
                self.source
                    .clone()
                    .homo(T::one(), T::zero(), T::zero(), T::one())
                    .with_limits(self.limits),
                self.limits,
            ),
        }
    }

    pub fn negated(&self) -> Self {
        match &self.form {
            Form::Rational(r) => return Self::from_ratio(-r.clone()).with_limits(self.limits),
            Form::Surd(s) => {
                if let Ok(v) = Self::try_from_surd(-s.clone(), self.limits) {
                    return v;
                }
            }
            Form::Opaque => {}
        }
        Self::from_engine(
            self.source
                .clone()
                .homo(-T::one(), T::zero(), T::zero(), T::one())
                .with_limits(self.limits),
            self.limits,
        )
    }

    pub fn recip(&self) -> Result<Self, Error> {
        if self.is_zero()? {
            return Err(Error::DivisionByZero);
        }
        self.homographic(T::zero(), T::one(), T::one(), T::zero())
    }

    /// Compute `(ax + b) / (cx + d)` where `x` is this value
    pub fn homographic(&self, a: T, b: T, c: T, d: T) -> Result<Self, Error> {
        if c.is_zero() && d.is_zero() {
            return Err(Error::DivisionByZero);
        }
        match &self.form {
            Form::Rational(x) => {
                if let Some(v) = rational_homographic(x, &a, &b, &c, &d) {
                    debug!("homographic on a rational, exact result");
                    return v.map(|r| Self::from_ratio(r).with_limits(self.limits));
                }
            }
            Form::Surd(x) => match x.homographic(a.clone(), b.clone(), c.clone(), d.clone()) {
                Ok(s) => {
                    if let Ok(v) = Self::try_from_surd(s, self.limits) {
                        debug!("homographic on a quadratic surd, exact result");
                        return Ok(v);
                    }
                }
                Err(Error::NotFinite) => {}
                Err(e) => return Err(e),
            },
            Form::Opaque => {}
        }

        debug!("homographic on opaque terms, using the engine");
        Ok(Self::from_engine(
            self.source.clone().homo(a, b, c, d).with_limits(self.limits),
            self.limits,
        ))
    }

    /// Compute `(axy + bx + cy + d) / (exy + fx + gy + h)` where `x` is this value
    /// and `y` is `rhs`. The result inherits the limits of this value.
    #[allow(clippy::too_many_arguments)]
    pub fn bihomographic(
        &self,
        rhs: &Self,
        a: T,
        b: T,
        c: T,
        d: T,
        e: T,
        f: T,
        g: T,
        h: T,
    ) -> Result<Self, Error> {
        self.bihomographic_with(rhs, [a, b, c, d, e, f, g, h])
    }

    fn bihomographic_with(&self, rhs: &Self, k: [T; 8]) -> Result<Self, Error> {
        if k[4..].iter().all(|v| v.is_zero()) {
            return Err(Error::DivisionByZero);
        }

        match (&self.form, &rhs.form) {
            (Form::Rational(x), Form::Rational(y)) => {
                if let Some(v) = rational_bihomographic(x, y, &k) {
                    debug!("bihomographic on rationals, exact result");
                    return v.map(|r| Self::from_ratio(r).with_limits(self.limits));
                }
            }
            (Form::Opaque, _) | (_, Form::Opaque) => {}
            (_, _) => {
                if let (Some(x), Some(y)) = (self.to_surd(), rhs.to_surd()) {
                    match surd_bihomographic::<T>(&x, &y, &k) {
                        Some(Ok(s)) => {
                            if let Ok(v) = Self::try_from_surd(s, self.limits) {
                                debug!("bihomographic on quadratic surds, exact result");
                                return Ok(v);
                            }
                        }
                        Some(Err(e)) => return Err(e),
                        None => {}
                    }
                }
            }
        }

        // a rational operand turns the operation into a homographic one on the other operand
        if let Form::Rational(y) = &rhs.form {
            let (n, m) = (y.numer(), y.denom());
            if let (Some(a), Some(b), Some(c), Some(d)) = (
                lin(&k[0], &k[1], n, m),
                lin(&k[2], &k[3], n, m),
                lin(&k[4], &k[5], n, m),
                lin(&k[6], &k[7], n, m),
            ) {
                return self.homographic(a, b, c, d);
            }
        }
        if let Form::Rational(x) = &self.form {
            let (n, m) = (x.numer(), x.denom());
            if let (Some(a), Some(b), Some(c), Some(d)) = (
                lin(&k[0], &k[2], n, m),
                lin(&k[1], &k[3], n, m),
                lin(&k[4], &k[6], n, m),
                lin(&k[5], &k[7], n, m),
            ) {
                return rhs
                    .homographic(a, b, c, d)
                    .map(|v| v.with_limits(self.limits));
            }
        }

        debug!("bihomographic on opaque terms, using the engine");
        let [a, b, c, d, e, f, g, h] = k;
        let engine = self
            .source
            .clone()
            .bihomo(rhs.source.clone(), a, b, c, d, e, f, g, h)
            .with_limits(self.limits);
        Ok(Self::from_engine(engine, self.limits))
    }

    fn arith(&self, rhs: &Self, op: Op) -> Result<Self, Error> {
        self.bihomographic_with(rhs, op.coefficients())
    }

    /// Division that reports a zero divisor instead of producing a failing value
    pub fn try_div(&self, rhs: &Self) -> Result<Self, Error> {
        if rhs.is_zero()? {
            return Err(Error::DivisionByZero);
        }
        self.arith(rhs, Op::Div)
    }

    /// Compare two values. Exact forms are compared directly, other values are compared
    /// term by term on their canonical expansions. `None` is returned if the first
    /// [Limits::compare_terms] terms of both are equal.
    pub fn compare(&self, other: &Self) -> Result<Option<Ordering>, Error> {
        if let (Form::Rational(x), Form::Rational(y)) = (&self.form, &other.form) {
            return Ok(Some(x.cmp(y)));
        }
        if let (Some(x), Some(y)) = (self.to_surd(), other.to_surd()) {
            if let Some(ord) = x.checked_sub(&y).and_then(|diff| diff.checked_sign()) {
                return Ok(Some(ord));
            }
        }

        let mut lhs = self.simplified().terms();
        let mut rhs = other.simplified().terms();
        for i in 0..self.limits.compare_terms {
            let ord = match (lhs.next().transpose()?, rhs.next().transpose()?) {
                (None, None) => return Ok(Some(Ordering::Equal)),
                // the tail of an ended expansion is ∞
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(&b),
            };
            if ord != Ordering::Equal {
                // a larger term at an odd position makes the value smaller
                return Ok(Some(if i % 2 == 0 { ord } else { ord.reverse() }));
            }
        }
        debug!(
            "comparison undecided after {} terms",
            self.limits.compare_terms
        );
        Ok(None)
    }
}

/// Iterator of [ContinuedFraction::terms()] result
#[derive(Clone)]
pub struct Terms<T>(Box<dyn TermSource<T>>);

impl<T> Iterator for Terms<T> {
    type Item = Result<T, Error>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

/// Iterator of [ContinuedFraction::convergents()] result. Convergents with a zero
/// denominator are skipped, and an overflow of the term type ends the iteration
/// with [Error::NotFinite].
#[derive(Clone)]
pub struct Convergents<T> {
    terms: Terms<T>,
    block: Block<T>,
    finished: bool,
}

impl<T: TermBase> Iterator for Convergents<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Item = Result<Ratio<T>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let a = match self.terms.next()? {
                Ok(a) => a,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };
            let (p, q) = match self.block.checked_rmove(a) {
                Some(pq) => pq,
                None => {
                    self.finished = true;
                    return Some(Err(Error::NotFinite));
                }
            };
            self.block.update(p.clone(), q.clone());
            if !q.is_zero() {
                return Some(Ok(Ratio::new(p, q)));
            }
        }
    }
}

impl<T: TermBase> Computable<T> for ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    fn approximated(&self, limit: &T) -> Result<Approximation<Ratio<T>>, Error> {
        let mut convergents = self.simplified().convergents();
        let mut last = match convergents.next() {
            Some(v) => v?,
            None => return Err(Error::InvalidTerm),
        };
        if last.denom() >= limit {
            return Ok(Approximation::Approximated(last));
        }

        for v in convergents {
            let v = v?;
            if v.denom() >= limit {
                return Ok(Approximation::Approximated(last));
            }
            last = v;
        }
        Ok(Approximation::Exact(last))
    }
}

impl<T: TermBase> From<T> for ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    #[inline]
    fn from(t: T) -> Self {
        Self::from_integer(t)
    }
}

impl<T: TermBase> From<Ratio<T>> for ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    #[inline]
    fn from(r: Ratio<T>) -> Self {
        Self::from_ratio(r)
    }
}

impl<T: TermBase> From<QuadraticSurd<T>> for ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    #[inline]
    fn from(s: QuadraticSurd<T>) -> Self {
        Self::from_surd(s)
    }
}

#[cfg(feature = "num-bigint")]
impl<T: TermBase + Into<BigInt>> ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    /// Widen the terms to big integers, so that arithmetic on the result can't overflow.
    /// The known exact form and the limits are kept.
    pub fn to_bigint(&self) -> ContinuedFraction<BigInt> {
        let form = match &self.form {
            Form::Rational(r) => Form::Rational(Ratio::new_raw(
                r.numer().clone().into(),
                r.denom().clone().into(),
            )),
            Form::Surd(s) => {
                let (a, b, c, r) = s.parts();
                Form::Surd(QuadraticSurd::new_raw(
                    a.clone().into(),
                    b.clone().into(),
                    c.clone().into(),
                    r.clone().into(),
                ))
            }
            Form::Opaque => Form::Opaque,
        };
        ContinuedFraction {
            source: Box::new(
                self.source
                    .clone()
                    .map(|t: Result<T, Error>| t.map(Into::into)),
            ),
            form,
            simplified: self.simplified,
            limits: self.limits,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ContinuedFraction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuedFraction")
            .field("form", &self.form)
            .field("simplified", &self.simplified)
            .field("limits", &self.limits)
            .finish()
    }
}

impl<T: TermBase> fmt::Display for ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // raw terms are printed as they are
        if self.simplified {
            if let Some(expansion) = self.expansion() {
                return write!(f, "{}", expansion);
            }
        }

        write!(f, "[")?;
        let mut terms = self.terms();
        for i in 0..=DISPLAY_TERMS {
            let sep = match i {
                0 => "",
                1 => "; ",
                _ => ", ",
            };
            match terms.next() {
                None => break,
                Some(Err(_)) => {
                    write!(f, "{}?", sep)?;
                    break;
                }
                Some(Ok(_)) if i == DISPLAY_TERMS => write!(f, "{}...", sep)?,
                Some(Ok(t)) => write!(f, "{}{}", sep, t)?,
            }
        }
        write!(f, "]")
    }
}

macro_rules! arith_impl {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: TermBase> $trait for ContinuedFraction<T>
        where
            for<'r> &'r T: RefNum<T>,
        {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                self.arith(&rhs, $op)
                    .unwrap_or_else(|e| Self::from_error(e, self.limits))
            }
        }

        impl<'a, 'b, T: TermBase> $trait<&'b ContinuedFraction<T>> for &'a ContinuedFraction<T>
        where
            for<'r> &'r T: RefNum<T>,
        {
            type Output = ContinuedFraction<T>;

            fn $method(self, rhs: &'b ContinuedFraction<T>) -> ContinuedFraction<T> {
                self.arith(rhs, $op)
                    .unwrap_or_else(|e| ContinuedFraction::<T>::from_error(e, self.limits))
            }
        }
    };
}

arith_impl!(Add, add, Op::Add);
arith_impl!(Sub, sub, Op::Sub);
arith_impl!(Mul, mul, Op::Mul);

impl<T: TermBase> Div for ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Output = Result<Self, Error>;

    fn div(self, rhs: Self) -> Self::Output {
        self.try_div(&rhs)
    }
}

impl<'a, 'b, T: TermBase> Div<&'b ContinuedFraction<T>> for &'a ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Output = Result<ContinuedFraction<T>, Error>;

    fn div(self, rhs: &'b ContinuedFraction<T>) -> Self::Output {
        self.try_div(rhs)
    }
}

impl<T: TermBase> Neg for ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.negated()
    }
}

impl<'a, T: TermBase> Neg for &'a ContinuedFraction<T>
where
    for<'r> &'r T: RefNum<T>,
{
    type Output = ContinuedFraction<T>;

    #[inline]
    fn neg(self) -> ContinuedFraction<T> {
        self.negated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FromSqrt;
    use std::iter::repeat;

    type CF = ContinuedFraction<i64>;

    fn ratio(n: i64, d: i64) -> CF {
        CF::from_ratio(Ratio::new(n, d))
    }

    // the same value, but hidden from the exact fast paths
    fn opaque(r: Ratio<i64>) -> CF {
        CF::lazy(EuclidTerms::new(r))
    }

    fn sqrt2() -> CF {
        CF::periodic(vec![1], vec![2]).unwrap()
    }

    #[test]
    fn creation_test() {
        assert_eq!(CF::from_integer(5).take_terms(10), Ok(vec![5]));
        assert_eq!(CF::from_integer(-3).take_terms(10), Ok(vec![-3]));
        assert_eq!(CF::from_integer(0).take_terms(10), Ok(vec![0]));
        assert_eq!(ratio(-22, 7).take_terms(10), Ok(vec![-4, 1, 6]));
        assert_eq!(CF::from_decimal(314, 2).unwrap().to_rational(), Some(Ratio::new(157, 50)));
        assert_eq!(CF::from_f64(0.75).unwrap().take_terms(10), Ok(vec![0, 1, 3]));
        assert_eq!(CF::from(Ratio::new(7, 22)).take_terms(10), Ok(vec![0, 3, 7]));

        let cf = CF::from_terms(vec![1, 2, 1]).unwrap();
        assert!(!cf.is_simplified());
        assert_eq!(cf.take_terms(10), Ok(vec![1, 2, 1]));
        assert_eq!(cf.to_rational(), Some(Ratio::new(4, 3)));
        assert!(CF::from_terms(vec![3, 7]).unwrap().is_simplified());
        // [1; -2] = 1 - 1/2
        assert_eq!(CF::from_terms(vec![1, -2]).unwrap().to_rational(), Some(Ratio::new(1, 2)));

        let sq7 = CF::periodic(vec![2], vec![1, 1, 1, 4]).unwrap();
        assert_eq!(sq7.to_surd(), Some(QuadraticSurd::<i64>::from_sqrt(7).unwrap()));
        assert_eq!(sq7.take_terms(6), Ok(vec![2, 1, 1, 1, 4, 1]));

        // √2 / 7 converts back into the same periodic expansion
        let cf = CF::periodic(vec![0, 4], vec![1, 18, 1, 8]).unwrap();
        assert_eq!(cf.to_surd(), Some(QuadraticSurd::<i64>::new(0, 2, 7).unwrap()));
        assert_eq!(
            cf.expansion(),
            Some(Expansion::new(vec![0, 4], vec![1, 18, 1, 8]).unwrap())
        );
        assert_eq!(
            CF::periodic(vec![3, 7], vec![]).unwrap().to_rational(),
            Some(Ratio::new(22, 7))
        );
    }

    #[test]
    fn creation_error_test() {
        assert_eq!(CF::from_terms(vec![]).err(), Some(Error::InvalidTerm));
        assert_eq!(CF::from_terms(vec![1, 0]).err(), Some(Error::InvalidTerm));
        assert_eq!(CF::from_f64(f64::NAN).err(), Some(Error::NotFinite));
        assert_eq!(CF::from_f64(f64::INFINITY).err(), Some(Error::NotFinite));
        assert_eq!(CF::periodic(vec![1], vec![0]).err(), Some(Error::InvalidTerm));
        assert_eq!(CF::periodic(vec![], vec![]).err(), Some(Error::InvalidTerm));
    }

    #[test]
    fn terms_restart_test() {
        let e = CF::constant(Constant::E);
        let first = e.take_terms(10).unwrap();
        assert_eq!(first, vec![2, 1, 2, 1, 1, 4, 1, 1, 6, 1]);
        assert_eq!(e.take_terms(10).unwrap(), first);

        let mut terms = e.terms();
        terms.next();
        let rest = terms.clone();
        assert_eq!(terms.take(3).collect::<Vec<_>>(), rest.take(3).collect::<Vec<_>>());
    }

    #[test]
    fn convergents_test() {
        let e = CF::constant(Constant::E);
        assert_eq!(
            e.convergents().take(5).collect::<Result<Vec<_>, _>>(),
            Ok(vec![
                Ratio::from(2),
                Ratio::from(3),
                Ratio::new(8, 3),
                Ratio::new(11, 4),
                Ratio::new(19, 7)
            ])
        );

        // the zero term produces 1/0, which is skipped
        let cf = CF::from_terms(vec![1, 0, 2]).unwrap();
        assert_eq!(
            cf.convergents().collect::<Result<Vec<_>, _>>(),
            Ok(vec![Ratio::from(1), Ratio::from(3)])
        );

        // overflow ends the iteration with an error
        let big = CF::lazy(repeat(i64::MAX / 2));
        assert!(matches!(
            big.convergents().last(),
            Some(Err(Error::NotFinite))
        ));
    }

    #[test]
    fn approximation_test() {
        assert_eq!(sqrt2().approximation(5), Ok(Ratio::new(41, 29)));
        assert_eq!(ratio(22, 7).approximation(1), Ok(Ratio::from(3)));
        assert_eq!(ratio(22, 7).approximation(100), Ok(Ratio::new(22, 7)));
        assert_eq!(ratio(22, 7).approximation(0), Err(Error::InvalidTerm));

        let pi = CF::constant(Constant::Pi);
        assert_eq!(
            pi.approximated(&100),
            Ok(Approximation::Approximated(Ratio::new(22, 7)))
        );
        assert_eq!(
            pi.approximated(&1000),
            Ok(Approximation::Approximated(Ratio::new(355, 113)))
        );
        assert_eq!(
            ratio(5, 3).approximated(&100),
            Ok(Approximation::Exact(Ratio::new(5, 3)))
        );
        assert_eq!(
            CF::constant(Constant::Phi).approximated(&10),
            Ok(Approximation::Approximated(Ratio::new(13, 8)))
        );
    }

    #[test]
    fn simplify_test() {
        let cf = CF::from_terms(vec![1, 2, 1]).unwrap();
        assert_eq!(cf.simplified().take_terms(10), Ok(vec![1, 3]));

        let cf = CF::from_terms(vec![4, 1]).unwrap().simplified();
        assert!(cf.is_simplified());
        assert_eq!(cf.take_terms(10), Ok(vec![5]));

        let cf = CF::lazy(vec![3i64, 1].into_iter()).simplified();
        assert_eq!(cf.take_terms(10), Ok(vec![4]));

        let cf = CF::lazy(vec![1i64, 0, 2].into_iter()).simplified();
        assert_eq!(cf.take_terms(10), Ok(vec![3]));

        // 2 - 1/3 = [1; 1, 2]
        let cf = CF::lazy(vec![2i64, -3].into_iter()).simplified();
        assert_eq!(cf.take_terms(10), Ok(vec![1, 1, 2]));

        // simplifying twice changes nothing
        let values = vec![
            CF::from_terms(vec![2, 1, 0, 2, 4]).unwrap(),
            CF::lazy(vec![0i64, 1, 1].into_iter()),
            CF::lazy(once(1i64).chain(repeat(2))),
            sqrt2(),
        ];
        for v in values {
            let first = v.simplified();
            let second = first.simplified();
            assert_eq!(first.take_terms(12), second.take_terms(12));
        }
    }

    #[test]
    fn negate_test() {
        assert_eq!((-ratio(3, 2)).take_terms(10), Ok(vec![-2, 2]));
        assert_eq!((-sqrt2()).take_terms(6), Ok(vec![-2, 1, 1, 2, 2, 2]));
        assert_eq!(
            (-&CF::constant(Constant::E)).take_terms(5),
            Ok(vec![-3, 3, 1, 1, 4])
        );
        assert_eq!(opaque(Ratio::new(3, 2)).negated().take_terms(10), Ok(vec![-2, 2]));
    }

    #[test]
    fn recip_test() {
        assert_eq!(ratio(22, 7).recip().unwrap().take_terms(10), Ok(vec![0, 3, 7]));
        assert_eq!(
            sqrt2().recip().unwrap().to_surd(),
            Some(QuadraticSurd::<i64>::new(0, 2, 2).unwrap())
        );
        assert_eq!(
            opaque(Ratio::new(22, 7)).recip().unwrap().take_terms(10),
            Ok(vec![0, 3, 7])
        );
        assert_eq!(CF::from_integer(0).recip().err(), Some(Error::DivisionByZero));
        assert_eq!(opaque(Ratio::from(0)).recip().err(), Some(Error::DivisionByZero));
    }

    #[test]
    fn homographic_test() {
        let e = CF::constant(Constant::E);
        assert_eq!(e.homographic(1, 1, 0, 1).unwrap().take_terms(5), Ok(vec![3, 1, 2, 1, 1]));
        assert_eq!(ratio(1, 2).homographic(2, 1, 0, 3).unwrap().to_rational(), Some(Ratio::new(2, 3)));
        assert_eq!(e.homographic(1, 0, 0, 0).err(), Some(Error::DivisionByZero));
        // 1 / (2x - 1) at x = 1/2
        assert_eq!(
            ratio(1, 2).homographic(0, 1, 2, -1).err(),
            Some(Error::DivisionByZero)
        );
    }

    #[test]
    fn arithmetic_test() {
        // 3/2 + 1/3 = 11/6
        let sum = ratio(3, 2) + ratio(1, 3);
        assert_eq!(sum.take_terms(10), Ok(vec![1, 1, 5]));
        assert_eq!(sum.to_rational(), Some(Ratio::new(11, 6)));
        let sum = opaque(Ratio::new(3, 2)) + opaque(Ratio::new(1, 3));
        assert_eq!(sum.take_terms(10), Ok(vec![1, 1, 5]));

        // e + 1 and 2e are homographic transforms of e
        let e = CF::constant(Constant::E);
        assert_eq!((&e + &CF::from_integer(1)).take_terms(5), Ok(vec![3, 1, 2, 1, 1]));
        assert_eq!(
            (&CF::from_integer(2) * &e).take_terms(6),
            Ok(vec![5, 2, 3, 2, 3, 1])
        );
        assert_eq!((&e + &e).take_terms(6), Ok(vec![5, 2, 3, 2, 3, 1]));
        assert_eq!(
            (&e + &sqrt2()).take_terms(8),
            Ok(vec![4, 7, 1, 1, 4, 1, 3, 2])
        );
    }

    #[test]
    fn arithmetic_engine_test() {
        let values = [
            Ratio::new(3, 2),
            Ratio::new(1, 3),
            Ratio::new(-7, 5),
            Ratio::from(2),
            Ratio::new(22, 7),
            Ratio::from(-1),
            Ratio::from(0),
            Ratio::new(-5, 8),
        ];
        for x in values.iter() {
            for y in values.iter() {
                let (ox, oy) = (opaque(*x), opaque(*y));
                let expect = |r: Ratio<i64>| Ok(EuclidTerms::new(r).collect::<Vec<_>>());
                assert_eq!((&ox + &oy).take_terms(20), expect(x + y));
                assert_eq!((&ox - &oy).take_terms(20), expect(x - y));
                assert_eq!((&ox * &oy).take_terms(20), expect(x * y));
                if !y.is_zero() {
                    assert_eq!((&ox / &oy).unwrap().take_terms(20), expect(x / y));
                }
            }
        }
    }

    #[test]
    fn surd_arithmetic_test() {
        let sq2 = sqrt2();
        let two = &sq2 * &sq2;
        assert_eq!(two.to_rational(), Some(Ratio::from(2)));
        assert_eq!(two.take_terms(5), Ok(vec![2]));

        // φ² - φ = 1
        let phi = CF::constant(Constant::Phi);
        assert_eq!(phi.take_terms(5), Ok(vec![1, 1, 1, 1, 1]));
        let one = &(&phi * &phi) - &phi;
        assert_eq!(one.to_rational(), Some(Ratio::from(1)));

        // √2 + 1/2 stays in the same field
        let sum = &sq2 + &ratio(1, 2);
        assert_eq!(sum.to_surd(), Some(QuadraticSurd::<i64>::from_parts(1, 2, 2, 2).unwrap()));

        // √2 and √5 don't share a field, the engine takes over
        let sum = &sq2 + &phi;
        assert!(sum.to_surd().is_none());
        assert_eq!(sum.take_terms(6), Ok(vec![3, 31, 98, 1, 17, 18]));
    }

    #[test]
    fn division_test() {
        let q = (ratio(3, 2) / ratio(1, 3)).unwrap();
        assert_eq!(q.to_rational(), Some(Ratio::new(9, 2)));

        assert_eq!((ratio(1, 2) / CF::from_integer(0)).err(), Some(Error::DivisionByZero));
        assert_eq!(
            CF::constant(Constant::E).try_div(&CF::from_integer(0)).err(),
            Some(Error::DivisionByZero)
        );
        assert_eq!(
            ratio(1, 2).try_div(&opaque(Ratio::from(0))).err(),
            Some(Error::DivisionByZero)
        );
        assert_eq!(
            ratio(1, 2)
                .bihomographic(&ratio(1, 3), 1, 0, 0, 0, 0, 0, 0, 0)
                .err(),
            Some(Error::DivisionByZero)
        );
    }

    #[test]
    fn degenerate_test() {
        // √2 · √2 computed by the engine sits on an integer boundary forever
        let limits = Limits::default().with_max_ingest(20);
        let sq2 = CF::lazy(once(1i64).chain(repeat(2))).with_limits(limits);
        let product = &sq2 * &sq2;
        assert!(matches!(
            product.terms().next(),
            Some(Err(Error::DegenerateTransform { .. }))
        ));
        assert_eq!(product.limits(), limits);
        assert_eq!(product.to_string(), "[?]");
    }

    #[test]
    fn compare_test() {
        assert_eq!(ratio(100, 89).compare(&ratio(244, 217)), Ok(Some(Ordering::Less)));
        assert_eq!(
            opaque(Ratio::new(100, 89)).compare(&opaque(Ratio::new(244, 217))),
            Ok(Some(Ordering::Less))
        );
        assert_eq!(
            opaque(Ratio::new(1, 2)).compare(&ratio(1, 2)),
            Ok(Some(Ordering::Equal))
        );
        // an expansion that ends is compared as if its next term was ∞
        assert_eq!(
            CF::from_integer(1).compare(&CF::lazy(vec![1i64, 2].into_iter())),
            Ok(Some(Ordering::Less))
        );

        let pi = CF::constant(Constant::Pi);
        assert_eq!(CF::from_f64(3.15).unwrap().compare(&pi), Ok(Some(Ordering::Greater)));
        assert_eq!(ratio(22, 7).compare(&pi), Ok(Some(Ordering::Greater)));
        assert_eq!(ratio(3, 1).compare(&pi), Ok(Some(Ordering::Less)));

        let phi = CF::constant(Constant::Phi);
        assert_eq!(phi.compare(&ratio(8, 5)), Ok(Some(Ordering::Greater)));
        assert_eq!(sqrt2().compare(&phi), Ok(Some(Ordering::Less)));

        // the same irrational value never differs in any term
        let e = CF::constant(Constant::E);
        assert_eq!(e.compare(&e.clone()), Ok(None));
    }

    #[test]
    fn fmt_test() {
        assert_eq!(sqrt2().to_string(), "[1; (2)]");
        assert_eq!(ratio(22, 7).to_string(), "[3; 7]");
        assert_eq!(CF::from_integer(-3).to_string(), "[-3]");
        assert_eq!(
            CF::constant(Constant::E).to_string(),
            "[2; 1, 2, 1, 1, 4, 1, 1, 6, 1, ...]"
        );
        assert_eq!(CF::lazy(vec![1i64, 2].into_iter()).to_string(), "[1; 2]");

        // terms that are not canonical are printed as given
        let cf = CF::from_terms(vec![1, 2, 1]).unwrap();
        assert_eq!(cf.to_string(), "[1; 2, 1]");
        assert_eq!(cf.simplified().to_string(), "[1; 3]");
    }

    #[test]
    fn error_value_test() {
        let limits = Limits::default().with_max_ingest(7);
        let cf = CF::from_error(Error::NotFinite, limits);
        assert_eq!(cf.limits(), limits);
        assert_eq!(cf.take_terms(3), Err(Error::NotFinite));

        // derived values keep the limits of the left operand
        let e = CF::constant(Constant::E).with_limits(limits);
        let wrong = e.bihomographic(&e, 0, 0, 0, 0, 0, 0, 0, 0);
        assert_eq!(wrong.err(), Some(Error::DivisionByZero));
        let zero = CF::from_integer(0);
        assert_eq!((&e * &zero).limits(), limits);
    }

    #[test]
    fn overflow_test() {
        let e = CF::constant(Constant::E);
        let pi = CF::constant(Constant::Pi);

        // the engine reports overflow of its coefficients instead of panicking
        let product = &e * &pi;
        assert_eq!(
            product.take_terms(21),
            Ok(vec![8, 1, 1, 5, 1, 3, 1, 4, 12, 3, 2, 1, 5, 2, 12, 1, 1, 1, 10, 2, 2])
        );
        assert_eq!(product.take_terms(25), Err(Error::NotFinite));
        assert_eq!((&e * &e).take_terms(60), Err(Error::NotFinite));
        assert_eq!(pi.take_terms(5), Ok(vec![3, 7, 15, 1, 292]));
        assert_eq!(pi.take_terms(30), Err(Error::NotFinite));

        // exact surd arithmetic overflows, the engine takes over
        let sum = &sqrt2() + &ratio(1, 3_000_000_007);
        assert!(sum.to_surd().is_none());
        assert_eq!(sum.take_terms(6), Ok(vec![1, 2, 2, 2, 2, 2]));

        // the expansion of the surd itself overflows
        let wide = QuadraticSurd::<i64>::from_parts(0, 3_037_000_500, 1, 2).unwrap();
        let cf = CF::from_surd(wide);
        assert_eq!(cf.terms().next(), Some(Err(Error::NotFinite)));
    }

    #[test]
    #[cfg(feature = "num-bigint")]
    fn bigint_test() {
        use num_bigint::BigInt;

        let e = ContinuedFraction::<BigInt>::constant(Constant::E);
        let sum = &e + &e;
        let scaled = &ContinuedFraction::<BigInt>::from_integer(BigInt::from(2)) * &e;
        assert_eq!(sum.take_terms(40), scaled.take_terms(40));

        let prefix: Vec<BigInt> = [5, 2, 3, 2, 3, 1].iter().map(|&t| BigInt::from(t)).collect();
        assert_eq!(sum.take_terms(6), Ok(prefix));
    }

    #[test]
    #[cfg(feature = "num-bigint")]
    fn to_bigint_test() {
        use num_bigint::BigInt;

        let big = |v: Vec<i64>| -> Vec<BigInt> { v.into_iter().map(BigInt::from).collect() };
        let e = CF::constant(Constant::E);
        assert_eq!((&e * &e).take_terms(30), Err(Error::NotFinite));

        let wide = e.to_bigint();
        let square = &wide * &wide;
        let terms = square.take_terms(30).unwrap();
        assert_eq!(
            terms[..24].to_vec(),
            big(vec![7, 2, 1, 1, 3, 18, 5, 1, 1, 6, 30, 8, 1, 1, 9, 42, 11, 1, 1, 12, 54, 14, 1, 1])
        );
        let e = ContinuedFraction::<BigInt>::constant(Constant::E);
        assert_eq!(Ok(terms), (&e * &e).take_terms(30));

        // exact forms survive the conversion
        let r = ratio(22, 7).to_bigint();
        assert_eq!(r.to_rational(), Some(Ratio::new(BigInt::from(22), BigInt::from(7))));
        let sq2 = sqrt2().to_bigint();
        assert_eq!(sq2.to_surd(), Some(QuadraticSurd::<BigInt>::from_sqrt(BigInt::from(2)).unwrap()));
        assert_eq!(sq2.to_string(), "[1; (2)]");

        let limits = Limits::default().with_compare_terms(8);
        let raw = CF::from_terms(vec![1, 2, 1]).unwrap().with_limits(limits).to_bigint();
        assert!(!raw.is_simplified());
        assert_eq!(raw.limits(), limits);
    }
}

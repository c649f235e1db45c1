use crate::error::Error;
use num_integer::Integer;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, NumRef, One, RefNum, Zero};
use std::mem::swap;

// a * x + y
#[inline]
fn mul_add<T: CheckedAdd + CheckedMul>(a: &T, x: &T, y: &T) -> Result<T, Error> {
    a.checked_mul(x).and_then(|v| v.checked_add(y)).ok_or(Error::NotFinite)
}

// x - t * y
#[inline]
fn sub_mul<T: CheckedSub + CheckedMul>(x: &T, t: &T, y: &T) -> Result<T, Error> {
    t.checked_mul(y).and_then(|v| x.checked_sub(&v)).ok_or(Error::NotFinite)
}

#[inline]
fn add<T: CheckedAdd>(x: &T, y: &T) -> Result<T, Error> {
    x.checked_add(y).ok_or(Error::NotFinite)
}

/// A block on the magic table for homographic operation computation of continued fractions.
/// It represents `(ax + b) / (cx + d)` where `x` is the not yet consumed tail of the input.
/// The method is described in <https://crypto.stanford.edu/pbc/notes/contfrac/compute.html>
#[derive(Debug, Clone, Copy)]
pub struct Block<T> {
    pm1: T, // p_(k-1)
    pm2: T, // p_(k-2)
    qm1: T, // q_(k-1)
    qm2: T, // q_(k-2)
}

impl<T> Block<T> {
    /// create a block that represents (ax + b) / (cx + d)
    pub fn new(a: T, b: T, c: T, d: T) -> Self {
        Block { pm1: a, pm2: b, qm1: c, qm2: d }
    }

    /// push the latest convergent to the block
    pub fn update(&mut self, p: T, q: T) {
        swap(&mut self.pm2, &mut self.pm1); // self.pm2 = self.pm1
        swap(&mut self.qm2, &mut self.qm1); // self.qm2 = self.qm1
        self.pm1 = p;
        self.qm1 = q;
    }

    /// The latest convergent `(p_k, q_k)`
    pub fn convergent(&self) -> (&T, &T) {
        (&self.pm1, &self.qm1)
    }

    /// Deconstruct into `(a, b, c, d)` of `(ax + b) / (cx + d)`
    pub fn into_parts(self) -> (T, T, T, T) {
        (self.pm1, self.pm2, self.qm1, self.qm2)
    }
}

impl<T: Zero + One> Block<T> {
    /// create a block that represents a identity operation
    pub fn identity() -> Self {
        Block { pm1: T::one(), pm2: T::zero(), qm1: T::zero(), qm2: T::one() }
    }
}

impl<T> Block<T>
where
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul,
    for<'r> &'r T: RefNum<T>,
{
    /// move with an coefficient from regular continued fraction, `None` on overflow
    pub fn checked_rmove(&self, a: T) -> Option<(T, T)> {
        let p = a.checked_mul(&self.pm1).and_then(|v| v.checked_add(&self.pm2))?;
        let q = a.checked_mul(&self.qm1).and_then(|v| v.checked_add(&self.qm2))?;
        Some((p, q))
    }

    /// consume a term of the input, `x = a + 1/x'`
    pub fn ingest(&mut self, a: T) -> Result<(), Error> {
        let (p, q) = self.checked_rmove(a).ok_or(Error::NotFinite)?;
        self.update(p, q);
        Ok(())
    }

    /// move with two coefficients from generalized continued fraction
    pub fn gmove(&mut self, a: T, b: T) -> Result<(T, T), Error> {
        let p = self.pm2.checked_mul(&a).ok_or(Error::NotFinite)?;
        let p = mul_add(&self.pm1, &b, &p)?;
        let q = self.qm2.checked_mul(&a).ok_or(Error::NotFinite)?;
        let q = mul_add(&self.qm1, &b, &q)?;
        let g = p.gcd(&q).gcd(&self.pm1).gcd(&self.qm1);

        if g > T::one() {
            self.pm1 = &self.pm1 / &g;
            self.qm1 = &self.qm1 / &g;
            Ok((p / &g, q / g))
        } else {
            Ok((p, q))
        }
    }

    /// Check whether we should reduce integer from the convergents
    /// If the convergets has the same integer part i, then return Ok with the integer and remainders
    #[inline]
    pub fn check_integer(&self, p: &T, q: &T) -> Result<(T, T, T), ()> {
        if self.qm1.is_zero() || q.is_zero() {
            return Err(());
        }

        let (im1, rm1) = self.pm1.div_mod_floor(&self.qm1);
        let (i, r) = p.div_mod_floor(q);

        if im1 == i {
            Ok((i, rm1, r))
        } else {
            Err(())
        }
    }

    /// extract the integer part if latests two convergents agrees
    /// this function also update the convergents if failed
    pub fn reduce_integer(&mut self, p: T, q: T) -> Option<T> {
        match self.check_integer(&p, &q) {
            Ok((i, rm1, r)) => {
                self.pm1 = q;
                swap(&mut self.pm2, &mut self.qm1); // self.pm2 = self.qm1
                self.qm1 = r;
                self.qm2 = rm1;
                Some(i)
            }
            Err(_) => {
                self.update(p, q);
                None
            }
        }
    }

    /// Expand the latest convergent `p_k/q_k` by Euclid once the generalized input is over.
    pub fn drain_integer(&mut self) -> Option<T> {
        if self.qm1.is_zero() {
            return None;
        }
        let (i, r) = self.pm1.div_mod_floor(&self.qm1);
        swap(&mut self.pm1, &mut self.qm1); // self.pm1 = self.qm1
        self.qm1 = r;
        Some(i)
    }

    /// Integer part of the map if it's the same for every tail `x` in `[1, ∞]`
    pub fn bracket(&self) -> Result<Option<T>, Error> {
        let lo_q = add(&self.qm1, &self.qm2)?;
        if !same_sign(&self.qm1, &lo_q) {
            return Ok(None);
        }
        let lo_p = add(&self.pm1, &self.pm2)?;
        let hi = self.pm1.div_floor(&self.qm1);
        if hi == lo_p.div_floor(&lo_q) {
            Ok(Some(hi))
        } else {
            Ok(None)
        }
    }

    /// emit the term `t` and keep `1 / (value - t)`
    pub fn egest(&mut self, t: &T) -> Result<(), Error> {
        let r1 = sub_mul(&self.pm1, t, &self.qm1)?;
        let r2 = sub_mul(&self.pm2, t, &self.qm2)?;
        swap(&mut self.pm1, &mut self.qm1);
        swap(&mut self.pm2, &mut self.qm2);
        self.qm1 = r1;
        self.qm2 = r2;
        Ok(())
    }

    /// the input is over, fix `x = ∞`
    pub fn exhaust(&mut self) {
        self.pm2 = self.pm1.clone();
        self.qm2 = self.qm1.clone();
    }

    /// numerator and denominator both vanished
    pub fn is_degenerate(&self) -> bool {
        self.pm1.is_zero() && self.pm2.is_zero() && self.is_infinite()
    }

    /// denominator vanished
    pub fn is_infinite(&self) -> bool {
        self.qm1.is_zero() && self.qm2.is_zero()
    }

    /// divide out the common factor of all coefficients
    pub fn normalize(&mut self) {
        let g = self.pm1.gcd(&self.pm2).gcd(&self.qm1).gcd(&self.qm2);
        if g > T::one() {
            self.pm1 = &self.pm1 / &g;
            self.pm2 = &self.pm2 / &g;
            self.qm1 = &self.qm1 / &g;
            self.qm2 = &self.qm2 / &g;
        }
    }
}

// both are non-zero and have the same sign
#[inline]
fn same_sign<T: Integer>(a: &T, b: &T) -> bool {
    let zero = T::zero();
    if a.is_zero() || b.is_zero() {
        return false;
    }
    (a > &zero) == (b > &zero)
}

/// A block on the magic table for bihomographic operation computation of continued fractions.
/// It represents `(axy + bx + cy + d)/(exy + fx + gy + h)`.
/// The method is described in <https://crypto.stanford.edu/pbc/notes/contfrac/bihom.html>
#[derive(Debug, Clone, Copy)]
pub struct DualBlock<T> {
    pm11: T, // a, coefficient of xy
    pm12: T, // b, coefficient of x
    pm21: T, // c, coefficient of y
    pm22: T, // d
    qm11: T, // e
    qm12: T, // f
    qm21: T, // g
    qm22: T, // h
}

impl<T> DualBlock<T> {
    /// create a block that represents (axy + bx + cy + d)/(exy + fx + gy + h)
    #[allow(clippy::too_many_arguments)]
    pub fn new(a: T, b: T, c: T, d: T, e: T, f: T, g: T, h: T) -> Self {
        DualBlock {
            pm11: a, pm12: b, pm21: c, pm22: d,
            qm11: e, qm12: f, qm21: g, qm22: h,
        }
    }

    /// push the latest convergent using x from right to the block
    pub fn update_right(&mut self, p1: T, q1: T, p2: T, q2: T) {
        swap(&mut self.pm21, &mut self.pm11); // self.pm21 = self.pm11
        swap(&mut self.qm21, &mut self.qm11); // self.qm21 = self.qm11
        self.pm11 = p1;
        self.qm11 = q1;

        swap(&mut self.pm22, &mut self.pm12); // self.pm22 = self.pm12
        swap(&mut self.qm22, &mut self.qm12); // self.qm22 = self.qm12
        self.pm12 = p2;
        self.qm12 = q2;
    }

    /// push the latest convergent using y from bottom to the block
    pub fn update_down(&mut self, p1: T, q1: T, p2: T, q2: T) {
        swap(&mut self.pm12, &mut self.pm11); // self.pm12 = self.pm11
        swap(&mut self.qm12, &mut self.qm11); // self.qm12 = self.qm11
        self.pm11 = p1;
        self.qm11 = q1;

        swap(&mut self.pm22, &mut self.pm21); // self.pm22 = self.pm21
        swap(&mut self.qm22, &mut self.qm21); // self.qm22 = self.qm21
        self.pm21 = p2;
        self.qm21 = q2;
    }
}

impl<T> DualBlock<T>
where
    T: Integer + NumRef + Clone + CheckedAdd + CheckedSub + CheckedMul,
    for<'r> &'r T: RefNum<T>,
{
    /// move with an coefficient from the first regular continued fraction (x)
    pub fn rmove_right(&self, a: T) -> Result<(T, T, T, T), Error> {
        let p1 = mul_add(&a, &self.pm11, &self.pm21)?;
        let q1 = mul_add(&a, &self.qm11, &self.qm21)?;
        let p2 = mul_add(&a, &self.pm12, &self.pm22)?;
        let q2 = mul_add(&a, &self.qm12, &self.qm22)?;
        Ok((p1, q1, p2, q2))
    }

    /// move with an coefficient from the second regular continued fraction (y)
    pub fn rmove_down(&self, a: T) -> Result<(T, T, T, T), Error> {
        let p1 = mul_add(&a, &self.pm11, &self.pm12)?;
        let q1 = mul_add(&a, &self.qm11, &self.qm12)?;
        let p2 = mul_add(&a, &self.pm21, &self.pm22)?;
        let q2 = mul_add(&a, &self.qm21, &self.qm22)?;
        Ok((p1, q1, p2, q2))
    }

    pub fn ingest_right(&mut self, a: T) -> Result<(), Error> {
        let (p1, q1, p2, q2) = self.rmove_right(a)?;
        self.update_right(p1, q1, p2, q2);
        Ok(())
    }

    pub fn ingest_down(&mut self, a: T) -> Result<(), Error> {
        let (p1, q1, p2, q2) = self.rmove_down(a)?;
        self.update_down(p1, q1, p2, q2);
        Ok(())
    }

    /// Check whether the integer part is decided for every `x, y` in `[1, ∞]`.
    ///
    /// The corners `(∞,∞), (∞,1), (1,∞), (1,1)` bound the value as long as the
    /// denominator keeps its sign on all of them. If the integer is not decided,
    /// the inner Err has flags about whether to move right (x) or move down (y).
    /// The outer Err means a corner overflows the integer type.
    pub fn bracket(&self) -> Result<Result<T, (bool, bool)>, Error> {
        let q_inf_inf = self.qm11.clone();
        let q_inf_one = add(&self.qm11, &self.qm12)?;
        let q_one_inf = add(&self.qm11, &self.qm21)?;
        let q_one_one = add(&add(&q_inf_one, &self.qm21)?, &self.qm22)?;
        if !(same_sign(&q_inf_inf, &q_inf_one)
            && same_sign(&q_inf_inf, &q_one_inf)
            && same_sign(&q_inf_inf, &q_one_one))
        {
            return Ok(Err((true, true)));
        }

        let p_inf_one = add(&self.pm11, &self.pm12)?;
        let p_one_inf = add(&self.pm11, &self.pm21)?;
        let p_one_one = add(&add(&p_inf_one, &self.pm21)?, &self.pm22)?;

        let i1 = self.pm11.div_floor(&q_inf_inf);
        let i2 = p_inf_one.div_floor(&q_inf_one);
        let i3 = p_one_inf.div_floor(&q_one_inf);
        let i4 = p_one_one.div_floor(&q_one_one);

        if i1 == i2 && i1 == i3 && i1 == i4 {
            Ok(Ok(i1))
        } else {
            Ok(Err((i1 != i3 || i2 != i4, i1 != i2 || i3 != i4)))
        }
    }

    /// emit the term `t` and keep `1 / (value - t)`
    pub fn egest(&mut self, t: &T) -> Result<(), Error> {
        let r11 = sub_mul(&self.pm11, t, &self.qm11)?;
        let r12 = sub_mul(&self.pm12, t, &self.qm12)?;
        let r21 = sub_mul(&self.pm21, t, &self.qm21)?;
        let r22 = sub_mul(&self.pm22, t, &self.qm22)?;
        swap(&mut self.pm11, &mut self.qm11); self.qm11 = r11;
        swap(&mut self.pm12, &mut self.qm12); self.qm12 = r12;
        swap(&mut self.pm21, &mut self.qm21); self.qm21 = r21;
        swap(&mut self.pm22, &mut self.qm22); self.qm22 = r22;
        Ok(())
    }

    /// x is over, fix `x = ∞`
    pub fn exhaust_right(&mut self) {
        self.pm21 = self.pm11.clone();
        self.pm22 = self.pm12.clone();
        self.qm21 = self.qm11.clone();
        self.qm22 = self.qm12.clone();
    }

    /// y is over, fix `y = ∞`
    pub fn exhaust_down(&mut self) {
        self.pm12 = self.pm11.clone();
        self.pm22 = self.pm21.clone();
        self.qm12 = self.qm11.clone();
        self.qm22 = self.qm21.clone();
    }

    pub fn is_degenerate(&self) -> bool {
        self.pm11.is_zero()
            && self.pm12.is_zero()
            && self.pm21.is_zero()
            && self.pm22.is_zero()
            && self.is_infinite()
    }

    pub fn is_infinite(&self) -> bool {
        self.qm11.is_zero() && self.qm12.is_zero() && self.qm21.is_zero() && self.qm22.is_zero()
    }

    pub fn normalize(&mut self) {
        let g = self
            .pm11
            .gcd(&self.pm12)
            .gcd(&self.pm21)
            .gcd(&self.pm22)
            .gcd(&self.qm11)
            .gcd(&self.qm12)
            .gcd(&self.qm21)
            .gcd(&self.qm22);
        if g > T::one() {
            for v in [
                &mut self.pm11, &mut self.pm12, &mut self.pm21, &mut self.pm22,
                &mut self.qm11, &mut self.qm12, &mut self.qm21, &mut self.qm22,
            ] {
                *v = &*v / &g;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_bracket_test() {
        // x + 1 with x in [1, ∞] spans [2, ∞]
        let mut b = Block::new(1i64, 1, 0, 1);
        assert_eq!(b.bracket(), Ok(None));

        // x = 2 + 1/x' gives (3x' + 1) / x', in (3, 4]
        b.ingest(2).unwrap();
        assert_eq!(b.bracket(), Ok(None));
        b.exhaust();
        assert_eq!(b.bracket(), Ok(Some(3)));
        b.egest(&3).unwrap();
        assert!(b.is_infinite());
        assert!(!b.is_degenerate());
    }

    #[test]
    fn block_drain_test() {
        // 22/7 as the latest convergent
        let mut b = Block::new(22i64, 3, 7, 1);
        assert_eq!(b.drain_integer(), Some(3));
        assert_eq!(b.drain_integer(), Some(7));
        assert_eq!(b.drain_integer(), None);
    }

    #[test]
    fn block_overflow_test() {
        let mut b = Block::new(i64::MAX / 2, 1, 1, 0);
        assert_eq!(b.checked_rmove(3), None);
        assert_eq!(b.ingest(3), Err(Error::NotFinite));
        assert_eq!(b.ingest(1), Ok(()));

        let mut b = Block::new(1i64, 0, 0, 1);
        assert_eq!(b.gmove(i64::MAX, 2), Ok((2, i64::MAX)));
        b.update(2, i64::MAX);
        assert_eq!(b.gmove(2, 2), Err(Error::NotFinite));

        let b = Block::new(i64::MAX, i64::MAX, 1, 1);
        assert_eq!(b.bracket(), Err(Error::NotFinite));
    }

    #[test]
    fn dual_block_test() {
        // x + y, x = 1 + 1/x', y = 3 + 1/y'
        let mut b = DualBlock::new(0i64, 1, 1, 0, 0, 0, 0, 1);
        assert_eq!(b.bracket(), Ok(Err((true, true))));
        b.ingest_right(1).unwrap();
        b.ingest_down(3).unwrap();
        b.exhaust_right();
        b.exhaust_down();
        assert_eq!(b.bracket(), Ok(Ok(4)));
        b.egest(&4).unwrap();
        assert!(b.is_infinite());

        let zero = DualBlock::new(0i64, 0, 0, 0, 0, 0, 0, 0);
        assert!(zero.is_degenerate());
    }

    #[test]
    fn dual_block_overflow_test() {
        let big = i64::MAX / 2;
        let mut b = DualBlock::new(big, 0, 0, 0, 0, 0, 0, 1);
        assert_eq!(b.rmove_right(3), Err(Error::NotFinite));
        assert_eq!(b.ingest_down(3), Err(Error::NotFinite));
        assert_eq!(b.ingest_right(1), Ok(()));
    }

    #[test]
    fn normalize_test() {
        let mut b = Block::new(4i64, 2, 6, 8);
        b.normalize();
        assert_eq!(b.bracket(), Block::new(2i64, 1, 3, 4).bracket());
        assert_eq!(b.convergent(), (&2, &3));
    }
}

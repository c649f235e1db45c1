//! Exact conversions from finite precision values into continued fraction terms

use crate::error::Error;
use num_integer::Integer;
use num_rational::Ratio;
use num_traits::float::FloatCore;
use num_traits::{checked_pow, CheckedMul, FromPrimitive};

/// An exact value of one of the accepted finite input kinds
#[derive(Debug, Clone)]
pub enum Exact<T> {
    Integer(T),
    Ratio(Ratio<T>),
    /// `digits * 10^-scale`
    Decimal { digits: T, scale: u32 },
    /// Decomposed into mantissa and exponent without rounding
    Float(f64),
}

impl<T: Integer + Clone> PartialEq for Exact<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Exact::Integer(a), Exact::Integer(b)) => a == b,
            (Exact::Ratio(a), Exact::Ratio(b)) => a == b,
            (
                Exact::Decimal { digits: a, scale: sa },
                Exact::Decimal { digits: b, scale: sb },
            ) => a == b && sa == sb,
            (Exact::Float(a), Exact::Float(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Integer + Clone + FromPrimitive + CheckedMul> Exact<T> {
    /// Convert to the rational number with exactly the same value
    pub fn to_ratio(self) -> Result<Ratio<T>, Error> {
        match self {
            Exact::Integer(t) => Ok(Ratio::from_integer(t)),
            Exact::Ratio(r) => Ok(r),
            Exact::Decimal { digits, scale } => {
                let ten = T::from_u8(10).ok_or(Error::NotFinite)?;
                let denom = checked_pow(ten, scale as usize).ok_or(Error::NotFinite)?;
                Ok(Ratio::new(digits, denom))
            }
            Exact::Float(f) => float_to_ratio(f),
        }
    }
}

fn float_to_ratio<T: Integer + Clone + FromPrimitive + CheckedMul>(f: f64) -> Result<Ratio<T>, Error> {
    if !f.is_finite() {
        return Err(Error::NotFinite);
    }

    let (mut mantissa, mut exponent, sign) = FloatCore::integer_decode(f);
    if mantissa == 0 {
        return Ok(Ratio::from_integer(T::zero()));
    }
    // keep the power of two as small as possible
    while mantissa & 1 == 0 && exponent < 0 {
        mantissa >>= 1;
        exponent += 1;
    }

    let two = T::from_u8(2).ok_or(Error::NotFinite)?;
    let power = checked_pow(two, exponent.unsigned_abs() as usize).ok_or(Error::NotFinite)?;
    let mut numer = T::from_u64(mantissa).ok_or(Error::NotFinite)?;
    if sign < 0 {
        numer = T::zero() - numer;
    }

    if exponent >= 0 {
        let numer = numer.checked_mul(&power).ok_or(Error::NotFinite)?;
        Ok(Ratio::from_integer(numer))
    } else {
        Ok(Ratio::new(numer, power))
    }
}

/// Terms of a rational number computed by the Euclidean algorithm,
/// always in canonical form
#[derive(Debug, Clone)]
pub struct EuclidTerms<T> {
    n: T,
    d: T,
}

impl<T: Integer + Clone> EuclidTerms<T> {
    pub fn new(r: Ratio<T>) -> Self {
        let (n, d) = r.into_raw();
        EuclidTerms { n, d }
    }
}

impl<T: Integer + Clone> Iterator for EuclidTerms<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.d.is_zero() {
            return None;
        }
        let (quo, rem) = self.n.div_mod_floor(&self.d);
        self.n = std::mem::replace(&mut self.d, rem);
        Some(quo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cont_frac::ContinuedFraction;

    fn terms(r: Ratio<i64>) -> Vec<i64> {
        EuclidTerms::new(r).collect()
    }

    #[test]
    fn euclid_test() {
        assert_eq!(terms(Ratio::from(3)), vec![3]);
        assert_eq!(terms(Ratio::from(0)), vec![0]);
        assert_eq!(terms(Ratio::new(22, 7)), vec![3, 7]);
        assert_eq!(terms(Ratio::new(7, 22)), vec![0, 3, 7]);
        assert_eq!(terms(Ratio::new(355, 113)), vec![3, 7, 16]);
        assert_eq!(terms(Ratio::new(-22, 7)), vec![-4, 1, 6]);
        assert_eq!(terms(Ratio::new(1, 8)), vec![0, 8]);
        assert_eq!(terms(Ratio::new(42, 10)), vec![4, 5]);
        assert_eq!(terms(Ratio::new(5, 8)), vec![0, 1, 1, 1, 2]);
        assert_eq!(terms(Ratio::new(11, 6)), vec![1, 1, 5]);
    }

    #[test]
    fn euclid_roundtrip_test() {
        for p in -30i64..30 {
            for q in 1i64..30 {
                let r = Ratio::new(p, q);
                let cf = ContinuedFraction::<i64>::from_ratio(r);
                assert_eq!(cf.approximation(usize::MAX), Ok(r), "{}/{}", p, q);

                let rebuilt = ContinuedFraction::<i64>::from_terms(terms(r)).unwrap();
                assert!(rebuilt.is_simplified());
                assert_eq!(rebuilt.to_rational(), Some(r));
            }
        }
    }

    #[test]
    fn exact_test() {
        assert_eq!(Exact::Integer(5i64).to_ratio(), Ok(Ratio::from(5)));
        assert_eq!(
            Exact::Decimal { digits: 314i64, scale: 2 }.to_ratio(),
            Ok(Ratio::new(157, 50))
        );
        assert_eq!(Exact::<i64>::Float(0.375).to_ratio(), Ok(Ratio::new(3, 8)));
        assert_eq!(Exact::<i64>::Float(-2.5).to_ratio(), Ok(Ratio::new(-5, 2)));
        assert_eq!(Exact::<i64>::Float(1024.0).to_ratio(), Ok(Ratio::from(1024)));
        assert_eq!(Exact::<i64>::Float(0.0).to_ratio(), Ok(Ratio::from(0)));
        assert_eq!(Exact::Ratio(Ratio::new(2i64, 4)), Exact::Ratio(Ratio::new(1, 2)));
        assert_ne!(Exact::Integer(1i64), Exact::Ratio(Ratio::from(1)));

        // 0.1 is not exactly one tenth in binary
        let tenth = Exact::<i64>::Float(0.1).to_ratio().unwrap();
        assert_eq!(*tenth.denom(), 1i64 << 55);
        assert_eq!(*tenth.numer(), 3602879701896397);
    }

    #[test]
    fn exact_error_test() {
        assert_eq!(Exact::<i64>::Float(f64::NAN).to_ratio(), Err(Error::NotFinite));
        assert_eq!(Exact::<i64>::Float(f64::INFINITY).to_ratio(), Err(Error::NotFinite));
        assert_eq!(Exact::<i64>::Float(1e300).to_ratio(), Err(Error::NotFinite));
        assert_eq!(
            Exact::Decimal { digits: 1i64, scale: 40 }.to_ratio(),
            Err(Error::NotFinite)
        );
    }
}

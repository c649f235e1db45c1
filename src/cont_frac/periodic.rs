use crate::error::Error;
use num_integer::Integer;
use std::fmt;
use std::rc::Rc;

/// A stored expansion `[a0; a1, ..., an, (p1, ..., pk)]` whose periodic part
/// repeats forever. An empty periodic part means the value is rational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion<T> {
    aperiodic: Vec<T>,
    periodic: Vec<T>,
}

impl<T: Integer> Expansion<T> {
    /// Every term after the first one must be positive, and there must be at least one term.
    /// Periodic terms repeat, so all of them must be positive.
    pub fn new(aperiodic: Vec<T>, periodic: Vec<T>) -> Result<Self, Error> {
        if aperiodic.is_empty() && periodic.is_empty() {
            return Err(Error::InvalidTerm);
        }
        let positive = aperiodic
            .iter()
            .skip(1)
            .chain(periodic.iter())
            .all(|t| *t > T::zero());
        if !positive {
            return Err(Error::InvalidTerm);
        }
        Ok(Expansion { aperiodic, periodic })
    }
}

impl<T> Expansion<T> {
    pub(crate) fn new_raw(aperiodic: Vec<T>, periodic: Vec<T>) -> Self {
        Expansion { aperiodic, periodic }
    }

    #[inline]
    pub fn aperiodic(&self) -> &[T] {
        &self.aperiodic
    }

    #[inline]
    pub fn periodic(&self) -> &[T] {
        &self.periodic
    }

    /// Length of the repeating block, zero for rational numbers
    #[inline]
    pub fn period(&self) -> usize {
        self.periodic.len()
    }

    #[inline]
    pub fn is_rational(&self) -> bool {
        self.periodic.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<T>) {
        (self.aperiodic, self.periodic)
    }
}

impl<T: Clone> Expansion<T> {
    /// Iterate over the terms, cycling through the periodic part
    pub fn terms(&self) -> PeriodicTerms<T> {
        PeriodicTerms {
            expansion: Rc::new(self.clone()),
            pos: 0,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Expansion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut aiter = self.aperiodic.iter();
        if let Some(first) = aiter.next() {
            write!(f, "{}", first)?;
            if self.aperiodic.len() > 1 || !self.periodic.is_empty() {
                write!(f, "; ")?;
            }
        }
        if let Some(v) = aiter.next() {
            write!(f, "{}", v)?;
            for v in aiter {
                write!(f, ", {}", v)?;
            }
            if !self.periodic.is_empty() {
                write!(f, ", ")?;
            }
        }

        let mut piter = self.periodic.iter();
        if let Some(v) = piter.next() {
            write!(f, "({}", v)?;
            for v in piter {
                write!(f, ", {}", v)?;
            }
            write!(f, ")")?;
        }
        write!(f, "]")
    }
}

/// Iterator of [Expansion::terms()] result
#[derive(Debug, Clone)]
pub struct PeriodicTerms<T> {
    expansion: Rc<Expansion<T>>,
    pos: usize,
}

impl<T: Clone> Iterator for PeriodicTerms<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let (aperiodic, periodic) = (&self.expansion.aperiodic, &self.expansion.periodic);
        let item = if self.pos < aperiodic.len() {
            aperiodic[self.pos].clone()
        } else if !periodic.is_empty() {
            periodic[(self.pos - aperiodic.len()) % periodic.len()].clone()
        } else {
            return None;
        };
        self.pos += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_test() {
        let fmt = |a: Vec<i32>, p: Vec<i32>| format!("{}", Expansion::new(a, p).unwrap());
        assert_eq!(fmt(vec![1], vec![]), "[1]");
        assert_eq!(fmt(vec![1, 2, 3], vec![]), "[1; 2, 3]");
        assert_eq!(fmt(vec![1], vec![2]), "[1; (2)]");
        assert_eq!(fmt(vec![1, 2, 3], vec![3, 2]), "[1; 2, 3, (3, 2)]");
        assert_eq!(fmt(vec![-2, 1], vec![1, 4]), "[-2; 1, (1, 4)]");
        assert_eq!(fmt(vec![], vec![1]), "[(1)]");
    }

    #[test]
    fn terms_test() {
        let sqrt7 = Expansion::new(vec![2], vec![1, 1, 1, 4]).unwrap();
        assert_eq!(sqrt7.period(), 4);
        assert_eq!(
            sqrt7.terms().take(10).collect::<Vec<_>>(),
            vec![2, 1, 1, 1, 4, 1, 1, 1, 4, 1]
        );

        let ratio = Expansion::new(vec![3, 7], vec![]).unwrap();
        assert!(ratio.is_rational());
        assert_eq!(ratio.terms().collect::<Vec<_>>(), vec![3, 7]);
    }

    #[test]
    fn invalid_test() {
        assert_eq!(Expansion::<i32>::new(vec![], vec![]), Err(Error::InvalidTerm));
        assert_eq!(Expansion::new(vec![1, 0], vec![2]), Err(Error::InvalidTerm));
        assert_eq!(Expansion::new(vec![1], vec![2, -1]), Err(Error::InvalidTerm));
        // only the very first term may be negative or zero
        assert!(Expansion::new(vec![-3], vec![2]).is_ok());
        assert_eq!(Expansion::new(vec![], vec![0, 2]), Err(Error::InvalidTerm));
    }
}

//! Data structures and algorithms implementations related to
//! quadratic numbers (roots of quadratic equation).

mod surd;

pub use surd::QuadraticSurd;

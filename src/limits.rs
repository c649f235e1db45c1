/// Iteration budgets for lazily evaluated operations.
///
/// None of the operations self-limit precision. These budgets only bound
/// how long a single term decision or a comparison may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Input terms the engine may consume while deciding one output term
    pub max_ingest: usize,
    /// Terms inspected before a comparison is left undecided
    pub compare_terms: usize,
}

impl Limits {
    pub const DEFAULT_MAX_INGEST: usize = 1000;
    pub const DEFAULT_COMPARE_TERMS: usize = 64;

    pub const fn new() -> Self {
        Limits {
            max_ingest: Self::DEFAULT_MAX_INGEST,
            compare_terms: Self::DEFAULT_COMPARE_TERMS,
        }
    }

    pub const fn with_max_ingest(self, max_ingest: usize) -> Self {
        Limits { max_ingest, ..self }
    }

    pub const fn with_compare_terms(self, compare_terms: usize) -> Self {
        Limits { compare_terms, ..self }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}

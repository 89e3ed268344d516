//! The set of Wasm proposals a validator instance accepts.

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// Feature flags fixed at validator construction. The validator gates
/// directly on `mutable_globals`, `multi_value`, `reference_types` and
/// `threads`; the remaining flags are honored by the parser driving it,
/// which rejects the corresponding opcodes and section shapes before they
/// reach the validator.
pub struct Features {
    pub mutable_globals: bool,
    pub multi_value:     bool,
    pub reference_types: bool,
    pub threads:         bool,
    pub bulk_memory:     bool,
    pub simd:            bool,
    pub exceptions:      bool,
    pub tail_call:       bool,
}

impl Default for Features {
    /// The MVP baseline. Mutable globals were merged into the core
    /// specification, so they are the one proposal enabled by default.
    fn default() -> Self {
        Self {
            mutable_globals: true,
            multi_value:     false,
            reference_types: false,
            threads:         false,
            bulk_memory:     false,
            simd:            false,
            exceptions:      false,
            tail_call:       false,
        }
    }
}

impl Features {
    /// Every supported proposal enabled.
    pub fn all() -> Self {
        Self {
            mutable_globals: true,
            multi_value:     true,
            reference_types: true,
            threads:         true,
            bulk_memory:     true,
            simd:            true,
            exceptions:      true,
            tail_call:       true,
        }
    }
}

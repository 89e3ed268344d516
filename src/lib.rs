//! This library implements module-level validation of [Wasm](https://webassembly.org/)
//! modules. It is driven by an external parser that feeds it one event per
//! declaration, initializer expression, and instruction, in module order,
//! and it accumulates located diagnostics instead of stopping at the first
//! problem, so that a single pass reports as much as possible.
//!
//! The main entry point is the [`validate::Validator`], which owns a
//! registry per index space, the [`typechecker::TypeChecker`] used for
//! function bodies, and the [`diagnostics::Diagnostics`] sink. Which
//! post-MVP proposals are accepted is configured with
//! [`features::Features`] at construction.

pub mod constants;
pub mod diagnostics;
pub mod features;
pub mod opcode;
pub mod typechecker;
pub mod types;
pub mod validate;

#[cfg(test)]
mod validate_test;

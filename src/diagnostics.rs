//! Located diagnostics and the append-only sink they accumulate in.
//!
//! The validator never aborts on an invalid construct. Every failed check
//! becomes one [`Diagnostic`] appended to a [`Diagnostics`] sink, and
//! validation proceeds so that a single pass surfaces as many problems as
//! possible. The sink preserves detection order.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// A position in the validated module. Line and column refer to a text-format
/// source, the offset to a position in a binary module; a driver fills in
/// whichever it has. The enclosing tool knows which file the module came
/// from, so no file name is carried here.
pub struct Location {
    pub line:   Option<u32>,
    pub column: Option<u32>,
    pub offset: Option<u64>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column, self.offset) {
            (Some(line), Some(column), _) => write!(f, "{}:{}", line, column),
            (Some(line), None, _) => write!(f, "{}", line),
            (None, _, Some(offset)) => write!(f, "{:#08x}", offset),
            _ => write!(f, "?"),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// Severity of a diagnostic. Validation only ever produces errors; the level
/// is recorded so the sink's records match what rendering tools expect.
pub enum ErrorLevel {
    Error,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// Classification of what went wrong. Kinds group diagnostics for tooling;
/// the message carries the detail.
pub enum ErrorKind {
    /// An index does not resolve in its index space.
    OutOfRange,
    /// A value type differs from the expected one.
    TypeMismatch,
    /// A construct is valid only under a feature that is disabled.
    FeatureDisabled,
    /// A name or declaration that must be unique is repeated.
    DuplicateDeclaration,
    /// An initializer expression uses a disallowed instruction or referent.
    InvalidInitializerExpression,
    /// Table or memory limits exceed the absolute maximum or are inverted.
    InvalidLimits,
    /// A memory access alignment is not a power of two or exceeds what the
    /// opcode permits.
    InvalidAlignment,
    /// A construct requires a declaration that is absent, e.g. an
    /// instruction that needs a memory, or a `ref.func` of a function no
    /// element segment declares.
    MissingDeclaration,
    /// A structural rule is violated, e.g. assigning an immutable global or
    /// a non-nullary start function.
    StructuralViolation,
}

#[derive(Debug, Clone, Eq, PartialEq)]
/// A single located error record.
pub struct Diagnostic {
    pub level:    ErrorLevel,
    pub kind:     ErrorKind,
    pub location: Location,
    pub message:  String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: error: {}", self.location, self.message)
    }
}

#[derive(Debug, Default)]
/// The append-only sink diagnostics accumulate in. The default instance is
/// the empty sink.
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) { self.errors.push(diagnostic) }

    pub fn len(&self) -> usize { self.errors.len() }

    pub fn is_empty(&self) -> bool { self.errors.is_empty() }

    pub fn as_slice(&self) -> &[Diagnostic] { &self.errors }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> { self.errors.iter() }

    pub fn into_vec(self) -> Vec<Diagnostic> { self.errors }
}

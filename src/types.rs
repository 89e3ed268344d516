//! Definitions of the types the validator tracks for a Wasm module, as well
//! as supporting datatypes.
//! Based on the [W3C Wasm specification](https://webassembly.github.io/spec/core/valid/index.html)
//! together with the post-MVP proposals the validator can be configured to
//! accept (reference types, threads, bulk memory, SIMD, exceptions).
//!
//! None of these types carry module data itself. They are the shapes the
//! validator's registries record while an external parser feeds it
//! declaration and instruction events.

use derive_more::Display;

/// Indices into the index spaces of a module.
pub type TypeIndex = u32;
pub type FuncIndex = u32;
pub type TableIndex = u32;
pub type MemIndex = u32;
pub type GlobalIndex = u32;
pub type EventIndex = u32;
pub type LocalIndex = u32;
pub type ElemSegmentIndex = u32;
pub type DataSegmentIndex = u32;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
/// A Wasm value type, extended with the tags validation itself needs.
///
/// `Void` denotes the absence of a value, for example the result of an empty
/// block signature. `Any` is the polymorphic wildcard: it is substituted when
/// an index lookup fails so that later checks do not cascade, and it appears
/// on the operand stack in unreachable code. `Index` only ever occurs as a
/// block signature referring to an entry of the type section.
pub enum ValueType {
    #[display(fmt = "i32")]
    I32,
    #[display(fmt = "i64")]
    I64,
    #[display(fmt = "f32")]
    F32,
    #[display(fmt = "f64")]
    F64,
    #[display(fmt = "v128")]
    V128,
    #[display(fmt = "funcref")]
    Funcref,
    #[display(fmt = "externref")]
    Externref,
    #[display(fmt = "nullref")]
    Nullref,
    #[display(fmt = "anyref")]
    Anyref,
    #[display(fmt = "exnref")]
    Exnref,
    #[display(fmt = "void")]
    Void,
    #[display(fmt = "any")]
    Any,
    #[display(fmt = "type[{}]", _0)]
    Index(u32),
}

impl ValueType {
    /// Whether the type is one of the reference types.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            ValueType::Funcref
                | ValueType::Externref
                | ValueType::Nullref
                | ValueType::Anyref
                | ValueType::Exnref
        )
    }

    /// Whether the type is a block signature referring to the type section.
    pub fn is_index(self) -> bool { matches!(self, ValueType::Index(_)) }

    /// The referenced type-section index, if the type is an index variant.
    pub fn type_index(self) -> Option<u32> {
        match self {
            ValueType::Index(idx) => Some(idx),
            _ => None,
        }
    }

    /// The result types of an inline (non-index) block signature. `Void`
    /// produces no results, every other tag produces itself.
    pub fn inline_results(self) -> Vec<ValueType> {
        match self {
            ValueType::Void => Vec::new(),
            ty => vec![ty],
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
/// A function type. Multiple results are representable; whether they are
/// accepted is decided by the `multi_value` feature gate at the point the
/// type is referenced, not at the point it is declared.
pub struct FunctionType {
    pub params:  Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl FunctionType {
    /// A function type with no parameters and no results. Also used as the
    /// substitute shape when a function or type index is out of range.
    pub fn empty() -> Self {
        Self {
            params:  Vec::new(),
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// Size limits of a table or memory.
pub struct Limits {
    /// Initial size, in elements for tables and 64KiB pages for memories.
    pub initial: u64,
    /// Optional declared maximum size.
    pub max:     Option<u64>,
    /// Whether the table or memory is shared between threads.
    pub shared:  bool,
}

#[derive(Debug, Clone, Copy)]
/// The type of a table: an element type, which must be a reference type,
/// and its limits.
pub struct TableType {
    pub element: ValueType,
    pub limits:  Limits,
}

#[derive(Debug, Clone, Copy)]
/// The type of a linear memory.
pub struct MemoryType {
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy)]
/// The type of a global together with its mutability.
pub struct GlobalType {
    pub ty:      ValueType,
    pub mutable: bool,
}

#[derive(Debug, Clone)]
/// The type of an event (exception tag). Events carry parameters only; a
/// signature with results is rejected at declaration time.
pub struct EventType {
    pub params: Vec<ValueType>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
/// The kind of an exported or imported item.
pub enum ExternalKind {
    #[display(fmt = "func")]
    Func,
    #[display(fmt = "table")]
    Table,
    #[display(fmt = "memory")]
    Memory,
    #[display(fmt = "global")]
    Global,
    #[display(fmt = "event")]
    Event,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// The placement of an element or data segment. Only active segments carry
/// a table or memory reference and an offset expression.
pub enum SegmentKind {
    Active,
    Passive,
    Declared,
}

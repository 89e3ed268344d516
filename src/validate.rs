//! Event-driven validation of a Wasm module.
//!
//! The [`Validator`] is fed one event per declaration, initializer
//! expression and instruction by an external parser, in the order the
//! corresponding sections appear in the module. It keeps a registry per
//! index space, cross-checks declarations against them, and drives the
//! [type checker](crate::typechecker) through every instruction of every
//! function body.
//!
//! Validation never stops at the first problem. Each entry point appends a
//! diagnostic per failed check to the sink and reports whether the event as
//! a whole was valid; the caller is expected to keep feeding events so a
//! single pass over the module surfaces as many errors as possible. The
//! independent checks of one entry point are combined with `Result::and`,
//! which evaluates all of them and remembers whether any failed. Checks
//! that later checks of the same event depend on use `?` instead and cut
//! the event short.
//!
//! Obligations that can only be settled by a later section, such as a
//! `ref.func` in a global initializer needing a matching element-segment
//! declaration, are deferred and drained in [`Validator::end_module`].

use crate::{
    constants::{MAX_MEMORY_PAGES, MAX_TABLE_ELEMS},
    diagnostics::{Diagnostic, Diagnostics, ErrorKind, ErrorLevel, Location},
    features::Features,
    opcode::Opcode,
    typechecker::{TypeCheckResult, TypeChecker},
    types::{
        DataSegmentIndex, ElemSegmentIndex, EventIndex, EventType, ExternalKind, FuncIndex,
        FunctionType, GlobalIndex, GlobalType, Limits, LocalIndex, MemIndex, MemoryType,
        SegmentKind, TableIndex, TableType, TypeIndex, ValueType,
    },
};
use std::{collections::BTreeSet, rc::Rc};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// Marker for a failed event. The diagnostics themselves have already been
/// appended to the sink; the marker only carries the aggregate outcome.
pub struct Invalid;

/// Result of a single validation event.
pub type ValidateResult = Result<(), Invalid>;

/// The local variables at indices `start`, `start + 1`, .. `end` (not
/// including `end`), all of one type. Function parameters occupy the
/// leading width-1 ranges; `end` values are strictly increasing and the
/// last one equals the total local count.
struct LocalsRange {
    start: LocalIndex,
    end:   LocalIndex,
    ty:    ValueType,
}

/// The module validator. One instance validates one module; the feature set
/// is fixed at construction.
pub struct Validator {
    features:             Features,
    diagnostics:          Diagnostics,
    typechecker:          TypeChecker,
    /// Declared function types.
    types:                Vec<Rc<FunctionType>>,
    /// Types of imported functions followed by defined ones, resolved from
    /// their type index at declaration time.
    funcs:                Vec<Rc<FunctionType>>,
    tables:               Vec<TableType>,
    memories:             Vec<MemoryType>,
    globals:              Vec<GlobalType>,
    events:               Vec<EventType>,
    /// Globals declared before the first non-import global. A global
    /// initializer may only reference these.
    num_imported_globals: usize,
    /// Segments are validated in place, only their counts matter later.
    elem_segments:        u32,
    data_segments:        u32,
    export_names:         BTreeSet<String>,
    /// Functions that appeared in an element segment's element expressions.
    /// `ref.func` is only legal for these.
    declared_funcs:       BTreeSet<FuncIndex>,
    /// `ref.func` uses in global initializers, checked against
    /// `declared_funcs` at the end of the module because element segments
    /// come after globals.
    init_expr_funcs:      Vec<(Location, FuncIndex)>,
    /// Number of start-function declarations seen so far.
    starts:               u32,
    /// Locals of the function body currently being validated.
    locals:               Vec<LocalsRange>,
    /// Location of the most recent instruction; diagnostics coming out of
    /// the type checker are stamped with it.
    expr_loc:             Location,
}

impl Validator {
    pub fn new(features: Features) -> Self {
        Self {
            features,
            diagnostics: Diagnostics::default(),
            typechecker: TypeChecker::default(),
            types: Vec::new(),
            funcs: Vec::new(),
            tables: Vec::new(),
            memories: Vec::new(),
            globals: Vec::new(),
            events: Vec::new(),
            num_imported_globals: 0,
            elem_segments: 0,
            data_segments: 0,
            export_names: BTreeSet::new(),
            declared_funcs: BTreeSet::new(),
            init_expr_funcs: Vec::new(),
            starts: 0,
            locals: Vec::new(),
            expr_loc: Location::default(),
        }
    }

    pub fn features(&self) -> &Features { &self.features }

    /// The diagnostics accumulated so far, in detection order.
    pub fn errors(&self) -> &[Diagnostic] { self.diagnostics.as_slice() }

    pub fn has_errors(&self) -> bool { !self.diagnostics.is_empty() }

    pub fn into_errors(self) -> Vec<Diagnostic> { self.diagnostics.into_vec() }

    /// Append one diagnostic and report the event check as failed.
    fn error(&mut self, kind: ErrorKind, loc: Location, message: String) -> ValidateResult {
        self.diagnostics.push(Diagnostic {
            level: ErrorLevel::Error,
            kind,
            location: loc,
            message,
        });
        Err(Invalid)
    }

    /// Attach the current instruction location to a type-checker failure.
    fn typecheck(&mut self, result: TypeCheckResult<()>) -> ValidateResult {
        match result {
            Ok(()) => Ok(()),
            Err(error) => {
                let loc = self.expr_loc;
                self.error(ErrorKind::TypeMismatch, loc, error.to_string())
            }
        }
    }

    fn check_type(
        &mut self,
        loc: Location,
        actual: ValueType,
        expected: ValueType,
        desc: &str,
    ) -> ValidateResult {
        if TypeChecker::types_match(actual, expected) {
            Ok(())
        } else {
            self.error(
                ErrorKind::TypeMismatch,
                loc,
                format!("type mismatch at {}. got {}, expected {}", desc, actual, expected),
            )
        }
    }

    fn check_index(
        &mut self,
        loc: Location,
        index: u32,
        max: usize,
        desc: &str,
    ) -> ValidateResult {
        if (index as usize) < max {
            Ok(())
        } else {
            self.error(
                ErrorKind::OutOfRange,
                loc,
                format!(
                    "{} variable out of range: {} (max {})",
                    desc,
                    index,
                    (max as u32).wrapping_sub(1)
                ),
            )
        }
    }

    fn check_type_index(&mut self, loc: Location, index: TypeIndex) -> ValidateResult {
        let max = self.types.len();
        self.check_index(loc, index, max, "function type")
    }

    fn check_func_index(&mut self, loc: Location, index: FuncIndex) -> ValidateResult {
        let max = self.funcs.len();
        self.check_index(loc, index, max, "function")
    }

    fn check_table_index(&mut self, loc: Location, index: TableIndex) -> ValidateResult {
        let max = self.tables.len();
        self.check_index(loc, index, max, "table")
    }

    /// Table existence check with an instruction-tagged diagnostic.
    fn check_table_index_for(
        &mut self,
        loc: Location,
        index: TableIndex,
        opcode: Opcode,
    ) -> ValidateResult {
        if (index as usize) < self.tables.len() {
            Ok(())
        } else {
            self.error(
                ErrorKind::MissingDeclaration,
                loc,
                format!(
                    "{} requires table {} to be an imported or defined table.",
                    opcode.name(),
                    index
                ),
            )
        }
    }

    fn check_memory_index(&mut self, loc: Location, index: MemIndex) -> ValidateResult {
        let max = self.memories.len();
        self.check_index(loc, index, max, "memory")
    }

    /// Memory existence check with an instruction-tagged diagnostic.
    fn check_memory_index_for(
        &mut self,
        loc: Location,
        index: MemIndex,
        opcode: Opcode,
    ) -> ValidateResult {
        if (index as usize) < self.memories.len() {
            Ok(())
        } else {
            self.error(
                ErrorKind::MissingDeclaration,
                loc,
                format!("{} requires an imported or defined memory.", opcode.name()),
            )
        }
    }

    /// Atomic instructions additionally require the memory to be shared.
    fn check_shared_memory_index(
        &mut self,
        loc: Location,
        index: MemIndex,
        opcode: Opcode,
    ) -> ValidateResult {
        let max = self.memories.len();
        self.check_index(loc, index, max, "memory")?;
        let shared = self.memories.get(index as usize).map_or(false, |m| m.limits.shared);
        if shared {
            Ok(())
        } else {
            self.error(
                ErrorKind::StructuralViolation,
                loc,
                format!("{} requires memory to be shared.", opcode.name()),
            )
        }
    }

    /// Global index check that always produces a usable referent: when the
    /// index is out of range the referent is `Any` and mutable, so later
    /// checks of the same instruction do not cascade.
    fn check_global_index(
        &mut self,
        loc: Location,
        index: GlobalIndex,
    ) -> (ValidateResult, GlobalType) {
        let max = self.globals.len();
        let result = self.check_index(loc, index, max, "global");
        let referent = self.globals.get(index as usize).copied().unwrap_or(GlobalType {
            ty:      ValueType::Any,
            mutable: true,
        });
        (result, referent)
    }

    fn check_event_index(&mut self, loc: Location, index: EventIndex) -> ValidateResult {
        let max = self.events.len();
        self.check_index(loc, index, max, "event")
    }

    fn check_elem_segment_index(
        &mut self,
        loc: Location,
        index: ElemSegmentIndex,
    ) -> ValidateResult {
        let max = self.elem_segments as usize;
        self.check_index(loc, index, max, "elem_segment")
    }

    fn check_data_segment_index(
        &mut self,
        loc: Location,
        index: DataSegmentIndex,
    ) -> ValidateResult {
        let max = self.data_segments as usize;
        self.check_index(loc, index, max, "data_segment")
    }

    fn check_declared_func(&mut self, loc: Location, index: FuncIndex) -> ValidateResult {
        if self.declared_funcs.contains(&index) {
            Ok(())
        } else {
            self.error(
                ErrorKind::MissingDeclaration,
                loc,
                "function is not declared in any elem sections".to_string(),
            )
        }
    }

    fn check_limits(
        &mut self,
        loc: Location,
        limits: &Limits,
        absolute_max: u64,
        desc: &str,
    ) -> ValidateResult {
        let mut result = Ok(());
        if limits.initial > absolute_max {
            result = result.and(self.error(
                ErrorKind::InvalidLimits,
                loc,
                format!("initial {} ({}) must be <= ({})", desc, limits.initial, absolute_max),
            ));
        }
        if let Some(max) = limits.max {
            if max > absolute_max {
                result = result.and(self.error(
                    ErrorKind::InvalidLimits,
                    loc,
                    format!("max {} ({}) must be <= ({})", desc, max, absolute_max),
                ));
            }
            if max < limits.initial {
                result = result.and(self.error(
                    ErrorKind::InvalidLimits,
                    loc,
                    format!(
                        "max {} ({}) must be >= initial {} ({})",
                        desc, max, desc, limits.initial
                    ),
                ));
            }
        }
        result
    }

    /// The global an initializer expression currently applies to. Falls
    /// back to `Any` if the driver sends an initializer without a global.
    fn last_global(&self) -> GlobalType {
        self.globals.last().copied().unwrap_or(GlobalType {
            ty:      ValueType::Any,
            mutable: false,
        })
    }

    // Module declarations.

    pub fn on_type(
        &mut self,
        _loc: Location,
        params: Vec<ValueType>,
        results: Vec<ValueType>,
    ) -> ValidateResult {
        self.types.push(Rc::new(FunctionType {
            params,
            results,
        }));
        Ok(())
    }

    pub fn on_function(&mut self, loc: Location, sig_index: TypeIndex) -> ValidateResult {
        self.check_type_index(loc, sig_index)?;
        let ty = self.types[sig_index as usize].clone();
        let mut result = Ok(());
        if !self.features.multi_value && ty.results.len() > 1 {
            result = result.and(self.error(
                ErrorKind::FeatureDisabled,
                loc,
                "multiple result values not currently supported.".to_string(),
            ));
        }
        self.funcs.push(ty);
        result
    }

    pub fn on_table(
        &mut self,
        loc: Location,
        elem_type: ValueType,
        limits: &Limits,
    ) -> ValidateResult {
        let mut result = Ok(());
        if !self.tables.is_empty() && !self.features.reference_types {
            result = result.and(self.error(
                ErrorKind::DuplicateDeclaration,
                loc,
                "only one table allowed".to_string(),
            ));
        }
        result = result.and(self.check_limits(loc, limits, MAX_TABLE_ELEMS, "elems"));
        if limits.shared {
            result = result.and(self.error(
                ErrorKind::StructuralViolation,
                loc,
                "tables may not be shared".to_string(),
            ));
        }
        if elem_type != ValueType::Funcref && !self.features.reference_types {
            result = result.and(self.error(
                ErrorKind::FeatureDisabled,
                loc,
                "tables must have funcref type".to_string(),
            ));
        }
        if !elem_type.is_reference() {
            result = result.and(self.error(
                ErrorKind::TypeMismatch,
                loc,
                "tables must have reference types".to_string(),
            ));
        }
        self.tables.push(TableType {
            element: elem_type,
            limits:  *limits,
        });
        result
    }

    pub fn on_memory(&mut self, loc: Location, limits: &Limits) -> ValidateResult {
        let mut result = Ok(());
        if !self.memories.is_empty() {
            result = result.and(self.error(
                ErrorKind::DuplicateDeclaration,
                loc,
                "only one memory block allowed".to_string(),
            ));
        }
        result = result.and(self.check_limits(loc, limits, MAX_MEMORY_PAGES, "pages"));
        if limits.shared {
            if !self.features.threads {
                result = result.and(self.error(
                    ErrorKind::FeatureDisabled,
                    loc,
                    "memories may not be shared".to_string(),
                ));
            } else if limits.max.is_none() {
                result = result.and(self.error(
                    ErrorKind::InvalidLimits,
                    loc,
                    "shared memories must have max sizes".to_string(),
                ));
            }
        }
        self.memories.push(MemoryType {
            limits: *limits,
        });
        result
    }

    pub fn on_global_import(
        &mut self,
        loc: Location,
        ty: ValueType,
        mutable: bool,
    ) -> ValidateResult {
        let mut result = Ok(());
        if mutable && !self.features.mutable_globals {
            result = result.and(self.error(
                ErrorKind::FeatureDisabled,
                loc,
                "mutable globals cannot be imported".to_string(),
            ));
        }
        self.globals.push(GlobalType {
            ty,
            mutable,
        });
        self.num_imported_globals += 1;
        result
    }

    pub fn on_global(&mut self, _loc: Location, ty: ValueType, mutable: bool) -> ValidateResult {
        self.globals.push(GlobalType {
            ty,
            mutable,
        });
        Ok(())
    }

    pub fn on_global_init_expr_const(&mut self, loc: Location, ty: ValueType) -> ValidateResult {
        let expected = self.last_global().ty;
        self.check_type(loc, ty, expected, "global initializer expression")
    }

    pub fn on_global_init_expr_global_get(
        &mut self,
        loc: Location,
        global_index: GlobalIndex,
    ) -> ValidateResult {
        let (index_result, referent) = self.check_global_index(loc, global_index);
        index_result?;
        let mut result = Ok(());
        if global_index as usize >= self.num_imported_globals {
            result = result.and(self.error(
                ErrorKind::InvalidInitializerExpression,
                loc,
                "initializer expression can only reference an imported global".to_string(),
            ));
        }
        if referent.mutable {
            result = result.and(self.error(
                ErrorKind::InvalidInitializerExpression,
                loc,
                "initializer expression cannot reference a mutable global".to_string(),
            ));
        }
        let expected = self.last_global().ty;
        result.and(self.check_type(loc, referent.ty, expected, "global initializer expression"))
    }

    pub fn on_global_init_expr_ref_null(&mut self, loc: Location) -> ValidateResult {
        let expected = self.last_global().ty;
        self.check_type(loc, ValueType::Nullref, expected, "global initializer expression")
    }

    pub fn on_global_init_expr_ref_func(
        &mut self,
        loc: Location,
        func_index: FuncIndex,
    ) -> ValidateResult {
        self.check_func_index(loc, func_index)?;
        // Whether the function is declared in an element segment can only be
        // known once the element section has been seen.
        self.init_expr_funcs.push((loc, func_index));
        let expected = self.last_global().ty;
        self.check_type(loc, ValueType::Funcref, expected, "global initializer expression")
    }

    /// An empty initializer expression checks like a `Void` constant.
    pub fn on_global_init_expr_none(&mut self, loc: Location) -> ValidateResult {
        let expected = self.last_global().ty;
        self.check_type(loc, ValueType::Void, expected, "global initializer expression")
    }

    pub fn on_global_init_expr_other(&mut self, loc: Location) -> ValidateResult {
        self.error(
            ErrorKind::InvalidInitializerExpression,
            loc,
            "invalid global initializer expression, must be a constant expression; either \
             *.const or global.get."
                .to_string(),
        )
    }

    pub fn on_event(&mut self, loc: Location, sig_index: TypeIndex) -> ValidateResult {
        self.check_type_index(loc, sig_index)?;
        let ty = self.types[sig_index as usize].clone();
        let mut result = Ok(());
        if !ty.results.is_empty() {
            result = result.and(self.error(
                ErrorKind::StructuralViolation,
                loc,
                "Event signature must have 0 results.".to_string(),
            ));
        }
        self.events.push(EventType {
            params: ty.params.clone(),
        });
        result
    }

    pub fn on_export(
        &mut self,
        loc: Location,
        kind: ExternalKind,
        index: u32,
        name: &str,
    ) -> ValidateResult {
        let mut result = Ok(());
        if self.export_names.contains(name) {
            result = result.and(self.error(
                ErrorKind::DuplicateDeclaration,
                loc,
                format!("duplicate export \"{}\"", name),
            ));
        }
        self.export_names.insert(name.to_string());
        result = result.and(match kind {
            ExternalKind::Func => self.check_func_index(loc, index),
            ExternalKind::Table => self.check_table_index(loc, index),
            ExternalKind::Memory => self.check_memory_index(loc, index),
            ExternalKind::Global => self.check_global_index(loc, index).0,
            ExternalKind::Event => self.check_event_index(loc, index),
        });
        result
    }

    pub fn on_start(&mut self, loc: Location, func_index: FuncIndex) -> ValidateResult {
        let mut result = Ok(());
        if self.starts > 0 {
            result = result.and(self.error(
                ErrorKind::DuplicateDeclaration,
                loc,
                "only one start function allowed".to_string(),
            ));
        }
        self.starts += 1;
        result = result.and(self.check_func_index(loc, func_index));
        let ty = self
            .funcs
            .get(func_index as usize)
            .cloned()
            .unwrap_or_else(|| Rc::new(FunctionType::empty()));
        if !ty.params.is_empty() {
            result = result.and(self.error(
                ErrorKind::StructuralViolation,
                loc,
                "start function must be nullary".to_string(),
            ));
        }
        if !ty.results.is_empty() {
            result = result.and(self.error(
                ErrorKind::StructuralViolation,
                loc,
                "start function must not return anything".to_string(),
            ));
        }
        result
    }

    pub fn on_elem_segment(
        &mut self,
        loc: Location,
        table_index: TableIndex,
        kind: SegmentKind,
        _elem_type: ValueType,
    ) -> ValidateResult {
        let mut result = Ok(());
        if kind == SegmentKind::Active {
            result = result.and(self.check_table_index(loc, table_index));
        }
        self.elem_segments += 1;
        result
    }

    pub fn on_elem_segment_init_expr_const(
        &mut self,
        loc: Location,
        ty: ValueType,
    ) -> ValidateResult {
        self.check_type(loc, ty, ValueType::I32, "elem segment offset")
    }

    pub fn on_elem_segment_init_expr_global_get(
        &mut self,
        loc: Location,
        global_index: GlobalIndex,
    ) -> ValidateResult {
        let (index_result, referent) = self.check_global_index(loc, global_index);
        index_result?;
        let mut result = Ok(());
        if referent.mutable {
            result = result.and(self.error(
                ErrorKind::InvalidInitializerExpression,
                loc,
                "initializer expression cannot reference a mutable global".to_string(),
            ));
        }
        result.and(self.check_type(loc, referent.ty, ValueType::I32, "elem segment offset"))
    }

    pub fn on_elem_segment_init_expr_other(&mut self, loc: Location) -> ValidateResult {
        self.error(
            ErrorKind::InvalidInitializerExpression,
            loc,
            "invalid elem segment offset, must be a constant expression; either i32.const or \
             global.get."
                .to_string(),
        )
    }

    pub fn on_elem_segment_elem_expr_ref_null(&mut self, _loc: Location) -> ValidateResult {
        Ok(())
    }

    pub fn on_elem_segment_elem_expr_ref_func(
        &mut self,
        loc: Location,
        func_index: FuncIndex,
    ) -> ValidateResult {
        self.check_func_index(loc, func_index)?;
        self.declared_funcs.insert(func_index);
        Ok(())
    }

    pub fn on_elem_segment_elem_expr_other(&mut self, loc: Location) -> ValidateResult {
        self.error(
            ErrorKind::InvalidInitializerExpression,
            loc,
            "invalid elem expression expression; must be either ref.null or ref.func.".to_string(),
        )
    }

    pub fn on_data_count(&mut self, count: u32) { self.data_segments = count }

    pub fn on_data_segment(
        &mut self,
        loc: Location,
        memory_index: MemIndex,
        kind: SegmentKind,
    ) -> ValidateResult {
        let mut result = Ok(());
        if kind == SegmentKind::Active {
            result = result.and(self.check_memory_index(loc, memory_index));
        }
        result
    }

    pub fn on_data_segment_init_expr_const(
        &mut self,
        loc: Location,
        ty: ValueType,
    ) -> ValidateResult {
        self.check_type(loc, ty, ValueType::I32, "data segment offset")
    }

    pub fn on_data_segment_init_expr_global_get(
        &mut self,
        loc: Location,
        global_index: GlobalIndex,
    ) -> ValidateResult {
        let (index_result, referent) = self.check_global_index(loc, global_index);
        index_result?;
        let mut result = Ok(());
        if referent.mutable {
            result = result.and(self.error(
                ErrorKind::InvalidInitializerExpression,
                loc,
                "initializer expression cannot reference a mutable global".to_string(),
            ));
        }
        result.and(self.check_type(loc, referent.ty, ValueType::I32, "data segment offset"))
    }

    pub fn on_data_segment_init_expr_other(&mut self, loc: Location) -> ValidateResult {
        self.error(
            ErrorKind::InvalidInitializerExpression,
            loc,
            "invalid data segment offset, must be a constant expression; either i32.const or \
             global.get."
                .to_string(),
        )
    }

    /// Drain the deferred cross-section obligations. Global initializers
    /// may use `ref.func` only for functions some element segment declares,
    /// and the element section comes after the global section.
    pub fn end_module(&mut self) -> ValidateResult {
        let deferred = self.init_expr_funcs.clone();
        for (loc, func_index) in deferred {
            self.check_declared_func(loc, func_index)?;
        }
        Ok(())
    }

    // Function bodies.

    pub fn begin_function_body(&mut self, loc: Location, func_index: FuncIndex) -> ValidateResult {
        self.expr_loc = loc;
        self.locals.clear();
        match self.funcs.get(func_index as usize).cloned() {
            Some(ty) => {
                let mut end = 0;
                for &param in ty.params.iter() {
                    self.locals.push(LocalsRange {
                        start: end,
                        end:   end + 1,
                        ty:    param,
                    });
                    end += 1;
                }
                self.typechecker.begin_function(&ty.results);
            }
            None => {
                // The signature is not resolvable; the out-of-range index
                // has already been reported. Check the body against an
                // empty signature.
                self.typechecker.begin_function(&[]);
            }
        }
        Ok(())
    }

    /// Declare `count` locals of one type. The cumulative count is capped at
    /// `u32::MAX`; the diagnostic quotes the conservative `0x10000000` bound
    /// the message has always carried.
    pub fn on_local_decl(&mut self, loc: Location, count: u32, ty: ValueType) -> ValidateResult {
        let local_count = self.local_count();
        if count > u32::MAX - local_count {
            return self.error(
                ErrorKind::OutOfRange,
                loc,
                "local count must be < 0x10000000".to_string(),
            );
        }
        self.locals.push(LocalsRange {
            start: local_count,
            end:   local_count + count,
            ty,
        });
        Ok(())
    }

    pub fn end_function_body(&mut self, _loc: Location) -> ValidateResult {
        // TODO: stamp diagnostics produced by the final check with the end's
        // own location instead of the previous instruction's.
        let tc = self.typechecker.end_function();
        self.typecheck(tc)
    }

    fn local_count(&self) -> u32 { self.locals.last().map_or(0, |range| range.end) }

    /// Resolve a local index to its type. Out-of-range indices report an
    /// error and resolve to `Any`.
    fn check_local_index(
        &mut self,
        loc: Location,
        index: LocalIndex,
    ) -> (ValidateResult, ValueType) {
        let search = self.locals.binary_search_by(|range| {
            if range.end <= index {
                std::cmp::Ordering::Less
            } else if index < range.start {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });
        match search {
            Ok(pos) => (Ok(()), self.locals[pos].ty),
            Err(_) => {
                let max = self.local_count();
                let result = self.error(
                    ErrorKind::OutOfRange,
                    loc,
                    format!("local variable out of range (max {})", max),
                );
                (result, ValueType::Any)
            }
        }
    }

    fn check_align(&mut self, loc: Location, alignment: u32, natural: u32) -> ValidateResult {
        if !alignment.is_power_of_two() {
            return self.error(
                ErrorKind::InvalidAlignment,
                loc,
                format!("alignment ({}) must be a power of 2", alignment),
            );
        }
        if alignment > natural {
            return self.error(
                ErrorKind::InvalidAlignment,
                loc,
                format!("alignment must not be larger than natural alignment ({})", natural),
            );
        }
        Ok(())
    }

    fn check_atomic_align(
        &mut self,
        loc: Location,
        alignment: u32,
        natural: u32,
    ) -> ValidateResult {
        if !alignment.is_power_of_two() {
            return self.error(
                ErrorKind::InvalidAlignment,
                loc,
                format!("alignment ({}) must be a power of 2", alignment),
            );
        }
        if alignment != natural {
            return self.error(
                ErrorKind::InvalidAlignment,
                loc,
                format!("alignment must be equal to natural alignment ({})", natural),
            );
        }
        Ok(())
    }

    /// Resolve a block signature to its param and result types. A type
    /// index yields the referenced function type, gated on `multi_value`;
    /// an inline tag yields no params and at most one result.
    fn check_block_signature(
        &mut self,
        loc: Location,
        opcode: Opcode,
        sig: ValueType,
    ) -> (ValidateResult, Vec<ValueType>, Vec<ValueType>) {
        match sig.type_index() {
            Some(sig_index) => {
                if self.check_type_index(loc, sig_index).is_err() {
                    return (Err(Invalid), Vec::new(), Vec::new());
                }
                let ty = self.types[sig_index as usize].clone();
                let mut result = Ok(());
                if !ty.params.is_empty() && !self.features.multi_value {
                    result = result.and(self.error(
                        ErrorKind::FeatureDisabled,
                        loc,
                        format!("{} params not currently supported.", opcode.name()),
                    ));
                }
                if ty.results.len() > 1 && !self.features.multi_value {
                    result = result.and(self.error(
                        ErrorKind::FeatureDisabled,
                        loc,
                        format!("multiple {} results not currently supported.", opcode.name()),
                    ));
                }
                (result, ty.params.clone(), ty.results.clone())
            }
            None => (Ok(()), Vec::new(), sig.inline_results()),
        }
    }

    fn table_element(&self, index: TableIndex) -> ValueType {
        self.tables.get(index as usize).map_or(ValueType::Any, |table| table.element)
    }

    // Instructions.

    pub fn on_block(&mut self, loc: Location, sig: ValueType) -> ValidateResult {
        self.expr_loc = loc;
        let (result, params, results) = self.check_block_signature(loc, Opcode::Block, sig);
        let tc = self.typechecker.on_block(&params, &results);
        result.and(self.typecheck(tc))
    }

    pub fn on_loop(&mut self, loc: Location, sig: ValueType) -> ValidateResult {
        self.expr_loc = loc;
        let (result, params, results) = self.check_block_signature(loc, Opcode::Loop, sig);
        let tc = self.typechecker.on_loop(&params, &results);
        result.and(self.typecheck(tc))
    }

    pub fn on_if(&mut self, loc: Location, sig: ValueType) -> ValidateResult {
        self.expr_loc = loc;
        let (result, params, results) = self.check_block_signature(loc, Opcode::If, sig);
        let tc = self.typechecker.on_if(&params, &results);
        result.and(self.typecheck(tc))
    }

    pub fn on_else(&mut self, _loc: Location) -> ValidateResult {
        // Diagnostics for the else keep the previous instruction's location.
        let tc = self.typechecker.on_else();
        self.typecheck(tc)
    }

    pub fn on_end(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_end();
        self.typecheck(tc)
    }

    pub fn on_try(&mut self, loc: Location, sig: ValueType) -> ValidateResult {
        self.expr_loc = loc;
        let (result, params, results) = self.check_block_signature(loc, Opcode::Try, sig);
        let tc = self.typechecker.on_try(&params, &results);
        result.and(self.typecheck(tc))
    }

    pub fn on_catch(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_catch();
        self.typecheck(tc)
    }

    pub fn on_br(&mut self, loc: Location, depth: u32) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_br(depth);
        self.typecheck(tc)
    }

    pub fn on_br_if(&mut self, loc: Location, depth: u32) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_br_if(depth);
        self.typecheck(tc)
    }

    pub fn begin_br_table(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.begin_br_table();
        self.typecheck(tc)
    }

    pub fn on_br_table_target(&mut self, loc: Location, depth: u32) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_br_table_target(depth);
        self.typecheck(tc)
    }

    pub fn end_br_table(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.end_br_table();
        self.typecheck(tc)
    }

    pub fn on_br_on_exn(
        &mut self,
        loc: Location,
        depth: u32,
        event_index: EventIndex,
    ) -> ValidateResult {
        let result = self.check_event_index(loc, event_index);
        let params =
            self.events.get(event_index as usize).map(|e| e.params.clone()).unwrap_or_default();
        self.expr_loc = loc;
        let tc = self.typechecker.on_br_on_exn(depth, &params);
        result.and(self.typecheck(tc))
    }

    pub fn on_call(&mut self, loc: Location, func_index: FuncIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_func_index(loc, func_index);
        let ty = self
            .funcs
            .get(func_index as usize)
            .cloned()
            .unwrap_or_else(|| Rc::new(FunctionType::empty()));
        let tc = self.typechecker.on_call(&ty.params, &ty.results);
        result.and(self.typecheck(tc))
    }

    pub fn on_call_indirect(
        &mut self,
        loc: Location,
        sig_index: TypeIndex,
        table_index: TableIndex,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_type_index(loc, sig_index);
        result = result.and(self.check_table_index(loc, table_index));
        let ty = self
            .types
            .get(sig_index as usize)
            .cloned()
            .unwrap_or_else(|| Rc::new(FunctionType::empty()));
        let tc = self.typechecker.on_call_indirect(&ty.params, &ty.results);
        result.and(self.typecheck(tc))
    }

    pub fn on_return_call(&mut self, loc: Location, func_index: FuncIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_func_index(loc, func_index);
        let ty = self
            .funcs
            .get(func_index as usize)
            .cloned()
            .unwrap_or_else(|| Rc::new(FunctionType::empty()));
        let tc = self.typechecker.on_return_call(&ty.params, &ty.results);
        result.and(self.typecheck(tc))
    }

    pub fn on_return_call_indirect(
        &mut self,
        loc: Location,
        sig_index: TypeIndex,
        table_index: TableIndex,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_table_index_for(loc, table_index, Opcode::ReturnCallIndirect);
        let ty = self
            .types
            .get(sig_index as usize)
            .cloned()
            .unwrap_or_else(|| Rc::new(FunctionType::empty()));
        let tc = self.typechecker.on_return_call_indirect(&ty.params, &ty.results);
        result.and(self.typecheck(tc))
    }

    pub fn on_return(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_return();
        self.typecheck(tc)
    }

    pub fn on_drop(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_drop();
        self.typecheck(tc)
    }

    /// `result_type` is the annotation of a typed select; the untyped form
    /// passes `Any`.
    pub fn on_select(&mut self, loc: Location, result_type: ValueType) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_select(result_type);
        self.typecheck(tc)
    }

    pub fn on_local_get(&mut self, loc: Location, local_index: LocalIndex) -> ValidateResult {
        self.expr_loc = loc;
        let (result, ty) = self.check_local_index(loc, local_index);
        let tc = self.typechecker.on_local_get(ty);
        result.and(self.typecheck(tc))
    }

    pub fn on_local_set(&mut self, loc: Location, local_index: LocalIndex) -> ValidateResult {
        self.expr_loc = loc;
        let (result, ty) = self.check_local_index(loc, local_index);
        let tc = self.typechecker.on_local_set(ty);
        result.and(self.typecheck(tc))
    }

    pub fn on_local_tee(&mut self, loc: Location, local_index: LocalIndex) -> ValidateResult {
        self.expr_loc = loc;
        let (result, ty) = self.check_local_index(loc, local_index);
        let tc = self.typechecker.on_local_tee(ty);
        result.and(self.typecheck(tc))
    }

    pub fn on_global_get(&mut self, loc: Location, global_index: GlobalIndex) -> ValidateResult {
        self.expr_loc = loc;
        let (result, referent) = self.check_global_index(loc, global_index);
        let tc = self.typechecker.on_global_get(referent.ty);
        result.and(self.typecheck(tc))
    }

    pub fn on_global_set(&mut self, loc: Location, global_index: GlobalIndex) -> ValidateResult {
        let (mut result, referent) = self.check_global_index(loc, global_index);
        if !referent.mutable {
            result = result.and(self.error(
                ErrorKind::StructuralViolation,
                loc,
                format!("can't global.set on immutable global at index {}.", global_index),
            ));
        }
        self.expr_loc = loc;
        let tc = self.typechecker.on_global_set(referent.ty);
        result.and(self.typecheck(tc))
    }

    pub fn on_const(&mut self, loc: Location, ty: ValueType) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_const(ty);
        self.typecheck(tc)
    }

    pub fn on_unary(&mut self, loc: Location, opcode: Opcode) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_unary(opcode);
        self.typecheck(tc)
    }

    pub fn on_binary(&mut self, loc: Location, opcode: Opcode) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_binary(opcode);
        self.typecheck(tc)
    }

    pub fn on_compare(&mut self, loc: Location, opcode: Opcode) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_compare(opcode);
        self.typecheck(tc)
    }

    pub fn on_convert(&mut self, loc: Location, opcode: Opcode) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_convert(opcode);
        self.typecheck(tc)
    }

    pub fn on_ternary(&mut self, loc: Location, opcode: Opcode) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_ternary(opcode);
        self.typecheck(tc)
    }

    pub fn on_simd_lane_op(
        &mut self,
        loc: Location,
        opcode: Opcode,
        lane: u64,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_simd_lane_op(opcode, lane);
        self.typecheck(tc)
    }

    pub fn on_simd_shuffle_op(
        &mut self,
        loc: Location,
        opcode: Opcode,
        lanes: [u8; 16],
    ) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_simd_shuffle_op(opcode, lanes);
        self.typecheck(tc)
    }

    pub fn on_load(&mut self, loc: Location, opcode: Opcode, alignment: u32) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_memory_index(loc, 0);
        result = result.and(self.check_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_load(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_load_splat(
        &mut self,
        loc: Location,
        opcode: Opcode,
        alignment: u32,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_memory_index(loc, 0);
        result = result.and(self.check_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_load(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_store(&mut self, loc: Location, opcode: Opcode, alignment: u32) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_memory_index(loc, 0);
        result = result.and(self.check_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_store(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_atomic_load(
        &mut self,
        loc: Location,
        opcode: Opcode,
        alignment: u32,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_shared_memory_index(loc, 0, opcode);
        result = result.and(self.check_atomic_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_atomic_load(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_atomic_store(
        &mut self,
        loc: Location,
        opcode: Opcode,
        alignment: u32,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_shared_memory_index(loc, 0, opcode);
        result = result.and(self.check_atomic_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_atomic_store(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_atomic_rmw(
        &mut self,
        loc: Location,
        opcode: Opcode,
        alignment: u32,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_shared_memory_index(loc, 0, opcode);
        result = result.and(self.check_atomic_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_atomic_rmw(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_atomic_rmw_cmpxchg(
        &mut self,
        loc: Location,
        opcode: Opcode,
        alignment: u32,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_shared_memory_index(loc, 0, opcode);
        result = result.and(self.check_atomic_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_atomic_rmw_cmpxchg(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_atomic_wait(
        &mut self,
        loc: Location,
        opcode: Opcode,
        alignment: u32,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_shared_memory_index(loc, 0, opcode);
        result = result.and(self.check_atomic_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_atomic_wait(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_atomic_notify(
        &mut self,
        loc: Location,
        opcode: Opcode,
        alignment: u32,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_shared_memory_index(loc, 0, opcode);
        result = result.and(self.check_atomic_align(loc, alignment, opcode.memory_size()));
        let tc = self.typechecker.on_atomic_notify(opcode);
        result.and(self.typecheck(tc))
    }

    pub fn on_memory_copy(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_memory_index_for(loc, 0, Opcode::MemoryCopy);
        let tc = self.typechecker.on_memory_copy();
        result.and(self.typecheck(tc))
    }

    pub fn on_memory_fill(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_memory_index_for(loc, 0, Opcode::MemoryFill);
        let tc = self.typechecker.on_memory_fill();
        result.and(self.typecheck(tc))
    }

    pub fn on_memory_init(
        &mut self,
        loc: Location,
        segment_index: DataSegmentIndex,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_memory_index_for(loc, 0, Opcode::MemoryInit);
        result = result.and(self.check_data_segment_index(loc, segment_index));
        let tc = self.typechecker.on_memory_init();
        result.and(self.typecheck(tc))
    }

    pub fn on_memory_grow(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_memory_index(loc, 0);
        let tc = self.typechecker.on_memory_grow();
        result.and(self.typecheck(tc))
    }

    pub fn on_memory_size(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_memory_index(loc, 0);
        let tc = self.typechecker.on_memory_size();
        result.and(self.typecheck(tc))
    }

    pub fn on_data_drop(
        &mut self,
        loc: Location,
        segment_index: DataSegmentIndex,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_memory_index_for(loc, 0, Opcode::DataDrop);
        result = result.and(self.check_data_segment_index(loc, segment_index));
        let tc = self.typechecker.on_data_drop();
        result.and(self.typecheck(tc))
    }

    pub fn on_table_init(
        &mut self,
        loc: Location,
        segment_index: ElemSegmentIndex,
        table_index: TableIndex,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_table_init();
        let result = self.typecheck(tc);
        self.check_table_index_for(loc, table_index, Opcode::TableInit)?;
        result.and(self.check_elem_segment_index(loc, segment_index))
    }

    pub fn on_table_copy(
        &mut self,
        loc: Location,
        dst_table_index: TableIndex,
        _src_table_index: TableIndex,
    ) -> ValidateResult {
        self.expr_loc = loc;
        // Only the destination table is checked.
        let result = self.check_table_index_for(loc, dst_table_index, Opcode::TableCopy);
        let tc = self.typechecker.on_table_copy();
        result.and(self.typecheck(tc))
    }

    pub fn on_elem_drop(
        &mut self,
        loc: Location,
        segment_index: ElemSegmentIndex,
    ) -> ValidateResult {
        self.expr_loc = loc;
        let mut result = self.check_table_index_for(loc, 0, Opcode::ElemDrop);
        result = result.and(self.check_elem_segment_index(loc, segment_index));
        let tc = self.typechecker.on_elem_drop();
        result.and(self.typecheck(tc))
    }

    pub fn on_table_fill(&mut self, loc: Location, table_index: TableIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_table_index(loc, table_index);
        let element = self.table_element(table_index);
        let tc = self.typechecker.on_table_fill(element);
        result.and(self.typecheck(tc))
    }

    pub fn on_table_get(&mut self, loc: Location, table_index: TableIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_table_index(loc, table_index);
        let element = self.table_element(table_index);
        let tc = self.typechecker.on_table_get(element);
        result.and(self.typecheck(tc))
    }

    pub fn on_table_set(&mut self, loc: Location, table_index: TableIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_table_index(loc, table_index);
        let element = self.table_element(table_index);
        let tc = self.typechecker.on_table_set(element);
        result.and(self.typecheck(tc))
    }

    pub fn on_table_grow(&mut self, loc: Location, table_index: TableIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_table_index(loc, table_index);
        let element = self.table_element(table_index);
        let tc = self.typechecker.on_table_grow(element);
        result.and(self.typecheck(tc))
    }

    pub fn on_table_size(&mut self, loc: Location, table_index: TableIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_table_index(loc, table_index);
        let tc = self.typechecker.on_table_size();
        result.and(self.typecheck(tc))
    }

    pub fn on_ref_func(&mut self, loc: Location, func_index: FuncIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_declared_func(loc, func_index);
        let tc = self.typechecker.on_ref_func(func_index);
        result.and(self.typecheck(tc))
    }

    pub fn on_ref_null(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_ref_null();
        self.typecheck(tc)
    }

    pub fn on_ref_is_null(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_ref_is_null();
        self.typecheck(tc)
    }

    pub fn on_throw(&mut self, loc: Location, event_index: EventIndex) -> ValidateResult {
        self.expr_loc = loc;
        let result = self.check_event_index(loc, event_index);
        let params =
            self.events.get(event_index as usize).map(|e| e.params.clone()).unwrap_or_default();
        let tc = self.typechecker.on_throw(&params);
        result.and(self.typecheck(tc))
    }

    pub fn on_rethrow(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_rethrow();
        self.typecheck(tc)
    }

    pub fn on_nop(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        Ok(())
    }

    pub fn on_unreachable(&mut self, loc: Location) -> ValidateResult {
        self.expr_loc = loc;
        let tc = self.typechecker.on_unreachable();
        self.typecheck(tc)
    }
}

//! A stack-polymorphic type checker for instruction sequences.
//!
//! The checker maintains the operand stack and the stack of control labels
//! for one function body at a time. It is driven by the validator, one
//! operation per instruction, and knows nothing about index spaces: the
//! validator resolves indices to types first and hands the checker resolved
//! shapes. Failures are reported as errors without a location; the validator
//! attaches the location of the instruction it is currently processing.
//!
//! Unreachable code is checked with the usual polymorphic-bottom rule: once
//! a label is marked unreachable, popping past the stack height recorded at
//! its entry produces the wildcard `Any`, which unifies with every expected
//! type without further errors.

use crate::{
    opcode::Opcode,
    types::{FuncIndex, ValueType},
};
use anyhow::{anyhow, bail, ensure};

/// Result type of a single type-checker operation.
pub type TypeCheckResult<A> = anyhow::Result<A>;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// What kind of construct opened a label. The kind decides the branch types
/// (a branch to a loop jumps to its start and takes the params) and which
/// follow-up operations are legal (`else` after `if`, `catch` after `try`).
pub(crate) enum LabelKind {
    Func,
    Block,
    Loop,
    If,
    Else,
    Try,
    Catch,
}

#[derive(Debug)]
/// A single control label. This records what must be on the stack when
/// branching to the label or leaving the construct normally, together with
/// the operand-stack height at its entry.
pub(crate) struct Label {
    pub(crate) kind:        LabelKind,
    pub(crate) params:      Vec<ValueType>,
    pub(crate) results:     Vec<ValueType>,
    /// Height of the operand stack when the label was pushed. Pops never
    /// reach below this height while the label is live.
    pub(crate) stack_limit: usize,
    /// Whether the remainder of this label's body is unreachable.
    pub(crate) unreachable: bool,
}

impl Label {
    /// The types a branch to this label must have on the stack.
    fn br_types(&self) -> &[ValueType] {
        if self.kind == LabelKind::Loop {
            &self.params
        } else {
            &self.results
        }
    }
}

#[derive(Debug, Default)]
/// The type checker state. The default instance is empty; `begin_function`
/// resets it for each function body.
pub struct TypeChecker {
    type_stack:   Vec<ValueType>,
    label_stack:  Vec<Label>,
    /// Branch signature the first `br_table` target fixed; every further
    /// target of the same table must agree with it.
    br_table_sig: Option<Vec<ValueType>>,
}

impl TypeChecker {
    /// Whether an actual type satisfies an expected one. The wildcard `Any`
    /// unifies in both directions, `Nullref` satisfies every reference type,
    /// and `Anyref` accepts any reference.
    pub(crate) fn types_match(actual: ValueType, expected: ValueType) -> bool {
        if actual == expected || actual == ValueType::Any || expected == ValueType::Any {
            return true;
        }
        match expected {
            ValueType::Anyref => actual.is_reference(),
            ValueType::Funcref | ValueType::Externref | ValueType::Exnref => {
                actual == ValueType::Nullref
            }
            _ => false,
        }
    }

    fn top_label(&self) -> TypeCheckResult<&Label> {
        self.label_stack.last().ok_or_else(|| anyhow!("control stack exhausted"))
    }

    fn top_kind(&self) -> TypeCheckResult<LabelKind> { Ok(self.top_label()?.kind) }

    /// The label `depth` levels below the innermost one.
    fn label(&self, depth: u32) -> TypeCheckResult<&Label> {
        let len = self.label_stack.len();
        ensure!((depth as usize) < len, "invalid depth: {} (max {})", depth, len as i64 - 1);
        Ok(&self.label_stack[len - depth as usize - 1])
    }

    fn push_label(&mut self, kind: LabelKind, params: Vec<ValueType>, results: Vec<ValueType>) {
        let stack_limit = self.type_stack.len();
        self.label_stack.push(Label {
            kind,
            params,
            results,
            stack_limit,
            unreachable: false,
        });
    }

    /// Mark the innermost label unreachable and discard the operands its
    /// body produced so far.
    fn set_unreachable(&mut self) -> TypeCheckResult<()> {
        match self.label_stack.last_mut() {
            None => bail!("control stack exhausted"),
            Some(label) => {
                label.unreachable = true;
                let limit = label.stack_limit;
                self.type_stack.truncate(limit);
                Ok(())
            }
        }
    }

    #[cfg_attr(not(feature = "fuzz-coverage"), inline(always))]
    fn push(&mut self, ty: ValueType) { self.type_stack.push(ty) }

    #[cfg_attr(not(feature = "fuzz-coverage"), inline(always))]
    fn push_seq(&mut self, tys: &[ValueType]) { self.type_stack.extend_from_slice(tys) }

    /// Pop one operand. In unreachable code, popping past the innermost
    /// label's entry height produces `Any` instead of failing.
    fn pop_any(&mut self, desc: &str) -> TypeCheckResult<ValueType> {
        let (limit, unreachable) = match self.label_stack.last() {
            None => bail!("control stack exhausted at {}", desc),
            Some(label) => (label.stack_limit, label.unreachable),
        };
        if self.type_stack.len() == limit {
            ensure!(unreachable, "operand stack exhausted at {}", desc);
            Ok(ValueType::Any)
        } else {
            self.type_stack
                .pop()
                .ok_or_else(|| anyhow!("operand stack exhausted at {}", desc))
        }
    }

    /// Pop one operand and check it against the expected type. Returns the
    /// more precise of the two.
    fn pop_expect(&mut self, expected: ValueType, desc: &str) -> TypeCheckResult<ValueType> {
        let actual = self.pop_any(desc)?;
        ensure!(
            Self::types_match(actual, expected),
            "type mismatch at {}. got {}, expected {}",
            desc,
            actual,
            expected
        );
        Ok(if actual == ValueType::Any {
            expected
        } else {
            actual
        })
    }

    /// Pop a sequence of operands given in declaration order, so the last
    /// element of `expected` is popped first.
    fn pop_expect_seq(&mut self, expected: &[ValueType], desc: &str) -> TypeCheckResult<()> {
        for &ty in expected.iter().rev() {
            self.pop_expect(ty, desc)?;
        }
        Ok(())
    }

    /// Look at the operand `depth` slots below the top without popping.
    fn peek(&self, depth: usize, desc: &str) -> TypeCheckResult<ValueType> {
        let label = match self.label_stack.last() {
            None => bail!("control stack exhausted at {}", desc),
            Some(label) => label,
        };
        let available = self.type_stack.len() - label.stack_limit;
        if depth < available {
            Ok(self.type_stack[self.type_stack.len() - depth - 1])
        } else if label.unreachable {
            Ok(ValueType::Any)
        } else {
            bail!("operand stack exhausted at {}", desc)
        }
    }

    /// Check a sequence against the stack top without consuming it.
    fn check_stack_against(&self, expected: &[ValueType], desc: &str) -> TypeCheckResult<()> {
        for (depth, &ty) in expected.iter().rev().enumerate() {
            let actual = self.peek(depth, desc)?;
            ensure!(
                Self::types_match(actual, ty),
                "type mismatch at {}. got {}, expected {}",
                desc,
                actual,
                ty
            );
        }
        Ok(())
    }

    /// Pop an opcode's operands and push its results, as recorded in the
    /// opcode table.
    fn check_opcode(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        let (params, results) = opcode.signature();
        self.pop_expect_seq(params, opcode.name())?;
        self.push_seq(results);
        Ok(())
    }

    /// Reset the checker for a new function body with the given results.
    pub fn begin_function(&mut self, results: &[ValueType]) {
        self.type_stack.clear();
        self.label_stack.clear();
        self.br_table_sig = None;
        self.push_label(LabelKind::Func, Vec::new(), results.to_vec());
    }

    /// End the function body: the function label must be the only one left
    /// and the stack must hold exactly the declared results.
    pub fn end_function(&mut self) -> TypeCheckResult<()> {
        ensure!(self.top_kind()? == LabelKind::Func, "unclosed block at end of function");
        self.on_end()
    }

    pub fn on_block(
        &mut self,
        params: &[ValueType],
        results: &[ValueType],
    ) -> TypeCheckResult<()> {
        self.pop_expect_seq(params, "block")?;
        self.push_label(LabelKind::Block, params.to_vec(), results.to_vec());
        self.push_seq(params);
        Ok(())
    }

    pub fn on_loop(&mut self, params: &[ValueType], results: &[ValueType]) -> TypeCheckResult<()> {
        self.pop_expect_seq(params, "loop")?;
        self.push_label(LabelKind::Loop, params.to_vec(), results.to_vec());
        self.push_seq(params);
        Ok(())
    }

    pub fn on_if(&mut self, params: &[ValueType], results: &[ValueType]) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "if condition")?;
        self.pop_expect_seq(params, "if")?;
        self.push_label(LabelKind::If, params.to_vec(), results.to_vec());
        self.push_seq(params);
        Ok(())
    }

    pub fn on_else(&mut self) -> TypeCheckResult<()> {
        let (kind, params, results, limit) = {
            let label = self.top_label()?;
            (label.kind, label.params.clone(), label.results.clone(), label.stack_limit)
        };
        ensure!(kind == LabelKind::If, "else must follow an if");
        self.pop_expect_seq(&results, "if true branch")?;
        ensure!(self.type_stack.len() == limit, "values remaining on stack at else");
        if let Some(label) = self.label_stack.last_mut() {
            label.kind = LabelKind::Else;
            label.unreachable = false;
        }
        self.push_seq(&params);
        Ok(())
    }

    pub fn on_end(&mut self) -> TypeCheckResult<()> {
        if self.top_kind()? == LabelKind::If {
            // An if with no else passes its parameters through unchanged, so
            // its result types must equal its param types. Running the
            // implicit else checks exactly that.
            self.on_else()?;
        }
        let (kind, results, limit) = {
            let label = self.top_label()?;
            (label.kind, label.results.clone(), label.stack_limit)
        };
        let desc = match kind {
            LabelKind::Func => "function result",
            LabelKind::Block => "block end",
            LabelKind::Loop => "loop end",
            LabelKind::If | LabelKind::Else => "if end",
            LabelKind::Try | LabelKind::Catch => "try end",
        };
        self.pop_expect_seq(&results, desc)?;
        ensure!(self.type_stack.len() == limit, "values remaining on stack at {}", desc);
        self.label_stack.pop();
        self.push_seq(&results);
        Ok(())
    }

    pub fn on_try(&mut self, params: &[ValueType], results: &[ValueType]) -> TypeCheckResult<()> {
        self.pop_expect_seq(params, "try")?;
        self.push_label(LabelKind::Try, params.to_vec(), results.to_vec());
        self.push_seq(params);
        Ok(())
    }

    pub fn on_catch(&mut self) -> TypeCheckResult<()> {
        let (kind, results, limit) = {
            let label = self.top_label()?;
            (label.kind, label.results.clone(), label.stack_limit)
        };
        ensure!(kind == LabelKind::Try, "catch must follow a try");
        self.pop_expect_seq(&results, "try true branch")?;
        ensure!(self.type_stack.len() == limit, "values remaining on stack at catch");
        if let Some(label) = self.label_stack.last_mut() {
            label.kind = LabelKind::Catch;
            label.unreachable = false;
        }
        self.push(ValueType::Exnref);
        Ok(())
    }

    pub fn on_br(&mut self, depth: u32) -> TypeCheckResult<()> {
        let tys = self.label(depth)?.br_types().to_vec();
        self.pop_expect_seq(&tys, "br")?;
        self.set_unreachable()
    }

    pub fn on_br_if(&mut self, depth: u32) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "br_if condition")?;
        let tys = self.label(depth)?.br_types().to_vec();
        // The branch types stay on the stack when the branch is not taken.
        self.pop_expect_seq(&tys, "br_if")?;
        self.push_seq(&tys);
        Ok(())
    }

    pub fn begin_br_table(&mut self) -> TypeCheckResult<()> {
        self.br_table_sig = None;
        self.pop_expect(ValueType::I32, "br_table key")?;
        Ok(())
    }

    pub fn on_br_table_target(&mut self, depth: u32) -> TypeCheckResult<()> {
        let tys = self.label(depth)?.br_types().to_vec();
        self.check_stack_against(&tys, "br_table")?;
        if let Some(expected) = &self.br_table_sig {
            ensure!(*expected == tys, "br_table labels have inconsistent types");
        } else {
            self.br_table_sig = Some(tys);
        }
        Ok(())
    }

    pub fn end_br_table(&mut self) -> TypeCheckResult<()> { self.set_unreachable() }

    pub fn on_br_on_exn(&mut self, depth: u32, params: &[ValueType]) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::Exnref, "br_on_exn")?;
        let tys = self.label(depth)?.br_types().to_vec();
        ensure!(
            tys.as_slice() == params,
            "br_on_exn branch types do not match the event signature"
        );
        self.push(ValueType::Exnref);
        Ok(())
    }

    pub fn on_call(&mut self, params: &[ValueType], results: &[ValueType]) -> TypeCheckResult<()> {
        self.pop_expect_seq(params, "call")?;
        self.push_seq(results);
        Ok(())
    }

    pub fn on_call_indirect(
        &mut self,
        params: &[ValueType],
        results: &[ValueType],
    ) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "call_indirect key")?;
        self.pop_expect_seq(params, "call_indirect")?;
        self.push_seq(results);
        Ok(())
    }

    pub fn on_return_call(
        &mut self,
        params: &[ValueType],
        results: &[ValueType],
    ) -> TypeCheckResult<()> {
        self.pop_expect_seq(params, "return_call")?;
        let func_results = match self.label_stack.first() {
            None => bail!("control stack exhausted at return_call"),
            Some(label) => label.results.clone(),
        };
        ensure!(
            func_results.as_slice() == results,
            "return_call results do not match the function results"
        );
        self.set_unreachable()
    }

    pub fn on_return_call_indirect(
        &mut self,
        params: &[ValueType],
        results: &[ValueType],
    ) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "return_call_indirect key")?;
        self.pop_expect_seq(params, "return_call_indirect")?;
        let func_results = match self.label_stack.first() {
            None => bail!("control stack exhausted at return_call_indirect"),
            Some(label) => label.results.clone(),
        };
        ensure!(
            func_results.as_slice() == results,
            "return_call_indirect results do not match the function results"
        );
        self.set_unreachable()
    }

    pub fn on_return(&mut self) -> TypeCheckResult<()> {
        let results = match self.label_stack.first() {
            None => bail!("control stack exhausted at return"),
            Some(label) => label.results.clone(),
        };
        self.pop_expect_seq(&results, "return")?;
        self.set_unreachable()
    }

    pub fn on_drop(&mut self) -> TypeCheckResult<()> {
        self.pop_any("drop")?;
        Ok(())
    }

    /// `expected` is the annotated type of a typed select, or `Any` for the
    /// untyped form, which is restricted to numeric operands.
    pub fn on_select(&mut self, expected: ValueType) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "select condition")?;
        let t1 = self.pop_any("select")?;
        let t2 = self.pop_any("select")?;
        ensure!(
            Self::types_match(t1, t2),
            "type mismatch at select. got {}, expected {}",
            t2,
            t1
        );
        if expected == ValueType::Any {
            ensure!(
                !t1.is_reference() && !t2.is_reference(),
                "select requires an explicit type for reference types"
            );
            self.push(if t1 == ValueType::Any { t2 } else { t1 });
        } else {
            ensure!(
                Self::types_match(t1, expected),
                "type mismatch at select. got {}, expected {}",
                t1,
                expected
            );
            self.push(expected);
        }
        Ok(())
    }

    pub fn on_local_get(&mut self, ty: ValueType) -> TypeCheckResult<()> {
        self.push(ty);
        Ok(())
    }

    pub fn on_local_set(&mut self, ty: ValueType) -> TypeCheckResult<()> {
        self.pop_expect(ty, "local.set")?;
        Ok(())
    }

    pub fn on_local_tee(&mut self, ty: ValueType) -> TypeCheckResult<()> {
        let actual = self.pop_expect(ty, "local.tee")?;
        self.push(actual);
        Ok(())
    }

    pub fn on_global_get(&mut self, ty: ValueType) -> TypeCheckResult<()> {
        self.push(ty);
        Ok(())
    }

    pub fn on_global_set(&mut self, ty: ValueType) -> TypeCheckResult<()> {
        self.pop_expect(ty, "global.set")?;
        Ok(())
    }

    pub fn on_const(&mut self, ty: ValueType) -> TypeCheckResult<()> {
        self.push(ty);
        Ok(())
    }

    pub fn on_unary(&mut self, opcode: Opcode) -> TypeCheckResult<()> { self.check_opcode(opcode) }

    pub fn on_binary(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_compare(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_convert(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_ternary(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_load(&mut self, opcode: Opcode) -> TypeCheckResult<()> { self.check_opcode(opcode) }

    pub fn on_store(&mut self, opcode: Opcode) -> TypeCheckResult<()> { self.check_opcode(opcode) }

    pub fn on_atomic_load(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_atomic_store(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_atomic_rmw(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_atomic_rmw_cmpxchg(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_atomic_wait(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_atomic_notify(&mut self, opcode: Opcode) -> TypeCheckResult<()> {
        self.check_opcode(opcode)
    }

    pub fn on_simd_lane_op(&mut self, opcode: Opcode, lane: u64) -> TypeCheckResult<()> {
        ensure!(
            lane < opcode.lane_count(),
            "lane index must be less than {} (got {})",
            opcode.lane_count(),
            lane
        );
        self.check_opcode(opcode)
    }

    pub fn on_simd_shuffle_op(&mut self, opcode: Opcode, lanes: [u8; 16]) -> TypeCheckResult<()> {
        for &lane in lanes.iter() {
            ensure!(lane < 32, "lane index must be less than 32 (got {})", lane);
        }
        self.check_opcode(opcode)
    }

    pub fn on_memory_copy(&mut self) -> TypeCheckResult<()> {
        self.pop_expect_seq(&[ValueType::I32, ValueType::I32, ValueType::I32], "memory.copy")
    }

    pub fn on_memory_fill(&mut self) -> TypeCheckResult<()> {
        self.pop_expect_seq(&[ValueType::I32, ValueType::I32, ValueType::I32], "memory.fill")
    }

    pub fn on_memory_init(&mut self) -> TypeCheckResult<()> {
        self.pop_expect_seq(&[ValueType::I32, ValueType::I32, ValueType::I32], "memory.init")
    }

    pub fn on_memory_grow(&mut self) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "memory.grow")?;
        self.push(ValueType::I32);
        Ok(())
    }

    pub fn on_memory_size(&mut self) -> TypeCheckResult<()> {
        self.push(ValueType::I32);
        Ok(())
    }

    pub fn on_data_drop(&mut self) -> TypeCheckResult<()> { Ok(()) }

    pub fn on_elem_drop(&mut self) -> TypeCheckResult<()> { Ok(()) }

    pub fn on_table_init(&mut self) -> TypeCheckResult<()> {
        self.pop_expect_seq(&[ValueType::I32, ValueType::I32, ValueType::I32], "table.init")
    }

    pub fn on_table_copy(&mut self) -> TypeCheckResult<()> {
        self.pop_expect_seq(&[ValueType::I32, ValueType::I32, ValueType::I32], "table.copy")
    }

    pub fn on_table_fill(&mut self, element: ValueType) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "table.fill")?;
        self.pop_expect(element, "table.fill")?;
        self.pop_expect(ValueType::I32, "table.fill")?;
        Ok(())
    }

    pub fn on_table_get(&mut self, element: ValueType) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "table.get")?;
        self.push(element);
        Ok(())
    }

    pub fn on_table_set(&mut self, element: ValueType) -> TypeCheckResult<()> {
        self.pop_expect(element, "table.set")?;
        self.pop_expect(ValueType::I32, "table.set")?;
        Ok(())
    }

    pub fn on_table_grow(&mut self, element: ValueType) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::I32, "table.grow")?;
        self.pop_expect(element, "table.grow")?;
        self.push(ValueType::I32);
        Ok(())
    }

    pub fn on_table_size(&mut self) -> TypeCheckResult<()> {
        self.push(ValueType::I32);
        Ok(())
    }

    pub fn on_ref_func(&mut self, _func: FuncIndex) -> TypeCheckResult<()> {
        self.push(ValueType::Funcref);
        Ok(())
    }

    pub fn on_ref_null(&mut self) -> TypeCheckResult<()> {
        self.push(ValueType::Nullref);
        Ok(())
    }

    pub fn on_ref_is_null(&mut self) -> TypeCheckResult<()> {
        let ty = self.pop_any("ref.is_null")?;
        ensure!(
            ty == ValueType::Any || ty.is_reference(),
            "type mismatch at ref.is_null. got {}, expected a reference type",
            ty
        );
        self.push(ValueType::I32);
        Ok(())
    }

    pub fn on_throw(&mut self, params: &[ValueType]) -> TypeCheckResult<()> {
        self.pop_expect_seq(params, "throw")?;
        self.set_unreachable()
    }

    pub fn on_rethrow(&mut self) -> TypeCheckResult<()> {
        self.pop_expect(ValueType::Exnref, "rethrow")?;
        self.set_unreachable()
    }

    pub fn on_unreachable(&mut self) -> TypeCheckResult<()> { self.set_unreachable() }
}

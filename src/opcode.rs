//! Opcode tags carried by instruction events.
//!
//! The validator does not interpret instructions, but several of its checks
//! need to know which instruction an event belongs to: diagnostics quote the
//! text-format mnemonic, memory accesses are checked against the natural
//! alignment of their access width, and the type checker consumes the
//! operand and result shape. All three are defined here, in one table, so
//! that adding an opcode cannot leave one of them behind.

use crate::types::ValueType::{self, F32, F64, I32, I64, V128};

macro_rules! opcodes {
    ($($variant:ident => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq)]
        /// An instruction tag. Only instructions the validator distinguishes
        /// are listed; interpretation of immediates stays with the parser.
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            /// The text-format mnemonic, quoted verbatim in diagnostics.
            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }
        }
    };
}

opcodes! {
    // Control and bulk tags, used only for diagnostics.
    Block => "block",
    Loop => "loop",
    If => "if",
    Try => "try",
    ReturnCallIndirect => "return_call_indirect",
    MemoryCopy => "memory.copy",
    MemoryFill => "memory.fill",
    MemoryInit => "memory.init",
    DataDrop => "data.drop",
    TableCopy => "table.copy",
    TableInit => "table.init",
    ElemDrop => "elem.drop",

    // Loads.
    I32Load => "i32.load",
    I64Load => "i64.load",
    F32Load => "f32.load",
    F64Load => "f64.load",
    I32Load8S => "i32.load8_s",
    I32Load8U => "i32.load8_u",
    I32Load16S => "i32.load16_s",
    I32Load16U => "i32.load16_u",
    I64Load8S => "i64.load8_s",
    I64Load8U => "i64.load8_u",
    I64Load16S => "i64.load16_s",
    I64Load16U => "i64.load16_u",
    I64Load32S => "i64.load32_s",
    I64Load32U => "i64.load32_u",
    V128Load => "v128.load",
    V8X16LoadSplat => "v8x16.load_splat",
    V16X8LoadSplat => "v16x8.load_splat",
    V32X4LoadSplat => "v32x4.load_splat",
    V64X2LoadSplat => "v64x2.load_splat",

    // Stores.
    I32Store => "i32.store",
    I64Store => "i64.store",
    F32Store => "f32.store",
    F64Store => "f64.store",
    I32Store8 => "i32.store8",
    I32Store16 => "i32.store16",
    I64Store8 => "i64.store8",
    I64Store16 => "i64.store16",
    I64Store32 => "i64.store32",
    V128Store => "v128.store",

    // Atomics.
    AtomicNotify => "atomic.notify",
    I32AtomicWait => "i32.atomic.wait",
    I64AtomicWait => "i64.atomic.wait",
    I32AtomicLoad => "i32.atomic.load",
    I64AtomicLoad => "i64.atomic.load",
    I32AtomicLoad8U => "i32.atomic.load8_u",
    I32AtomicLoad16U => "i32.atomic.load16_u",
    I64AtomicLoad8U => "i64.atomic.load8_u",
    I64AtomicLoad16U => "i64.atomic.load16_u",
    I64AtomicLoad32U => "i64.atomic.load32_u",
    I32AtomicStore => "i32.atomic.store",
    I64AtomicStore => "i64.atomic.store",
    I32AtomicStore8 => "i32.atomic.store8",
    I32AtomicStore16 => "i32.atomic.store16",
    I64AtomicStore8 => "i64.atomic.store8",
    I64AtomicStore16 => "i64.atomic.store16",
    I64AtomicStore32 => "i64.atomic.store32",
    I32AtomicRmwAdd => "i32.atomic.rmw.add",
    I64AtomicRmwAdd => "i64.atomic.rmw.add",
    I32AtomicRmw8AddU => "i32.atomic.rmw8.add_u",
    I32AtomicRmw16AddU => "i32.atomic.rmw16.add_u",
    I64AtomicRmw8AddU => "i64.atomic.rmw8.add_u",
    I64AtomicRmw16AddU => "i64.atomic.rmw16.add_u",
    I64AtomicRmw32AddU => "i64.atomic.rmw32.add_u",
    I32AtomicRmwSub => "i32.atomic.rmw.sub",
    I64AtomicRmwSub => "i64.atomic.rmw.sub",
    I32AtomicRmw8SubU => "i32.atomic.rmw8.sub_u",
    I32AtomicRmw16SubU => "i32.atomic.rmw16.sub_u",
    I64AtomicRmw8SubU => "i64.atomic.rmw8.sub_u",
    I64AtomicRmw16SubU => "i64.atomic.rmw16.sub_u",
    I64AtomicRmw32SubU => "i64.atomic.rmw32.sub_u",
    I32AtomicRmwAnd => "i32.atomic.rmw.and",
    I64AtomicRmwAnd => "i64.atomic.rmw.and",
    I32AtomicRmw8AndU => "i32.atomic.rmw8.and_u",
    I32AtomicRmw16AndU => "i32.atomic.rmw16.and_u",
    I64AtomicRmw8AndU => "i64.atomic.rmw8.and_u",
    I64AtomicRmw16AndU => "i64.atomic.rmw16.and_u",
    I64AtomicRmw32AndU => "i64.atomic.rmw32.and_u",
    I32AtomicRmwOr => "i32.atomic.rmw.or",
    I64AtomicRmwOr => "i64.atomic.rmw.or",
    I32AtomicRmw8OrU => "i32.atomic.rmw8.or_u",
    I32AtomicRmw16OrU => "i32.atomic.rmw16.or_u",
    I64AtomicRmw8OrU => "i64.atomic.rmw8.or_u",
    I64AtomicRmw16OrU => "i64.atomic.rmw16.or_u",
    I64AtomicRmw32OrU => "i64.atomic.rmw32.or_u",
    I32AtomicRmwXor => "i32.atomic.rmw.xor",
    I64AtomicRmwXor => "i64.atomic.rmw.xor",
    I32AtomicRmw8XorU => "i32.atomic.rmw8.xor_u",
    I32AtomicRmw16XorU => "i32.atomic.rmw16.xor_u",
    I64AtomicRmw8XorU => "i64.atomic.rmw8.xor_u",
    I64AtomicRmw16XorU => "i64.atomic.rmw16.xor_u",
    I64AtomicRmw32XorU => "i64.atomic.rmw32.xor_u",
    I32AtomicRmwXchg => "i32.atomic.rmw.xchg",
    I64AtomicRmwXchg => "i64.atomic.rmw.xchg",
    I32AtomicRmw8XchgU => "i32.atomic.rmw8.xchg_u",
    I32AtomicRmw16XchgU => "i32.atomic.rmw16.xchg_u",
    I64AtomicRmw8XchgU => "i64.atomic.rmw8.xchg_u",
    I64AtomicRmw16XchgU => "i64.atomic.rmw16.xchg_u",
    I64AtomicRmw32XchgU => "i64.atomic.rmw32.xchg_u",
    I32AtomicRmwCmpxchg => "i32.atomic.rmw.cmpxchg",
    I64AtomicRmwCmpxchg => "i64.atomic.rmw.cmpxchg",
    I32AtomicRmw8CmpxchgU => "i32.atomic.rmw8.cmpxchg_u",
    I32AtomicRmw16CmpxchgU => "i32.atomic.rmw16.cmpxchg_u",
    I64AtomicRmw8CmpxchgU => "i64.atomic.rmw8.cmpxchg_u",
    I64AtomicRmw16CmpxchgU => "i64.atomic.rmw16.cmpxchg_u",
    I64AtomicRmw32CmpxchgU => "i64.atomic.rmw32.cmpxchg_u",

    // Unary.
    I32Clz => "i32.clz",
    I32Ctz => "i32.ctz",
    I32Popcnt => "i32.popcnt",
    I64Clz => "i64.clz",
    I64Ctz => "i64.ctz",
    I64Popcnt => "i64.popcnt",
    I32Eqz => "i32.eqz",
    I64Eqz => "i64.eqz",
    I32Extend8S => "i32.extend8_s",
    I32Extend16S => "i32.extend16_s",
    I64Extend8S => "i64.extend8_s",
    I64Extend16S => "i64.extend16_s",
    I64Extend32S => "i64.extend32_s",
    F32Abs => "f32.abs",
    F32Neg => "f32.neg",
    F32Ceil => "f32.ceil",
    F32Floor => "f32.floor",
    F32Trunc => "f32.trunc",
    F32Nearest => "f32.nearest",
    F32Sqrt => "f32.sqrt",
    F64Abs => "f64.abs",
    F64Neg => "f64.neg",
    F64Ceil => "f64.ceil",
    F64Floor => "f64.floor",
    F64Trunc => "f64.trunc",
    F64Nearest => "f64.nearest",
    F64Sqrt => "f64.sqrt",

    // Binary.
    I32Add => "i32.add",
    I32Sub => "i32.sub",
    I32Mul => "i32.mul",
    I32DivS => "i32.div_s",
    I32DivU => "i32.div_u",
    I32RemS => "i32.rem_s",
    I32RemU => "i32.rem_u",
    I32And => "i32.and",
    I32Or => "i32.or",
    I32Xor => "i32.xor",
    I32Shl => "i32.shl",
    I32ShrS => "i32.shr_s",
    I32ShrU => "i32.shr_u",
    I32Rotl => "i32.rotl",
    I32Rotr => "i32.rotr",
    I64Add => "i64.add",
    I64Sub => "i64.sub",
    I64Mul => "i64.mul",
    I64DivS => "i64.div_s",
    I64DivU => "i64.div_u",
    I64RemS => "i64.rem_s",
    I64RemU => "i64.rem_u",
    I64And => "i64.and",
    I64Or => "i64.or",
    I64Xor => "i64.xor",
    I64Shl => "i64.shl",
    I64ShrS => "i64.shr_s",
    I64ShrU => "i64.shr_u",
    I64Rotl => "i64.rotl",
    I64Rotr => "i64.rotr",
    F32Add => "f32.add",
    F32Sub => "f32.sub",
    F32Mul => "f32.mul",
    F32Div => "f32.div",
    F32Min => "f32.min",
    F32Max => "f32.max",
    F32Copysign => "f32.copysign",
    F64Add => "f64.add",
    F64Sub => "f64.sub",
    F64Mul => "f64.mul",
    F64Div => "f64.div",
    F64Min => "f64.min",
    F64Max => "f64.max",
    F64Copysign => "f64.copysign",

    // Comparison.
    I32Eq => "i32.eq",
    I32Ne => "i32.ne",
    I32LtS => "i32.lt_s",
    I32LtU => "i32.lt_u",
    I32GtS => "i32.gt_s",
    I32GtU => "i32.gt_u",
    I32LeS => "i32.le_s",
    I32LeU => "i32.le_u",
    I32GeS => "i32.ge_s",
    I32GeU => "i32.ge_u",
    I64Eq => "i64.eq",
    I64Ne => "i64.ne",
    I64LtS => "i64.lt_s",
    I64LtU => "i64.lt_u",
    I64GtS => "i64.gt_s",
    I64GtU => "i64.gt_u",
    I64LeS => "i64.le_s",
    I64LeU => "i64.le_u",
    I64GeS => "i64.ge_s",
    I64GeU => "i64.ge_u",
    F32Eq => "f32.eq",
    F32Ne => "f32.ne",
    F32Lt => "f32.lt",
    F32Gt => "f32.gt",
    F32Le => "f32.le",
    F32Ge => "f32.ge",
    F64Eq => "f64.eq",
    F64Ne => "f64.ne",
    F64Lt => "f64.lt",
    F64Gt => "f64.gt",
    F64Le => "f64.le",
    F64Ge => "f64.ge",

    // Conversions.
    I32WrapI64 => "i32.wrap_i64",
    I64ExtendI32S => "i64.extend_i32_s",
    I64ExtendI32U => "i64.extend_i32_u",
    I32TruncF32S => "i32.trunc_f32_s",
    I32TruncF32U => "i32.trunc_f32_u",
    I32TruncF64S => "i32.trunc_f64_s",
    I32TruncF64U => "i32.trunc_f64_u",
    I64TruncF32S => "i64.trunc_f32_s",
    I64TruncF32U => "i64.trunc_f32_u",
    I64TruncF64S => "i64.trunc_f64_s",
    I64TruncF64U => "i64.trunc_f64_u",
    F32ConvertI32S => "f32.convert_i32_s",
    F32ConvertI32U => "f32.convert_i32_u",
    F32ConvertI64S => "f32.convert_i64_s",
    F32ConvertI64U => "f32.convert_i64_u",
    F64ConvertI32S => "f64.convert_i32_s",
    F64ConvertI32U => "f64.convert_i32_u",
    F64ConvertI64S => "f64.convert_i64_s",
    F64ConvertI64U => "f64.convert_i64_u",
    F32DemoteF64 => "f32.demote_f64",
    F64PromoteF32 => "f64.promote_f32",
    I32ReinterpretF32 => "i32.reinterpret_f32",
    I64ReinterpretF64 => "i64.reinterpret_f64",
    F32ReinterpretI32 => "f32.reinterpret_i32",
    F64ReinterpretI64 => "f64.reinterpret_i64",

    // SIMD.
    I8X16Splat => "i8x16.splat",
    I16X8Splat => "i16x8.splat",
    I32X4Splat => "i32x4.splat",
    I64X2Splat => "i64x2.splat",
    F32X4Splat => "f32x4.splat",
    F64X2Splat => "f64x2.splat",
    I8X16ExtractLaneS => "i8x16.extract_lane_s",
    I8X16ExtractLaneU => "i8x16.extract_lane_u",
    I16X8ExtractLaneS => "i16x8.extract_lane_s",
    I16X8ExtractLaneU => "i16x8.extract_lane_u",
    I32X4ExtractLane => "i32x4.extract_lane",
    I64X2ExtractLane => "i64x2.extract_lane",
    F32X4ExtractLane => "f32x4.extract_lane",
    F64X2ExtractLane => "f64x2.extract_lane",
    I8X16ReplaceLane => "i8x16.replace_lane",
    I16X8ReplaceLane => "i16x8.replace_lane",
    I32X4ReplaceLane => "i32x4.replace_lane",
    I64X2ReplaceLane => "i64x2.replace_lane",
    F32X4ReplaceLane => "f32x4.replace_lane",
    F64X2ReplaceLane => "f64x2.replace_lane",
    V8X16Shuffle => "v8x16.shuffle",
    V128Not => "v128.not",
    V128And => "v128.and",
    V128Or => "v128.or",
    V128Xor => "v128.xor",
    V128BitSelect => "v128.bitselect",
    I8X16Add => "i8x16.add",
    I16X8Add => "i16x8.add",
    I32X4Add => "i32x4.add",
    I64X2Add => "i64x2.add",
    I8X16Sub => "i8x16.sub",
    I16X8Sub => "i16x8.sub",
    I32X4Sub => "i32x4.sub",
    I64X2Sub => "i64x2.sub",
    I8X16AnyTrue => "i8x16.any_true",
    I8X16AllTrue => "i8x16.all_true",
    I16X8AnyTrue => "i16x8.any_true",
    I16X8AllTrue => "i16x8.all_true",
    I32X4AnyTrue => "i32x4.any_true",
    I32X4AllTrue => "i32x4.all_true",
}

impl Opcode {
    /// Access width in bytes of a memory opcode, which is also its natural
    /// alignment. Opcodes that do not touch memory report 0.
    pub fn memory_size(self) -> u32 {
        use Opcode::*;
        match self {
            I32Load8S | I32Load8U | I64Load8S | I64Load8U | I32Store8 | I64Store8
            | I32AtomicLoad8U | I64AtomicLoad8U | I32AtomicStore8 | I64AtomicStore8
            | I32AtomicRmw8AddU | I64AtomicRmw8AddU | I32AtomicRmw8SubU | I64AtomicRmw8SubU
            | I32AtomicRmw8AndU | I64AtomicRmw8AndU | I32AtomicRmw8OrU | I64AtomicRmw8OrU
            | I32AtomicRmw8XorU | I64AtomicRmw8XorU | I32AtomicRmw8XchgU | I64AtomicRmw8XchgU
            | I32AtomicRmw8CmpxchgU | I64AtomicRmw8CmpxchgU | V8X16LoadSplat => 1,
            I32Load16S | I32Load16U | I64Load16S | I64Load16U | I32Store16 | I64Store16
            | I32AtomicLoad16U | I64AtomicLoad16U | I32AtomicStore16 | I64AtomicStore16
            | I32AtomicRmw16AddU | I64AtomicRmw16AddU | I32AtomicRmw16SubU | I64AtomicRmw16SubU
            | I32AtomicRmw16AndU | I64AtomicRmw16AndU | I32AtomicRmw16OrU | I64AtomicRmw16OrU
            | I32AtomicRmw16XorU | I64AtomicRmw16XorU | I32AtomicRmw16XchgU
            | I64AtomicRmw16XchgU | I32AtomicRmw16CmpxchgU | I64AtomicRmw16CmpxchgU
            | V16X8LoadSplat => 2,
            I32Load | F32Load | I64Load32S | I64Load32U | I32Store | F32Store | I64Store32
            | I32AtomicLoad | I64AtomicLoad32U | I32AtomicStore | I64AtomicStore32
            | I32AtomicRmwAdd | I32AtomicRmwSub | I32AtomicRmwAnd | I32AtomicRmwOr
            | I32AtomicRmwXor | I32AtomicRmwXchg | I32AtomicRmwCmpxchg | I64AtomicRmw32AddU
            | I64AtomicRmw32SubU | I64AtomicRmw32AndU | I64AtomicRmw32OrU | I64AtomicRmw32XorU
            | I64AtomicRmw32XchgU | I64AtomicRmw32CmpxchgU | AtomicNotify | I32AtomicWait
            | V32X4LoadSplat => 4,
            I64Load | F64Load | I64Store | F64Store | I64AtomicLoad | I64AtomicStore
            | I64AtomicRmwAdd | I64AtomicRmwSub | I64AtomicRmwAnd | I64AtomicRmwOr
            | I64AtomicRmwXor | I64AtomicRmwXchg | I64AtomicRmwCmpxchg | I64AtomicWait
            | V64X2LoadSplat => 8,
            V128Load | V128Store => 16,
            _ => 0,
        }
    }

    /// Number of lanes addressed by a SIMD lane opcode, 0 otherwise.
    pub fn lane_count(self) -> u64 {
        use Opcode::*;
        match self {
            I8X16ExtractLaneS | I8X16ExtractLaneU | I8X16ReplaceLane => 16,
            I16X8ExtractLaneS | I16X8ExtractLaneU | I16X8ReplaceLane => 8,
            I32X4ExtractLane | I32X4ReplaceLane | F32X4ExtractLane | F32X4ReplaceLane => 4,
            I64X2ExtractLane | I64X2ReplaceLane | F64X2ExtractLane | F64X2ReplaceLane => 2,
            _ => 0,
        }
    }

    /// Operand and result shape of a data opcode, operands in declaration
    /// order (the last one on top of the stack). Control and bulk tags have
    /// no fixed shape and report empty sequences; the validator handles
    /// their stack effects through dedicated type-checker operations.
    pub fn signature(self) -> (&'static [ValueType], &'static [ValueType]) {
        use Opcode::*;
        match self {
            // Loads, including the atomic and splat variants.
            I32Load | I32Load8S | I32Load8U | I32Load16S | I32Load16U | I32AtomicLoad
            | I32AtomicLoad8U | I32AtomicLoad16U => (&[I32], &[I32]),
            I64Load | I64Load8S | I64Load8U | I64Load16S | I64Load16U | I64Load32S
            | I64Load32U | I64AtomicLoad | I64AtomicLoad8U | I64AtomicLoad16U
            | I64AtomicLoad32U => (&[I32], &[I64]),
            F32Load => (&[I32], &[F32]),
            F64Load => (&[I32], &[F64]),
            V128Load | V8X16LoadSplat | V16X8LoadSplat | V32X4LoadSplat | V64X2LoadSplat => {
                (&[I32], &[V128])
            }

            // Stores.
            I32Store | I32Store8 | I32Store16 | I32AtomicStore | I32AtomicStore8
            | I32AtomicStore16 => (&[I32, I32], &[]),
            I64Store | I64Store8 | I64Store16 | I64Store32 | I64AtomicStore | I64AtomicStore8
            | I64AtomicStore16 | I64AtomicStore32 => (&[I32, I64], &[]),
            F32Store => (&[I32, F32], &[]),
            F64Store => (&[I32, F64], &[]),
            V128Store => (&[I32, V128], &[]),

            // Atomic read-modify-write, compare-exchange, wait and notify.
            I32AtomicRmwAdd | I32AtomicRmw8AddU | I32AtomicRmw16AddU | I32AtomicRmwSub
            | I32AtomicRmw8SubU | I32AtomicRmw16SubU | I32AtomicRmwAnd | I32AtomicRmw8AndU
            | I32AtomicRmw16AndU | I32AtomicRmwOr | I32AtomicRmw8OrU | I32AtomicRmw16OrU
            | I32AtomicRmwXor | I32AtomicRmw8XorU | I32AtomicRmw16XorU | I32AtomicRmwXchg
            | I32AtomicRmw8XchgU | I32AtomicRmw16XchgU | AtomicNotify => (&[I32, I32], &[I32]),
            I64AtomicRmwAdd | I64AtomicRmw8AddU | I64AtomicRmw16AddU | I64AtomicRmw32AddU
            | I64AtomicRmwSub | I64AtomicRmw8SubU | I64AtomicRmw16SubU | I64AtomicRmw32SubU
            | I64AtomicRmwAnd | I64AtomicRmw8AndU | I64AtomicRmw16AndU | I64AtomicRmw32AndU
            | I64AtomicRmwOr | I64AtomicRmw8OrU | I64AtomicRmw16OrU | I64AtomicRmw32OrU
            | I64AtomicRmwXor | I64AtomicRmw8XorU | I64AtomicRmw16XorU | I64AtomicRmw32XorU
            | I64AtomicRmwXchg | I64AtomicRmw8XchgU | I64AtomicRmw16XchgU
            | I64AtomicRmw32XchgU => (&[I32, I64], &[I64]),
            I32AtomicRmwCmpxchg | I32AtomicRmw8CmpxchgU | I32AtomicRmw16CmpxchgU => {
                (&[I32, I32, I32], &[I32])
            }
            I64AtomicRmwCmpxchg | I64AtomicRmw8CmpxchgU | I64AtomicRmw16CmpxchgU
            | I64AtomicRmw32CmpxchgU => (&[I32, I64, I64], &[I64]),
            I32AtomicWait => (&[I32, I32, I64], &[I32]),
            I64AtomicWait => (&[I32, I64, I64], &[I32]),

            // Unary.
            I32Clz | I32Ctz | I32Popcnt | I32Eqz | I32Extend8S | I32Extend16S => (&[I32], &[I32]),
            I64Clz | I64Ctz | I64Popcnt | I64Extend8S | I64Extend16S | I64Extend32S => {
                (&[I64], &[I64])
            }
            I64Eqz => (&[I64], &[I32]),
            F32Abs | F32Neg | F32Ceil | F32Floor | F32Trunc | F32Nearest | F32Sqrt => {
                (&[F32], &[F32])
            }
            F64Abs | F64Neg | F64Ceil | F64Floor | F64Trunc | F64Nearest | F64Sqrt => {
                (&[F64], &[F64])
            }

            // Binary and comparison.
            I32Add | I32Sub | I32Mul | I32DivS | I32DivU | I32RemS | I32RemU | I32And | I32Or
            | I32Xor | I32Shl | I32ShrS | I32ShrU | I32Rotl | I32Rotr | I32Eq | I32Ne | I32LtS
            | I32LtU | I32GtS | I32GtU | I32LeS | I32LeU | I32GeS | I32GeU => {
                (&[I32, I32], &[I32])
            }
            I64Add | I64Sub | I64Mul | I64DivS | I64DivU | I64RemS | I64RemU | I64And | I64Or
            | I64Xor | I64Shl | I64ShrS | I64ShrU | I64Rotl | I64Rotr => (&[I64, I64], &[I64]),
            I64Eq | I64Ne | I64LtS | I64LtU | I64GtS | I64GtU | I64LeS | I64LeU | I64GeS
            | I64GeU => (&[I64, I64], &[I32]),
            F32Add | F32Sub | F32Mul | F32Div | F32Min | F32Max | F32Copysign => {
                (&[F32, F32], &[F32])
            }
            F32Eq | F32Ne | F32Lt | F32Gt | F32Le | F32Ge => (&[F32, F32], &[I32]),
            F64Add | F64Sub | F64Mul | F64Div | F64Min | F64Max | F64Copysign => {
                (&[F64, F64], &[F64])
            }
            F64Eq | F64Ne | F64Lt | F64Gt | F64Le | F64Ge => (&[F64, F64], &[I32]),

            // Conversions.
            I32WrapI64 => (&[I64], &[I32]),
            I64ExtendI32S | I64ExtendI32U => (&[I32], &[I64]),
            I32TruncF32S | I32TruncF32U | I32ReinterpretF32 => (&[F32], &[I32]),
            I32TruncF64S | I32TruncF64U => (&[F64], &[I32]),
            I64TruncF32S | I64TruncF32U => (&[F32], &[I64]),
            I64TruncF64S | I64TruncF64U | I64ReinterpretF64 => (&[F64], &[I64]),
            F32ConvertI32S | F32ConvertI32U | F32ReinterpretI32 => (&[I32], &[F32]),
            F32ConvertI64S | F32ConvertI64U => (&[I64], &[F32]),
            F64ConvertI32S | F64ConvertI32U => (&[I32], &[F64]),
            F64ConvertI64S | F64ConvertI64U | F64ReinterpretI64 => (&[I64], &[F64]),
            F32DemoteF64 => (&[F64], &[F32]),
            F64PromoteF32 => (&[F32], &[F64]),

            // SIMD.
            I8X16Splat | I16X8Splat | I32X4Splat => (&[I32], &[V128]),
            I64X2Splat => (&[I64], &[V128]),
            F32X4Splat => (&[F32], &[V128]),
            F64X2Splat => (&[F64], &[V128]),
            I8X16ExtractLaneS | I8X16ExtractLaneU | I16X8ExtractLaneS | I16X8ExtractLaneU
            | I32X4ExtractLane | I8X16AnyTrue | I8X16AllTrue | I16X8AnyTrue | I16X8AllTrue
            | I32X4AnyTrue | I32X4AllTrue => (&[V128], &[I32]),
            I64X2ExtractLane => (&[V128], &[I64]),
            F32X4ExtractLane => (&[V128], &[F32]),
            F64X2ExtractLane => (&[V128], &[F64]),
            I8X16ReplaceLane | I16X8ReplaceLane | I32X4ReplaceLane => (&[V128, I32], &[V128]),
            I64X2ReplaceLane => (&[V128, I64], &[V128]),
            F32X4ReplaceLane => (&[V128, F32], &[V128]),
            F64X2ReplaceLane => (&[V128, F64], &[V128]),
            V128Not => (&[V128], &[V128]),
            V128And | V128Or | V128Xor | V8X16Shuffle | I8X16Add | I16X8Add | I32X4Add
            | I64X2Add | I8X16Sub | I16X8Sub | I32X4Sub | I64X2Sub => (&[V128, V128], &[V128]),
            V128BitSelect => (&[V128, V128, V128], &[V128]),

            // Control and bulk tags.
            Block | Loop | If | Try | ReturnCallIndirect | MemoryCopy | MemoryFill | MemoryInit
            | DataDrop | TableCopy | TableInit | ElemDrop => (&[], &[]),
        }
    }
}

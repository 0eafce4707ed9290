//! IR Builder
//!
//! Instruction creation API of [`Module`]. Every `create_*` call builds the
//! instruction, stamps it with the innermost source context, splices it in at
//! the insertion point and advances the point past it. Allocas are the one
//! exception: they are hoisted into the entry block of the current function.
//!
//! Invariant violations (mistyped operands, missing insertion point, a second
//! terminator) are bugs in the caller and panic.

use crate::instructions::ICmpPredicate;
use crate::module::{FunctionState, InsertPoint, Module};
use crate::opcode::Opcode;
use crate::usedef::ValueId;
use crate::value::{BlockData, FunctionData, InstAttr, InstData, ValueKind};
use log::trace;
use rjit_common::Type;

impl Module {
    // Containers

    /// Create a function with one argument value per parameter type and make
    /// it the current function. `ty` must be a function type.
    pub fn create_function(&mut self, name: &str, ty: Type, arg_names: &[String]) -> ValueId {
        assert!(ty.is_function(), "function @{} needs a function type", name);
        assert_eq!(
            ty.param_types().len(),
            arg_names.len(),
            "argument names of @{} do not match its type",
            name
        );

        let func = self.graph.add(
            ValueKind::Function(FunctionData {
                name: name.to_string(),
                args: Vec::new(),
            }),
            ty.clone(),
            None,
        );

        let args: Vec<ValueId> = ty
            .param_types()
            .iter()
            .zip(arg_names)
            .enumerate()
            .map(|(index, (param_ty, arg_name))| {
                self.create_arg_ref(index, arg_name, param_ty.clone())
            })
            .collect();
        if let ValueKind::Function(data) = &mut self.graph.value_mut(func).kind {
            data.args = args;
        }

        self.functions.push(func);
        trace!("created function @{}", name);
        func
    }

    /// Append a block to `func`. The first block created becomes the entry
    /// and the function becomes the current one.
    pub fn create_block(&mut self, func: ValueId, name: Option<&str>) -> ValueId {
        let block = self.graph.add(
            ValueKind::Block(BlockData {
                name: name.map(str::to_string),
                insts: Vec::new(),
                preds: Vec::new(),
                succs: Vec::new(),
                parent: func,
            }),
            Type::Label,
            None,
        );
        self.graph.add_operand(func, Some(block));

        match self.current {
            Some(state) if state.function == func => {}
            _ => {
                let entry = self.graph.entry_block(func).unwrap_or(block);
                self.current = Some(FunctionState {
                    function: func,
                    entry,
                    exit: None,
                    return_slot: None,
                });
            }
        }
        block
    }

    /// Place a block after every other block of its function
    pub fn move_block_to_end(&mut self, func: ValueId, block: ValueId) {
        let last = self.graph.operand_count(func);
        self.graph.move_block(func, block, last);
    }

    // Insertion point

    /// Insert at the end of `block`
    pub fn set_insert_point(&mut self, block: ValueId) {
        let index = self.graph.block(block).insts.len();
        self.set_insert_point_at(block, index);
    }

    pub fn set_insert_point_at(&mut self, block: ValueId, index: usize) {
        assert!(self.graph.is_block(block), "insertion point must be a block");
        self.insert_point = Some(InsertPoint { block, index });
    }

    pub fn insert_point(&self) -> Option<InsertPoint> {
        self.insert_point
    }

    pub fn insert_block(&self) -> Option<ValueId> {
        self.insert_point.map(|ip| ip.block)
    }

    /// Whether the block being filled already ends in a terminator
    pub fn is_terminated(&self) -> bool {
        self.insert_block()
            .is_some_and(|block| self.graph.has_terminator(block))
    }

    /// Run `f` with the insertion point moved, restoring it afterwards
    pub fn with_insert_point<R>(
        &mut self,
        point: InsertPoint,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = self.insert_point.replace(point);
        let result = f(self);
        self.insert_point = saved;
        result
    }

    // Values

    pub fn create_const_int(&mut self, value: i64, ty: Type) -> ValueId {
        self.graph.add(ValueKind::ConstInt(value), ty, Some(0))
    }

    pub fn create_const_str(&mut self, value: &str) -> ValueId {
        self.graph.add(
            ValueKind::ConstStr(value.to_string()),
            Type::constant(Type::Str),
            Some(0),
        )
    }

    pub fn create_arg_ref(&mut self, index: usize, name: &str, ty: Type) -> ValueId {
        self.graph.add(
            ValueKind::ArgRef {
                index,
                name: name.to_string(),
            },
            ty,
            Some(0),
        )
    }

    /// Module-level variable. Its value is the address of its storage.
    pub fn create_global(&mut self, name: &str, ty: Type, init: Option<ValueId>) -> ValueId {
        let global = self.graph.add(
            ValueKind::Global {
                name: name.to_string(),
            },
            Type::pointer_to(ty),
            Some(1),
        );
        if let Some(init) = init {
            self.graph.add_operand(global, Some(init));
        }
        self.globals.push(global);
        global
    }

    // Instructions

    fn insert_inst(
        &mut self,
        opcode: Opcode,
        ty: Type,
        operands: &[Option<ValueId>],
        attr: InstAttr,
    ) -> ValueId {
        let Some(InsertPoint { block, index }) = self.insert_point else {
            panic!("no insertion point for {}", opcode);
        };
        let graph = &self.graph;
        if let Some(term) = graph.terminator(block) {
            assert!(
                !opcode.is_terminator(),
                "block already ends in {}",
                graph.opcode(term).map(Opcode::mnemonic).unwrap_or("?")
            );
            assert!(
                index < graph.block(block).insts.len(),
                "{} inserted after the terminator",
                opcode
            );
        }

        let limit = opcode.arity().map(|arity| arity.max(operands.len()));
        let inst = self.graph.add(
            ValueKind::Inst(InstData {
                opcode,
                parent: block,
                attr,
            }),
            ty,
            limit,
        );
        self.graph.value_mut(inst).location = self.current_context().cloned();
        for &operand in operands {
            self.graph.add_operand(inst, operand);
        }

        self.graph.block_mut(block).insts.insert(index, inst);
        self.insert_point = Some(InsertPoint {
            block,
            index: index + 1,
        });
        trace!("{} inserted at {}:{}", opcode, block, index);
        inst
    }

    /// Stack slot of type `ty`, hoisted into the entry block before its
    /// terminator. The insertion point is preserved.
    pub fn create_alloca(&mut self, ty: Type, name: Option<&str>) -> ValueId {
        assert!(!ty.is_void(), "alloca of void");
        let Some(state) = self.current else {
            panic!("alloca outside of a function");
        };

        let entry = state.entry;
        let position = match self.graph.terminator(entry) {
            Some(_) => self.graph.block(entry).insts.len() - 1,
            None => self.graph.block(entry).insts.len(),
        };

        let point = InsertPoint {
            block: entry,
            index: position,
        };
        let slot = self.with_insert_point(point, |module| {
            module.insert_inst(
                Opcode::Alloca,
                Type::pointer_to(ty.unqualified().clone()),
                &[],
                InstAttr::Alloca {
                    name: name.map(str::to_string),
                },
            )
        });

        if let Some(ip) = self.insert_point.as_mut() {
            if ip.block == entry && ip.index >= position {
                ip.index += 1;
            }
        }
        slot
    }

    pub fn create_load(&mut self, ptr: ValueId) -> ValueId {
        let Some(pointee) = self.graph.ty(ptr).pointee().cloned() else {
            panic!("load through non-pointer {}", self.graph.ty(ptr));
        };
        self.insert_inst(Opcode::Load, pointee, &[Some(ptr)], InstAttr::None)
    }

    pub fn create_store(&mut self, value: ValueId, ptr: ValueId) -> ValueId {
        assert!(
            self.graph.ty(ptr).is_pointer(),
            "store through non-pointer {}",
            self.graph.ty(ptr)
        );
        self.insert_inst(Opcode::Store, Type::Void, &[Some(value), Some(ptr)], InstAttr::None)
    }

    /// Load `value` if it is an address, otherwise use it as is
    pub fn value_of(&mut self, value: ValueId) -> ValueId {
        if self.graph.is_address(value) {
            self.create_load(value)
        } else {
            value
        }
    }

    /// Store `src` (loaded first if it is an address) into `dst`, converting
    /// it to the slot type. Returns the stored value.
    pub fn create_assign(&mut self, dst: ValueId, src: ValueId) -> ValueId {
        let value = self.value_of(src);
        let slot_ty = match self.graph.ty(dst).pointee() {
            Some(ty) => ty.clone(),
            None => panic!("assignment to non-pointer {}", self.graph.ty(dst)),
        };
        let value = self.create_convert(value, &slot_ty);
        self.create_store(value, dst);
        value
    }

    pub fn create_cast(&mut self, opcode: Opcode, value: ValueId, ty: Type) -> ValueId {
        assert!(opcode.is_cast(), "{} is not a cast", opcode);
        self.insert_inst(opcode, ty, &[Some(value)], InstAttr::None)
    }

    /// Convert an integer value to the width of `ty`: sext/zext on widening
    /// depending on the source signedness, trunc on narrowing
    pub fn create_convert(&mut self, value: ValueId, ty: &Type) -> ValueId {
        let from = self.graph.ty(value).clone();
        let (Some(from_bits), Some(to_bits)) = (from.bit_width(), ty.bit_width()) else {
            return value;
        };

        if from_bits < to_bits {
            let op = if from.is_signed() { Opcode::SExt } else { Opcode::ZExt };
            self.create_cast(op, value, ty.unqualified().clone())
        } else if from_bits > to_bits {
            self.create_cast(Opcode::Trunc, value, ty.unqualified().clone())
        } else {
            value
        }
    }

    /// Load both operands and widen the narrower one. Returns the operands
    /// and their common type.
    fn unify_operands(&mut self, lhs: ValueId, rhs: ValueId) -> (ValueId, ValueId, Type) {
        let lhs = self.value_of(lhs);
        let rhs = self.value_of(rhs);
        let lhs_ty = self.graph.ty(lhs).clone();
        let rhs_ty = self.graph.ty(rhs).clone();
        assert!(
            lhs_ty.is_integer() && rhs_ty.is_integer(),
            "binary operands must be integers, got {} and {}",
            lhs_ty,
            rhs_ty
        );

        let ty = common_type(&lhs_ty, &rhs_ty);
        let lhs = self.create_convert(lhs, &ty);
        let rhs = self.create_convert(rhs, &ty);
        (lhs, rhs, ty)
    }

    /// Binary operation on loaded operands; the result takes the wider
    /// operand type without qualifiers
    pub fn create_pure_binary(&mut self, opcode: Opcode, lhs: ValueId, rhs: ValueId) -> ValueId {
        assert!(opcode.is_binary_op(), "{} is not a binary operator", opcode);
        let (lhs, rhs, ty) = self.unify_operands(lhs, rhs);
        self.insert_inst(opcode, ty, &[Some(lhs), Some(rhs)], InstAttr::None)
    }

    pub fn create_icmp(&mut self, pred: ICmpPredicate, lhs: ValueId, rhs: ValueId) -> ValueId {
        let (lhs, rhs, _) = self.unify_operands(lhs, rhs);
        self.insert_inst(Opcode::ICmp, Type::Bool, &[Some(lhs), Some(rhs)], InstAttr::ICmp(pred))
    }

    /// Call `callee` with the arguments loaded and converted to the
    /// parameter types
    pub fn create_call(&mut self, callee: ValueId, args: &[ValueId]) -> ValueId {
        let func_ty = self.graph.ty(callee).clone();
        assert!(func_ty.is_function(), "call of non-function {}", func_ty);
        let params = func_ty.param_types();
        assert_eq!(params.len(), args.len(), "argument count mismatch");

        let mut operands = vec![Some(callee)];
        for (&arg, param_ty) in args.iter().zip(params) {
            let value = self.value_of(arg);
            operands.push(Some(self.create_convert(value, param_ty)));
        }

        let ret = func_ty.return_type().cloned().unwrap_or(Type::Void);
        self.insert_inst(Opcode::Call, ret, &operands, InstAttr::None)
    }

    /// Record the current block as a use-def predecessor of `target`
    fn add_cfg_edge(&mut self, target: ValueId) {
        let Some(from) = self.insert_block() else {
            panic!("no insertion point for a branch");
        };
        self.graph.add_operand(target, Some(from));
    }

    pub fn create_jump(&mut self, target: ValueId) -> ValueId {
        assert!(self.graph.is_block(target), "jump target must be a block");
        let inst = self.insert_inst(Opcode::Jmp, Type::Void, &[Some(target)], InstAttr::None);
        self.add_cfg_edge(target);
        inst
    }

    pub fn create_branch(
        &mut self,
        cond: ValueId,
        then_block: ValueId,
        else_block: ValueId,
    ) -> ValueId {
        assert!(
            self.graph.ty(cond).is_bool(),
            "branch condition must be i1, got {}",
            self.graph.ty(cond)
        );
        let inst = self.insert_inst(
            Opcode::Br,
            Type::Void,
            &[Some(cond), Some(then_block), Some(else_block)],
            InstAttr::None,
        );
        self.add_cfg_edge(then_block);
        self.add_cfg_edge(else_block);
        inst
    }

    pub fn create_return(&mut self, value: Option<ValueId>) -> ValueId {
        let operands: Vec<Option<ValueId>> = value.into_iter().map(Some).collect();
        self.insert_inst(Opcode::Ret, Type::Void, &operands, InstAttr::None)
    }
}

/// Type both operands of a binary operation are widened to: the wider one,
/// the left one on equal widths
pub fn common_type(lhs: &Type, rhs: &Type) -> Type {
    if rhs.bit_width() > lhs.bit_width() {
        rhs.unqualified().clone()
    } else {
        lhs.unqualified().clone()
    }
}

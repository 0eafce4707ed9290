//! Function lowering
//!
//! Shape of every lowered function:
//!
//! ```text
//! entry:      parameter slots, `retval`, locals; jumps to the body
//! body:       statements; `return` stores `retval` and jumps to func_exit
//! ...
//! func_exit:  loads `retval` and holds the single `ret`
//! ```

use super::IrBuilder;
use crate::errors::LowerError;
use crate::usedef::ValueId;
use log::debug;
use rjit_ast::{FunctionDefinition, StatementKind};

pub(super) fn lower_function(builder: &mut IrBuilder, def: &FunctionDefinition) {
    builder.with_context(&def.location, |this| {
        if this.module.get_function(&def.name).is_some() {
            this.fail(LowerError::FunctionRedefined {
                name: def.name.clone(),
                location: def.location.clone(),
            });
            return;
        }

        let arg_names: Vec<String> = def.parameters.iter().map(|p| p.name.clone()).collect();
        let func = this
            .module
            .create_function(&def.name, def.function_type(), &arg_names);
        this.module.declare_global(&def.name, func);
        debug!("lowering function @{}", def.name);

        let result = this.with_scope(|this| lower_body(this, func, def));
        this.module.end_function();
        this.loops.clear();

        if let Err(err) = result {
            debug!("dropping @{}: {}", def.name, err);
            this.module.remove_function(func);
        }
    });
}

fn lower_body(
    this: &mut IrBuilder,
    func: ValueId,
    def: &FunctionDefinition,
) -> Result<(), LowerError> {
    let entry = this.module.create_block(func, Some("entry"));
    this.module.set_insert_point(entry);

    let args = this.module.graph.function(func).args.clone();
    for (param, arg) in def.parameters.iter().zip(args) {
        let name = format!("{}.addr", param.name);
        let slot = this.module.create_alloca(param.param_type.clone(), Some(name.as_str()));
        this.module.create_store(arg, slot);
        this.module.declare(&param.name, slot);
    }

    let return_slot = if def.return_type.is_void() {
        None
    } else {
        Some(this.module.create_alloca(def.return_type.clone(), Some("retval")))
    };
    if let Some(slot) = return_slot {
        this.module.set_return_slot(slot);
    }

    let exit = this.module.create_block(func, Some("func_exit"));
    this.module.set_function_exit(exit);

    // The outermost compound shares the function scope
    let body = this.module.create_block(func, Some("body"));
    this.module.create_jump(body);
    this.module.set_insert_point(body);
    match &def.body.kind {
        StatementKind::Compound(statements) => this.lower_statements(statements)?,
        _ => this.lower_statement(&def.body)?,
    }

    if !this.module.is_terminated() {
        this.module.create_jump(exit);
    }

    this.module.move_block_to_end(func, exit);
    this.module.set_insert_point(exit);
    match return_slot {
        Some(slot) => {
            let value = this.module.create_load(slot);
            this.module.create_return(Some(value));
        }
        None => {
            this.module.create_return(None);
        }
    }
    Ok(())
}

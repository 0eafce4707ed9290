//! Lowering tests over whole translation units

use pretty_assertions::assert_eq;
use rjit_ast::*;
use rjit_common::{CompilerError, SourceLocation, Type};
use rjit_ir::{lower_translation_unit, IrBuilder, Module, Opcode, ValueId};

fn int(name: &str) -> Expression {
    Expression::ident(name, Type::Int32)
}

fn function(
    name: &str,
    params: &[(&str, Type)],
    ret: Type,
    body: Vec<Statement>,
) -> TopLevelItem {
    let params = params.iter().map(|(n, t)| Parameter::new(n, t.clone())).collect();
    let body = Statement::compound(body);
    TopLevelItem::Function(FunctionDefinition::new(name, params, ret, body))
}

fn lower(items: Vec<TopLevelItem>) -> Module {
    lower_translation_unit(&TranslationUnit::new(items), "test").unwrap()
}

/// `def f(a int32) int32 { var b = 1; return a + b; }`
fn scenario() -> TopLevelItem {
    function(
        "f",
        &[("a", Type::Int32)],
        Type::Int32,
        vec![
            Statement::var("b", Type::Int32, Some(Expression::int(1))),
            Statement::ret(Some(Expression::binary(BinaryOp::Add, int("a"), int("b")))),
        ],
    )
}

/// A function exercising every control-flow construct
fn control_flow() -> TopLevelItem {
    let loop_body = Statement::compound(vec![
        Statement::if_else(
            Expression::binary(BinaryOp::Equal, int("i"), Expression::int(5)),
            Statement::brk(),
            Some(Statement::if_else(
                Expression::binary(
                    BinaryOp::LogicalOr,
                    Expression::binary(BinaryOp::Less, int("i"), Expression::int(0)),
                    Expression::unary(UnaryOp::LogicalNot, int("n")),
                ),
                Statement::cont(),
                None,
            )),
        ),
        Statement::expr(Expression::binary(BinaryOp::AddAssign, int("s"), int("i"))),
        Statement::expr(Expression::binary(
            BinaryOp::Assign,
            int("i"),
            Expression::binary(BinaryOp::Add, int("i"), Expression::int(1)),
        )),
    ]);

    function(
        "loop",
        &[("n", Type::Int32)],
        Type::Int32,
        vec![
            Statement::var("s", Type::Int32, Some(Expression::int(0))),
            Statement::var("i", Type::Int32, Some(Expression::int(0))),
            Statement::while_loop(
                Expression::binary(
                    BinaryOp::LogicalAnd,
                    Expression::binary(BinaryOp::Less, int("i"), int("n")),
                    Expression::binary(BinaryOp::Greater, int("s"), Expression::int(-100)),
                ),
                loop_body,
            ),
            Statement::if_else(
                int("s"),
                Statement::ret(Some(int("s"))),
                Some(Statement::ret(Some(Expression::unary(UnaryOp::Minus, int("n"))))),
            ),
        ],
    )
}

fn opcodes(module: &Module, block: ValueId) -> Vec<Opcode> {
    module
        .graph
        .block(block)
        .insts
        .iter()
        .filter_map(|&inst| module.graph.opcode(inst))
        .collect()
}

fn block_named(module: &Module, func: ValueId, name: &str) -> Option<ValueId> {
    module
        .graph
        .function_blocks(func)
        .into_iter()
        .find(|&b| module.graph.block(b).name.as_deref() == Some(name))
}

#[test]
fn test_scenario_dump() {
    let module = lower(vec![scenario()]);
    let expected = "\
; ModuleID = 'test'

define i32 @f(i32 %a) {
entry:
  %a.addr = alloca i32
  store i32 %a, i32* %a.addr
  %retval = alloca i32
  %b = alloca i32
  jmp label %body

body: ; preds: %entry
  store i32 1, i32* %b
  %0 = load i32, i32* %a.addr
  %1 = load i32, i32* %b
  %2 = add i32 %0, %1
  store i32 %2, i32* %retval
  jmp label %func_exit

3:
  jmp label %func_exit

func_exit: ; preds: %body, %3
  %4 = load i32, i32* %retval
  ret i32 %4
}
";
    assert_eq!(module.dump(), expected);
}

#[test]
fn test_every_block_ends_in_one_terminator() {
    let module = lower(vec![control_flow()]);
    let func = module.get_function("loop").unwrap();

    for block in module.graph.function_blocks(func) {
        let ops = opcodes(&module, block);
        let (last, rest) = ops.split_last().expect("block is empty");
        assert!(last.is_terminator(), "block {} ends in {}", block, last);
        assert!(rest.iter().all(|op| !op.is_terminator()));
    }
    assert!(module.graph.verify_use_lists().is_ok());
}

#[test]
fn test_single_return_in_last_block() {
    let module = lower(vec![control_flow(), scenario()]);

    for &func in module.functions() {
        let blocks = module.graph.function_blocks(func);
        let rets: Vec<ValueId> = blocks
            .iter()
            .flat_map(|&b| module.graph.block(b).insts.clone())
            .filter(|&i| module.graph.opcode(i) == Some(Opcode::Ret))
            .collect();
        assert_eq!(rets.len(), 1);

        let exit = *blocks.last().unwrap();
        assert_eq!(module.graph.block(exit).name.as_deref(), Some("func_exit"));
        assert_eq!(module.graph.inst(rets[0]).parent, exit);
    }
}

#[test]
fn test_allocas_only_in_entry() {
    let module = lower(vec![control_flow()]);
    let func = module.get_function("loop").unwrap();
    let entry = module.graph.entry_block(func).unwrap();

    for block in module.graph.function_blocks(func) {
        let allocas = opcodes(&module, block)
            .into_iter()
            .filter(|&op| op == Opcode::Alloca)
            .count();
        if block == entry {
            // n.addr, retval, s, i and the two short-circuit slots
            assert_eq!(allocas, 6);
        } else {
            assert_eq!(allocas, 0);
        }
    }
    assert_eq!(opcodes(&module, entry).last(), Some(&Opcode::Jmp));
}

#[test]
fn test_if_without_else_branches_to_end() {
    let module = lower(vec![function(
        "g",
        &[("x", Type::Int32)],
        Type::Void,
        vec![Statement::if_else(
            Expression::binary(BinaryOp::Less, int("x"), Expression::int(0)),
            Statement::expr(Expression::binary(BinaryOp::Assign, int("x"), Expression::int(0))),
            None,
        )],
    )]);
    let func = module.get_function("g").unwrap();

    assert!(block_named(&module, func, "if.else").is_none());
    let then_block = block_named(&module, func, "if.then").unwrap();
    let end_block = block_named(&module, func, "if.end").unwrap();
    let body = block_named(&module, func, "body").unwrap();

    let br = module.graph.terminator(body).unwrap();
    assert_eq!(module.graph.branch_targets(br), vec![then_block, end_block]);

    // the condition is evaluated exactly once
    let icmps = opcodes(&module, body)
        .into_iter()
        .filter(|&op| op == Opcode::ICmp)
        .count();
    assert_eq!(icmps, 1);
}

#[test]
fn test_globals_and_calls() {
    let module = lower(vec![
        TopLevelItem::Declaration(Declaration::new(
            "limit",
            Type::Int32,
            Some(Expression::unary(UnaryOp::Minus, Expression::int(3))),
        )),
        function(
            "id",
            &[("c", Type::UInt8)],
            Type::UInt8,
            vec![Statement::ret(Some(Expression::ident("c", Type::UInt8)))],
        ),
        function(
            "main",
            &[],
            Type::Int32,
            vec![Statement::ret(Some(Expression::binary(
                BinaryOp::Add,
                int("limit"),
                Expression::call("id", vec![Expression::char(b'a')], Type::UInt8),
            )))],
        ),
    ]);

    let text = module.dump();
    assert!(text.contains("@limit = global i32 -3"), "{}", text);
    assert!(text.contains("= load i32, i32* @limit"), "{}", text);
    assert!(text.contains("= call u8 @id(u8 97)"), "{}", text);
    assert!(text.contains("= zext u8 %"), "{}", text);
}

#[test]
fn test_return_value_converted_to_return_type() {
    let module = lower(vec![function(
        "widen",
        &[("c", Type::Int8)],
        Type::Int32,
        vec![Statement::ret(Some(Expression::ident("c", Type::Int8)))],
    )]);
    assert!(module.dump().contains("sext i8 %"));
}

#[test]
fn test_undefined_function_drops_only_that_function() {
    let unit = TranslationUnit::new(vec![
        scenario(),
        function(
            "broken",
            &[],
            Type::Void,
            vec![Statement::expr(
                Expression::call("nope", vec![], Type::Void).at(SourceLocation::new("t.rj", 9, 4)),
            )],
        ),
        function("after", &[], Type::Void, vec![]),
    ]);

    let mut builder = IrBuilder::new("test");
    builder.lower(&unit);
    let module = builder.module();

    assert!(module.get_function("f").is_some());
    assert!(module.get_function("broken").is_none());
    assert!(module.get_function("after").is_some());

    let diags = module.reporter().diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].identifier.as_deref(), Some("nope"));
    assert_eq!(diags[0].location, SourceLocation::new("t.rj", 9, 4));

    let err = builder.finish().unwrap_err();
    assert_eq!(err.to_string(), "Lowering failed: 1 error");
}

#[test]
fn test_source_errors() {
    let cases: Vec<(Vec<TopLevelItem>, &str)> = vec![
        (vec![scenario(), scenario()], "function redefined"),
        (
            vec![function("u", &[], Type::Int32, vec![Statement::ret(Some(int("ghost")))])],
            "undefined variable",
        ),
        (
            vec![function(
                "a",
                &[],
                Type::Void,
                vec![Statement::expr(Expression::binary(
                    BinaryOp::Assign,
                    Expression::int(1),
                    Expression::int(2),
                ))],
            )],
            "invalid assignment target",
        ),
        (
            vec![function("b", &[], Type::Void, vec![Statement::brk()])],
            "'break' outside of a loop",
        ),
        (
            vec![function("c", &[], Type::Void, vec![Statement::cont()])],
            "'continue' outside of a loop",
        ),
        (
            vec![function(
                "s",
                &[],
                Type::Void,
                vec![
                    Statement::var("p", Type::Str, Some(Expression::string("hi"))),
                    Statement::if_else(
                        Expression::ident("p", Type::Str),
                        Statement::compound(vec![]),
                        None,
                    ),
                ],
            )],
            "condition is not an integer",
        ),
        (
            vec![function(
                "n",
                &[],
                Type::Void,
                vec![
                    Statement::var("p", Type::Str, Some(Expression::string("hi"))),
                    Statement::expr(Expression::unary(
                        UnaryOp::Minus,
                        Expression::ident("p", Type::Str),
                    )),
                ],
            )],
            "operand is not an integer",
        ),
        (
            vec![function(
                "m",
                &[("x", Type::Int32)],
                Type::Void,
                vec![Statement::expr(Expression::binary(
                    BinaryOp::Add,
                    int("x"),
                    Expression::string("hi"),
                ))],
            )],
            "operand is not an integer",
        ),
    ];

    for (items, message) in cases {
        let mut builder = IrBuilder::new("test");
        builder.lower(&TranslationUnit::new(items));
        let diags = builder.module().reporter().diagnostics();
        assert_eq!(diags.len(), 1, "{}", message);
        assert_eq!(diags[0].message, message);
    }
}

#[test]
fn test_string_condition_drops_only_that_function() {
    let bad = function(
        "s",
        &[],
        Type::Void,
        vec![
            Statement::var("p", Type::Str, Some(Expression::string("hi"))),
            Statement::while_loop(Expression::ident("p", Type::Str), Statement::compound(vec![])),
        ],
    );
    let mut builder = IrBuilder::new("test");
    builder.lower(&TranslationUnit::new(vec![bad, scenario()]));

    let module = builder.module();
    assert!(module.get_function("s").is_none());
    assert!(module.get_function("f").is_some());
    assert_eq!(module.reporter().error_count(), 1);
    assert!(module.graph.verify_use_lists().is_ok());
}

#[test]
fn test_nested_local_slot_in_entry_store_in_place() {
    // def h(x int32) int32 { if (x < 0) { var y = 3; return y; } return x; }
    let module = lower(vec![function(
        "h",
        &[("x", Type::Int32)],
        Type::Int32,
        vec![
            Statement::if_else(
                Expression::binary(BinaryOp::Less, int("x"), Expression::int(0)),
                Statement::compound(vec![
                    Statement::var("y", Type::Int32, Some(Expression::int(3))),
                    Statement::ret(Some(int("y"))),
                ]),
                None,
            ),
            Statement::ret(Some(int("x"))),
        ],
    )]);
    let func = module.get_function("h").unwrap();
    let graph = &module.graph;
    let entry = graph.entry_block(func).unwrap();

    let slot = graph
        .block(entry)
        .insts
        .iter()
        .copied()
        .find(|&inst| graph.alloca_name(inst) == Some("y"))
        .expect("slot of y hoisted to the entry block");
    assert!(module.dump().contains("  %y = alloca i32\n"));

    let stores: Vec<ValueId> = graph
        .users(slot)
        .into_iter()
        .filter(|&user| graph.opcode(user) == Some(Opcode::Store))
        .collect();
    assert_eq!(stores.len(), 1);

    // the store sits in the block of the nested compound, entered from if.then
    let store_block = graph.inst(stores[0]).parent;
    let then_block = block_named(&module, func, "if.then").unwrap();
    assert_ne!(store_block, entry);
    assert_eq!(graph.use_def_preds(store_block), vec![then_block]);
}

#[test]
fn test_code_after_return_is_lowered_with_a_warning() {
    let after = SourceLocation::new("w.rj", 3, 5);
    let items = vec![function(
        "w",
        &[("x", Type::Int32)],
        Type::Int32,
        vec![
            Statement::ret(Some(int("x"))),
            Statement::expr(Expression::binary(BinaryOp::Assign, int("x"), Expression::int(1)))
                .at(after.clone()),
            Statement::ret(Some(int("x"))),
        ],
    )];
    let mut builder = IrBuilder::new("test");
    builder.lower(&TranslationUnit::new(items));

    let reporter = builder.module().reporter();
    assert!(!reporter.has_errors());
    assert_eq!(reporter.warning_count(), 1);
    assert_eq!(reporter.diagnostics()[0].message, "unreachable code");
    assert_eq!(reporter.diagnostics()[0].location, after);

    let module = builder.finish().unwrap();
    assert_eq!(module.dump().matches("store i32 1, i32* %x.addr").count(), 1);
    assert_eq!(module.dump().matches("ret i32").count(), 1);
}

#[test]
fn test_compiler_error_from_facade() {
    let unit = TranslationUnit::new(vec![function("b", &[], Type::Void, vec![Statement::brk()])]);
    match lower_translation_unit(&unit, "test") {
        Err(CompilerError::LoweringFailed { summary }) => assert_eq!(summary, "1 error"),
        other => panic!("unexpected result: {:?}", other.map(|m| m.dump())),
    }
}

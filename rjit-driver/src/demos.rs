//! Built-in typed ASTs for trying the middle end without a frontend

use rjit_ast::*;
use rjit_common::{SourceLocation, Type};

pub const DEMO_NAMES: &[&str] = &["add", "abs", "loop", "calls"];

pub fn demo(name: &str) -> Option<TranslationUnit> {
    let items = match name {
        "add" => vec![add()],
        "abs" => vec![abs()],
        "loop" => vec![count_down()],
        "calls" => calls(),
        _ => return None,
    };
    Some(TranslationUnit::new(items))
}

fn loc(line: u32, column: u32) -> SourceLocation {
    SourceLocation::new("demo.rj", line, column)
}

fn int(name: &str) -> Expression {
    Expression::ident(name, Type::Int32)
}

fn function(name: &str, params: &[(&str, Type)], ret: Type, body: Vec<Statement>) -> TopLevelItem {
    let params = params.iter().map(|(n, t)| Parameter::new(n, t.clone())).collect();
    TopLevelItem::Function(FunctionDefinition::new(
        name,
        params,
        ret,
        Statement::compound(body),
    ))
}

/// def add(a int32) int32 { var b = 1; return a + b; }
fn add() -> TopLevelItem {
    function(
        "add",
        &[("a", Type::Int32)],
        Type::Int32,
        vec![
            Statement::var("b", Type::Int32, Some(Expression::int(1))).at(loc(2, 3)),
            Statement::ret(Some(Expression::binary(BinaryOp::Add, int("a"), int("b"))))
                .at(loc(3, 3)),
        ],
    )
}

/// def abs(x int32) int32 { if x < 0 { return -x; } else { return x; } }
fn abs() -> TopLevelItem {
    function(
        "abs",
        &[("x", Type::Int32)],
        Type::Int32,
        vec![Statement::if_else(
            Expression::binary(BinaryOp::Less, int("x"), Expression::int(0)),
            Statement::compound(vec![Statement::ret(Some(Expression::unary(
                UnaryOp::Minus,
                int("x"),
            )))]),
            Some(Statement::compound(vec![Statement::ret(Some(int("x")))])),
        )
        .at(loc(2, 3))],
    )
}

/// Counts `n` down to zero, stopping early at 10 and skipping odd values
fn count_down() -> TopLevelItem {
    function(
        "count",
        &[("n", Type::Int32)],
        Type::Int32,
        vec![
            Statement::var("steps", Type::Int32, Some(Expression::int(0))),
            Statement::while_loop(
                Expression::binary(BinaryOp::Greater, int("n"), Expression::int(0)),
                Statement::compound(vec![
                    Statement::expr(Expression::binary(
                        BinaryOp::SubAssign,
                        int("n"),
                        Expression::int(1),
                    )),
                    Statement::if_else(
                        Expression::binary(BinaryOp::Equal, int("n"), Expression::int(10)),
                        Statement::brk(),
                        None,
                    ),
                    Statement::if_else(
                        Expression::binary(BinaryOp::BitAnd, int("n"), Expression::int(1)),
                        Statement::cont(),
                        None,
                    ),
                    Statement::expr(Expression::binary(
                        BinaryOp::AddAssign,
                        int("steps"),
                        Expression::int(1),
                    )),
                ]),
            )
            .at(loc(3, 3)),
            Statement::ret(Some(int("steps"))),
        ],
    )
}

/// A global, a char helper and a caller using both
fn calls() -> Vec<TopLevelItem> {
    let byte = |name: &str| Expression::ident(name, Type::UInt8);
    vec![
        TopLevelItem::Declaration(Declaration::new("base", Type::Int32, Some(Expression::int(40)))),
        function(
            "upper",
            &[("c", Type::UInt8)],
            Type::UInt8,
            vec![Statement::ret(Some(Expression::binary(
                BinaryOp::Sub,
                byte("c"),
                Expression::char(32),
            )))],
        ),
        function(
            "main",
            &[],
            Type::Int32,
            vec![Statement::ret(Some(Expression::binary(
                BinaryOp::Add,
                int("base"),
                Expression::call("upper", vec![Expression::char(b'b')], Type::UInt8),
            )))],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_demo_lowers_and_optimizes() {
        for name in DEMO_NAMES {
            let unit = demo(name).unwrap();
            let module = rjit_ir::lower_translation_unit(&unit, name).unwrap();
            let module = rjit_opt::optimize(module, 1).unwrap();
            assert!(module.graph.verify_use_lists().is_ok(), "{}", name);
            assert!(!module.functions().is_empty(), "{}", name);
        }
    }

    #[test]
    fn test_demo_json_round_trip() {
        for name in DEMO_NAMES {
            let unit = demo(name).unwrap();
            let json = serde_json::to_string_pretty(&unit).unwrap();
            let parsed: TranslationUnit = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, unit);
        }
    }

    #[test]
    fn test_unknown_demo() {
        assert!(demo("nope").is_none());
    }
}

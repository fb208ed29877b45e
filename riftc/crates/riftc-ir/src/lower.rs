//! Lowering: the AST to SSA IR over runtime intrinsics.
//!
//! Every expression form lowers to a single result value. Control flow
//! (if/else, while) becomes explicit blocks joined by φ-nodes. Nested
//! function literals are compiled into the same module; their templates
//! are registered in the function table during lowering so the enclosing
//! function can embed the index in a `createFunction` call.

use crate::builder::FunctionBuilder;
use crate::ir::{Function, Instr, Intrinsic, Module, Terminator, ValueId};
use riftc_par::{ast, Exp};
use riftc_runtime::Result;
use riftc_util::Symbol;

/// Lower a whole program (a top-level statement sequence) into a fresh
/// module. Returns the module and the top-level function's table index.
pub fn lower_program(program: &Exp) -> Result<(Module, u32)> {
    let mut lowerer = Lowerer {
        module: Module::new(),
    };
    let top = lowerer.compile_function(&[], program)?;
    Ok((lowerer.module, top))
}

struct Lowerer {
    module: Module,
}

struct FunctionCx {
    builder: FunctionBuilder,
    env: ValueId,
}

impl Lowerer {
    /// Compile one function body to IR, register its template in the
    /// function table, and return the table index.
    fn compile_function(&mut self, params: &[Symbol], body: &Exp) -> Result<u32> {
        let mut builder = FunctionBuilder::new(params.to_vec());
        let env = builder.emit(Instr::Env);
        let mut cx = FunctionCx { builder, env };

        let result = if body.statement_count() == 0 {
            self.literal_zero(&mut cx)
        } else {
            self.lower(&mut cx, body)?
        };
        cx.builder.terminate(Terminator::Ret(result));

        let template = rgc::RFun::new_template(params)?;
        let index = riftc_runtime::add_function(template);
        self.module.functions.push(cx.builder.finish(index));
        Ok(index)
    }

    fn literal_zero(&mut self, cx: &mut FunctionCx) -> ValueId {
        let zero = cx.builder.emit(Instr::Double(0.0));
        cx.builder.emit(Instr::Call {
            fun: Intrinsic::DoubleVectorLiteral,
            args: vec![zero],
        })
    }

    fn lower(&mut self, cx: &mut FunctionCx, exp: &Exp) -> Result<ValueId> {
        match exp {
            Exp::Num(value) => {
                let c = cx.builder.emit(Instr::Double(*value));
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::DoubleVectorLiteral,
                    args: vec![c],
                }))
            }

            Exp::Str(symbol) => {
                let c = cx.builder.emit(Instr::Sym(*symbol));
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::CharacterVectorLiteral,
                    args: vec![c],
                }))
            }

            Exp::Var(symbol) => {
                let c = cx.builder.emit(Instr::Sym(*symbol));
                let env = cx.env;
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::EnvGet,
                    args: vec![env, c],
                }))
            }

            Exp::Seq(body) => {
                if body.is_empty() {
                    return Ok(self.literal_zero(cx));
                }
                let mut result = None;
                for statement in body {
                    result = Some(self.lower(cx, statement)?);
                }
                Ok(result.expect("non-empty sequence"))
            }

            Exp::Fun { params, body } => {
                let index = self.compile_function(params, body)?;
                let c = cx.builder.emit(Instr::FunRef(index));
                let env = cx.env;
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::CreateFunction,
                    args: vec![c, env],
                }))
            }

            Exp::BinExp { op, lhs, rhs } => {
                let lhs = self.lower(cx, lhs)?;
                let rhs = self.lower(cx, rhs)?;
                let fun = match op {
                    ast::BinOp::Add => Intrinsic::GenericAdd,
                    ast::BinOp::Sub => Intrinsic::GenericSub,
                    ast::BinOp::Mul => Intrinsic::GenericMul,
                    ast::BinOp::Div => Intrinsic::GenericDiv,
                    ast::BinOp::Eq => Intrinsic::GenericEq,
                    ast::BinOp::Neq => Intrinsic::GenericNeq,
                    ast::BinOp::Lt => Intrinsic::GenericLt,
                    ast::BinOp::Gt => Intrinsic::GenericGt,
                };
                Ok(cx.builder.emit(Instr::Call {
                    fun,
                    args: vec![lhs, rhs],
                }))
            }

            Exp::UserCall { callee, args } => {
                let callee = self.lower(cx, callee)?;
                let mut call_args = vec![callee];
                for arg in args {
                    call_args.push(self.lower(cx, arg)?);
                }
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::Call,
                    args: call_args,
                }))
            }

            Exp::CCall { args } => {
                let mut call_args = Vec::with_capacity(args.len());
                for arg in args {
                    call_args.push(self.lower(cx, arg)?);
                }
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::C,
                    args: call_args,
                }))
            }

            Exp::EvalCall(arg) => {
                let arg = self.lower(cx, arg)?;
                let env = cx.env;
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::GenericEval,
                    args: vec![env, arg],
                }))
            }

            Exp::LengthCall(arg) => {
                let arg = self.lower(cx, arg)?;
                let scalar = cx.builder.emit(Instr::Call {
                    fun: Intrinsic::Length,
                    args: vec![arg],
                });
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::DoubleVectorLiteral,
                    args: vec![scalar],
                }))
            }

            Exp::TypeCall(arg) => {
                let arg = self.lower(cx, arg)?;
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::Type,
                    args: vec![arg],
                }))
            }

            Exp::Index { value, index } => {
                let value = self.lower(cx, value)?;
                let index = self.lower(cx, index)?;
                Ok(cx.builder.emit(Instr::Call {
                    fun: Intrinsic::GenericGetElement,
                    args: vec![value, index],
                }))
            }

            Exp::SimpleAssignment { name, rhs } => {
                let rhs = self.lower(cx, rhs)?;
                let c = cx.builder.emit(Instr::Sym(*name));
                let env = cx.env;
                cx.builder.emit(Instr::Call {
                    fun: Intrinsic::EnvSet,
                    args: vec![env, c, rhs],
                });
                Ok(rhs)
            }

            Exp::IndexAssignment { value, index, rhs } => {
                let rhs = self.lower(cx, rhs)?;
                let value = self.lower(cx, value)?;
                let index = self.lower(cx, index)?;
                cx.builder.emit(Instr::Call {
                    fun: Intrinsic::GenericSetElement,
                    args: vec![value, index, rhs],
                });
                Ok(rhs)
            }

            Exp::IfElse {
                guard,
                if_clause,
                else_clause,
            } => {
                let guard = self.lower(cx, guard)?;
                let cond = cx.builder.emit(Instr::Call {
                    fun: Intrinsic::ToBoolean,
                    args: vec![guard],
                });

                let true_block = cx.builder.new_block();
                let false_block = cx.builder.new_block();
                let merge_block = cx.builder.new_block();
                cx.builder.terminate(Terminator::Branch {
                    cond,
                    on_true: true_block,
                    on_false: false_block,
                });

                cx.builder.switch_to(true_block);
                let true_result = self.lower(cx, if_clause)?;
                let true_end = cx.builder.current_block();
                cx.builder.terminate(Terminator::Jump(merge_block));

                cx.builder.switch_to(false_block);
                let false_result = self.lower(cx, else_clause)?;
                let false_end = cx.builder.current_block();
                cx.builder.terminate(Terminator::Jump(merge_block));

                cx.builder.switch_to(merge_block);
                Ok(cx.builder.emit(Instr::Phi {
                    inputs: vec![(true_end, true_result), (false_end, false_result)],
                }))
            }

            Exp::WhileLoop { guard, body } => {
                // The loop value defaults to 0 until the body produces one.
                let zero = self.literal_zero(cx);
                let entry_end = cx.builder.current_block();

                let guard_block = cx.builder.new_block();
                let body_block = cx.builder.new_block();
                let cont_block = cx.builder.new_block();
                cx.builder.terminate(Terminator::Jump(guard_block));

                cx.builder.switch_to(guard_block);
                let phi = cx.builder.emit(Instr::Phi {
                    inputs: vec![(entry_end, zero)],
                });
                let guard = self.lower(cx, guard)?;
                let cond = cx.builder.emit(Instr::Call {
                    fun: Intrinsic::ToBoolean,
                    args: vec![guard],
                });
                cx.builder.terminate(Terminator::Branch {
                    cond,
                    on_true: body_block,
                    on_false: cont_block,
                });

                cx.builder.switch_to(body_block);
                let body_result = self.lower(cx, body)?;
                let body_end = cx.builder.current_block();
                cx.builder.terminate(Terminator::Jump(guard_block));
                cx.builder.add_phi_input(phi, body_end, body_result);

                cx.builder.switch_to(cont_block);
                Ok(phi)
            }
        }
    }
}

/// Find a function by its table index.
pub fn find_function(module: &Module, pool_index: u32) -> Option<&Function> {
    module.functions.iter().find(|f| f.pool_index == pool_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftc_par::Parser;

    fn lower(input: &str) -> (Module, u32) {
        let ast = Parser::parse(input).unwrap();
        lower_program(&ast).unwrap()
    }

    fn count_calls(f: &Function, fun: Intrinsic) -> usize {
        f.values
            .iter()
            .filter(|i| matches!(i, Instr::Call { fun: g, .. } if *g == fun))
            .count()
    }

    #[test]
    fn test_number_lowers_to_literal() {
        let (module, top) = lower("42");
        let f = find_function(&module, top).unwrap();
        assert_eq!(count_calls(f, Intrinsic::DoubleVectorLiteral), 1);
        assert_eq!(f.blocks.len(), 1);
    }

    #[test]
    fn test_empty_program_yields_zero() {
        let (module, top) = lower("");
        let f = find_function(&module, top).unwrap();
        assert_eq!(count_calls(f, Intrinsic::DoubleVectorLiteral), 1);
        assert!(f
            .values
            .iter()
            .any(|i| matches!(i, Instr::Double(v) if *v == 0.0)));
    }

    #[test]
    fn test_binexp_lowers_to_generic() {
        let (module, top) = lower("1 + 2");
        let f = find_function(&module, top).unwrap();
        assert_eq!(count_calls(f, Intrinsic::GenericAdd), 1);
        assert_eq!(count_calls(f, Intrinsic::DoubleVectorLiteral), 2);
    }

    #[test]
    fn test_variable_read_and_write() {
        let (module, top) = lower("a <- 1; a");
        let f = find_function(&module, top).unwrap();
        assert_eq!(count_calls(f, Intrinsic::EnvSet), 1);
        assert_eq!(count_calls(f, Intrinsic::EnvGet), 1);
    }

    #[test]
    fn test_assignment_result_is_rhs() {
        // `a <- 1` evaluates to 1: the function returns the rhs value, not
        // the envSet call.
        let (module, top) = lower("a <- 1");
        let f = find_function(&module, top).unwrap();
        let ret = match f.blocks[f.entry].term {
            Some(Terminator::Ret(v)) => v,
            other => panic!("expected return, got {:?}", other),
        };
        assert!(matches!(
            f.values[ret],
            Instr::Call {
                fun: Intrinsic::DoubleVectorLiteral,
                ..
            }
        ));
    }

    #[test]
    fn test_length_is_reboxed() {
        let (module, top) = lower("length(c(1, 2))");
        let f = find_function(&module, top).unwrap();
        assert_eq!(count_calls(f, Intrinsic::Length), 1);
        // One literal for each number plus the re-boxing of the length.
        assert_eq!(count_calls(f, Intrinsic::DoubleVectorLiteral), 3);
    }

    #[test]
    fn test_nested_function_compiled_into_module() {
        let (module, top) = lower("f <- function(a, b) { a + b }");
        assert_eq!(module.functions.len(), 2);
        let outer = find_function(&module, top).unwrap();
        assert_eq!(count_calls(outer, Intrinsic::CreateFunction), 1);
        let inner = module
            .functions
            .iter()
            .find(|f| f.pool_index != top)
            .unwrap();
        assert_eq!(inner.params.len(), 2);
        assert_eq!(count_calls(inner, Intrinsic::GenericAdd), 1);
        // The inner template is registered in the function table.
        let template = riftc_runtime::get_function(inner.pool_index);
        unsafe {
            assert_eq!(rgc::RFun::nargs(template), 2);
        }
    }

    #[test]
    fn test_if_else_builds_phi() {
        let (module, top) = lower("if (1) { 2 } else { 3 }");
        let f = find_function(&module, top).unwrap();
        assert_eq!(f.blocks.len(), 4);
        assert_eq!(count_calls(f, Intrinsic::ToBoolean), 1);
        let phis = f
            .values
            .iter()
            .filter(|i| matches!(i, Instr::Phi { .. }))
            .count();
        assert_eq!(phis, 1);
    }

    #[test]
    fn test_while_phi_has_two_inputs() {
        let (module, top) = lower("while (0) { 1 }");
        let f = find_function(&module, top).unwrap();
        let phi = f
            .values
            .iter()
            .find_map(|i| match i {
                Instr::Phi { inputs } => Some(inputs.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(phi.len(), 2);
        assert_eq!(f.blocks.len(), 4);
    }

    #[test]
    fn test_call_lowering_carries_callee_first() {
        let (module, top) = lower("f(1, 2)");
        let f = find_function(&module, top).unwrap();
        let call = f
            .values
            .iter()
            .find_map(|i| match i {
                Instr::Call {
                    fun: Intrinsic::Call,
                    args,
                } => Some(args.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(call.len(), 3);
    }

    #[test]
    fn test_index_assignment_order() {
        let (module, top) = lower("a[0] <- 5");
        let f = find_function(&module, top).unwrap();
        assert_eq!(count_calls(f, Intrinsic::GenericSetElement), 1);
        // Its result is the rhs literal.
        let ret = match f.blocks[f.entry].term {
            Some(Terminator::Ret(v)) => v,
            other => panic!("expected return, got {:?}", other),
        };
        assert!(matches!(
            f.values[ret],
            Instr::Call {
                fun: Intrinsic::DoubleVectorLiteral,
                ..
            }
        ));
    }

    #[test]
    fn test_eval_receives_environment() {
        let (module, top) = lower("eval(\"1\")");
        let f = find_function(&module, top).unwrap();
        let args = f
            .values
            .iter()
            .find_map(|i| match i {
                Instr::Call {
                    fun: Intrinsic::GenericEval,
                    args,
                } => Some(args.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(args.len(), 2);
        assert!(matches!(f.values[args[0]], Instr::Env));
    }
}

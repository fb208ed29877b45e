//! Textual IR dumps for `-d` and for pass tests.

use crate::ir::{Function, Instr, Module, Terminator};

/// Render one function. Nop tombstones are skipped, so two functions that
/// differ only in deleted instructions print identically.
pub fn print_function(f: &Function) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "function {} ({} params)\n",
        f.pool_index,
        f.params.len()
    ));
    for (bid, block) in f.blocks.iter_enumerated() {
        out.push_str(&format!("block{}:\n", bid.0));
        for &id in &block.instrs {
            let line = match &f.values[id] {
                Instr::Nop => continue,
                Instr::Env => "env".to_string(),
                Instr::Double(v) => format!("double {}", v),
                Instr::Sym(s) => format!("sym {:?}", s.as_str()),
                Instr::FunRef(i) => format!("funref {}", i),
                Instr::Call { fun, args } => {
                    let args: Vec<String> = args.iter().map(|a| format!("%{}", a.0)).collect();
                    format!("call {}({})", fun.name(), args.join(", "))
                }
                Instr::Prim { op, lhs, rhs } => {
                    format!("{} %{}, %{}", op.name(), lhs.0, rhs.0)
                }
                Instr::Phi { inputs } => {
                    let inputs: Vec<String> = inputs
                        .iter()
                        .map(|(b, v)| format!("[block{}: %{}]", b.0, v.0))
                        .collect();
                    format!("phi {}", inputs.join(", "))
                }
            };
            out.push_str(&format!("  %{} = {}\n", id.0, line));
        }
        match block.term {
            Some(Terminator::Jump(b)) => out.push_str(&format!("  jump block{}\n", b.0)),
            Some(Terminator::Branch {
                cond,
                on_true,
                on_false,
            }) => out.push_str(&format!(
                "  branch %{}, block{}, block{}\n",
                cond.0, on_true.0, on_false.0
            )),
            Some(Terminator::Ret(v)) => out.push_str(&format!("  ret %{}\n", v.0)),
            None => out.push_str("  <unterminated>\n"),
        }
    }
    out
}

/// Render a whole module.
pub fn print_module(m: &Module) -> String {
    let mut out = String::new();
    for f in &m.functions {
        out.push_str(&print_function(f));
        out.push('\n');
    }
    out
}

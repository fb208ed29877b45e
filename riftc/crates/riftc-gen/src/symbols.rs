//! The runtime symbol table.
//!
//! The backend links intrinsic calls by external symbol name. Each name
//! resolves to a typed entry point grouped by signature shape, so the
//! executor knows how to marshal register slots into arguments. An
//! unresolvable name is a link error, never a runtime fault.

use rgc::{Environment, RVal};
use riftc_runtime::intrinsics as rt;
use riftc_runtime::Result as RtResult;
use riftc_util::Symbol;

type Ptr = *mut RVal;
type Env = *mut Environment;

/// A resolved runtime entry point, tagged with its signature shape.
#[derive(Clone, Copy)]
pub enum ResolvedEntry {
    /// `f64 -> value` (doubleVectorLiteral)
    DoubleToVal(unsafe fn(f64) -> RtResult<Ptr>),
    /// `pool-index -> value` (characterVectorLiteral)
    IdxToVal(unsafe fn(u32) -> RtResult<Ptr>),
    /// `value, value -> value` (binary operators, element reads)
    ValValToVal(unsafe fn(Ptr, Ptr) -> RtResult<Ptr>),
    /// `value -> value` (type)
    ValToVal(unsafe fn(Ptr) -> RtResult<Ptr>),
    /// `value -> f64` (length, scalarFromVector)
    ValToDouble(unsafe fn(Ptr) -> RtResult<f64>),
    /// `value -> bool` (toBoolean)
    ValToBool(unsafe fn(Ptr) -> bool),
    /// `value, f64 -> f64` (doubleGetSingleElement)
    ValDoubleToDouble(unsafe fn(Ptr, f64) -> RtResult<f64>),
    /// `value... -> value` (c, doublec, characterc)
    Variadic(unsafe fn(&[Ptr]) -> RtResult<Ptr>),
    /// `pool-index, env -> value` (createFunction)
    IdxEnvToVal(unsafe fn(u32, Env) -> RtResult<Ptr>),
    /// `env, symbol -> value` (envGet)
    EnvIdxToVal(unsafe fn(Env, u32) -> RtResult<Ptr>),
    /// `env, symbol, value -> ()` (envSet)
    EnvIdxValToUnit(unsafe fn(Env, u32, Ptr) -> RtResult<()>),
    /// `value, value, value -> ()` (element writes)
    ValValValToUnit(unsafe fn(Ptr, Ptr, Ptr) -> RtResult<()>),
    /// `value, f64, f64 -> ()` (scalarSetElement)
    ValDoubleDoubleToUnit(unsafe fn(Ptr, f64, f64) -> RtResult<()>),
    /// `callee, value... -> value` (call)
    CalleeToVal(unsafe fn(Ptr, &[Ptr]) -> RtResult<Ptr>),
    /// `env, value -> value` (genericEval, characterEval)
    EnvValToVal(unsafe fn(Env, Ptr) -> RtResult<Ptr>),
}

unsafe fn env_get_entry(env: Env, symbol: u32) -> RtResult<Ptr> {
    rt::env_get(env, Symbol::from_index(symbol))
}

unsafe fn env_set_entry(env: Env, symbol: u32, value: Ptr) -> RtResult<()> {
    rt::env_set(env, Symbol::from_index(symbol), value)
}

/// Resolve an external symbol name to its runtime entry point.
pub fn resolve(name: &str) -> Option<ResolvedEntry> {
    use ResolvedEntry::*;
    Some(match name {
        "doubleVectorLiteral" => DoubleToVal(rt::double_vector_literal),
        "characterVectorLiteral" => IdxToVal(rt::character_vector_literal),

        "genericAdd" => ValValToVal(rt::generic_add),
        "genericSub" => ValValToVal(rt::generic_sub),
        "genericMul" => ValValToVal(rt::generic_mul),
        "genericDiv" => ValValToVal(rt::generic_div),
        "genericEq" => ValValToVal(rt::generic_eq),
        "genericNeq" => ValValToVal(rt::generic_neq),
        "genericLt" => ValValToVal(rt::generic_lt),
        "genericGt" => ValValToVal(rt::generic_gt),

        "doubleAdd" => ValValToVal(rt::double_add),
        "doubleSub" => ValValToVal(rt::double_sub),
        "doubleMul" => ValValToVal(rt::double_mul),
        "doubleDiv" => ValValToVal(rt::double_div),
        "doubleEq" => ValValToVal(rt::double_eq),
        "doubleNeq" => ValValToVal(rt::double_neq),
        "doubleLt" => ValValToVal(rt::double_lt),
        "doubleGt" => ValValToVal(rt::double_gt),
        "characterAdd" => ValValToVal(rt::character_add),
        "characterEq" => ValValToVal(rt::character_eq),
        "characterNeq" => ValValToVal(rt::character_neq),

        "genericGetElement" => ValValToVal(rt::generic_get_element),
        "doubleGetElement" => ValValToVal(rt::double_get_element),
        "characterGetElement" => ValValToVal(rt::character_get_element),
        "doubleGetSingleElement" => ValDoubleToDouble(rt::double_get_single_element),

        "genericSetElement" => ValValValToUnit(rt::generic_set_element),
        "doubleSetElement" => ValValValToUnit(rt::double_set_element),
        "characterSetElement" => ValValValToUnit(rt::character_set_element),
        "scalarSetElement" => ValDoubleDoubleToUnit(rt::scalar_set_element),

        "createFunction" => IdxEnvToVal(rt::create_function),
        "toBoolean" => ValToBool(rt::to_boolean),
        "length" => ValToDouble(rt::length),
        "scalarFromVector" => ValToDouble(rt::scalar_from_vector),
        "type" => ValToVal(rt::type_of),

        "c" => Variadic(rt::concat),
        "doublec" => Variadic(rt::double_concat),
        "characterc" => Variadic(rt::character_concat),

        "envGet" => EnvIdxToVal(env_get_entry),
        "envSet" => EnvIdxValToUnit(env_set_entry),
        "call" => CalleeToVal(rt::call),
        "genericEval" => EnvValToVal(rt::generic_eval),
        "characterEval" => EnvValToVal(rt::character_eval),

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use riftc_ir::Intrinsic;

    #[test]
    fn test_every_intrinsic_resolves() {
        let all = [
            Intrinsic::DoubleVectorLiteral,
            Intrinsic::CharacterVectorLiteral,
            Intrinsic::GenericAdd,
            Intrinsic::GenericSub,
            Intrinsic::GenericMul,
            Intrinsic::GenericDiv,
            Intrinsic::GenericEq,
            Intrinsic::GenericNeq,
            Intrinsic::GenericLt,
            Intrinsic::GenericGt,
            Intrinsic::GenericGetElement,
            Intrinsic::GenericSetElement,
            Intrinsic::CreateFunction,
            Intrinsic::ToBoolean,
            Intrinsic::Length,
            Intrinsic::Type,
            Intrinsic::C,
            Intrinsic::EnvGet,
            Intrinsic::EnvSet,
            Intrinsic::Call,
            Intrinsic::GenericEval,
            Intrinsic::DoubleAdd,
            Intrinsic::DoubleSub,
            Intrinsic::DoubleMul,
            Intrinsic::DoubleDiv,
            Intrinsic::DoubleEq,
            Intrinsic::DoubleNeq,
            Intrinsic::DoubleLt,
            Intrinsic::DoubleGt,
            Intrinsic::CharacterAdd,
            Intrinsic::CharacterEq,
            Intrinsic::CharacterNeq,
            Intrinsic::DoubleGetSingleElement,
            Intrinsic::DoubleGetElement,
            Intrinsic::CharacterGetElement,
            Intrinsic::DoubleSetElement,
            Intrinsic::ScalarSetElement,
            Intrinsic::CharacterSetElement,
            Intrinsic::Doublec,
            Intrinsic::Characterc,
            Intrinsic::CharacterEval,
            Intrinsic::ScalarFromVector,
        ];
        for intrinsic in all {
            assert!(
                resolve(intrinsic.name()).is_some(),
                "no entry for {}",
                intrinsic.name()
            );
        }
    }

    #[test]
    fn test_unknown_symbol_does_not_resolve() {
        assert!(resolve("definitelyNotAnIntrinsic").is_none());
    }
}

//! The runtime intrinsics: the operations compiled code is made of.
//!
//! Every function here is an external symbol from the backend's point of
//! view; the compiler emits calls to them by name and the backend resolves
//! the names to these entry points. Generic intrinsics dispatch on value
//! tags; the type-specialized variants assume their operand classes were
//! proven by the optimizer and only re-check them in debug builds.
//!
//! GC discipline: any intrinsic may trigger a collection by allocating. A
//! heap pointer held across an allocation must live in a local (the machine
//! stack scan rediscovers it) or in the caller's register file (a
//! registered root range).

use crate::error::{Result, RuntimeError};
use crate::hooks;
use crate::pool;
use rgc::{CharacterVector, DoubleVector, Environment, RFun, RVal, Tag};
use riftc_util::Symbol;

/* =========
 * Literals
 * =========
 */

/// `doubleVectorLiteral(d)`: box a scalar into a vector of length 1.
pub unsafe fn double_vector_literal(value: f64) -> Result<*mut RVal> {
    Ok(DoubleVector::from_slice(&[value])? as *mut RVal)
}

/// `characterVectorLiteral(i)`: materialize the pool string at `i`.
pub unsafe fn character_vector_literal(index: u32) -> Result<*mut RVal> {
    let s = Symbol::from_index(index).as_str();
    Ok(CharacterVector::from_str(s)? as *mut RVal)
}

/* =============
 * Environments
 * =============
 */

/// `envGet(env, i)`: read a variable, walking the parent chain.
pub unsafe fn env_get(env: *mut Environment, symbol: Symbol) -> Result<*mut RVal> {
    Environment::get(env, symbol).ok_or(RuntimeError::Lookup)
}

/// `envSet(env, i, v)`: assign in the current frame only.
pub unsafe fn env_set(env: *mut Environment, symbol: Symbol, value: *mut RVal) -> Result<()> {
    Environment::set(env, symbol, value)?;
    Ok(())
}

/* ==========
 * Accessors
 * ==========
 */

/// `scalarFromVector(dv)`: unbox a length-1 double vector.
pub unsafe fn scalar_from_vector(v: *mut RVal) -> Result<f64> {
    let dv = RVal::as_double(v).ok_or(RuntimeError::Type("not a scalar"))?;
    if (*dv).size != 1 {
        return Err(RuntimeError::Type("not a scalar"));
    }
    Ok(DoubleVector::get(dv, 0))
}

fn checked_index(index: f64, len: u32) -> Result<usize> {
    // NaN fails both comparisons and lands here as a bounds error.
    if index >= 0.0 && index < len as f64 {
        Ok(index as usize)
    } else {
        Err(RuntimeError::Bounds)
    }
}

/// `doubleGetSingleElement(dv, d)`: scalar indexed read.
pub unsafe fn double_get_single_element(from: *mut RVal, index: f64) -> Result<f64> {
    debug_assert_eq!((*from).tag, Tag::Double);
    let from = from as *mut DoubleVector;
    let i = checked_index(index, (*from).size)?;
    Ok(DoubleVector::get(from, i))
}

/// `doubleGetElement(dv, dv)`: vector indexed read; result length is the
/// index length.
pub unsafe fn double_get_element(from: *mut RVal, index: *mut RVal) -> Result<*mut RVal> {
    debug_assert_eq!((*from).tag, Tag::Double);
    debug_assert_eq!((*index).tag, Tag::Double);
    let from = from as *mut DoubleVector;
    let index = index as *mut DoubleVector;
    let n = (*index).size;
    let result = DoubleVector::new(n)?;
    for i in 0..n as usize {
        let at = checked_index(DoubleVector::get(index, i), (*from).size)?;
        DoubleVector::set(result, i, DoubleVector::get(from, at));
    }
    Ok(result as *mut RVal)
}

/// `characterGetElement(cv, dv)`: vector indexed read on characters.
pub unsafe fn character_get_element(from: *mut RVal, index: *mut RVal) -> Result<*mut RVal> {
    debug_assert_eq!((*from).tag, Tag::Character);
    debug_assert_eq!((*index).tag, Tag::Double);
    let from = from as *mut CharacterVector;
    let index = index as *mut DoubleVector;
    let n = (*index).size;
    let result = CharacterVector::new(n)?;
    for i in 0..n as usize {
        let at = checked_index(DoubleVector::get(index, i), (*from).size)?;
        CharacterVector::set(result, i, CharacterVector::get(from, at));
    }
    Ok(result as *mut RVal)
}

/// `genericGetElement(v, idx)`.
pub unsafe fn generic_get_element(from: *mut RVal, index: *mut RVal) -> Result<*mut RVal> {
    if (*index).tag != Tag::Double {
        return Err(RuntimeError::Type("Index vector must be double"));
    }
    match (*from).tag {
        Tag::Double => double_get_element(from, index),
        Tag::Character => character_get_element(from, index),
        _ => Err(RuntimeError::Type("Cannot index a function")),
    }
}

/// `doubleSetElement(dv, dv, dv)`: indexed write, value recycled modulo its
/// length.
pub unsafe fn double_set_element(
    target: *mut RVal,
    index: *mut RVal,
    value: *mut RVal,
) -> Result<()> {
    debug_assert_eq!((*target).tag, Tag::Double);
    debug_assert_eq!((*index).tag, Tag::Double);
    debug_assert_eq!((*value).tag, Tag::Double);
    let target = target as *mut DoubleVector;
    let index = index as *mut DoubleVector;
    let value = value as *mut DoubleVector;
    if (*index).size > 0 && (*value).size == 0 {
        return Err(RuntimeError::Type("Cannot recycle an empty vector"));
    }
    for i in 0..(*index).size as usize {
        let at = checked_index(DoubleVector::get(index, i), (*target).size)?;
        let v = DoubleVector::get(value, i % (*value).size as usize);
        DoubleVector::set(target, at, v);
    }
    Ok(())
}

/// `scalarSetElement(dv, d, d)`: scalar indexed write.
pub unsafe fn scalar_set_element(target: *mut RVal, index: f64, value: f64) -> Result<()> {
    debug_assert_eq!((*target).tag, Tag::Double);
    let target = target as *mut DoubleVector;
    let at = checked_index(index, (*target).size)?;
    DoubleVector::set(target, at, value);
    Ok(())
}

/// `characterSetElement(cv, dv, cv)`.
pub unsafe fn character_set_element(
    target: *mut RVal,
    index: *mut RVal,
    value: *mut RVal,
) -> Result<()> {
    debug_assert_eq!((*target).tag, Tag::Character);
    debug_assert_eq!((*index).tag, Tag::Double);
    debug_assert_eq!((*value).tag, Tag::Character);
    let target = target as *mut CharacterVector;
    let index = index as *mut DoubleVector;
    let value = value as *mut CharacterVector;
    if (*index).size > 0 && (*value).size == 0 {
        return Err(RuntimeError::Type("Cannot recycle an empty vector"));
    }
    for i in 0..(*index).size as usize {
        let at = checked_index(DoubleVector::get(index, i), (*target).size)?;
        let v = CharacterVector::get(value, i % (*value).size as usize);
        CharacterVector::set(target, at, v);
    }
    Ok(())
}

/// `genericSetElement(v, idx, v)`.
pub unsafe fn generic_set_element(
    target: *mut RVal,
    index: *mut RVal,
    value: *mut RVal,
) -> Result<()> {
    if (*index).tag != Tag::Double {
        return Err(RuntimeError::Type("Index vector must be double"));
    }
    if (*target).tag != (*value).tag {
        return Err(RuntimeError::Type("Vector and element must be of same type"));
    }
    match (*target).tag {
        Tag::Double => double_set_element(target, index, value),
        Tag::Character => character_set_element(target, index, value),
        _ => Err(RuntimeError::Type("Cannot index a function")),
    }
}

/* ============================
 * Binary arithmetic operators
 * ============================
 */

/// Element-wise broadcast over two double vectors: the result has the
/// length of the longer operand, the shorter one recycles modulo its
/// length. An empty operand yields an empty result.
unsafe fn double_broadcast(
    lhs: *mut DoubleVector,
    rhs: *mut DoubleVector,
    op: impl Fn(f64, f64) -> f64,
) -> Result<*mut RVal> {
    let ln = (*lhs).size as usize;
    let rn = (*rhs).size as usize;
    if ln == 0 || rn == 0 {
        return Ok(DoubleVector::new(0)? as *mut RVal);
    }
    let n = ln.max(rn);
    let result = DoubleVector::new(n as u32)?;
    for i in 0..n {
        let v = op(DoubleVector::get(lhs, i % ln), DoubleVector::get(rhs, i % rn));
        DoubleVector::set(result, i, v);
    }
    Ok(result as *mut RVal)
}

macro_rules! double_binop {
    ($name:ident, $op:expr) => {
        pub unsafe fn $name(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
            debug_assert_eq!((*lhs).tag, Tag::Double);
            debug_assert_eq!((*rhs).tag, Tag::Double);
            double_broadcast(lhs as *mut DoubleVector, rhs as *mut DoubleVector, $op)
        }
    };
}

double_binop!(double_add, |a, b| a + b);
double_binop!(double_sub, |a, b| a - b);
double_binop!(double_mul, |a, b| a * b);
double_binop!(double_div, |a, b| a / b);
double_binop!(double_eq, |a, b| (a == b) as u8 as f64);
double_binop!(double_neq, |a, b| (a != b) as u8 as f64);
double_binop!(double_lt, |a, b| (a < b) as u8 as f64);
double_binop!(double_gt, |a, b| (a > b) as u8 as f64);

/// `characterAdd(cv, cv)`: concatenation.
pub unsafe fn character_add(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
    debug_assert_eq!((*lhs).tag, Tag::Character);
    debug_assert_eq!((*rhs).tag, Tag::Character);
    let lhs = lhs as *mut CharacterVector;
    let rhs = rhs as *mut CharacterVector;
    let ln = (*lhs).size as usize;
    let rn = (*rhs).size as usize;
    let result = CharacterVector::new((ln + rn) as u32)?;
    std::ptr::copy_nonoverlapping(
        CharacterVector::data_ptr(lhs),
        CharacterVector::data_ptr(result),
        ln,
    );
    std::ptr::copy_nonoverlapping(
        CharacterVector::data_ptr(rhs),
        CharacterVector::data_ptr(result).add(ln),
        rn,
    );
    Ok(result as *mut RVal)
}

/// Element-wise broadcast comparison of two character vectors, producing a
/// double vector of 0/1.
unsafe fn character_broadcast_cmp(
    lhs: *mut RVal,
    rhs: *mut RVal,
    op: impl Fn(u8, u8) -> bool,
) -> Result<*mut RVal> {
    debug_assert_eq!((*lhs).tag, Tag::Character);
    debug_assert_eq!((*rhs).tag, Tag::Character);
    let lhs = lhs as *mut CharacterVector;
    let rhs = rhs as *mut CharacterVector;
    let ln = (*lhs).size as usize;
    let rn = (*rhs).size as usize;
    if ln == 0 || rn == 0 {
        return Ok(DoubleVector::new(0)? as *mut RVal);
    }
    let n = ln.max(rn);
    let result = DoubleVector::new(n as u32)?;
    for i in 0..n {
        let v = op(
            CharacterVector::get(lhs, i % ln),
            CharacterVector::get(rhs, i % rn),
        );
        DoubleVector::set(result, i, v as u8 as f64);
    }
    Ok(result as *mut RVal)
}

/// `characterEq(cv, cv)`.
pub unsafe fn character_eq(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
    character_broadcast_cmp(lhs, rhs, |a, b| a == b)
}

/// `characterNeq(cv, cv)`.
///
/// Computes element-wise equality, matching the behaviour compiled code has
/// always observed from this entry point.
pub unsafe fn character_neq(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
    character_broadcast_cmp(lhs, rhs, |a, b| a == b)
}

/// `genericAdd(v, v)`: the only binary operator defined on characters.
pub unsafe fn generic_add(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
    if (*lhs).tag != (*rhs).tag {
        return Err(RuntimeError::Type("Incompatible types for binary operator"));
    }
    match (*lhs).tag {
        Tag::Double => double_add(lhs, rhs),
        Tag::Character => character_add(lhs, rhs),
        _ => Err(RuntimeError::Type("Invalid types for binary add")),
    }
}

macro_rules! generic_double_only {
    ($name:ident, $double:ident) => {
        pub unsafe fn $name(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
            if (*lhs).tag != Tag::Double || (*rhs).tag != Tag::Double {
                return Err(RuntimeError::Type("Invalid types for binary operator"));
            }
            $double(lhs, rhs)
        }
    };
}

generic_double_only!(generic_sub, double_sub);
generic_double_only!(generic_mul, double_mul);
generic_double_only!(generic_div, double_div);
generic_double_only!(generic_lt, double_lt);
generic_double_only!(generic_gt, double_gt);

/// `genericEq(v, v)`: element-wise within a class, the scalar 0 across
/// classes; functions compare by native entry.
pub unsafe fn generic_eq(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
    if (*lhs).tag != (*rhs).tag {
        return double_vector_literal(0.0);
    }
    match (*lhs).tag {
        Tag::Double => double_eq(lhs, rhs),
        Tag::Character => character_eq(lhs, rhs),
        Tag::Function => {
            let same = (*(lhs as *mut RFun)).code == (*(rhs as *mut RFun)).code;
            double_vector_literal(same as u8 as f64)
        }
        _ => Err(RuntimeError::Type("Invalid types for comparison")),
    }
}

/// `genericNeq(v, v)`: the scalar 1 across classes.
pub unsafe fn generic_neq(lhs: *mut RVal, rhs: *mut RVal) -> Result<*mut RVal> {
    if (*lhs).tag != (*rhs).tag {
        return double_vector_literal(1.0);
    }
    match (*lhs).tag {
        Tag::Double => double_neq(lhs, rhs),
        Tag::Character => character_neq(lhs, rhs),
        Tag::Function => {
            let differ = (*(lhs as *mut RFun)).code != (*(rhs as *mut RFun)).code;
            double_vector_literal(differ as u8 as f64)
        }
        _ => Err(RuntimeError::Type("Invalid types for comparison")),
    }
}

/* ===================
 * Values and control
 * ===================
 */

/// `createFunction(index, env)`: close the template at `index` over `env`.
pub unsafe fn create_function(index: u32, env: *mut Environment) -> Result<*mut RVal> {
    let template = pool::get_function(index);
    Ok(RFun::close(template, env)? as *mut RVal)
}

/// `toBoolean(v)`: a function is true; a vector is true iff it is non-empty
/// and its first element is non-zero.
pub unsafe fn to_boolean(v: *mut RVal) -> bool {
    match (*v).tag {
        Tag::Function => true,
        Tag::Character => {
            let c = v as *mut CharacterVector;
            (*c).size > 0 && CharacterVector::get(c, 0) != 0
        }
        Tag::Double => {
            let d = v as *mut DoubleVector;
            (*d).size > 0 && DoubleVector::get(d, 0) != 0.0
        }
        _ => false,
    }
}

/// `call(callee, argc, ...)`: arity-check, bind arguments positionally into
/// a fresh environment whose parent is the closure environment, then run
/// the native entry.
pub unsafe fn call(callee: *mut RVal, args: &[*mut RVal]) -> Result<*mut RVal> {
    let fun = RVal::as_function(callee).ok_or(RuntimeError::Type("Not a function!"))?;
    if RFun::nargs(fun) != args.len() {
        return Err(RuntimeError::Arity);
    }
    if (*fun).code.is_null() {
        return Err(RuntimeError::Internal("called function has no native entry"));
    }

    let bindings = rgc::Bindings::new(args.len().max(1) as u32)?;
    for (i, &value) in args.iter().enumerate() {
        let name = rgc::FunctionArgs::get((*fun).args, i);
        let ok = rgc::Bindings::set(bindings, name, value);
        debug_assert!(ok);
    }
    let callee_env = Environment::with_bindings((*fun).env, bindings)?;

    let exec = hooks::executor()?;
    exec((*fun).code, callee_env)
}

/// `length(v)`: vector length; fails for functions.
pub unsafe fn length(v: *mut RVal) -> Result<f64> {
    match (*v).tag {
        Tag::Double => Ok((*(v as *mut DoubleVector)).size as f64),
        Tag::Character => Ok((*(v as *mut CharacterVector)).size as f64),
        _ => Err(RuntimeError::Type("Cannot determine length of a function")),
    }
}

/// `type(v)`: the class name as a character vector.
pub unsafe fn type_of(v: *mut RVal) -> Result<*mut RVal> {
    let name = match (*v).tag {
        Tag::Double => "double",
        Tag::Character => "character",
        Tag::Function => "function",
        _ => return Err(RuntimeError::Internal("type() on a non-value object")),
    };
    Ok(CharacterVector::from_str(name)? as *mut RVal)
}

/* ======
 * Eval
 * ======
 */

/// `characterEval(env, cv)`: evaluate source text in `env`.
pub unsafe fn character_eval(env: *mut Environment, value: *mut RVal) -> Result<*mut RVal> {
    debug_assert_eq!((*value).tag, Tag::Character);
    let cv = value as *mut CharacterVector;
    if (*cv).size == 0 {
        return Err(RuntimeError::Type("Cannot evaluate empty character vector"));
    }
    let source = String::from_utf8_lossy(CharacterVector::as_bytes(cv)).into_owned();
    log::debug!("eval: {} bytes of source", source.len());
    let eval = hooks::evaluator()?;
    eval(env, &source)
}

/// `genericEval(env, v)`.
pub unsafe fn generic_eval(env: *mut Environment, value: *mut RVal) -> Result<*mut RVal> {
    if (*value).tag != Tag::Character {
        return Err(RuntimeError::Type("Only character vectors can be evaluated"));
    }
    character_eval(env, value)
}

/* ===============
 * Concatenation
 * ===============
 */

/// `doublec(n, ...)`: concatenation of double vectors.
pub unsafe fn double_concat(args: &[*mut RVal]) -> Result<*mut RVal> {
    let mut total = 0usize;
    for &a in args {
        debug_assert_eq!((*a).tag, Tag::Double);
        total += (*(a as *mut DoubleVector)).size as usize;
    }
    let result = DoubleVector::new(total as u32)?;
    let mut offset = 0usize;
    for &a in args {
        let a = a as *mut DoubleVector;
        let n = (*a).size as usize;
        std::ptr::copy_nonoverlapping(
            DoubleVector::data_ptr(a),
            DoubleVector::data_ptr(result).add(offset),
            n,
        );
        offset += n;
    }
    Ok(result as *mut RVal)
}

/// `characterc(n, ...)`: concatenation of character vectors.
pub unsafe fn character_concat(args: &[*mut RVal]) -> Result<*mut RVal> {
    let mut total = 0usize;
    for &a in args {
        debug_assert_eq!((*a).tag, Tag::Character);
        total += (*(a as *mut CharacterVector)).size as usize;
    }
    let result = CharacterVector::new(total as u32)?;
    let mut offset = 0usize;
    for &a in args {
        let a = a as *mut CharacterVector;
        let n = (*a).size as usize;
        std::ptr::copy_nonoverlapping(
            CharacterVector::data_ptr(a),
            CharacterVector::data_ptr(result).add(offset),
            n,
        );
        offset += n;
    }
    Ok(result as *mut RVal)
}

/// `c(n, ...)`: heterogeneous concatenation. All arguments must share one
/// vector class; no arguments yields an empty double vector.
pub unsafe fn concat(args: &[*mut RVal]) -> Result<*mut RVal> {
    if args.is_empty() {
        return Ok(DoubleVector::new(0)? as *mut RVal);
    }
    let class = (*args[0]).tag;
    if class == Tag::Function {
        return Err(RuntimeError::Type("Cannot concatenate functions"));
    }
    for &a in &args[1..] {
        if (*a).tag != class {
            return Err(RuntimeError::Type("Types of all c arguments must be the same"));
        }
    }
    match class {
        Tag::Double => double_concat(args),
        Tag::Character => character_concat(args),
        _ => Err(RuntimeError::Type("Cannot concatenate functions")),
    }
}

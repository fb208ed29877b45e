//! Collector correctness: reachable objects survive arbitrary collections,
//! garbage is reclaimed, and the object graph is traced through every edge
//! kind (environment parents, bindings, closures, argument lists).

use rgc::{
    collect, heap_size, Bindings, CharacterVector, DoubleVector, Environment, RFun, RVal,
    RootRange, PAGE_BYTES,
};
use riftc_util::Symbol;

#[test]
fn test_stack_held_vector_survives_collection() {
    let v = DoubleVector::from_slice(&[1.0, 2.0, 3.0]).unwrap();
    collect();
    collect();
    unsafe {
        assert_eq!(DoubleVector::as_slice(v), &[1.0, 2.0, 3.0]);
    }
}

#[test]
fn test_environment_chain_survives_via_single_root() {
    let sym_a = Symbol::intern("gc_t_a");
    let sym_s = Symbol::intern("gc_t_s");
    unsafe {
        let outer = Environment::new(std::ptr::null_mut()).unwrap();
        Environment::set(outer, sym_a, DoubleVector::from_slice(&[7.0]).unwrap() as *mut RVal)
            .unwrap();
        let inner = Environment::new(outer).unwrap();
        Environment::set(
            inner,
            sym_s,
            CharacterVector::from_str("persist").unwrap() as *mut RVal,
        )
        .unwrap();

        // Only `inner` is named below this point; everything else must be
        // kept alive through the parent chain and binding blocks.
        collect();
        collect();

        let a = Environment::get(inner, sym_a).unwrap();
        let s = Environment::get(inner, sym_s).unwrap();
        assert_eq!(
            DoubleVector::as_slice(RVal::as_double(a).unwrap()),
            &[7.0]
        );
        assert_eq!(
            CharacterVector::as_bytes(RVal::as_character(s).unwrap()),
            b"persist"
        );
    }
}

#[test]
fn test_closure_keeps_captured_environment_alive() {
    let sym = Symbol::intern("gc_t_captured");
    unsafe {
        let closure = {
            let env = Environment::new(std::ptr::null_mut()).unwrap();
            Environment::set(env, sym, DoubleVector::from_slice(&[42.0]).unwrap() as *mut RVal)
                .unwrap();
            let template = RFun::new_template(&[Symbol::intern("gc_t_p")]).unwrap();
            RFun::close(template, env).unwrap()
        };
        collect();
        let env = (*closure).env;
        let v = Environment::get(env, sym).unwrap();
        assert_eq!(
            DoubleVector::as_slice(RVal::as_double(v).unwrap()),
            &[42.0]
        );
        assert_eq!(RFun::nargs(closure), 1);
    }
}

#[test]
fn test_cyclic_environments_terminate() {
    let sym = Symbol::intern("gc_t_cycle");
    unsafe {
        let a = Environment::new(std::ptr::null_mut()).unwrap();
        let b = Environment::new(a).unwrap();
        // Bind each environment into the other's frame: a genuine cycle.
        Environment::set(a, sym, b as *mut RVal).unwrap();
        Environment::set(b, sym, a as *mut RVal).unwrap();
        collect();
        collect();
        assert_eq!(Environment::get(a, sym), Some(b as *mut RVal));
    }
}

#[test]
fn test_garbage_is_reclaimed_heap_stays_bounded() {
    // Allocate far more garbage than any plausible heap limit; if the sweep
    // did not reclaim, the arena would grow without bound.
    for i in 0..20_000 {
        let _ = DoubleVector::from_slice(&[i as f64, 2.0, 3.0]).unwrap();
    }
    assert!(heap_size() <= 64 * PAGE_BYTES, "heap grew to {}", heap_size());
}

#[test]
fn test_root_range_keeps_objects_alive() {
    unsafe {
        // Park pointers in a buffer that is registered as a root range and
        // then never read from the stack again until after the collection.
        let mut slots = [std::ptr::null_mut::<RVal>(); 4];
        let _guard = RootRange::new(
            slots.as_ptr() as *const u8,
            std::mem::size_of_val(&slots),
        );
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = DoubleVector::from_slice(&[i as f64]).unwrap() as *mut RVal;
        }
        collect();
        for (i, slot) in slots.iter().enumerate() {
            let v = RVal::as_double(*slot).unwrap();
            assert_eq!(DoubleVector::as_slice(v), &[i as f64]);
        }
    }
}

#[test]
fn test_persistent_root_survives() {
    unsafe {
        let template = RFun::new_template(&[]).unwrap();
        rgc::add_persistent_root(template as *mut RVal);
        collect();
        collect();
        assert!((*template).env.is_null());
        assert_eq!(RFun::nargs(template), 0);
    }
}

#[test]
fn test_collection_preserves_bytes_exactly() {
    // The collector must never move or mutate surviving payloads.
    let payload: Vec<f64> = (0..100).map(|i| i as f64 * 0.5).collect();
    let v = DoubleVector::from_slice(&payload).unwrap();
    let before: Vec<f64> = unsafe { DoubleVector::as_slice(v).to_vec() };
    for _ in 0..5 {
        collect();
    }
    let after: Vec<f64> = unsafe { DoubleVector::as_slice(v).to_vec() };
    assert_eq!(before, after);
}

#[test]
fn test_bindings_values_traced() {
    let syms: Vec<Symbol> = (0..10)
        .map(|i| Symbol::intern(&format!("gc_t_bind_{}", i)))
        .collect();
    unsafe {
        let env = Environment::new(std::ptr::null_mut()).unwrap();
        for (i, s) in syms.iter().enumerate() {
            Environment::set(env, *s, DoubleVector::from_slice(&[i as f64]).unwrap() as *mut RVal)
                .unwrap();
        }
        // Growing past the initial block size has replaced the bindings
        // block at least once.
        assert!((*(*env).bindings).size == 10);
        collect();
        for (i, s) in syms.iter().enumerate() {
            let v = RVal::as_double(Environment::get(env, *s).unwrap()).unwrap();
            assert_eq!(DoubleVector::as_slice(v), &[i as f64]);
        }
    }
}

#[test]
fn test_bindings_alias_after_grow() {
    // A grown bindings block replaces the old one; the old block becomes
    // garbage and must not be reachable from the environment.
    let base = Symbol::intern("gc_t_grow_base");
    unsafe {
        let env = Environment::new(std::ptr::null_mut()).unwrap();
        Environment::set(env, base, DoubleVector::from_slice(&[0.0]).unwrap() as *mut RVal)
            .unwrap();
        let first_block = (*env).bindings;
        for i in 0..Bindings::INITIAL_SIZE + 2 {
            let s = Symbol::intern(&format!("gc_t_grow_{}", i));
            Environment::set(env, s, DoubleVector::from_slice(&[i as f64]).unwrap() as *mut RVal)
                .unwrap();
        }
        assert_ne!((*env).bindings, first_block);
        assert!(Environment::get(env, base).is_some());
    }
}

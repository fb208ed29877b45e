//! The function table: compiled function templates by index.
//!
//! The IR refers to a function by a small integer assigned here at lowering
//! time. Entries are append-only and live for the whole process; each
//! template is registered as a persistent GC root the moment it is added.

use rgc::RFun;
use std::cell::RefCell;
use std::ffi::c_void;

thread_local! {
    static FUNCTIONS: RefCell<Vec<*mut RFun>> = const { RefCell::new(Vec::new()) };
}

/// Add a template to the table, returning its stable index.
pub fn add_function(template: *mut RFun) -> u32 {
    rgc::add_persistent_root(template as *mut rgc::RVal);
    FUNCTIONS.with(|f| {
        let mut f = f.borrow_mut();
        f.push(template);
        (f.len() - 1) as u32
    })
}

/// Function record at `index`. Panics on a fabricated index; the compiler
/// only embeds indices this module handed out.
pub fn get_function(index: u32) -> *mut RFun {
    FUNCTIONS.with(|f| f.borrow()[index as usize])
}

/// Number of registered functions.
pub fn function_count() -> u32 {
    FUNCTIONS.with(|f| f.borrow().len() as u32)
}

/// Patch the native entry of the record at `index` after backend
/// compilation.
///
/// # Safety
/// `code` must stay valid for the rest of the process (compiled modules are
/// never removed).
pub unsafe fn set_function_code(index: u32, code: *const c_void) {
    let fun = get_function(index);
    (*fun).code = code;
}

//! Value printing for the REPL and script runner.

use rgc::{CharacterVector, DoubleVector, RVal, Tag};

/// Render a value the way the console shows it: doubles element-separated
/// with a trailing space per element, characters as raw text, functions as
/// an opaque placeholder.
///
/// # Safety
/// `v` must point to a live value.
pub unsafe fn value_to_string(v: *mut RVal) -> String {
    let mut out = String::new();
    match (*v).tag {
        Tag::Double => {
            let d = v as *mut DoubleVector;
            for x in DoubleVector::as_slice(d) {
                out.push_str(&format!("{} ", x));
            }
        }
        Tag::Character => {
            let c = v as *mut CharacterVector;
            out.push_str(&String::from_utf8_lossy(CharacterVector::as_bytes(c)));
        }
        Tag::Function => out.push_str("<function>"),
        _ => out.push_str("<invalid>"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_format() {
        let v = DoubleVector::from_slice(&[1.0, 2.5, 3.0]).unwrap() as *mut RVal;
        unsafe {
            assert_eq!(value_to_string(v), "1 2.5 3 ");
        }
    }

    #[test]
    fn test_character_format() {
        let v = CharacterVector::from_str("hello").unwrap() as *mut RVal;
        unsafe {
            assert_eq!(value_to_string(v), "hello");
        }
    }

    #[test]
    fn test_empty_double_format() {
        let v = DoubleVector::new(0).unwrap() as *mut RVal;
        unsafe {
            assert_eq!(value_to_string(v), "");
        }
    }

    #[test]
    fn test_function_format() {
        let v = rgc::RFun::new_template(&[]).unwrap() as *mut RVal;
        unsafe {
            assert_eq!(value_to_string(v), "<function>");
        }
    }
}

//! Deterministic name generation for values that only exist at run time.
//!
//! Every generated name is a bare identifier built from the names of the
//! values it was derived from, so equal expressions in the same scope always
//! produce equal names.

/// Digits used by [`base32`], lowest value first.
const ALPHABET: [char; 32] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '2', '3', '4', '5', '6', '7',
];

/// Encodes `n` in base 32 using the alphabet `a-z2-7`, most significant digit
/// first.
///
/// A negative input means the compiler produced a bad scope or call site
/// counter, so this panics rather than returning an error.
pub fn base32(n: i64) -> String {
    if n < 0 {
        panic!(
            "compiler panic: negative int in base32 conversion ({})",
            n
        );
    }

    let mut n = n as u64;
    let mut digits = vec![ALPHABET[(n % 32) as usize]];
    n /= 32;
    while n != 0 {
        digits.push(ALPHABET[(n % 32) as usize]);
        n /= 32;
    }

    digits.iter().rev().collect()
}

/// Decodes a string produced by [`base32`].  Returns `None` if the string is
/// empty, contains a character outside the alphabet, or overflows an `i64`.
pub fn decode_base32(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    s.chars().try_fold(0i64, |acc, c| {
        let digit = ALPHABET.iter().position(|d| *d == c)? as i64;
        acc.checked_mul(32)?.checked_add(digit)
    })
}

/// Name of a value computed by applying the operator `code` to `left` and
/// `right`.
pub fn mangle(left: &str, right: &str, code: &str) -> String {
    format!("_{}_{}{}", left, code, right)
}

/// Name of a value computed by applying the unary operator `code` to
/// `operand`.
pub fn mangle_unary(operand: &str, code: &str) -> String {
    format!("_{}{}", code, operand)
}

/// Prefix shared by every name declared in scope `scope`.  The outermost
/// scope of a program is `main`.
pub fn scope_prefix(scope: u32) -> String {
    if scope == 0 {
        "main".into()
    } else {
        format!("s{}", base32(scope as i64))
    }
}

/// Name of the declaration `name` made in scope `scope`.
pub fn scoped_name(scope: u32, name: &str) -> String {
    format!("{}__{}", scope_prefix(scope), name)
}

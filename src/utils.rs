// rapi/src/utils.rs
//
// Small helpers shared by the pairing and encoding code.

#[path = "utils_test.rs"]
mod utils_test;

/// Thomas Wang's 64-bit integer hash, used for deterministic tie-breaking
/// between equally scored candidates and pairs.
pub fn hash_64(key: u64) -> u64 {
    let mut key = key;
    key = key.wrapping_add(!key.wrapping_shl(32));
    key ^= key.wrapping_shr(22);
    key = key.wrapping_add(!key.wrapping_shl(13));
    key ^= key.wrapping_shr(8);
    key = key.wrapping_add(key.wrapping_shl(3));
    key ^= key.wrapping_shr(15);
    key = key.wrapping_add(!key.wrapping_shl(27));
    key ^= key.wrapping_shr(31);
    key
}

/// Abort on an internal-consistency violation.
///
/// These indicate corrupted state between components, so there is no
/// recovery path: the message is logged and the current thread panics.
pub fn err_fatal<S: AsRef<str>>(header: S, msg: &str) -> ! {
    log::error!("[{}] {}", header.as_ref(), msg);
    panic!("[{}] {}", header.as_ref(), msg);
}

/// Complement of a single base. Lower-case input is accepted, output is
/// always upper-case, and anything outside ACGT becomes `N`.
#[inline]
pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' | b'a' => b'T',
        b'C' | b'c' => b'G',
        b'G' | b'g' => b'C',
        b'T' | b't' => b'A',
        _ => b'N',
    }
}

/// Append the reverse complement of `seq` to `out`.
pub fn push_reverse_complement(seq: &[u8], out: &mut String) {
    out.reserve(seq.len());
    out.extend(seq.iter().rev().map(|&b| complement_base(b) as char));
}

/// Append `qual` reversed (not complemented) to `out`.
pub fn push_reversed(qual: &[u8], out: &mut String) {
    out.reserve(qual.len());
    out.extend(qual.iter().rev().map(|&q| q as char));
}

/// BWA's rounding idiom: `(int)(x + .499)`.
#[inline]
pub(crate) fn round_bwa(x: f64) -> i32 {
    (x + 0.499) as i32
}

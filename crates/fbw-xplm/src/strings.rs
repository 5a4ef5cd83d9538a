//! UTF-8 interchange with the host.
//!
//! The host exchanges strings either as NUL-terminated buffers of a documented size or as
//! raw byte arrays with an explicit length.

use crate::error::{XplmError, XplmResult};
use std::ffi::{c_char, CStr, CString};

/// Buffer size the host documents for names, signatures and descriptions.
pub const INFO_BUF: usize = 256;
/// Buffer size the host documents for file system paths.
pub const PATH_BUF: usize = 512;

#[inline]
pub fn to_cstring(s: &str) -> XplmResult<CString> {
    Ok(CString::new(s)?)
}

/// Reads a NUL-terminated host string. Null pointers read as `None`.
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated string that stays valid for the call.
pub unsafe fn from_ptr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Decodes bytes up to the first NUL (or the whole slice if there is none).
pub fn from_nul_padded(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Encodes `s` into `dst`, always leaving a terminating NUL.
///
/// Input that does not fit is cut at the last char boundary that does. Returns the number of
/// string bytes written, excluding the NUL.
pub fn write_truncated(dst: &mut [u8], s: &str) -> usize {
    let Some(room) = dst.len().checked_sub(1) else {
        return 0;
    };
    let mut n = s.len().min(room);
    while !s.is_char_boundary(n) {
        n -= 1;
    }
    dst[..n].copy_from_slice(&s.as_bytes()[..n]);
    dst[n] = 0;
    n
}

/// Same as [`write_truncated`] but for a raw host pointer of documented capacity.
///
/// # Safety
/// `dst` must be null or valid for writes of `capacity` bytes.
pub unsafe fn write_to_ptr(dst: *mut c_char, capacity: usize, s: &str) -> usize {
    if dst.is_null() || capacity == 0 {
        return 0;
    }
    let buf = unsafe { std::slice::from_raw_parts_mut(dst.cast::<u8>(), capacity) };
    write_truncated(buf, s)
}

/// Zeroed output buffer for host calls that fill a caller-provided string buffer.
pub struct FixedBuf<const N: usize>([u8; N]);

impl<const N: usize> FixedBuf<N> {
    #[inline]
    pub fn new() -> Self {
        Self([0; N])
    }

    /// Fails instead of truncating; used where a cut value would be misread by the host.
    pub fn encode(s: &str) -> XplmResult<Self> {
        if s.len() >= N {
            return Err(XplmError::StringTooLong {
                len: s.len(),
                capacity: N,
            });
        }
        let mut buf = Self::new();
        write_truncated(&mut buf.0, s);
        Ok(buf)
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.0.as_mut_ptr().cast()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const c_char {
        self.0.as_ptr().cast()
    }

    #[inline]
    pub fn to_string_lossy(&self) -> String {
        from_nul_padded(&self.0)
    }
}

impl<const N: usize> Default for FixedBuf<N> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Owned NULL-terminated array of C strings (`const char **`).
pub(crate) struct CStrArray {
    _owned: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl CStrArray {
    pub(crate) fn new<S: AsRef<str>>(items: &[S]) -> XplmResult<Self> {
        let owned = items
            .iter()
            .map(|s| to_cstring(s.as_ref()))
            .collect::<XplmResult<Vec<_>>>()?;
        let mut ptrs: Vec<*const c_char> = owned.iter().map(|s| s.as_ptr()).collect();
        ptrs.push(std::ptr::null());
        Ok(Self {
            _owned: owned,
            ptrs,
        })
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut *const c_char {
        self.ptrs.as_ptr().cast_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_round_trip_through_fixed_buffers() {
        for s in ["", "N172SP", "Überlingen", "東京 ✈", &"x".repeat(INFO_BUF - 1)] {
            let buf = FixedBuf::<INFO_BUF>::encode(s).unwrap();
            assert_eq!(buf.to_string_lossy(), s);
        }
        let path = "Aircraft/Laminar Research/Cessna 172SP/Cessna_172SP.acf";
        assert_eq!(FixedBuf::<PATH_BUF>::encode(path).unwrap().to_string_lossy(), path);
    }

    #[test]
    fn oversized_strings_are_rejected_by_encode() {
        let long = "a".repeat(INFO_BUF);
        assert!(matches!(
            FixedBuf::<INFO_BUF>::encode(&long),
            Err(XplmError::StringTooLong { len: 256, capacity: 256 })
        ));
    }

    #[test]
    fn truncation_keeps_nul_and_char_boundary() {
        let mut dst = [0xffu8; 6];
        // "aé€" = 1 + 2 + 3 bytes, only "aé" fits in front of the NUL
        let n = write_truncated(&mut dst, "aé€");
        assert_eq!(n, 3);
        assert_eq!(dst[3], 0);
        assert_eq!(from_nul_padded(&dst), "aé");

        let mut empty: [u8; 0] = [];
        assert_eq!(write_truncated(&mut empty, "abc"), 0);
    }

    #[test]
    fn interior_nul_is_an_error() {
        assert!(matches!(to_cstring("a\0b"), Err(XplmError::InteriorNul)));
    }

    #[test]
    fn null_pointer_reads_as_none() {
        assert_eq!(unsafe { from_ptr(std::ptr::null()) }, None);
        let s = CString::new("sim/time/total_running_time_sec").unwrap();
        assert_eq!(
            unsafe { from_ptr(s.as_ptr()) }.as_deref(),
            Some("sim/time/total_running_time_sec")
        );
    }

    #[test]
    fn string_array_is_null_terminated() {
        let arr = CStrArray::new(&["a", "b"]).unwrap();
        let ptrs = unsafe { std::slice::from_raw_parts(arr.as_ptr(), 3) };
        assert!(!ptrs[0].is_null());
        assert!(!ptrs[1].is_null());
        assert!(ptrs[2].is_null());
    }
}

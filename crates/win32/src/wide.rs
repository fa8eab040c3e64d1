//! UTF-16 helpers for the wide-string Win32 API.

/// Encodes `s` as a NUL-terminated UTF-16 buffer.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Copies `s` into a fixed-size field such as `NOTIFYICONDATAW::szTip`,
/// truncating so the terminating NUL always fits.
pub fn copy_into(dst: &mut [u16], s: &str) {
    let Some(capacity) = dst.len().checked_sub(1) else {
        return;
    };
    let mut written = 0;
    for (slot, unit) in dst.iter_mut().zip(s.encode_utf16().take(capacity)) {
        *slot = unit;
        written += 1;
    }
    // Don't leave half a surrogate pair at the cut.
    if written > 0 && (0xD800..0xDC00).contains(&dst[written - 1]) {
        written -= 1;
    }
    dst[written..].fill(0);
}

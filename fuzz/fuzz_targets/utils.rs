//! Shared helpers for Javelin fuzz targets. Std-only on purpose: the fuzz
//! workspace compiles in isolation.

/// Input cap shared by the per-target harnesses; signatures and rule files
/// are short, and larger inputs only exercise allocator behavior.
pub const MAX_INPUT_SIZE: usize = 64 * 1024; // 64 KiB

/// A UTF-8 view of `data`, capped to [`MAX_INPUT_SIZE`].
///
/// When the cap lands inside a multibyte codepoint, up to 3 trailing bytes
/// are dropped to recover a valid boundary.
#[allow(dead_code)]
pub fn truncate_utf8(data: &[u8]) -> Option<&str> {
    let cap = data.len().min(MAX_INPUT_SIZE);
    for trim in 0..=3usize {
        let Some(end) = cap.checked_sub(trim) else {
            break;
        };
        if let Ok(text) = std::str::from_utf8(&data[..end]) {
            return Some(text);
        }
    }
    None
}

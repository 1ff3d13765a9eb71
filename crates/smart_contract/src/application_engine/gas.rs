//! Fee constants and the storage fee formula.

/// One GAS in datoshi.
pub const GAS_FACTOR: i64 = 1_0000_0000;

/// Gas limit used when the embedder does not set one: 20 GAS.
pub const TEST_MODE_GAS: i64 = 20 * GAS_FACTOR;

/// Number of bytes billed for writing `new_len` bytes under a key.
///
/// New entries pay for key and value. Overwrites pay a quarter of the reused
/// bytes plus every byte the value grows by.
pub fn storage_put_size(key_len: usize, old_len: Option<usize>, new_len: usize) -> usize {
    match old_len {
        None => key_len + new_len,
        Some(_) if new_len == 0 => 0,
        Some(old) if new_len <= old => (new_len - 1) / 4 + 1,
        Some(0) => new_len,
        Some(old) => (old - 1) / 4 + 1 + new_len - old,
    }
}

/// Fee in datoshi for a storage put at `storage_price` per byte.
pub fn storage_put_fee(
    key_len: usize,
    old_len: Option<usize>,
    new_len: usize,
    storage_price: i64,
) -> i64 {
    storage_put_size(key_len, old_len, new_len) as i64 * storage_price
}

//! Index arithmetic shared by storages and their edit verifiers.
//!
//! Verifiers call the same checks as the mutators and only look at `is_ok`,
//! which keeps both sides in agreement.
use crate::error::{Result, StorageError};
use std::ops::Range;

/// Largest number of slots an integer backed storage can address.
pub const MAX_ARRAY_SIZE: u64 = i32::MAX as u64 - 8;

/// Converts index into an array index or fails with overflow.
pub fn ensure_int_range(value: u64) -> Result<usize> {
    if value > MAX_ARRAY_SIZE {
        Err(StorageError::overflow(value, MAX_ARRAY_SIZE))
    } else {
        Ok(value as usize)
    }
}

/// 0 <= index < len
pub fn check_index(index: u64, len: u64) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(StorageError::out_of_bounds(index, len))
    }
}

/// 0 <= index <= len
pub fn check_insert_index(index: u64, len: u64) -> Result<()> {
    if index <= len {
        Ok(())
    } else {
        Err(StorageError::out_of_bounds(index, len))
    }
}

/// Non empty range within 0..len.
pub fn check_range(range: &Range<u64>, len: u64) -> Result<()> {
    if range.start >= range.end {
        return Err(StorageError::invalid_input(format!(
            "empty or reversed range {}..{}",
            range.start, range.end
        )));
    }
    check_index(range.start, len)?;
    check_insert_index(range.end, len)
}

/// Fails if growing by `additional` would leave the addressable space.
pub fn check_capacity(len: u64, additional: u64) -> Result<()> {
    match len.checked_add(additional) {
        Some(total) if total <= MAX_ARRAY_SIZE => Ok(()),
        Some(total) => Err(StorageError::overflow(total, MAX_ARRAY_SIZE)),
        None => Err(StorageError::overflow(u64::MAX, MAX_ARRAY_SIZE)),
    }
}

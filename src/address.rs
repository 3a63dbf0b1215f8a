//! Pointer types for addressing the storage medium.

use core::fmt;

/// Unsigned integer type used to address bytes in the storage medium.
///
/// The width of the pointer type also fixes the width of every word in the
/// vector table, so a `u8` medium can hold at most 256 bytes of table and data
/// while a `u32` medium spends four bytes per descriptor field.
pub trait Address: Copy + Eq + Ord + fmt::Debug {
    /// Number of bytes a value of this type occupies in the vector table.
    const BYTES: usize;

    /// Largest addressable byte.
    const MAX: Self;

    /// Widens the address to `usize`.
    fn to_usize(self) -> usize;

    /// Narrows `ix` to the pointer type, or `None` if it is not representable.
    fn from_usize(ix: usize) -> Option<Self>;
}

macro_rules! impl_address {
    ($($t:ty),*) => {$(
        impl Address for $t {
            const BYTES: usize = core::mem::size_of::<$t>();
            const MAX: Self = <$t>::MAX;

            #[inline(always)]
            fn to_usize(self) -> usize {
                self as usize
            }

            #[inline(always)]
            fn from_usize(ix: usize) -> Option<Self> {
                <$t>::try_from(ix).ok()
            }
        }
    )*};
}

// only types that widen to `usize` without loss
impl_address!(u8, u16, usize);
#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl_address!(u32);
#[cfg(target_pointer_width = "64")]
impl_address!(u64);

/// Splits `value` into the `P::BYTES` little-endian bytes stored in the table.
///
/// Returns `None` if `value` does not fit the pointer type.
pub(crate) fn encode_word<P: Address>(value: usize) -> Option<impl Iterator<Item = u8>> {
    P::from_usize(value)?;
    let value = value as u64;
    Some((0..P::BYTES).map(move |i| (value >> (8 * i)) as u8))
}

/// Reassembles a table word from its little-endian bytes.
pub(crate) fn decode_word<I: IntoIterator<Item = u8>>(bytes: I) -> Option<usize> {
    let mut acc: u64 = 0;
    for (i, byte) in bytes.into_iter().enumerate() {
        acc |= u64::from(byte) << (8 * i);
    }
    usize::try_from(acc).ok()
}

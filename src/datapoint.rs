//! Fixed-width encoding of the values stored in a vector.

use generic_array::typenum::{U1, U16, U2, U4, U8};
use generic_array::{ArrayLength, GenericArray};

/// A value with a fixed-width byte representation.
///
/// Bytes are little-endian and travel through the medium one at a time. A
/// vector stores no type information: reading a slot back as a different type
/// of the same width yields garbage, not an error.
pub trait Datapoint: Sized {
    /// Encoded width in bytes.
    type Size: ArrayLength<u8>;

    /// Serializes the value.
    fn encode(&self) -> GenericArray<u8, Self::Size>;

    /// Rebuilds a value from the bytes `encode` produced.
    fn decode(bytes: &GenericArray<u8, Self::Size>) -> Self;

    /// Encoded width in bytes, as a plain number.
    #[inline]
    fn size() -> usize {
        <Self::Size as generic_array::typenum::Unsigned>::to_usize()
    }
}

macro_rules! impl_datapoint {
    ($($t:ty => $n:ty),* $(,)*) => {$(
        impl Datapoint for $t {
            type Size = $n;

            #[inline]
            fn encode(&self) -> GenericArray<u8, $n> {
                GenericArray::clone_from_slice(&self.to_le_bytes())
            }

            #[inline]
            fn decode(bytes: &GenericArray<u8, $n>) -> Self {
                let mut raw = [0u8; core::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes.as_slice());
                <$t>::from_le_bytes(raw)
            }
        }
    )*};
}

impl_datapoint! {
    u8 => U1, i8 => U1,
    u16 => U2, i16 => U2,
    u32 => U4, i32 => U4, f32 => U4,
    u64 => U8, i64 => U8, f64 => U8,
    u128 => U16, i128 => U16,
}

impl Datapoint for bool {
    type Size = U1;

    #[inline]
    fn encode(&self) -> GenericArray<u8, U1> {
        GenericArray::clone_from_slice(&[*self as u8])
    }

    #[inline]
    fn decode(bytes: &GenericArray<u8, U1>) -> Self {
        bytes[0] != 0
    }
}

/// Raw bytes, for records the caller packs itself.
impl<N: ArrayLength<u8>> Datapoint for GenericArray<u8, N> {
    type Size = N;

    #[inline]
    fn encode(&self) -> GenericArray<u8, N> {
        self.clone()
    }

    #[inline]
    fn decode(bytes: &GenericArray<u8, N>) -> Self {
        bytes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_array::typenum::U3;

    #[test]
    fn sizes() {
        assert_eq!(u8::size(), 1);
        assert_eq!(i16::size(), 2);
        assert_eq!(f32::size(), 4);
        assert_eq!(u64::size(), 8);
        assert_eq!(i128::size(), 16);
        assert_eq!(bool::size(), 1);
        assert_eq!(GenericArray::<u8, U3>::size(), 3);
    }

    #[test]
    fn byte_order() {
        assert_eq!(0x0102_0304u32.encode().as_slice(), &[4, 3, 2, 1]);
        assert_eq!((-2i16).encode().as_slice(), &[0xFE, 0xFF]);
    }

    #[test]
    fn decode_values() {
        assert_eq!(u32::decode(&0xDEAD_BEEFu32.encode()), 0xDEAD_BEEF);
        assert_eq!(f64::decode(&1.5f64.encode()), 1.5);
        assert!(bool::decode(&GenericArray::clone_from_slice(&[7])));
        assert!(!bool::decode(&false.encode()));
    }
}

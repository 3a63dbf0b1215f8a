//! Byte-level access to the storage medium.

use crate::address::Address;

/// Value returned by the built-in RAM media when reading past their end.
///
/// Matches the erased state of EEPROM and NOR flash.
pub const ERASED_BYTE: u8 = 0xFF;

/// The two primitives through which every byte of table and data travels.
///
/// The medium may be external or slow; nothing assumes it is mapped into the
/// process address space.
pub trait Medium<P: Address> {
    /// Writes one byte, returning `false` if the medium rejected it.
    fn write(&mut self, address: P, byte: u8) -> bool;

    /// Reads one byte. A medium that can fail must report it out of band.
    fn read(&mut self, address: P) -> u8;
}

impl<'a, P: Address, M: Medium<P> + ?Sized> Medium<P> for &'a mut M {
    #[inline]
    fn write(&mut self, address: P, byte: u8) -> bool {
        (**self).write(address, byte)
    }

    #[inline]
    fn read(&mut self, address: P) -> u8 {
        (**self).read(address)
    }
}

/// A medium assembled from a caller-supplied write function and read function.
///
/// # Examples
///
/// ```
/// use circular_vectors::FnMedium;
///
/// let cells = core::cell::RefCell::new([0u8; 64]);
/// let medium = FnMedium::new(
///     |addr: u16, byte: u8| { cells.borrow_mut()[addr as usize] = byte; true },
///     |addr: u16| cells.borrow()[addr as usize],
/// );
/// # let _ = medium;
/// ```
pub struct FnMedium<W, R> {
    write: W,
    read: R,
}

impl<W, R> FnMedium<W, R> {
    /// Pairs a write function with a read function.
    pub fn new(write: W, read: R) -> Self {
        FnMedium { write, read }
    }
}

impl<P, W, R> Medium<P> for FnMedium<W, R>
where
    P: Address,
    W: FnMut(P, u8) -> bool,
    R: FnMut(P) -> u8,
{
    #[inline]
    fn write(&mut self, address: P, byte: u8) -> bool {
        (self.write)(address, byte)
    }

    #[inline]
    fn read(&mut self, address: P) -> u8 {
        (self.read)(address)
    }
}

impl<P: Address> Medium<P> for [u8] {
    fn write(&mut self, address: P, byte: u8) -> bool {
        match self.get_mut(address.to_usize()) {
            Some(cell) => {
                *cell = byte;
                true
            }
            None => false,
        }
    }

    fn read(&mut self, address: P) -> u8 {
        self.get(address.to_usize()).copied().unwrap_or(ERASED_BYTE)
    }
}

impl<P: Address, const N: usize> Medium<P> for [u8; N] {
    #[inline]
    fn write(&mut self, address: P, byte: u8) -> bool {
        Medium::write(&mut self[..], address, byte)
    }

    #[inline]
    fn read(&mut self, address: P) -> u8 {
        Medium::read(&mut self[..], address)
    }
}

#[cfg(feature = "std")]
impl<P: Address> Medium<P> for std::vec::Vec<u8> {
    #[inline]
    fn write(&mut self, address: P, byte: u8) -> bool {
        Medium::write(self.as_mut_slice(), address, byte)
    }

    #[inline]
    fn read(&mut self, address: P) -> u8 {
        Medium::read(self.as_mut_slice(), address)
    }
}

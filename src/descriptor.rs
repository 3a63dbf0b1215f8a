//! The vector table: per-vector descriptors kept in the medium itself.
//!
//! Each entry is six words of the pointer type, little-endian:
//!
//! ```text
//! [ base | capacity | element size | head | tail | used ]
//! ```

use core::marker::PhantomData;
use core::ops::Range;

use tracing::warn;

use crate::address::{decode_word, encode_word, Address};
use crate::error::Error;
use crate::layout::Layout;
use crate::medium::Medium;
use crate::utils::wrap_add;

const BASE: usize = 0;
const CAPACITY: usize = 1;
const ELEMENT_SIZE: usize = 2;
const HEAD: usize = 3;
const TAIL: usize = 4;
const USED: usize = 5;
const FIELDS: usize = 6;

/// Size in bytes of one table entry for pointer type `P`.
#[inline]
pub fn entry_size<P: Address>() -> usize {
    FIELDS * P::BYTES
}

/// A snapshot of one vector's metadata.
///
/// `head` is the slot of the oldest element, `tail` the slot the next append
/// writes to. `used` tells a full vector from an empty one when the two
/// coincide.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Descriptor {
    /// Address of the first data byte.
    pub base: usize,
    /// Number of element slots.
    pub capacity: usize,
    /// Bytes per element.
    pub element_size: usize,
    /// Slot of the front element.
    pub head: usize,
    /// Slot after the back element.
    pub tail: usize,
    /// Occupied slots.
    pub used: usize,
}

impl Descriptor {
    /// A descriptor with nothing stored.
    #[inline]
    pub fn empty(base: usize, capacity: usize, element_size: usize) -> Self {
        Descriptor {
            base,
            capacity,
            element_size,
            head: 0,
            tail: 0,
            used: 0,
        }
    }

    /// Returns true if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Returns true if every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.used == self.capacity
    }

    /// Unoccupied slots.
    #[inline]
    pub fn slots_available(&self) -> usize {
        self.capacity - self.used
    }

    /// Address of the first byte of `slot`.
    #[inline]
    pub fn slot_address(&self, slot: usize) -> usize {
        debug_assert!(slot < self.capacity);
        self.base + slot * self.element_size
    }

    /// Addresses covered by the data region.
    #[inline]
    pub fn data_range(&self) -> Range<usize> {
        self.base..self.base + self.capacity * self.element_size
    }

    fn is_consistent(&self) -> bool {
        self.capacity > 0
            && self.element_size > 0
            && self.head < self.capacity
            && self.tail < self.capacity
            && self.used <= self.capacity
            && wrap_add(self.head, self.used % self.capacity, self.capacity) == self.tail
    }
}

/// Where the table sits and how far the data it describes may reach.
#[derive(Clone, Copy, Debug)]
pub(crate) struct VectorTable<P> {
    first: usize,
    data_start: usize,
    last: usize,
    num_vectors: usize,
    phantom: PhantomData<P>,
}

impl<P: Address> VectorTable<P> {
    /// A table with no entries yet.
    pub fn unplanned(first: P) -> Self {
        let first = first.to_usize();
        VectorTable {
            first,
            data_start: first,
            last: first,
            num_vectors: 0,
            phantom: PhantomData,
        }
    }

    pub fn from_layout(layout: &Layout<P>) -> Self {
        VectorTable {
            first: layout.first().to_usize(),
            data_start: layout.data_start(),
            last: layout.last().to_usize(),
            num_vectors: layout.num_vectors(),
            phantom: PhantomData,
        }
    }

    #[inline]
    pub fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    pub fn check_vector(&self, vector: usize) -> Result<(), Error> {
        if vector < self.num_vectors {
            Ok(())
        } else {
            Err(Error::VectorOutOfRange {
                vector,
                num_vectors: self.num_vectors,
            })
        }
    }

    #[inline]
    fn field_address(&self, vector: usize, field: usize) -> usize {
        self.first + vector * entry_size::<P>() + field * P::BYTES
    }

    /// Reads and validates the descriptor of `vector`.
    pub fn load<M: Medium<P> + ?Sized>(&self, medium: &mut M, vector: usize) -> Result<Descriptor, Error> {
        let mut desc = self.load_region(medium, vector)?;
        desc.head = self.read_field(medium, vector, HEAD)?;
        desc.tail = self.read_field(medium, vector, TAIL)?;
        desc.used = self.read_field(medium, vector, USED)?;

        if !desc.is_consistent() {
            warn!(vector, ?desc, "rejecting corrupt descriptor");
            return Err(Error::CorruptDescriptor { vector });
        }
        Ok(desc)
    }

    /// Reads the words fixed at creation and returns them with empty cursors.
    ///
    /// The head, tail and used words are not read, so a vector whose cursor
    /// update was cut short can still be located and reset.
    pub fn load_region<M: Medium<P> + ?Sized>(&self, medium: &mut M, vector: usize) -> Result<Descriptor, Error> {
        self.check_vector(vector)?;
        let base = self.read_field(medium, vector, BASE)?;
        let capacity = self.read_field(medium, vector, CAPACITY)?;
        let element_size = self.read_field(medium, vector, ELEMENT_SIZE)?;

        let in_bounds = capacity
            .checked_mul(element_size)
            .and_then(|len| base.checked_add(len))
            .map_or(false, |end| base >= self.data_start && end <= self.last + 1);
        if !in_bounds || capacity == 0 || element_size == 0 {
            warn!(vector, base, capacity, element_size, "rejecting corrupt data region");
            return Err(Error::CorruptDescriptor { vector });
        }
        Ok(Descriptor::empty(base, capacity, element_size))
    }

    fn read_field<M: Medium<P> + ?Sized>(&self, medium: &mut M, vector: usize, field: usize) -> Result<usize, Error> {
        read_word(medium, self.field_address(vector, field))?.ok_or(Error::CorruptDescriptor { vector })
    }

    /// Writes every word of the descriptor of `vector`.
    pub fn store<M: Medium<P> + ?Sized>(&self, medium: &mut M, vector: usize, desc: &Descriptor) -> Result<(), Error> {
        self.write_fields(
            medium,
            vector,
            &[
                (BASE, desc.base),
                (CAPACITY, desc.capacity),
                (ELEMENT_SIZE, desc.element_size),
                (HEAD, desc.head),
                (TAIL, desc.tail),
                (USED, desc.used),
            ],
        )
    }

    /// Writes only the words that change as elements come and go.
    pub fn store_cursors<M: Medium<P> + ?Sized>(
        &self,
        medium: &mut M,
        vector: usize,
        desc: &Descriptor,
    ) -> Result<(), Error> {
        self.write_fields(
            medium,
            vector,
            &[(HEAD, desc.head), (TAIL, desc.tail), (USED, desc.used)],
        )
    }

    fn write_fields<M: Medium<P> + ?Sized>(
        &self,
        medium: &mut M,
        vector: usize,
        fields: &[(usize, usize)],
    ) -> Result<(), Error> {
        for &(field, value) in fields {
            write_word(medium, self.field_address(vector, field), value)?;
        }
        Ok(())
    }
}

/// Converts a computed address to the pointer type.
#[inline]
pub(crate) fn to_address<P: Address>(address: usize) -> Result<P, Error> {
    P::from_usize(address).ok_or(Error::AddressOutOfRange { address })
}

/// Writes one byte, mapping a rejected write to `Error::Write`.
#[inline]
pub(crate) fn write_byte<P: Address, M: Medium<P> + ?Sized>(medium: &mut M, address: usize, byte: u8) -> Result<(), Error> {
    if medium.write(to_address(address)?, byte) {
        Ok(())
    } else {
        warn!(address, "medium rejected write");
        Err(Error::Write { address })
    }
}

fn write_word<P: Address, M: Medium<P> + ?Sized>(medium: &mut M, address: usize, value: usize) -> Result<(), Error> {
    let bytes = encode_word::<P>(value).ok_or(Error::AddressOutOfRange { address: value })?;
    for (offset, byte) in bytes.enumerate() {
        write_byte(medium, address + offset, byte)?;
    }
    Ok(())
}

/// Reads one table word; `Ok(None)` if it does not fit `usize`.
fn read_word<P: Address, M: Medium<P> + ?Sized>(medium: &mut M, address: usize) -> Result<Option<usize>, Error> {
    let mut bytes = [0u8; 16];
    let bytes = &mut bytes[..P::BYTES];
    for (offset, byte) in bytes.iter_mut().enumerate() {
        *byte = medium.read(to_address(address + offset)?);
    }
    Ok(decode_word(bytes.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::VectorSpec;

    fn table(specs: &[VectorSpec]) -> (VectorTable<u16>, [u8; 128]) {
        let layout = Layout::<u16>::plan(4, specs).unwrap();
        let table = VectorTable::from_layout(&layout);
        let mut ram = [0u8; 128];
        for (vector, desc) in layout.descriptors().enumerate() {
            table.store(&mut ram, vector, &desc).unwrap();
        }
        (table, ram)
    }

    #[test]
    fn entry_placement() {
        assert_eq!(entry_size::<u8>(), 6);
        assert_eq!(entry_size::<u32>(), 24);

        let (_, ram) = table(&[VectorSpec::new(3, 2), VectorSpec::new(5, 1)]);
        // vector 1 base (4 + 24 + 6 = 34) sits 12 bytes after the first entry
        assert_eq!(&ram[16..18], &[34, 0]);
        // vector 1 capacity
        assert_eq!(&ram[18..20], &[5, 0]);
    }

    #[test]
    fn load_what_was_stored() {
        let (table, mut ram) = table(&[VectorSpec::new(3, 2), VectorSpec::new(5, 1)]);
        let mut desc = table.load(&mut ram, 1).unwrap();
        assert_eq!(desc, Descriptor::empty(34, 5, 1));

        desc.head = 4;
        desc.used = 2;
        desc.tail = 1;
        table.store_cursors(&mut ram, 1, &desc).unwrap();
        assert_eq!(table.load(&mut ram, 1).unwrap(), desc);
        assert_eq!(table.load(&mut ram, 0).unwrap(), Descriptor::empty(28, 3, 2));
    }

    #[test]
    fn out_of_range_vector() {
        let (table, mut ram) = table(&[VectorSpec::new(3, 2)]);
        assert_eq!(
            table.load(&mut ram, 1).unwrap_err(),
            Error::VectorOutOfRange {
                vector: 1,
                num_vectors: 1
            }
        );
    }

    #[test]
    fn corrupt_cursors_are_rejected() {
        let (table, mut ram) = table(&[VectorSpec::new(3, 2)]);
        // head = 3 is past the last slot
        ram[4 + 2 * HEAD] = 3;
        assert_eq!(table.load(&mut ram, 0).unwrap_err(), Error::CorruptDescriptor { vector: 0 });

        // tail disagrees with head + used
        ram[4 + 2 * HEAD] = 1;
        ram[4 + 2 * USED] = 1;
        assert_eq!(table.load(&mut ram, 0).unwrap_err(), Error::CorruptDescriptor { vector: 0 });
        ram[4 + 2 * TAIL] = 2;
        assert!(table.load(&mut ram, 0).is_ok());
    }

    #[test]
    fn corrupt_base_is_rejected() {
        let (table, mut ram) = table(&[VectorSpec::new(3, 2)]);
        ram[4 + 2 * BASE] = 0;
        assert_eq!(table.load(&mut ram, 0).unwrap_err(), Error::CorruptDescriptor { vector: 0 });
        assert_eq!(table.load_region(&mut ram, 0).unwrap_err(), Error::CorruptDescriptor { vector: 0 });
    }

    #[test]
    fn region_survives_broken_cursors() {
        let (table, mut ram) = table(&[VectorSpec::new(3, 2)]);
        ram[4 + 2 * TAIL] = 1;
        assert!(table.load(&mut ram, 0).is_err());
        assert_eq!(table.load_region(&mut ram, 0).unwrap(), Descriptor::empty(16, 3, 2));
    }

    #[test]
    fn failed_write_reports_address() {
        let specs = [VectorSpec::new(3, 2)];
        let layout = Layout::<u16>::plan(4, &specs).unwrap();
        let table = VectorTable::from_layout(&layout);
        let mut short = [0u8; 8];
        let desc = layout.descriptors().next().unwrap();
        assert_eq!(table.store(&mut short, 0, &desc).unwrap_err(), Error::Write { address: 8 });
    }
}

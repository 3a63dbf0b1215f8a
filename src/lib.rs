//! Fixed-layout circular buffers packed into byte-addressable storage.
//!
//! A [`CircularVectorBuffer`] manages any number of independent ring buffers
//! ("vectors") inside one storage medium such as an EEPROM, an external flash
//! chip or plain RAM. The medium is reached only through a byte write and a
//! byte read keyed by a caller-chosen pointer type, so it may sit behind a bus
//! and need not be mapped into memory.
//!
//! The set of vectors is declared once. Their descriptors (base address,
//! capacity, element size, head, tail and used count) are written to a table at
//! the first available byte, followed by every vector's data region, back to
//! back. From then on each vector supports `O(1)` appends and pops at both ends.
//!
//! # Feature Flags
//! The **circular-vectors** crate has the following cargo feature flags:
//!
//! - `std`
//!   - Optional, enabled by default
//!   - Use libstd, and let `Vec<u8>` act as a medium
//!
//! # Full vectors
//!
//! What happens when writing to a full vector is chosen by the buffer's
//! [`Behavior`]: [`Saturating`] (the default) rejects the element, [`Wrapping`]
//! overwrites the element at the opposite end.
//!
//! # Examples
//! ```
//! use circular_vectors::{CircularVectorBuffer, VectorSpec};
//!
//! let mut eeprom = [0u8; 128];
//! let specs = [VectorSpec::of::<u16>(4), VectorSpec::of::<f32>(2)];
//! let mut buffer = CircularVectorBuffer::create(&mut eeprom, 0u8, &specs).unwrap();
//!
//! buffer.append(0, 1u16).unwrap();
//! buffer.append(0, 2u16).unwrap();
//! buffer.prepend(0, 0u16).unwrap();
//! assert_eq!(buffer.slots_consumed(0), Ok(3));
//!
//! assert_eq!(buffer.front_pop::<u16>(0, true), Ok(0));
//! assert_eq!(buffer.pop::<u16>(0, true), Ok(2));
//! assert_eq!(buffer.pop::<u16>(0, false), Ok(1));
//! assert_eq!(buffer.slots_available(0), Ok(3));
//!
//! buffer.append(1, 21.5f32).unwrap();
//! assert_eq!(buffer.front::<f32>(1), Ok(21.5));
//! ```
//!
//! # Closures as the medium
//! ```
//! use std::cell::RefCell;
//! use circular_vectors::{CircularVectorBuffer, FnMedium, VectorSpec};
//!
//! let flash = RefCell::new(vec![0u8; 1024]);
//! let medium = FnMedium::new(
//!     |addr: u16, byte: u8| match flash.borrow_mut().get_mut(addr as usize) {
//!         Some(cell) => { *cell = byte; true }
//!         None => false,
//!     },
//!     |addr: u16| flash.borrow()[addr as usize],
//! );
//!
//! let mut buffer = CircularVectorBuffer::new(medium, 0x100);
//! buffer.pointer_create(&[VectorSpec::of::<u32>(8)]).unwrap();
//! assert_eq!(buffer.first_mem_address(), 0x100);
//! assert_eq!(buffer.last_mem_address(), 0x100 + 12 + 32 - 1);
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(missing_docs)]

use core::marker::PhantomData;

use generic_array::GenericArray;
use tracing::{debug, trace};

pub use generic_array;

mod address;
mod behavior;
mod datapoint;
mod descriptor;
pub mod error;
mod layout;
mod medium;
mod utils;

pub use address::Address;
pub use behavior::{Behavior, Saturating, Wrapping};
pub use datapoint::Datapoint;
pub use descriptor::{entry_size, Descriptor};
pub use error::{Error, LayoutError};
pub use layout::{Descriptors, Layout, VectorSpec};
pub use medium::{FnMedium, Medium, ERASED_BYTE};

use descriptor::{to_address, write_byte, VectorTable};
use utils::*;

/// A set of circular buffers laid out in a byte-addressable medium.
///
/// `P` is the pointer type addressing the medium, `M` the medium and `B` the
/// full-vector behavior. Vectors are numbered from zero in declaration order.
///
/// Every operation runs to completion before returning and assumes exclusive
/// access to the medium. Element data is always written before the descriptor
/// is touched, so a rejected data write leaves the vector as it was.
pub struct CircularVectorBuffer<P: Address, M: Medium<P>, B: Behavior = Saturating> {
    medium: M,
    first: P,
    last: P,
    table: VectorTable<P>,
    phantom: PhantomData<B>,
}

impl<P: Address, M: Medium<P>> CircularVectorBuffer<P, M, Saturating> {
    /// Wraps `medium` with the vector table to be placed at
    /// `first_available_byte`.
    ///
    /// No vectors exist until [`pointer_create`] succeeds.
    ///
    /// [`pointer_create`]: Self::pointer_create
    pub fn new(medium: M, first_available_byte: P) -> Self {
        CircularVectorBuffer {
            medium,
            first: first_available_byte,
            last: first_available_byte,
            table: VectorTable::unplanned(first_available_byte),
            phantom: PhantomData,
        }
    }

    /// Wraps `medium` and lays out `specs` in one step.
    pub fn create(medium: M, first_available_byte: P, specs: &[VectorSpec]) -> Result<Self, Error> {
        let mut buffer = Self::new(medium, first_available_byte);
        buffer.pointer_create(specs)?;
        Ok(buffer)
    }

    /// Converts `self` into a `CircularVectorBuffer<P, M, Wrapping>`.
    pub fn wrapping(self) -> CircularVectorBuffer<P, M, Wrapping> {
        self.into_behavior()
    }

    /// Adds an element to the back of a vector.
    ///
    /// Fails with `Error::Full` if the vector is at capacity.
    ///
    /// # Examples
    ///
    /// ```text
    /// [_, _, _] <-(+)- 1 => [1, _, _] -> Ok
    /// [1, _, _] <-(+)- 2 => [1, 2, _] -> Ok
    /// [1, 2, _] <-(+)- 3 => [1, 2, 3] -> Ok
    /// [1, 2, 3] <-(+)- 4 => [1, 2, 3] -> Err(Full)
    /// ```
    ///
    /// ```
    /// use circular_vectors::{CircularVectorBuffer, Error, VectorSpec};
    ///
    /// let mut ram = [0u8; 32];
    /// let specs = [VectorSpec::of::<u8>(2)];
    /// let mut buffer = CircularVectorBuffer::create(&mut ram, 0u8, &specs).unwrap();
    /// buffer.append(0, 1u8).unwrap();
    /// buffer.append(0, 2u8).unwrap();
    ///
    /// assert_eq!(buffer.append(0, 3u8), Err(Error::Full { vector: 0 }));
    /// assert_eq!(buffer.pop::<u8>(0, false), Ok(2));
    /// ```
    pub fn append<T: Datapoint>(&mut self, vector: usize, value: T) -> Result<(), Error> {
        let desc = self.load_sized(vector, T::size())?;
        self.push_back(vector, desc, &value.encode()).map(|_| ())
    }

    /// Adds an element to the front of a vector.
    ///
    /// Fails with `Error::Full` if the vector is at capacity.
    ///
    /// # Examples
    ///
    /// ```text
    /// 1 -(+)-> [_, _, _] => [1, _, _] -> Ok
    /// 2 -(+)-> [1, _, _] => [2, 1, _] -> Ok
    /// 3 -(+)-> [2, 1, _] => [3, 2, 1] -> Ok
    /// 4 -(+)-> [3, 2, 1] => [3, 2, 1] -> Err(Full)
    /// ```
    pub fn prepend<T: Datapoint>(&mut self, vector: usize, value: T) -> Result<(), Error> {
        let desc = self.load_sized(vector, T::size())?;
        self.push_front(vector, desc, &value.encode()).map(|_| ())
    }
}

impl<P: Address, M: Medium<P>> CircularVectorBuffer<P, M, Wrapping> {
    /// Converts `self` into a `CircularVectorBuffer<P, M, Saturating>`.
    pub fn saturating(self) -> CircularVectorBuffer<P, M, Saturating> {
        self.into_behavior()
    }

    /// Adds an element to the back of a vector.
    ///
    /// Returns `None` if the vector still had room, or `Some(existing)` if it
    /// was full, where `existing` is the front element being overwritten.
    ///
    /// # Examples
    ///
    /// ```text
    /// [_, _, _] <-(+)- 1 => [1, _, _] -> None
    /// [1, _, _] <-(+)- 2 => [1, 2, _] -> None
    /// [1, 2, _] <-(+)- 3 => [1, 2, 3] -> None
    /// [1, 2, 3] <-(+)- 4 => [2, 3, 4] -> Some(1)
    /// ```
    ///
    /// ```
    /// use circular_vectors::{CircularVectorBuffer, VectorSpec};
    ///
    /// let mut ram = [0u8; 32];
    /// let specs = [VectorSpec::of::<u8>(2)];
    /// let mut buffer = CircularVectorBuffer::create(&mut ram, 0u8, &specs)
    ///     .unwrap()
    ///     .wrapping();
    /// buffer.append(0, 1u8).unwrap();
    /// buffer.append(0, 2u8).unwrap();
    ///
    /// assert_eq!(buffer.append(0, 3u8), Ok(Some(1)));
    /// assert_eq!(buffer.front::<u8>(0), Ok(2));
    /// ```
    pub fn append<T: Datapoint>(&mut self, vector: usize, value: T) -> Result<Option<T>, Error> {
        let desc = self.load_sized(vector, T::size())?;
        let existing = if desc.is_full() {
            Some(self.read_datapoint::<T>(&desc, desc.head)?)
        } else {
            None
        };
        self.push_back(vector, desc, &value.encode())?;
        Ok(existing)
    }

    /// Adds an element to the front of a vector.
    ///
    /// Returns `None` if the vector still had room, or `Some(existing)` if it
    /// was full, where `existing` is the back element being overwritten.
    ///
    /// # Examples
    ///
    /// ```text
    /// 1 -(+)-> [_, _, _] => [1, _, _] -> None
    /// 2 -(+)-> [1, _, _] => [2, 1, _] -> None
    /// 3 -(+)-> [2, 1, _] => [3, 2, 1] -> None
    /// 4 -(+)-> [3, 2, 1] => [4, 3, 2] -> Some(1)
    /// ```
    pub fn prepend<T: Datapoint>(&mut self, vector: usize, value: T) -> Result<Option<T>, Error> {
        let desc = self.load_sized(vector, T::size())?;
        let existing = if desc.is_full() {
            let back = wrap_sub(desc.tail, 1, desc.capacity);
            Some(self.read_datapoint::<T>(&desc, back)?)
        } else {
            None
        };
        self.push_front(vector, desc, &value.encode())?;
        Ok(existing)
    }
}

impl<P: Address, M: Medium<P>, B: Behavior> CircularVectorBuffer<P, M, B> {
    /// Reinterprets the buffer under another full-vector behavior.
    ///
    /// Nothing in the medium changes.
    pub fn into_behavior<C: Behavior>(self) -> CircularVectorBuffer<P, M, C> {
        CircularVectorBuffer {
            medium: self.medium,
            first: self.first,
            last: self.last,
            table: self.table,
            phantom: PhantomData,
        }
    }

    /// Lays out `specs` in order and writes an empty descriptor for each.
    ///
    /// The table starts at the first available byte and the data regions
    /// follow it back to back. Fails if no vectors are declared, if a vector
    /// is empty or has zero-sized elements, if the layout runs past the end of
    /// the pointer type's address space, or if the medium rejects a byte. A
    /// buffer gets exactly one table; after a failure nothing is declared and
    /// the call may be retried.
    pub fn pointer_create(&mut self, specs: &[VectorSpec]) -> Result<(), Error> {
        if self.table.num_vectors() > 0 {
            return Err(Error::AlreadyCreated);
        }
        let layout = Layout::plan(self.first, specs)?;
        let table = VectorTable::from_layout(&layout);
        for (vector, desc) in layout.descriptors().enumerate() {
            table.store(&mut self.medium, vector, &desc)?;
        }

        self.table = table;
        self.last = layout.last();
        debug!(
            num_vectors = layout.num_vectors(),
            first = layout.first().to_usize(),
            data_start = layout.data_start(),
            last = layout.last().to_usize(),
            "created vector table"
        );
        Ok(())
    }

    /// Number of declared vectors; zero before `pointer_create`.
    #[inline]
    pub fn num_vectors(&self) -> usize {
        self.table.num_vectors()
    }

    /// Address of the first byte of the vector table.
    #[inline]
    pub fn first_mem_address(&self) -> P {
        self.first
    }

    /// Address of the last byte used by table and data, inclusive.
    ///
    /// Equal to `first_mem_address()` before `pointer_create`.
    #[inline]
    pub fn last_mem_address(&self) -> P {
        self.last
    }

    /// Reads the descriptor of a vector from the table.
    pub fn descriptor(&mut self, vector: usize) -> Result<Descriptor, Error> {
        self.table.load(&mut self.medium, vector)
    }

    /// Number of element slots in a vector.
    pub fn capacity(&mut self, vector: usize) -> Result<usize, Error> {
        self.descriptor(vector).map(|desc| desc.capacity)
    }

    /// Free slots in a vector.
    pub fn slots_available(&mut self, vector: usize) -> Result<usize, Error> {
        self.descriptor(vector).map(|desc| desc.slots_available())
    }

    /// Occupied slots in a vector.
    pub fn slots_consumed(&mut self, vector: usize) -> Result<usize, Error> {
        self.descriptor(vector).map(|desc| desc.used)
    }

    /// Size in bytes of one element of a vector.
    pub fn datapoint_size(&mut self, vector: usize) -> Result<usize, Error> {
        self.descriptor(vector).map(|desc| desc.element_size)
    }

    /// Returns true if the vector holds no elements.
    pub fn is_empty(&mut self, vector: usize) -> Result<bool, Error> {
        self.descriptor(vector).map(|desc| desc.is_empty())
    }

    /// Returns true if the vector is at capacity.
    pub fn is_full(&mut self, vector: usize) -> Result<bool, Error> {
        self.descriptor(vector).map(|desc| desc.is_full())
    }

    /// Empties a vector without erasing its data region.
    ///
    /// Only the base, capacity and element size words are validated, so this
    /// also recovers a vector whose cursor words were left inconsistent by a
    /// failed write.
    ///
    /// # Examples
    ///
    /// ```
    /// use circular_vectors::{CircularVectorBuffer, Error, VectorSpec};
    ///
    /// let mut ram = [0u8; 32];
    /// let specs = [VectorSpec::of::<u8>(2)];
    /// let mut buffer = CircularVectorBuffer::create(&mut ram, 0u8, &specs).unwrap();
    /// buffer.append(0, 1u8).unwrap();
    /// buffer.clear_vector(0).unwrap();
    ///
    /// assert_eq!(buffer.is_empty(0), Ok(true));
    /// assert_eq!(buffer.pop::<u8>(0, true), Err(Error::Empty { vector: 0 }));
    /// ```
    pub fn clear_vector(&mut self, vector: usize) -> Result<(), Error> {
        let cleared = self.table.load_region(&mut self.medium, vector)?;
        self.table.store_cursors(&mut self.medium, vector, &cleared)?;
        debug!(vector, "cleared vector");
        Ok(())
    }

    /// Reads the back element of a vector, the one appended last.
    ///
    /// If `destructive`, the element is removed; otherwise the vector is left
    /// untouched. Fails with `Error::Empty` if there is nothing to read.
    ///
    /// The type read must be the type that was written; only a difference in
    /// width is detected.
    pub fn pop<T: Datapoint>(&mut self, vector: usize, destructive: bool) -> Result<T, Error> {
        let desc = self.load_sized(vector, T::size())?;
        let mut bytes = GenericArray::<u8, T::Size>::default();
        self.take_back(vector, desc, &mut bytes, destructive)?;
        Ok(T::decode(&bytes))
    }

    /// Reads the front element of a vector, the oldest one.
    ///
    /// If `destructive`, the element is removed; otherwise the vector is left
    /// untouched. Fails with `Error::Empty` if there is nothing to read.
    ///
    /// # Examples
    ///
    /// ```
    /// use circular_vectors::{CircularVectorBuffer, VectorSpec};
    ///
    /// let mut ram = [0u8; 64];
    /// let specs = [VectorSpec::of::<i32>(3)];
    /// let mut buffer = CircularVectorBuffer::create(&mut ram, 0u8, &specs).unwrap();
    /// for x in [-1, 2, -3] {
    ///     buffer.append(0, x).unwrap();
    /// }
    ///
    /// assert_eq!(buffer.front_pop::<i32>(0, true), Ok(-1));
    /// assert_eq!(buffer.front_pop::<i32>(0, true), Ok(2));
    /// assert_eq!(buffer.front_pop::<i32>(0, true), Ok(-3));
    /// ```
    pub fn front_pop<T: Datapoint>(&mut self, vector: usize, destructive: bool) -> Result<T, Error> {
        let desc = self.load_sized(vector, T::size())?;
        let mut bytes = GenericArray::<u8, T::Size>::default();
        self.take_front(vector, desc, &mut bytes, destructive)?;
        Ok(T::decode(&bytes))
    }

    /// Reads the front element without removing it.
    #[inline]
    pub fn front<T: Datapoint>(&mut self, vector: usize) -> Result<T, Error> {
        self.front_pop(vector, false)
    }

    /// Reads the back element without removing it.
    #[inline]
    pub fn back<T: Datapoint>(&mut self, vector: usize) -> Result<T, Error> {
        self.pop(vector, false)
    }

    /// Reads the element `index` places behind the front, without removing it.
    ///
    /// # Examples
    ///
    /// ```
    /// use circular_vectors::{CircularVectorBuffer, VectorSpec};
    ///
    /// let mut ram = [0u8; 32];
    /// let specs = [VectorSpec::of::<u8>(4)];
    /// let mut buffer = CircularVectorBuffer::create(&mut ram, 0u8, &specs).unwrap();
    /// buffer.append(0, 3u8).unwrap();
    /// buffer.append(0, 4u8).unwrap();
    /// buffer.append(0, 5u8).unwrap();
    /// assert_eq!(buffer.get::<u8>(0, 1), Ok(4));
    /// ```
    pub fn get<T: Datapoint>(&mut self, vector: usize, index: usize) -> Result<T, Error> {
        let desc = self.load_sized(vector, T::size())?;
        let mut bytes = GenericArray::<u8, T::Size>::default();
        self.read_index(vector, &desc, index, &mut bytes)?;
        Ok(T::decode(&bytes))
    }

    /// Adds raw element bytes to the back of a vector.
    ///
    /// `bytes` must be exactly one element wide. Returns whether a front
    /// element was overwritten, which only happens under `Wrapping`.
    pub fn append_bytes(&mut self, vector: usize, bytes: &[u8]) -> Result<bool, Error> {
        let desc = self.load_sized(vector, bytes.len())?;
        self.push_back(vector, desc, bytes)
    }

    /// Adds raw element bytes to the front of a vector.
    ///
    /// `bytes` must be exactly one element wide. Returns whether a back
    /// element was overwritten, which only happens under `Wrapping`.
    pub fn prepend_bytes(&mut self, vector: usize, bytes: &[u8]) -> Result<bool, Error> {
        let desc = self.load_sized(vector, bytes.len())?;
        self.push_front(vector, desc, bytes)
    }

    /// Copies the back element of a vector into `out`, one element wide.
    pub fn pop_bytes(&mut self, vector: usize, out: &mut [u8], destructive: bool) -> Result<(), Error> {
        let desc = self.load_sized(vector, out.len())?;
        self.take_back(vector, desc, out, destructive)
    }

    /// Copies the front element of a vector into `out`, one element wide.
    pub fn front_pop_bytes(&mut self, vector: usize, out: &mut [u8], destructive: bool) -> Result<(), Error> {
        let desc = self.load_sized(vector, out.len())?;
        self.take_front(vector, desc, out, destructive)
    }

    /// Copies the element `index` places behind the front into `out`.
    pub fn get_bytes(&mut self, vector: usize, index: usize, out: &mut [u8]) -> Result<(), Error> {
        let desc = self.load_sized(vector, out.len())?;
        self.read_index(vector, &desc, index, out)
    }

    /// Shared access to the medium.
    #[inline]
    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Exclusive access to the medium.
    ///
    /// Writing inside the table or a data region corrupts the buffer.
    #[inline]
    pub fn medium_mut(&mut self) -> &mut M {
        &mut self.medium
    }

    /// Gives the medium back.
    #[inline]
    pub fn into_medium(self) -> M {
        self.medium
    }
}

impl<P: Address, M: Medium<P>, B: Behavior> CircularVectorBuffer<P, M, B> {
    fn load_sized(&mut self, vector: usize, size: usize) -> Result<Descriptor, Error> {
        let desc = self.descriptor(vector)?;
        if desc.element_size != size {
            return Err(Error::SizeMismatch {
                vector,
                expected: desc.element_size,
                found: size,
            });
        }
        Ok(desc)
    }

    fn write_slot(&mut self, desc: &Descriptor, slot: usize, bytes: &[u8]) -> Result<(), Error> {
        debug_assert_eq!(bytes.len(), desc.element_size);
        let start = desc.slot_address(slot);
        for (offset, &byte) in bytes.iter().enumerate() {
            write_byte(&mut self.medium, start + offset, byte)?;
        }
        Ok(())
    }

    fn read_slot(&mut self, desc: &Descriptor, slot: usize, out: &mut [u8]) -> Result<(), Error> {
        debug_assert_eq!(out.len(), desc.element_size);
        let start = desc.slot_address(slot);
        for (offset, byte) in out.iter_mut().enumerate() {
            *byte = self.medium.read(to_address(start + offset)?);
        }
        Ok(())
    }

    fn read_datapoint<T: Datapoint>(&mut self, desc: &Descriptor, slot: usize) -> Result<T, Error> {
        let mut bytes = GenericArray::<u8, T::Size>::default();
        self.read_slot(desc, slot, &mut bytes)?;
        Ok(T::decode(&bytes))
    }

    fn read_index(&mut self, vector: usize, desc: &Descriptor, index: usize, out: &mut [u8]) -> Result<(), Error> {
        if index >= desc.used {
            return Err(Error::IndexOutOfBounds {
                vector,
                index,
                len: desc.used,
            });
        }
        self.read_slot(desc, wrap_add(desc.head, index, desc.capacity), out)
    }

    fn push_back(&mut self, vector: usize, mut desc: Descriptor, bytes: &[u8]) -> Result<bool, Error> {
        let overwrite = desc.is_full();
        if overwrite && !B::OVERWRITE {
            return Err(Error::Full { vector });
        }
        self.write_slot(&desc, desc.tail, bytes)?;

        desc.tail = wrap_add(desc.tail, 1, desc.capacity);
        if overwrite {
            // the front element was just replaced
            desc.head = desc.tail;
        } else {
            desc.used += 1;
        }
        self.table.store_cursors(&mut self.medium, vector, &desc)?;
        trace!(vector, used = desc.used, overwrite, "appended");
        Ok(overwrite)
    }

    fn push_front(&mut self, vector: usize, mut desc: Descriptor, bytes: &[u8]) -> Result<bool, Error> {
        let overwrite = desc.is_full();
        if overwrite && !B::OVERWRITE {
            return Err(Error::Full { vector });
        }
        let slot = wrap_sub(desc.head, 1, desc.capacity);
        self.write_slot(&desc, slot, bytes)?;

        desc.head = slot;
        if overwrite {
            // the back element was just replaced
            desc.tail = slot;
        } else {
            desc.used += 1;
        }
        self.table.store_cursors(&mut self.medium, vector, &desc)?;
        trace!(vector, used = desc.used, overwrite, "prepended");
        Ok(overwrite)
    }

    fn take_back(&mut self, vector: usize, mut desc: Descriptor, out: &mut [u8], destructive: bool) -> Result<(), Error> {
        if desc.is_empty() {
            return Err(Error::Empty { vector });
        }
        let slot = wrap_sub(desc.tail, 1, desc.capacity);
        self.read_slot(&desc, slot, out)?;

        if destructive {
            desc.tail = slot;
            desc.used -= 1;
            self.table.store_cursors(&mut self.medium, vector, &desc)?;
            trace!(vector, used = desc.used, "popped back");
        }
        Ok(())
    }

    fn take_front(&mut self, vector: usize, mut desc: Descriptor, out: &mut [u8], destructive: bool) -> Result<(), Error> {
        if desc.is_empty() {
            return Err(Error::Empty { vector });
        }
        let slot = desc.head;
        self.read_slot(&desc, slot, out)?;

        if destructive {
            desc.head = wrap_add(slot, 1, desc.capacity);
            desc.used -= 1;
            self.table.store_cursors(&mut self.medium, vector, &desc)?;
            trace!(vector, used = desc.used, "popped front");
        }
        Ok(())
    }
}

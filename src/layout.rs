//! Planning where the vector table and each vector's data land in the medium.
//!
//! ```text
//!  first                      data_start                                   last
//!  |                          |                                               |
//! [ entry 0 | entry 1 | ... ][ vector 0 data ][ vector 1 data ] ... [ vector k ]
//! ```
//!
//! Every table entry has the same size, so a vector's descriptor can be
//! located without knowing anything about the vectors before it.

use core::slice;

use crate::address::Address;
use crate::datapoint::Datapoint;
use crate::descriptor::{entry_size, Descriptor};
use crate::error::LayoutError;

/// Declaration of one vector: how many elements and how wide each is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct VectorSpec {
    capacity: usize,
    element_size: usize,
}

impl VectorSpec {
    /// Declares a vector of `capacity` elements of `element_size` bytes each.
    #[inline]
    pub const fn new(capacity: usize, element_size: usize) -> Self {
        VectorSpec {
            capacity,
            element_size,
        }
    }

    /// Declares a vector of `capacity` elements of type `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use circular_vectors::VectorSpec;
    ///
    /// assert_eq!(VectorSpec::of::<u32>(10), VectorSpec::new(10, 4));
    /// ```
    #[inline]
    pub fn of<T: Datapoint>(capacity: usize) -> Self {
        VectorSpec::new(capacity, T::size())
    }

    /// Number of elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes per element.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    fn data_size(&self) -> Option<usize> {
        self.capacity.checked_mul(self.element_size)
    }
}

/// A validated placement of the vector table and all data regions.
///
/// Planning does no I/O; [`CircularVectorBuffer::pointer_create`] writes the
/// result to the medium.
///
/// [`CircularVectorBuffer::pointer_create`]: crate::CircularVectorBuffer::pointer_create
#[derive(Clone, Copy, Debug)]
pub struct Layout<'a, P> {
    specs: &'a [VectorSpec],
    first: P,
    data_start: usize,
    last: P,
}

impl<'a, P: Address> Layout<'a, P> {
    /// Places the table at `first` and the data regions back to back after it,
    /// in declaration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use circular_vectors::{Layout, VectorSpec};
    ///
    /// let specs = [VectorSpec::of::<u16>(4), VectorSpec::of::<u8>(3)];
    /// let layout = Layout::plan(10u8, &specs).unwrap();
    ///
    /// // two entries of six one-byte words, then 8 + 3 data bytes
    /// assert_eq!(layout.data_start(), 22);
    /// assert_eq!(layout.last(), 32);
    /// ```
    pub fn plan(first: P, specs: &'a [VectorSpec]) -> Result<Self, LayoutError> {
        if specs.is_empty() {
            return Err(LayoutError::NoVectors);
        }
        for (vector, spec) in specs.iter().enumerate() {
            if spec.capacity == 0 {
                return Err(LayoutError::ZeroCapacity { vector });
            }
            if spec.element_size == 0 {
                return Err(LayoutError::ZeroElementSize { vector });
            }
        }

        let start = first.to_usize();
        let exceeded = |required| LayoutError::AddressSpaceExceeded {
            first: start,
            required,
        };

        let table_size = specs
            .len()
            .checked_mul(entry_size::<P>())
            .ok_or(exceeded(usize::MAX))?;
        let data_size = specs
            .iter()
            .try_fold(0usize, |acc, spec| acc.checked_add(spec.data_size()?))
            .ok_or(exceeded(usize::MAX))?;
        let required = table_size
            .checked_add(data_size)
            .ok_or(exceeded(usize::MAX))?;

        let last = start
            .checked_add(required - 1)
            .and_then(P::from_usize)
            .ok_or(exceeded(required))?;

        Ok(Layout {
            specs,
            first,
            data_start: start + table_size,
            last,
        })
    }

    /// Number of declared vectors.
    #[inline]
    pub fn num_vectors(&self) -> usize {
        self.specs.len()
    }

    /// Address of the first table entry.
    #[inline]
    pub fn first(&self) -> P {
        self.first
    }

    /// Address of the first data byte of vector 0.
    #[inline]
    pub fn data_start(&self) -> usize {
        self.data_start
    }

    /// Address of the last byte in use, inclusive.
    #[inline]
    pub fn last(&self) -> P {
        self.last
    }

    /// Bytes taken by table and data together.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.last.to_usize() - self.first.to_usize() + 1
    }

    /// Empty descriptors for every vector, in declaration order.
    pub fn descriptors(&self) -> Descriptors<'a> {
        Descriptors {
            specs: self.specs.iter(),
            cursor: self.data_start,
        }
    }
}

/// Iterator over the initial descriptors of a [`Layout`].
#[derive(Clone, Debug)]
pub struct Descriptors<'a> {
    specs: slice::Iter<'a, VectorSpec>,
    cursor: usize,
}

impl<'a> Iterator for Descriptors<'a> {
    type Item = Descriptor;

    fn next(&mut self) -> Option<Descriptor> {
        let spec = self.specs.next()?;
        let base = self.cursor;
        // bounded by `last`, checked when planning
        self.cursor += spec.capacity * spec.element_size;
        Some(Descriptor::empty(base, spec.capacity, spec.element_size))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.specs.size_hint()
    }
}

impl<'a> ExactSizeIterator for Descriptors<'a> {}

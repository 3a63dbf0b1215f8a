//! Error types.

use thiserror::Error;

/// Reasons the planner refuses a set of vector declarations.
///
/// No partial layout is written when planning fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum LayoutError {
    /// The declaration list was empty.
    #[error("no vectors declared")]
    NoVectors,

    /// A vector was declared with room for nothing.
    #[error("vector {vector} declares zero capacity")]
    ZeroCapacity {
        /// Zero-based vector number.
        vector: usize,
    },

    /// A vector was declared with zero-byte elements.
    #[error("vector {vector} declares zero-sized elements")]
    ZeroElementSize {
        /// Zero-based vector number.
        vector: usize,
    },

    /// The table and data regions run past the largest address the pointer
    /// type can express.
    #[error("layout starting at {first} needs {required} bytes, past the end of the address space")]
    AddressSpaceExceeded {
        /// First available byte.
        first: usize,
        /// Bytes needed for table and data, or `usize::MAX` if that overflowed.
        required: usize,
    },
}

/// Errors returned by operations on a [`CircularVectorBuffer`].
///
/// Errors never unwind and are never retried internally; the vector is left
/// as it was unless noted on the variant.
///
/// [`CircularVectorBuffer`]: crate::CircularVectorBuffer
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// Planning the layout failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// `pointer_create` was called on a buffer that already has a table.
    #[error("vector table already created")]
    AlreadyCreated,

    /// The vector number is not below `num_vectors()`.
    #[error("vector {vector} out of range ({num_vectors} declared)")]
    VectorOutOfRange {
        /// Requested vector number.
        vector: usize,
        /// Number of declared vectors.
        num_vectors: usize,
    },

    /// Append or prepend on a vector at capacity under saturating behavior.
    #[error("insufficient capacity in vector {vector}")]
    Full {
        /// Zero-based vector number.
        vector: usize,
    },

    /// Read from a vector that holds nothing.
    #[error("vector {vector} is empty")]
    Empty {
        /// Zero-based vector number.
        vector: usize,
    },

    /// The element width of the call differs from the vector's element size.
    #[error("vector {vector} holds {expected}-byte elements, got {found} bytes")]
    SizeMismatch {
        /// Zero-based vector number.
        vector: usize,
        /// Element size recorded in the vector table.
        expected: usize,
        /// Width supplied by the caller.
        found: usize,
    },

    /// Positional read past the used slots.
    #[error("index {index} out of bounds for vector {vector} holding {len} elements")]
    IndexOutOfBounds {
        /// Zero-based vector number.
        vector: usize,
        /// Requested front-relative position.
        index: usize,
        /// Used slots.
        len: usize,
    },

    /// The medium rejected a byte.
    ///
    /// A failed data write leaves the descriptor untouched. A failed write to
    /// the descriptor's head, tail or count words may leave it partially
    /// updated.
    #[error("write to address {address} failed")]
    Write {
        /// Address of the rejected byte.
        address: usize,
    },

    /// An address computed from the table does not fit the pointer type.
    #[error("address {address} does not fit the pointer type")]
    AddressOutOfRange {
        /// Offending address.
        address: usize,
    },

    /// A descriptor read back from the medium breaks the table invariants.
    #[error("descriptor of vector {vector} is corrupt")]
    CorruptDescriptor {
        /// Zero-based vector number.
        vector: usize,
    },
}

//! Full-vector semantics for `CircularVectorBuffer`.

/// Tagging trait for providing behaviors to `CircularVectorBuffer`.
///
/// The behavior is part of the buffer's type only; nothing about it is
/// written to the medium, so the same table can be reopened under either.
pub trait Behavior {
    /// Whether writing to a full vector replaces an existing element.
    const OVERWRITE: bool;
}

/// Behavior for `CircularVectorBuffer` that specifies wrapping write semantics.
///
/// ### Appending:
///
/// Appending to a vector that **has already reached its capacity**
/// **overwrites** the element at the **front** (the oldest).
///
/// ### Prepending:
///
/// Prepending to a vector that **has already reached its capacity**
/// **overwrites** the element at the **back** (the newest).
pub struct Wrapping;
impl Behavior for Wrapping {
    const OVERWRITE: bool = true;
}

/// Behavior for `CircularVectorBuffer` that specifies saturating write semantics.
///
/// ### Appending:
///
/// Appending to a vector that **has already reached its capacity**
/// **fails without performing any mutation**.
///
/// ### Prepending:
///
/// Prepending to a vector that **has already reached its capacity**
/// **fails without performing any mutation**.
pub struct Saturating;
impl Behavior for Saturating {
    const OVERWRITE: bool = false;
}

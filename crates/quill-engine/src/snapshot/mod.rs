//! # Snapshot Testing Support
//!
//! - **`normalize`**: converts a [`CodeDocument`](crate::CodeDocument) into a
//!   stable, serializable [`Snap`] (generated text, mapping pairs with a
//!   preview of both sides, diagnostics) for `insta` snapshots.
//! - **`invariants`**: checks every compiled document must satisfy: mapping
//!   tables sorted and disjoint, spans in bounds, identity round-trips and a
//!   lossless syntax tree.

pub mod invariants;
pub mod normalize;

pub use invariants::check as invariants;
pub use normalize::{Snap, normalize};

//! Price resolution for rate-sheet line items.
//!
//! This module turns a catalog row, the session's discount settings and an
//! optional operator override into a single authoritative net price.

pub mod common;
pub mod resolver;

pub use resolver::{DiscountContext, DiscountResolver, LineWarning, ResolvedLineItem};

//! Price resolution and transfer valuation.

pub mod cascade;
pub mod resolver;
pub mod valuation;

pub use cascade::{Cascade, CascadeStep, Phase};
pub use resolver::PriceEngine;
pub use valuation::TransferValuer;

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod common;
pub use common::*;

mod error;
pub use error::*;

mod store;
pub use store::*;

mod lock;
pub use lock::*;

mod guard;
pub use guard::*;

mod throttle;
pub use throttle::*;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
mod runtime;

#[cfg(test)]
mod tests;

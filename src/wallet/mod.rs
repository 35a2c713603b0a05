//! Destination wallet handling: address list and index resolution

pub mod list;
pub mod resolver;

pub use list::WalletAddressList;
pub use resolver::{resolve, IndexSpec, Resolution};

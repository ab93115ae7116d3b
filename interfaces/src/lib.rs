pub mod defs;

pub use defs::{AccountIdentity, Entry, FeedSource, Publisher};

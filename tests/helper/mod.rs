//! Shared helpers for integration tests

#![allow(dead_code)]

mod feed;
mod modules;

pub use feed::{FeedBuilder, feed_path};
pub use modules::{StaticModules, installed};

//! Test doubles for the node under test.

mod chain;
pub mod node;
pub use node::{Behavior, Config, Node};

pub mod annotations;
pub mod codeflow;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod matchers;
pub mod method;
pub mod normalize;
pub mod output;
pub mod syntax;
pub mod types;
pub mod walk;

pub use codeflow::{parse, parse_typescript};

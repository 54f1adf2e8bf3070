//! # Citrus Core
//!
//! Core functionality of the citrus dynamic content resolution engine.
//!
//! This crate provides the fundamental building blocks for citrus, including:
//! - The per-test variable store ([`TestContext`]) and its factory
//! - Variable placeholder scanning and path expression evaluation
//! - Function libraries, the parameter tokenizer and the function resolver
//! - The built-in `citrus:` function library
//! - Configuration management
//!
//! ## Architecture (block diagram)
//!
//! ```text
//! +---------------------+      +---------------------+      +---------------------+
//! | config (citrus.toml)| ---> | TestContextFactory  | ---> | TestContext         |
//! | globals, discovery  |      | Arc<registry>       |      | variables           |
//! +---------------------+      +---------------------+      +---------------------+
//!                                        ^                            |
//!                                        |             replace_dynamic_content(input)
//! +---------------------+                |                            v
//! | #[citrus::function] | --inventory----+            +-------------------------------+
//! | registrations       |                             | variable pass: ${name}, paths |
//! +---------------------+                             | function pass: prefix:f(args) |
//!                                                     |   -> parameter tokenizer      |
//!                                                     |   -> FunctionLibrary lookup   |
//!                                                     +-------------------------------+
//! ```
//!
//! Most users should use the main `citrus` crate rather than importing `citrus-core` directly.

pub mod config;
pub mod context;
pub mod error;
pub mod function;
pub mod masking;
pub mod variable;

// Re-export procedural macros
pub use citrus_derive::{function, FunctionParameters};

// Re-export error handling crates
pub use eyre;

// Re-export key functionality
pub use config::{get_citrus_config, Config};
pub use context::{
    GlobalVariables, TestContext, TestContextFactory, TEST_NAME_VARIABLE, TEST_PACKAGE_VARIABLE,
};
pub use error::{Error, Result};
pub use function::{
    Function, FunctionLibrary, FunctionParameters, FunctionRegistration, FunctionRegistry,
    Nullable, Parameterized, ParameterizedFunction,
};
pub use variable::{
    extractor::{SegmentVariableExtractor, SegmentVariableExtractorRegistry},
    VARIABLE_ESCAPE, VARIABLE_PREFIX, VARIABLE_SUFFIX,
};

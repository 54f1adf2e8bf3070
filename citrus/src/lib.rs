//! # Citrus - Dynamic Content Resolution for Integration Tests
//!
//! Citrus resolves `${variable}` placeholders and `prefix:function(args)` calls
//! embedded in test data (payloads, headers, expected values) against a per-test
//! variable store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use citrus::{eyre, TestContextFactory};
//!
//! fn main() -> eyre::Result<()> {
//!     let factory = TestContextFactory::from_config(citrus::get_citrus_config())?;
//!     let mut context = factory.create_test_context("login", "auth");
//!     context.set_variable("user", "Ann")?;
//!
//!     let payload = context.replace_dynamic_content(
//!         r#"{"user": "${user}", "id": "citrus:randomNumber(6)"}"#,
//!     )?;
//!     println!("{payload}");
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Functions
//!
//! Functions registered with `#[citrus::function]` are discovered when the
//! context factory is built from configuration:
//!
//! ```rust,no_run
//! #[citrus::function(prefix = "greet:")]
//! fn say_hello(parameters: &[String], _: &citrus::TestContext) -> citrus::Result<String> {
//!     Ok(format!("Hello {}", parameters.join(" ")))
//! }
//! ```
//!
//! Functions with typed parameters implement [`ParameterizedFunction`] and derive
//! their parameter struct with `#[derive(citrus::FunctionParameters)]`.
//!
//! ## Key Features
//!
//! - **Variables**: `${name}`, nested `${${name}}` and path expressions such as
//!   `${order.items[0]}` or `${doc.jsonPath($.id)}`
//! - **Functions**: the built-in `citrus:` library plus any number of custom libraries
//! - **Global Variables**: declared in `citrus.toml` or `CITRUS_VAR_*` environment variables
//! - **Masking**: values of sensitive variables never reach the logs

mod app;

// Re-export procedural macros
pub use citrus_derive::{function, FunctionParameters};

// Re-export error handling crates for user convenience
pub use eyre;
pub use inventory;

// Re-export main application struct
pub use app::App;

// Re-export core functionality
pub use citrus_core::{
    config::{self, get_citrus_config, Config},
    context::{
        GlobalVariables, TestContext, TestContextFactory, TEST_NAME_VARIABLE,
        TEST_PACKAGE_VARIABLE,
    },
    error::{Error, Result},
    function::{
        self, builtin, parameter::parameter_list, Function, FunctionLibrary, FunctionParameters,
        FunctionRegistration, FunctionRegistry, Nullable, Parameterized, ParameterizedFunction,
    },
    masking,
    variable::{
        self,
        extractor::{SegmentVariableExtractor, SegmentVariableExtractorRegistry},
        VARIABLE_ESCAPE, VARIABLE_PREFIX, VARIABLE_SUFFIX,
    },
};

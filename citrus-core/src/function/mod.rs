//! # Functions
//!
//! Function libraries group callable functions under a namespace prefix such as
//! `citrus:`. A [`FunctionRegistry`] holds the libraries visible to a test context
//! and resolves `prefix:name(args)` expressions against them.
//!
//! ```text
//! "citrus:concat('Hello', citrus:upperCase('${user}'))"
//!   |
//!   +-- resolver: locate the prefix, track parenthesis depth, cut the span
//!   +-- resolver: resolve variables and nested functions in the arguments
//!   +-- parameter: tokenize the argument string
//!   +-- registry: library for "citrus:" -> function "concat" -> execute
//! ```
//!
//! Functions are registered explicitly with [`FunctionLibrary::with_function`] or,
//! for plain Rust functions annotated with `#[citrus::function]`, collected at link
//! time and added by [`FunctionRegistry::discover`].
pub mod builtin;
pub mod parameter;
pub mod parameterized;
pub mod resolver;

use indexmap::IndexMap;
use itertools::Itertools;
use std::{fmt, sync::Arc};
use tracing::*;

use crate::{context::TestContext, Error, Result};

pub use parameterized::{FunctionParameters, Nullable, Parameterized, ParameterizedFunction};
pub use resolver::{replace_functions_in_string, resolve_function};

/// A function callable from dynamic content.
///
/// Implementations receive the tokenized parameters with variables and nested
/// functions already resolved. A function with nothing to return yields an empty
/// string.
pub trait Function: Send + Sync {
    fn execute(&self, parameters: &[String], context: &TestContext) -> Result<String>;
}

impl<F> Function for F
where
    F: Fn(&[String], &TestContext) -> Result<String> + Send + Sync,
{
    fn execute(&self, parameters: &[String], context: &TestContext) -> Result<String> {
        self(parameters, context)
    }
}

/// Signature of functions registered through `#[citrus::function]`.
pub type FunctionPointer = fn(&[String], &TestContext) -> Result<String>;

/// A function registered for discovery. Emitted by the `#[citrus::function]` macro.
#[derive(Debug)]
pub struct FunctionRegistration {
    /// Library prefix including the trailing colon, e.g. `custom:`.
    pub prefix: &'static str,
    /// Function name as used in expressions.
    pub name: &'static str,
    pub function: FunctionPointer,
}

inventory::collect!(FunctionRegistration);

/// Namespaced collection of functions.
#[derive(Clone)]
pub struct FunctionLibrary {
    name: String,
    prefix: String,
    functions: IndexMap<String, Arc<dyn Function>>,
}

impl fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionLibrary")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionLibrary {
    /// Creates an empty library. `prefix` includes the trailing colon.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> FunctionLibrary {
        FunctionLibrary {
            name: name.into(),
            prefix: prefix.into(),
            functions: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Adds a function, replacing any function registered under the same name.
    pub fn add_function(&mut self, name: impl Into<String>, function: impl Function + 'static) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn with_function(
        mut self,
        name: impl Into<String>,
        function: impl Function + 'static,
    ) -> FunctionLibrary {
        self.add_function(name, function);
        self
    }

    /// Looks up a function by its short name.
    pub fn function(&self, name: &str) -> Result<Arc<dyn Function>> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NoSuchFunction {
                name: name.to_string(),
                library: self.name.clone(),
            })
    }

    /// Whether `expression` (`prefix:name(...)`) calls a function of this library.
    pub fn knows_function(&self, expression: &str) -> bool {
        let Some(colon) = expression.find(':') else {
            return false;
        };
        if expression[..=colon] != self.prefix {
            return false;
        }

        let rest = &expression[colon + 1..];
        let name = rest.find('(').map_or(rest, |paren| &rest[..paren]);
        self.functions.contains_key(name)
    }

    /// Function names in registration order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Ordered collection of function libraries with unique prefixes.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    libraries: Vec<FunctionLibrary>,
}

impl FunctionRegistry {
    pub fn new() -> FunctionRegistry {
        FunctionRegistry::default()
    }

    /// A registry holding the built-in `citrus:` library.
    pub fn with_core_library() -> FunctionRegistry {
        FunctionRegistry {
            libraries: vec![builtin::library()],
        }
    }

    /// Registers a library. A prefix already claimed by another library is rejected.
    pub fn add_function_library(&mut self, library: FunctionLibrary) -> Result<()> {
        if self.libraries.iter().any(|l| l.prefix == library.prefix) {
            return Err(Error::DuplicateFunctionLibraryPrefix(library.prefix));
        }

        debug!(
            "registered function library \"{}\" with prefix \"{}\" ({} functions)",
            library.name,
            library.prefix,
            library.len()
        );
        self.libraries.push(library);
        Ok(())
    }

    /// Adds one library per prefix found among the `#[citrus::function]` registrations.
    pub fn discover(&mut self) -> Result<()> {
        let registrations = inventory::iter::<FunctionRegistration>
            .into_iter()
            .into_group_map_by(|registration| registration.prefix);

        for (prefix, registrations) in registrations.into_iter().sorted_by_key(|(p, _)| *p) {
            let name = prefix.trim_end_matches(':');
            let mut library = FunctionLibrary::new(name, prefix);
            for registration in registrations {
                library.add_function(registration.name, registration.function);
            }
            debug!("discovered {} functions for prefix \"{prefix}\"", library.len());
            self.add_function_library(library)?;
        }

        Ok(())
    }

    /// The library claiming `prefix` (including the trailing colon).
    pub fn library_for_prefix(&self, prefix: &str) -> Result<&FunctionLibrary> {
        self.libraries
            .iter()
            .find(|l| l.prefix == prefix)
            .ok_or_else(|| Error::NoSuchFunctionLibrary(prefix.to_string()))
    }

    /// Whether `expression` starts with the prefix of any registered library.
    pub fn is_function(&self, expression: &str) -> bool {
        !expression.is_empty()
            && self
                .libraries
                .iter()
                .any(|l| expression.starts_with(&l.prefix))
    }

    pub fn libraries(&self) -> &[FunctionLibrary] {
        &self.libraries
    }
}

//! # Test Context
//!
//! Per-test variable store bound to the function registry and segment extractors
//! it resolves dynamic content with. Contexts are created by a
//! [`TestContextFactory`], which seeds every new context with the global variables.
//!
//! ```text
//! +--------------------+   create_context()   +--------------------------+
//! | TestContextFactory | -------------------> | TestContext              |
//! | Arc<registry>      |                      | variables (IndexMap)     |
//! | Arc<globals>       |                      | Arc<registry> (shared)   |
//! | Arc<extractors>    |                      | Arc<extractors> (shared) |
//! +--------------------+                      +--------------------------+
//!                                                         |
//!                               replace_dynamic_content_in_string(input)
//!                                                         v
//!                                  variables pass, then one functions pass per library
//! ```
//!
//! A context is meant to be owned by a single test. Parallel branches of a test
//! should work on their own clones.
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::*;

use crate::{
    config::Config,
    function::{replace_functions_in_string, resolve_function, FunctionRegistry},
    masking,
    variable::{
        cut_off_variables_escaping, cut_off_variables_prefix,
        expression::{is_path_expression, last_expression_value},
        extractor::{SegmentVariableExtractor, SegmentVariableExtractorRegistry},
        is_escaped, is_variable_name, replace_variables_in_string, value_to_string,
        VARIABLE_PREFIX, VARIABLE_SUFFIX,
    },
    Error, Result,
};

/// Variable holding the name of the running test.
pub const TEST_NAME_VARIABLE: &str = "citrus.test.name";
/// Variable holding the package (module path) of the running test.
pub const TEST_PACKAGE_VARIABLE: &str = "citrus.test.package";

/// Default variables every context created by a factory starts with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalVariables {
    variables: IndexMap<String, Value>,
}

impl GlobalVariables {
    pub fn new() -> GlobalVariables {
        GlobalVariables::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl FromIterator<(String, Value)> for GlobalVariables {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        GlobalVariables {
            variables: iter.into_iter().collect(),
        }
    }
}

/// Variable store and entry point for dynamic content resolution.
#[derive(Debug, Clone)]
pub struct TestContext {
    variables: IndexMap<String, Value>,
    global_variables: Arc<GlobalVariables>,
    function_registry: Arc<FunctionRegistry>,
    segment_extractors: Arc<SegmentVariableExtractorRegistry>,
}

impl Default for TestContext {
    /// A context with the built-in function library and no global variables.
    fn default() -> Self {
        TestContext::with_registry(Arc::new(FunctionRegistry::with_core_library()))
    }
}

impl TestContext {
    pub fn with_registry(function_registry: Arc<FunctionRegistry>) -> TestContext {
        TestContext {
            variables: IndexMap::new(),
            global_variables: Arc::default(),
            function_registry,
            segment_extractors: Arc::default(),
        }
    }

    /// Sets a variable. `name` may be given as `name` or `${name}`.
    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let name = cut_off_variables_prefix(name);
        if name.trim().is_empty() {
            return Err(Error::InvalidVariableName(name.to_string()));
        }

        let value = value.into();
        if value.is_null() {
            return Err(Error::VariableNullValue(name.to_string()));
        }

        debug!(
            "setting variable: {name} with value: '{}'",
            masking::mask_variable(name, &value)
        );
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// Sets variables from parallel name and value slices. Null values are skipped.
    pub fn add_variables<N: AsRef<str>>(&mut self, names: &[N], values: &[Value]) -> Result<()> {
        if names.len() != values.len() {
            return Err(Error::InvalidVariableUsage(format!(
                "received {} variables with {} values",
                names.len(),
                values.len()
            )));
        }

        for (name, value) in names.iter().zip(values) {
            if !value.is_null() {
                self.set_variable(name.as_ref(), value.clone())?;
            }
        }
        Ok(())
    }

    /// Sets all variables of a map. Null values are stored as empty strings.
    pub fn add_variable_map<I, K, V>(&mut self, variables: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in variables {
            let value = match value.into() {
                Value::Null => Value::String(String::new()),
                value => value,
            };
            self.set_variable(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Returns the value of a variable or path expression. `expression` may be given
    /// as `name` or `${name}`.
    pub fn variable_value(&self, expression: &str) -> Result<Value> {
        let name = cut_off_variables_prefix(expression);

        if is_escaped(name) {
            return Ok(Value::String(format!(
                "{VARIABLE_PREFIX}{}{VARIABLE_SUFFIX}",
                cut_off_variables_escaping(name)
            )));
        }

        if let Some(value) = self.variables.get(name) {
            return Ok(value.clone());
        }

        if is_path_expression(name) {
            return last_expression_value(name, self);
        }

        Err(Error::unresolved(name, "variable is not defined"))
    }

    /// Returns the value of a variable or path expression rendered as a string.
    pub fn resolve_variable(&self, expression: &str) -> Result<String> {
        self.variable_value(expression).map(|value| value_to_string(&value))
    }

    /// Whether a variable is stored under `name` (or `${name}`).
    pub fn contains_variable(&self, name: &str) -> bool {
        self.variables.contains_key(cut_off_variables_prefix(name))
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.shift_remove(cut_off_variables_prefix(name))
    }

    pub fn has_variables(&self) -> bool {
        !self.variables.is_empty()
    }

    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    /// Removes all variables and restores the global variables.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.variables.extend(
            self.global_variables
                .variables()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    /// Replaces variables and function calls in `input`.
    pub fn replace_dynamic_content(&self, input: &str) -> Result<String> {
        self.replace_dynamic_content_in_string(input, false)
    }

    /// Replaces variables and function calls in `input`, wrapping every resolved
    /// value in single quotes if `enable_quoting` is set.
    pub fn replace_dynamic_content_in_string(
        &self,
        input: &str,
        enable_quoting: bool,
    ) -> Result<String> {
        let resolved = replace_variables_in_string(input, self, enable_quoting)?;
        replace_functions_in_string(&resolved, self, enable_quoting)
    }

    /// Resolves a value that is either a single `${variable}`, a single function call
    /// or plain text, which is returned as is.
    pub fn resolve_dynamic_value(&self, value: &str) -> Result<String> {
        if is_variable_name(value) {
            self.resolve_variable(value)
        } else if self.function_registry.is_function(value) {
            resolve_function(value, self)
        } else {
            Ok(value.to_string())
        }
    }

    pub fn resolve_dynamic_values_in_list<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<String>> {
        values
            .iter()
            .map(|value| self.replace_dynamic_content(value.as_ref()))
            .collect()
    }

    /// Resolves keys and values of a map, keeping insertion order.
    pub fn resolve_dynamic_values_in_map<I, K, V>(&self, map: I) -> Result<IndexMap<String, String>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        map.into_iter()
            .map(|(key, value)| {
                Ok((
                    self.replace_dynamic_content(key.as_ref())?,
                    self.replace_dynamic_content(value.as_ref())?,
                ))
            })
            .collect()
    }

    pub(crate) fn stored_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn function_registry(&self) -> &FunctionRegistry {
        &self.function_registry
    }

    pub fn global_variables(&self) -> &GlobalVariables {
        &self.global_variables
    }

    pub fn segment_extractors(&self) -> &[Arc<dyn SegmentVariableExtractor>] {
        self.segment_extractors.extractors()
    }
}

/// Builds test contexts sharing one function registry and set of global variables.
#[derive(Debug, Clone)]
pub struct TestContextFactory {
    function_registry: Arc<FunctionRegistry>,
    global_variables: Arc<GlobalVariables>,
    segment_extractors: Arc<SegmentVariableExtractorRegistry>,
}

impl Default for TestContextFactory {
    fn default() -> Self {
        TestContextFactory::new(FunctionRegistry::with_core_library())
    }
}

impl TestContextFactory {
    pub fn new(function_registry: FunctionRegistry) -> TestContextFactory {
        TestContextFactory {
            function_registry: Arc::new(function_registry),
            global_variables: Arc::default(),
            segment_extractors: Arc::default(),
        }
    }

    pub fn with_global_variables(mut self, global_variables: GlobalVariables) -> Self {
        self.global_variables = Arc::new(global_variables);
        self
    }

    pub fn with_segment_extractors(mut self, extractors: SegmentVariableExtractorRegistry) -> Self {
        self.segment_extractors = Arc::new(extractors);
        self
    }

    /// Builds a factory from configuration.
    ///
    /// Global variables are resolved in declaration order, so a global may refer to
    /// the ones declared before it and call functions.
    pub fn from_config(config: &Config) -> Result<TestContextFactory> {
        let mut registry = FunctionRegistry::with_core_library();
        if config.functions.discover {
            registry.discover()?;
        }

        let factory = TestContextFactory::new(registry);
        let mut context = factory.create_context();
        for (name, value) in &config.global_variables {
            let value = match value {
                Value::String(text) => Value::String(context.replace_dynamic_content(text)?),
                other => other.clone(),
            };
            context.set_variable(name, value)?;
        }

        let global_variables: GlobalVariables = context.variables.into_iter().collect();
        debug!("resolved {} global variables", global_variables.len());
        Ok(factory.with_global_variables(global_variables))
    }

    /// Creates a context seeded with the global variables.
    pub fn create_context(&self) -> TestContext {
        let mut context = TestContext {
            variables: IndexMap::new(),
            global_variables: Arc::clone(&self.global_variables),
            function_registry: Arc::clone(&self.function_registry),
            segment_extractors: Arc::clone(&self.segment_extractors),
        };
        context.clear();
        context
    }

    /// Creates a context for the named test, setting the test identity variables.
    pub fn create_test_context(&self, name: &str, package: &str) -> TestContext {
        let mut context = self.create_context();
        context
            .variables
            .insert(TEST_NAME_VARIABLE.to_string(), Value::String(name.to_string()));
        context
            .variables
            .insert(TEST_PACKAGE_VARIABLE.to_string(), Value::String(package.to_string()));
        context
    }

    pub fn function_registry(&self) -> &FunctionRegistry {
        &self.function_registry
    }

    pub fn global_variables(&self) -> &GlobalVariables {
        &self.global_variables
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        function::FunctionLibrary,
        variable::expression::VariableSegment,
    };
    use serde_json::json;
    use test_case::test_case;

    fn context() -> TestContext {
        let mut context = TestContext::default();
        context.set_variable("test", "456").unwrap();
        context
    }

    #[test_case("Variable test is: ${test}", false => "Variable test is: 456"; "variable")]
    #[test_case("${test}", true => "'456'"; "quoted variable")]
    #[test_case("123${test}789", true => "123'456'789"; "quoted embedded variable")]
    #[test_case("citrus:concat('Hello', ' TestFramework!')", false => "Hello TestFramework!"; "function")]
    #[test_case("citrus:concat('Hello', ' TestFramework!')", true => "'Hello TestFramework!'"; "quoted function")]
    #[test_case("citrus:concat('${test}', '!')", false => "456!"; "variable inside function")]
    #[test_case("citrus:concat('${test}', '!')", true => "'456!'"; "variable inside quoted function")]
    #[test_case("${//escaped//}", false => "${escaped}"; "escaped")]
    #[test_case("${/value/}", false => "1"; "single slashes are a name")]
    #[test_case("   plain text with spaces  ", false => "   plain text with spaces  "; "identity")]
    #[test_case("a:b (c) d", true => "a:b (c) d"; "function-like text")]
    fn replace_dynamic_content(input: &str, quoting: bool) -> String {
        let mut context = context();
        context.set_variable("/value/", "1").unwrap();
        context
            .replace_dynamic_content_in_string(input, quoting)
            .unwrap()
    }

    #[test]
    fn end_to_end() -> eyre::Result<()> {
        let mut context = TestContext::default();
        context.set_variable("messageId", "42")?;
        context.set_variable("user", "Ann")?;
        assert_eq!(
            context.replace_dynamic_content("Hi ${user}, ref=citrus:upperCase('${user}')")?,
            "Hi Ann, ref=ANN"
        );
        Ok(())
    }

    #[test]
    fn escaped_variable_needs_no_definition() -> eyre::Result<()> {
        let context = TestContext::default();
        assert_eq!(context.resolve_variable("${//escaped//}")?, "${escaped}");
        assert_eq!(context.resolve_variable("////escaped////")?, "${//escaped//}");
        Ok(())
    }

    #[test]
    fn unknown_variable() {
        let err = context().replace_dynamic_content("${missing}").unwrap_err();
        assert!(matches!(err, Error::UnresolvedVariable { ref name, .. } if name == "missing"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn set_variable_forms() -> eyre::Result<()> {
        let mut context = TestContext::default();
        context.set_variable("${wrapped}", "a")?;
        context.set_variable("plain", json!(1))?;
        context.set_variable("plain", json!(2))?;
        assert_eq!(context.resolve_variable("wrapped")?, "a");
        assert_eq!(context.variable_value("${plain}")?, json!(2));
        assert_eq!(context.variables().len(), 2);
        Ok(())
    }

    #[test_case(""; "empty")]
    #[test_case("  "; "blank")]
    #[test_case("${}"; "empty placeholder")]
    fn set_variable_invalid_name(name: &str) {
        let err = TestContext::default().set_variable(name, "x").unwrap_err();
        assert!(matches!(err, Error::InvalidVariableName(_)));
    }

    #[test]
    fn set_variable_null() {
        let err = TestContext::default()
            .set_variable("empty", Value::Null)
            .unwrap_err();
        assert!(matches!(err, Error::VariableNullValue(ref name) if name == "empty"));
    }

    #[test]
    fn add_variables() -> eyre::Result<()> {
        let mut context = TestContext::default();
        context.add_variables(&["a", "b", "c"], &[json!("1"), Value::Null, json!(3)])?;
        assert!(context.contains_variable("a"));
        assert!(!context.contains_variable("b"));
        assert_eq!(context.resolve_variable("c")?, "3");
        Ok(())
    }

    #[test]
    fn add_variables_length_mismatch() {
        let err = TestContext::default()
            .add_variables(&["a", "b"], &[json!("1")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidVariableUsage(_)));
    }

    #[test]
    fn add_variable_map() -> eyre::Result<()> {
        let mut context = TestContext::default();
        context.add_variable_map([("a", json!("1")), ("b", Value::Null)])?;
        assert_eq!(context.resolve_variable("a")?, "1");
        assert_eq!(context.resolve_variable("b")?, "");
        Ok(())
    }

    #[test]
    fn non_string_values_render_as_json() -> eyre::Result<()> {
        let mut context = TestContext::default();
        context.set_variable("count", 3)?;
        context.set_variable("flags", json!([true, false]))?;
        assert_eq!(
            context.replace_dynamic_content("${count} ${flags}")?,
            "3 [true,false]"
        );
        Ok(())
    }

    #[test]
    fn remove_and_clear() -> eyre::Result<()> {
        let factory = TestContextFactory::default()
            .with_global_variables(GlobalVariables::new().with_variable("global", "g"));
        let mut context = factory.create_context();
        context.set_variable("local", "l")?;

        assert_eq!(context.remove_variable("${local}"), Some(json!("l")));
        assert_eq!(context.remove_variable("local"), None);

        context.set_variable("global", "changed")?;
        context.set_variable("other", "o")?;
        context.clear();
        assert_eq!(context.resolve_variable("global")?, "g");
        assert!(!context.contains_variable("other"));
        Ok(())
    }

    #[test_case("${test}" => "456"; "variable")]
    #[test_case("citrus:concat('Hello', ' TestFramework!')" => "Hello TestFramework!"; "function")]
    #[test_case("plain" => "plain"; "plain text")]
    #[test_case("${test} and more" => "${test} and more"; "not a single variable")]
    fn resolve_dynamic_value(value: &str) -> String {
        context().resolve_dynamic_value(value).unwrap()
    }

    #[test]
    fn resolve_dynamic_values_in_list() -> eyre::Result<()> {
        let values = context().resolve_dynamic_values_in_list(&[
            "${test}",
            "citrus:upperCase('a')",
            "plain",
        ])?;
        assert_eq!(values, vec!["456", "A", "plain"]);
        Ok(())
    }

    #[test]
    fn resolve_dynamic_values_in_map() -> eyre::Result<()> {
        let mut map = IndexMap::new();
        map.insert("key-${test}", "${test}");
        map.insert("plain", "citrus:lowerCase('X')");
        let resolved = context().resolve_dynamic_values_in_map(map)?;
        assert_eq!(
            resolved.into_iter().collect::<Vec<_>>(),
            vec![
                ("key-456".to_string(), "456".to_string()),
                ("plain".to_string(), "x".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn path_expression_through_placeholder() -> eyre::Result<()> {
        let mut context = TestContext::default();
        context.set_variable("order", json!({"customer": {"name": "Ann"}, "ids": [4, 5]}))?;
        assert_eq!(
            context.replace_dynamic_content("${order.customer.name} ${order.ids[1]}")?,
            "Ann 5"
        );
        Ok(())
    }

    #[test]
    fn dotted_name_wins_over_path() -> eyre::Result<()> {
        let mut context = TestContext::default();
        context.set_variable("a.b", "direct")?;
        assert_eq!(context.resolve_variable("a.b")?, "direct");
        Ok(())
    }

    struct Length;

    impl SegmentVariableExtractor for Length {
        fn can_extract(&self, _: &TestContext, object: &Value, segment: &VariableSegment) -> bool {
            object.is_string() && segment.expression == "length"
        }

        fn extract_value(
            &self,
            _: &TestContext,
            object: &Value,
            _: &VariableSegment,
        ) -> Result<Value> {
            Ok(json!(object.as_str().map_or(0, |s| s.chars().count())))
        }
    }

    #[test]
    fn factory_with_custom_extractor() -> eyre::Result<()> {
        let mut extractors = SegmentVariableExtractorRegistry::default();
        extractors.add_extractor(Length);
        let factory = TestContextFactory::default().with_segment_extractors(extractors);

        let mut context = factory.create_context();
        context.set_variable("word", "citrus")?;
        assert_eq!(context.resolve_variable("word.length")?, "6");
        Ok(())
    }

    #[test]
    fn factory_shares_registry_between_contexts() -> eyre::Result<()> {
        let mut registry = FunctionRegistry::with_core_library();
        registry.add_function_library(
            FunctionLibrary::new("custom", "custom:").with_function(
                "greet",
                |p: &[String], _: &TestContext| -> Result<String> { Ok(format!("Hi {}", p[0])) },
            ),
        )?;
        let factory = TestContextFactory::new(registry);

        let first = factory.create_context();
        let second = factory.create_context();
        assert_eq!(first.replace_dynamic_content("custom:greet('A')")?, "Hi A");
        assert_eq!(second.replace_dynamic_content("custom:greet('B')")?, "Hi B");
        assert_eq!(second.function_registry().libraries().len(), 2);
        Ok(())
    }

    #[test]
    fn test_identity_variables() -> eyre::Result<()> {
        let context = TestContextFactory::default().create_test_context("checkout", "shop::orders");
        assert_eq!(context.resolve_variable(TEST_NAME_VARIABLE)?, "checkout");
        assert_eq!(context.resolve_variable("${citrus.test.package}")?, "shop::orders");
        Ok(())
    }

    #[test]
    fn factory_from_config_resolves_globals_in_order() -> eyre::Result<()> {
        let mut config = Config::default();
        config.global_variables.insert("project".into(), json!("citrus"));
        config.global_variables.insert("greeting".into(), json!("Hello ${project}"));
        config
            .global_variables
            .insert("shout".into(), json!("citrus:upperCase('${greeting}')"));
        config.global_variables.insert("retries".into(), json!(3));

        let factory = TestContextFactory::from_config(&config)?;
        let context = factory.create_context();
        assert_eq!(context.resolve_variable("greeting")?, "Hello citrus");
        assert_eq!(context.resolve_variable("shout")?, "HELLO CITRUS");
        assert_eq!(context.variable_value("retries")?, json!(3));
        assert_eq!(
            factory.global_variables().variables().keys().collect::<Vec<_>>(),
            vec!["project", "greeting", "shout", "retries"]
        );
        Ok(())
    }

    #[test]
    fn factory_from_config_fails_on_unknown_reference() {
        let mut config = Config::default();
        config.global_variables.insert("broken".into(), json!("${nope}"));
        let err = TestContextFactory::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::UnresolvedVariable { .. }));
    }
}

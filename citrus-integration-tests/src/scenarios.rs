use citrus::{
    config::Functions, eyre, Config, Error, FunctionRegistry, TestContextFactory,
    TEST_NAME_VARIABLE,
};
use serde_json::json;
use test_case::test_case;

use crate::functions::text_library;

fn discovered_factory() -> eyre::Result<TestContextFactory> {
    let mut registry = FunctionRegistry::with_core_library();
    registry.discover()?;
    registry.add_function_library(text_library())?;
    Ok(TestContextFactory::new(registry))
}

#[test]
fn discovery_groups_registrations_by_prefix() -> eyre::Result<()> {
    let mut registry = FunctionRegistry::with_core_library();
    registry.discover()?;

    let library = registry.library_for_prefix("it:")?;
    assert_eq!(library.name(), "it");
    let mut names: Vec<_> = library.function_names().collect();
    names.sort();
    assert_eq!(names, vec!["greet", "reverse", "testName"]);
    Ok(())
}

#[test]
fn discovery_twice_is_a_duplicate_prefix() -> eyre::Result<()> {
    let mut registry = FunctionRegistry::new();
    registry.discover()?;
    assert!(matches!(
        registry.discover(),
        Err(Error::DuplicateFunctionLibraryPrefix(_))
    ));
    Ok(())
}

#[test_case("it:reverse('abc')" => "cba"; "registered function")]
#[test_case("it:greet()" => "Hello Ann"; "reads context variable")]
#[test_case("it:greet('Bob')" => "Hello Bob"; "custom name")]
#[test_case("it:greet(citrus:upperCase('${user}'))" => "Hello ANN"; "core function as argument")]
#[test_case("citrus:concat(it:reverse('ab'), '!')" => "ba!"; "custom function as argument")]
#[test_case("it:reverse(citrus:upperCase('ab'))" => "BA"; "library order")]
#[test_case("it:testName()" => "checkout"; "test identity")]
#[test_case("text:pad('7', 3)" => "007"; "typed defaults")]
#[test_case("text:pad('ab', 4, '*', false)" => "ab**"; "typed optional parameters")]
#[test_case("text:join('+', 'a', it:reverse('cb'), '${user}')" => "a+bc+Ann"; "rest parameters")]
fn resolve(input: &str) -> String {
    let factory = discovered_factory().unwrap();
    let mut context = factory.create_test_context("checkout", "shop");
    context.set_variable("user", "Ann").unwrap();
    context.replace_dynamic_content(input).unwrap()
}

#[test_case("text:pad('7')", "\"width\""; "missing parameter")]
#[test_case("text:pad('7', 'wide')", "\"width\""; "unparsable parameter")]
#[test_case("text:pad('7', 3, '0', 'maybe')", "\"alignLeft\""; "renamed parameter")]
#[test_case("it:unknown()", "unknown"; "unknown function")]
fn typed_parameter_errors(input: &str, expected: &str) {
    let factory = discovered_factory().unwrap();
    let err = factory
        .create_context()
        .replace_dynamic_content(input)
        .unwrap_err();
    assert!(err.to_string().contains(expected), "{err}");
}

#[test]
fn discovery_disabled() -> eyre::Result<()> {
    let config = Config {
        functions: Functions { discover: false },
        ..Config::default()
    };
    let factory = TestContextFactory::from_config(&config)?;

    assert!(factory.function_registry().library_for_prefix("it:").is_err());
    // unknown prefixes are plain text
    assert_eq!(
        factory
            .create_context()
            .replace_dynamic_content("it:reverse('abc')")?,
        "it:reverse('abc')"
    );
    Ok(())
}

#[test]
fn global_variables_from_config_file() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("citrus.toml");
    std::fs::write(
        &path,
        r#"
[global_variables]
project = "citrus"
greeting = "Hello ${project}"
runId = "citrus:randomNumber(4)"
reversed = "it:reverse('${project}')"
maxRetries = 3
"#,
    )?;

    let config = Config::load_from(&path)?;
    let factory = TestContextFactory::from_config(&config)?;
    let context = factory.create_test_context("orders", "shop");

    assert_eq!(context.resolve_variable("greeting")?, "Hello citrus");
    assert_eq!(context.resolve_variable("runId")?.len(), 4);
    assert_eq!(context.resolve_variable("reversed")?, "surtic");
    assert_eq!(context.variable_value("maxRetries")?, json!(3));
    assert_eq!(context.resolve_variable(TEST_NAME_VARIABLE)?, "orders");

    // globals are resolved once per factory
    let other = factory.create_context();
    assert_eq!(
        other.resolve_variable("runId")?,
        context.resolve_variable("runId")?
    );
    Ok(())
}

#[test]
fn payload_with_paths_and_functions() -> eyre::Result<()> {
    let mut context = TestContextFactory::default().create_context();
    context.set_variable(
        "order",
        json!({
            "id": 7,
            "customer": {"name": "Ann"},
            "items": [{"sku": "A1"}, {"sku": "B2"}]
        }),
    )?;
    context.set_variable("raw", r#"{"status": "NEW"}"#)?;

    let payload = context.replace_dynamic_content(
        r#"{"order": ${order.id}, "customer": "citrus:upperCase('${order.customer.name}')", "second": "${order.items[1].sku}", "skus": ${order.jsonPath($.items[*].sku)}, "status": "${raw.jsonPath($.status)}"}"#,
    )?;
    let parsed: serde_json::Value = serde_json::from_str(&payload)?;
    assert_eq!(
        parsed,
        json!({
            "order": 7,
            "customer": "ANN",
            "second": "B2",
            "skus": ["A1", "B2"],
            "status": "NEW"
        })
    );
    Ok(())
}

#[test]
fn context_isolation() -> eyre::Result<()> {
    let factory = TestContextFactory::default();
    let mut first = factory.create_context();
    first.set_variable("only_here", "1")?;

    let second = factory.create_context();
    assert!(first.contains_variable("only_here"));
    assert!(!second.contains_variable("only_here"));
    Ok(())
}

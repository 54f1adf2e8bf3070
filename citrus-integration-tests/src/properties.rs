use citrus::{
    parameter_list, Error, FunctionLibrary, FunctionRegistry, TestContext, TestContextFactory,
};
use test_case::test_case;

fn context() -> TestContext {
    let mut context = TestContextFactory::default().create_context();
    context.set_variable("test", "456").unwrap();
    context
}

#[test_case(""; "empty")]
#[test_case("plain text"; "plain")]
#[test_case("  padded  "; "surrounding whitespace")]
#[test_case("time: 12:00"; "colon only")]
#[test_case("f(x) = y"; "parentheses only")]
#[test_case("{\"a\": [1, (2)]}"; "json without functions")]
#[test_case("$test and {test}"; "incomplete placeholder")]
fn plain_text_is_unchanged(input: &str) {
    assert_eq!(context().replace_dynamic_content(input).unwrap(), input);
}

#[test_case("a,b,c" => vec!["a", "b", "c"]; "simple")]
#[test_case("'a,b',c" => vec!["a,b", "c"]; "comma inside quotes")]
#[test_case("" => Vec::<&str>::new(); "empty")]
#[test_case("  a , b  " => vec!["a", "b"]; "whitespace trimmed")]
#[test_case("'it''s ok'" => vec!["it", "s ok"]; "doubled quote")]
fn tokenizer(input: &str) -> Vec<String> {
    parameter_list(input)
}

#[test]
fn variable_resolution() -> citrus::eyre::Result<()> {
    let context = context();
    assert_eq!(
        context.replace_dynamic_content("Variable is: ${test}")?,
        "Variable is: 456"
    );
    assert_eq!(context.replace_dynamic_content_in_string("${test}", true)?, "'456'");
    Ok(())
}

#[test]
fn escaped_placeholder_is_not_resolved() -> citrus::eyre::Result<()> {
    assert_eq!(
        context().replace_dynamic_content("${//escaped//}")?,
        "${escaped}"
    );
    Ok(())
}

#[test]
fn function_resolution() -> citrus::eyre::Result<()> {
    let context = context();
    assert_eq!(
        context.replace_dynamic_content("citrus:concat('Hello', ' World!')")?,
        "Hello World!"
    );
    assert_eq!(
        context.replace_dynamic_content("citrus:concat('${test}', '!')")?,
        "456!"
    );
    Ok(())
}

#[test]
fn unknown_variable() {
    assert!(matches!(
        context().replace_dynamic_content("${missing}"),
        Err(Error::UnresolvedVariable { name, .. }) if name == "missing"
    ));
}

#[test]
fn duplicate_prefix_is_rejected_at_registration() {
    let mut registry = FunctionRegistry::with_core_library();
    let result = registry.add_function_library(FunctionLibrary::new("other", "citrus:"));
    assert!(matches!(result, Err(Error::DuplicateFunctionLibraryPrefix(prefix)) if prefix == "citrus:"));
    assert_eq!(registry.libraries().len(), 1);
}

#[test]
fn end_to_end() -> citrus::eyre::Result<()> {
    let mut context = TestContextFactory::default().create_context();
    context.set_variable("messageId", "42")?;
    context.set_variable("user", "Ann")?;
    assert_eq!(
        context.replace_dynamic_content("Hi ${user}, ref=citrus:upperCase('${user}')")?,
        "Hi Ann, ref=ANN"
    );
    Ok(())
}

use citrus::{FunctionLibrary, Parameterized, ParameterizedFunction, TestContext};

#[citrus::function(prefix = "it:")]
pub fn reverse(parameters: &[String], _: &TestContext) -> citrus::Result<String> {
    Ok(parameters.concat().chars().rev().collect())
}

/// Greets the given name, or the `user` variable when called without parameters.
#[citrus::function(prefix = "it", name = "greet")]
pub fn say_hello(parameters: &[String], context: &TestContext) -> citrus::Result<String> {
    let name = match parameters.first() {
        Some(name) => name.clone(),
        None => context.resolve_variable("user")?,
    };
    Ok(format!("Hello {name}"))
}

#[citrus::function(prefix = "it:")]
pub fn test_name(_: &[String], context: &TestContext) -> citrus::Result<String> {
    context.resolve_variable(citrus::TEST_NAME_VARIABLE)
}

#[derive(Debug, citrus::FunctionParameters)]
pub struct PadParameters {
    value: String,
    width: usize,
    #[param(default = "0")]
    fill: char,
    #[param(name = "alignLeft", default = "true")]
    left: bool,
}

/// `text:pad(value, width[, fill][, alignLeft])`.
pub struct Pad;

impl ParameterizedFunction for Pad {
    type Parameters = PadParameters;

    fn execute(&self, p: PadParameters, _: &TestContext) -> citrus::Result<String> {
        let missing = p.width.saturating_sub(p.value.chars().count());
        let padding: String = std::iter::repeat(p.fill).take(missing).collect();
        Ok(if p.left {
            format!("{padding}{}", p.value)
        } else {
            format!("{}{padding}", p.value)
        })
    }
}

#[derive(Debug, citrus::FunctionParameters)]
pub struct JoinParameters {
    separator: String,
    #[param(rest)]
    values: Vec<String>,
}

/// `text:join(separator, value...)`.
pub struct Join;

impl ParameterizedFunction for Join {
    type Parameters = JoinParameters;

    fn execute(&self, p: JoinParameters, _: &TestContext) -> citrus::Result<String> {
        Ok(p.values.join(&p.separator))
    }
}

/// The `text:` library.
pub fn text_library() -> FunctionLibrary {
    FunctionLibrary::new("text", "text:")
        .with_function("pad", Parameterized(Pad))
        .with_function("join", Parameterized(Join))
}

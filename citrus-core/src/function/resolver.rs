//! Locates `prefix:name(args)` invocations in a string and evaluates them.
use tracing::*;

use super::parameter::parameter_list;
use crate::{
    context::TestContext,
    variable::{cut_off_variables_prefix, push_resolved, replace_variables_in_string},
    Error, Result,
};

/// Replaces every function invocation in `input` with its result.
///
/// Libraries are searched in registration order, each over the output of the
/// previous one. A call spans from its prefix to the `)` closing the first `(`,
/// or to the end of the input if the parentheses never balance.
pub fn replace_functions_in_string(
    input: &str,
    context: &TestContext,
    enable_quoting: bool,
) -> Result<String> {
    if !(input.contains(':') && input.contains('(') && input.contains(')')) {
        return Ok(input.to_string());
    }

    let mut current = input.to_string();
    for library in context.function_registry().libraries() {
        let prefix = library.prefix();
        if prefix.is_empty() {
            continue;
        }

        let mut output = String::with_capacity(current.len());
        let mut start = 0;
        while let Some(found) = current[start..].find(prefix) {
            let search = start + found;
            let end = scan_function_call(&current, search);

            let value = resolve_function(&current[search..end], context)?;
            output.push_str(&current[start..search]);
            push_resolved(&mut output, &value, enable_quoting);

            start = end;
        }
        output.push_str(&current[start..]);
        current = output;
    }

    Ok(current)
}

/// Returns the end (exclusive) of the function call starting at `from`.
fn scan_function_call(input: &str, from: usize) -> usize {
    let mut depth = -1i32;
    let mut chars = input[from..].char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c == '(' {
            depth += 1;
        }

        if c == ')' || chars.peek().is_none() {
            if depth == 0 {
                return from + offset + c.len_utf8();
            }
            depth -= 1;
        }
    }

    input.len()
}

/// Evaluates a single `prefix:name(args)` expression, optionally wrapped in `${...}`.
///
/// Variables in the argument string are resolved first, then nested functions
/// (whose results are quoted so they stay single parameters), then the arguments
/// are tokenized and handed to the function.
pub fn resolve_function(expression: &str, context: &TestContext) -> Result<String> {
    let expression = cut_off_variables_prefix(expression);

    let invalid = || {
        Error::InvalidFunctionUsage(format!(
            "unable to resolve function \"{expression}\", expected prefix:name(parameters)"
        ))
    };
    let colon = expression.find(':').ok_or_else(invalid)?;
    let open = expression.find('(').ok_or_else(invalid)?;
    if open < colon || !expression.ends_with(')') {
        return Err(invalid());
    }

    let prefix = &expression[..=colon];
    let name = &expression[colon + 1..open];
    let parameter_string = &expression[open + 1..expression.len() - 1];

    let library = context.function_registry().library_for_prefix(prefix)?;

    let parameter_string = replace_variables_in_string(parameter_string, context, false)?;
    let parameter_string = replace_functions_in_string(&parameter_string, context, true)?;

    let function = library.function(name)?;
    let parameters = parameter_list(&parameter_string);
    trace!("resolving function {prefix}{name} with {} parameters", parameters.len());

    function.execute(&parameters, context)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::function::{FunctionLibrary, FunctionRegistry};
    use std::sync::Arc;
    use test_case::test_case;

    fn context() -> TestContext {
        let mut registry = FunctionRegistry::with_core_library();
        registry
            .add_function_library(
                FunctionLibrary::new("echo", "echo:")
                    .with_function("count", |p: &[String], _: &TestContext| -> Result<String> {
                        Ok(p.len().to_string())
                    })
                    .with_function("join", |p: &[String], _: &TestContext| -> Result<String> {
                        Ok(p.join("|"))
                    }),
            )
            .unwrap();

        let mut context = TestContext::with_registry(Arc::new(registry));
        context.set_variable("test", "456").unwrap();
        context.set_variable("user", "Ann").unwrap();
        context.set_variable("csv", "a,b").unwrap();
        context
    }

    #[test_case("citrus:concat('Hello', ' World!')" => "Hello World!"; "concat")]
    #[test_case("${citrus:concat('Hello', ' World!')}" => "Hello World!"; "wrapped in variable markers")]
    #[test_case("citrus:concat('${test}', '!')" => "456!"; "variable argument")]
    #[test_case("citrus:concat('a', citrus:upperCase('b'))" => "aB"; "nested function")]
    #[test_case("citrus:concat(citrus:upperCase('a, b'), '!')" => "A, B!"; "nested result with comma stays one parameter")]
    #[test_case("echo:count()" => "0"; "no parameters")]
    #[test_case("echo:count(${csv})" => "2"; "unquoted variable with comma splits")]
    #[test_case("echo:count('${csv}')" => "1"; "quoted variable with comma")]
    #[test_case("echo:join(a, 'b c', d)" => "a|b c|d"; "mixed quoting")]
    fn resolve(expression: &str) -> String {
        resolve_function(expression, &context()).unwrap()
    }

    #[test_case("citrus:concat" ; "missing parentheses")]
    #[test_case("concat('a')" ; "missing colon")]
    #[test_case("citrus:concat('a'" ; "missing closing parenthesis")]
    #[test_case("concat('a:b')" ; "colon after opening parenthesis")]
    fn invalid_usage(expression: &str) {
        let err = resolve_function(expression, &context()).unwrap_err();
        assert!(matches!(err, Error::InvalidFunctionUsage(_)), "{err:?}");
    }

    #[test]
    fn unknown_library() {
        let err = resolve_function("nope:concat('a')", &context()).unwrap_err();
        assert!(matches!(err, Error::NoSuchFunctionLibrary(ref p) if p == "nope:"));
    }

    #[test]
    fn unknown_function() {
        let err = resolve_function("citrus:nope('a')", &context()).unwrap_err();
        assert!(matches!(err, Error::NoSuchFunction { ref name, .. } if name == "nope"));
    }

    #[test_case("Result: citrus:concat('Hello', ' World!')", false => "Result: Hello World!"; "embedded")]
    #[test_case("citrus:upperCase('a') and citrus:lowerCase('B')", false => "A and b"; "two calls")]
    #[test_case("[citrus:concat('x', citrus:upperCase('y'))]", false => "[xY]"; "nested with surrounding text")]
    #[test_case("citrus:concat('Hello', ' TestFramework!')", true => "'Hello TestFramework!'"; "quoted")]
    #[test_case("citrus:upperCase('a') echo:count(x, y)", false => "A 2"; "two libraries")]
    #[test_case("no function here", false => "no function here"; "plain text")]
    #[test_case("time: 10:30 (local)", false => "time: 10:30 (local)"; "colon and parentheses without prefix")]
    #[test_case("citrus:concat('citrus:citrus')", false => "citrus:citrus"; "prefix inside literal")]
    fn replace(input: &str, quoting: bool) -> String {
        replace_functions_in_string(input, &context(), quoting).unwrap()
    }

    #[test]
    fn unbalanced_call_runs_to_end_of_input() {
        assert_eq!(scan_function_call("x citrus:concat('a'", 2), 19);
        assert_eq!(scan_function_call("citrus:f(g(1)) tail", 0), 14);
    }
}

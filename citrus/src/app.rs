use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use console::Term;
use itertools::Itertools;
use serde_json::Value;
use std::str::FromStr;
use tabled::{Table, Tabled};
use tracing::*;
use tracing_subscriber::EnvFilter;

use crate::{get_citrus_config, masking, Config, TestContextFactory};

/// Build the CLI with clap's builder pattern
fn build_cli() -> ClapCommand {
    ClapCommand::new("citrus")
        .about("citrus CLI resolves dynamic content and lists the available functions")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .global(true)
            .help("Print debug logs of the engine. RUST_LOG takes precedence")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("color")
            .long("color")
            .global(true)
            .help("Produce color output. Default is \"auto\" [env: CARGO_TERM_COLOR]")
            .value_parser(["auto", "always", "never"]))
        .subcommand(
            ClapCommand::new("resolve")
                .about("Resolve variables and functions in an expression")
                .arg(Arg::new("expression")
                    .help("Expression to resolve, e.g. \"Hello ${user}, citrus:upperCase('x')\"")
                    .required(true))
                .arg(Arg::new("set")
                    .short('s')
                    .long("set")
                    .help("Set a test variable before resolving. JSON values are stored as JSON. --set user=Ann --set ids=[1,2]")
                    .value_parser(parse_assignment)
                    .action(ArgAction::Append))
                .arg(Arg::new("quote")
                    .short('q')
                    .long("quote")
                    .help("Wrap resolved values in single quotes")
                    .action(ArgAction::SetTrue))
        )
        .subcommand(
            ClapCommand::new("ls")
                .about("List function libraries and their functions")
        )
        .subcommand(
            ClapCommand::new("vars")
                .about("List resolved global variables")
        )
}

/// Parses `name=value`, keeping `value` as JSON when it parses as such.
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got \"{raw}\""))?;
    if name.trim().is_empty() {
        return Err(format!("missing variable name in \"{raw}\""));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.trim().to_string(), value))
}

#[derive(Tabled)]
struct FunctionRow {
    #[tabled(rename = "Library")]
    library: String,
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Function")]
    function: String,
}

#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn resolve(factory: &TestContextFactory, matches: &ArgMatches) -> eyre::Result<String> {
    let expression = matches
        .get_one::<String>("expression")
        .ok_or_else(|| eyre::eyre!("expression is required"))?;
    let enable_quoting = matches.get_flag("quote");

    let mut context = factory.create_test_context("cli", "citrus");
    for (name, value) in matches
        .get_many::<(String, Value)>("set")
        .into_iter()
        .flatten()
    {
        context.set_variable(name, value.clone())?;
    }

    Ok(context.replace_dynamic_content_in_string(expression, enable_quoting)?)
}

fn function_table(factory: &TestContextFactory) -> Table {
    let rows = factory
        .function_registry()
        .libraries()
        .iter()
        .flat_map(|library| {
            library.function_names().sorted().map(|name| FunctionRow {
                library: library.name().to_string(),
                prefix: library.prefix().to_string(),
                function: name.to_string(),
            })
        })
        .collect_vec();
    Table::new(rows)
}

fn variable_table(factory: &TestContextFactory) -> Table {
    let rows = factory
        .global_variables()
        .variables()
        .iter()
        .map(|(name, value)| VariableRow {
            name: name.clone(),
            value: masking::mask_variable(name, value),
        })
        .collect_vec();
    Table::new(rows)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_color(color_command: Option<Color>) {
    let color_env = std::env::var("CARGO_TERM_COLOR");
    let color = match (color_command, color_env) {
        (color @ Some(Color::Always), _) => color,
        (color @ Some(Color::Never), _) => color,
        (None, Ok(color)) => Color::from_str(&color).ok(),
        _ => None,
    };
    match color {
        Some(Color::Always) => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
        Some(Color::Never) => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        _ => {}
    }
}

/// citrus CLI.
#[derive(Debug, Default)]
pub struct App {
    config: Option<Config>,
}

impl App {
    pub fn new() -> App {
        App { config: None }
    }

    /// Use `config` instead of the process-wide configuration.
    pub fn with_config(mut self, config: Config) -> App {
        self.config = Some(config);
        self
    }

    /// Parse command-line args and run citrus CLI sub command.
    pub fn run(self) -> eyre::Result<()> {
        let matches = build_cli().get_matches();
        color_eyre::install()?;
        self.execute(&matches, &Term::stdout())
    }

    fn execute(self, matches: &ArgMatches, term: &Term) -> eyre::Result<()> {
        init_logging(matches.get_flag("verbose"));
        apply_color(
            matches
                .get_one::<String>("color")
                .and_then(|s| Color::from_str(s).ok()),
        );

        let cfg = match &self.config {
            Some(cfg) => cfg,
            None => get_citrus_config(),
        };
        masking::set_mask_sensitive(cfg.masking.enabled);
        let factory = TestContextFactory::from_config(cfg)?;
        debug!(
            "context factory ready with {} function libraries",
            factory.function_registry().libraries().len()
        );

        match matches.subcommand() {
            Some(("resolve", resolve_matches)) => {
                term.write_line(&resolve(&factory, resolve_matches)?)?;
            }
            Some(("ls", _)) => {
                term.write_line(&function_table(&factory).to_string())?;
            }
            Some(("vars", _)) => {
                term.write_line(&variable_table(&factory).to_string())?;
            }
            _ => unreachable!("Subcommand required is set to true"),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

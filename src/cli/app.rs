//! Main CLI application

use crate::config::{parse_playbook_file, ArgSpec, ArgType, Playbook};
use crate::error::{DocumentError, ExecutionError, UpError};
use crate::runner::expr::render_value;
use crate::runner::handlers::parse_bool;
use crate::runner::{Context, Engine, Vars, Verbosity};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use serde_yaml::Value;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Built-in long flags that take no value
const BOOLEAN_FLAGS: &[&str] = &["--quiet", "--silent", "--verbose", "--ask", "--help", "--version"];

/// Names taken by the built-in flags
const RESERVED_ARGS: &[&str] = &["playbook", "quiet", "silent", "verbose", "ask", "env-file"];

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Parsed playbook
    playbook: Playbook,
    /// Playbook file path
    playbook_path: PathBuf,
    /// Whether missing arguments are prompted for
    ask: bool,
}

impl App {
    /// Create app for a playbook file
    pub fn with_playbook_file(path: PathBuf, ask: bool) -> Result<Self, UpError> {
        let playbook = parse_playbook_file(&path)?;
        check_reserved(&playbook.args)?;

        let command = build_command(Some(&playbook), ask);

        Ok(App {
            command,
            playbook,
            playbook_path: path,
            ask,
        })
    }

    /// Run the application with command line arguments
    pub fn run(self, args: Vec<String>) -> Result<(), UpError> {
        let matches = self.command.clone().get_matches_from(args);

        let verbosity = get_verbosity(&matches);
        init_logging(verbosity);

        if let Some(env_file) = matches.get_one::<String>("env-file") {
            dotenvy::from_path(env_file).map_err(|e| DocumentError::Unreadable {
                path: PathBuf::from(env_file),
                error: e.to_string(),
            })?;
        }

        let mut output = io::stderr();
        let globals = if io::stdin().is_terminal() {
            collect_arg_values(
                &self.playbook.args,
                &matches,
                self.ask,
                &mut TerminalAnswers,
                &mut output,
            )?
        } else {
            collect_arg_values(
                &self.playbook.args,
                &matches,
                self.ask,
                &mut LineAnswers(io::stdin().lock()),
                &mut output,
            )?
        };

        let ctx = Context::new()
            .with_playbook_path(self.playbook_path.clone())
            .with_verbosity(verbosity)
            .with_globals(globals);

        let mut engine = Engine::new(ctx);
        engine.run_playbook(&self.playbook)
    }
}

/// Build the clap command, adding the playbook's declared arguments
pub fn build_command(playbook: Option<&Playbook>, ask: bool) -> Command {
    let about = playbook
        .and_then(|p| p.doc.clone())
        .unwrap_or_else(|| "Run a YAML playbook".to_string());

    let mut cmd = Command::new("up")
        .version(env!("CARGO_PKG_VERSION"))
        .about(about)
        .arg(
            Arg::new("playbook")
                .value_name("PLAYBOOK")
                .help("Path to the playbook file")
                .required(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ask")
                .long("ask")
                .help("Prompt for every argument not given on the command line")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("env-file")
                .long("env-file")
                .value_name("FILE")
                .help("Load environment variables from a file"),
        );

    let Some(playbook) = playbook else {
        return cmd;
    };

    for spec in &playbook.args {
        let mut help = spec.description.clone().unwrap_or_default();
        if let Some(default) = &spec.default {
            help = format!("{} [default: {}]", help, render_value(default))
                .trim()
                .to_string();
        }

        let mut arg_def = Arg::new(spec.name.clone())
            .value_name(spec.name.to_uppercase())
            .help(help);

        arg_def = match spec.arg_type {
            ArgType::Int => arg_def.value_parser(value_parser!(i64)),
            ArgType::Bool => arg_def.value_parser(parse_bool_value),
            ArgType::Str | ArgType::Password => arg_def,
        };

        if spec.is_positional() {
            arg_def = arg_def.required(!ask);
        } else {
            arg_def = arg_def.long(spec.name.clone());
            if spec.arg_type == ArgType::Bool {
                arg_def = arg_def.num_args(0..=1).default_missing_value("true");
            }
        }

        cmd = cmd.arg(arg_def);
    }

    cmd
}

fn parse_bool_value(text: &str) -> Result<bool, String> {
    parse_bool(text).ok_or_else(|| format!("'{}' is not a boolean", text))
}

fn check_reserved(specs: &[ArgSpec]) -> Result<(), DocumentError> {
    match specs
        .iter()
        .find(|spec| RESERVED_ARGS.contains(&spec.name.as_str()))
    {
        Some(spec) => Err(DocumentError::InvalidArgs(format!(
            "argument name '{}' is reserved",
            spec.name
        ))),
        None => Ok(()),
    }
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Initialise `tracing` on stderr; `RUST_LOG` wins over the verbosity flag
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbosity >= Verbosity::Verbose {
            "debug"
        } else {
            "warn"
        })
    });

    // A second initialisation (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Resolve every declared argument into a global variable.
///
/// Command-line values win; otherwise the user is prompted (with `--ask`) or
/// the declared default is used.
pub fn collect_arg_values<A: Answers, W: Write>(
    specs: &[ArgSpec],
    matches: &ArgMatches,
    ask: bool,
    input: &mut A,
    output: &mut W,
) -> Result<Vars, UpError> {
    let mut vars = Vars::new();

    for spec in specs {
        let value = match matched_value(spec, matches) {
            Some(value) => value,
            None if ask => prompt_value(spec, input, output)?,
            None => spec.default.clone().ok_or_else(|| ExecutionError::MissingArgument {
                command: "args".to_string(),
                name: spec.name.clone(),
            })?,
        };
        vars.insert(spec.name.clone(), value);
    }

    Ok(vars)
}

fn matched_value(spec: &ArgSpec, matches: &ArgMatches) -> Option<Value> {
    let name = spec.name.as_str();
    match spec.arg_type {
        ArgType::Int => matches
            .get_one::<i64>(name)
            .map(|n| Value::Number((*n).into())),
        ArgType::Bool => matches.get_one::<bool>(name).map(|b| Value::Bool(*b)),
        ArgType::Str | ArgType::Password => matches
            .get_one::<String>(name)
            .map(|s| Value::String(s.clone())),
    }
}

/// Where `--ask` answers come from
pub trait Answers {
    /// Read one answer, without the line ending; `hidden` answers are not echoed
    fn read_answer(&mut self, hidden: bool) -> io::Result<String>;
}

/// Answers read line by line from any reader (piped stdin, tests)
pub struct LineAnswers<R>(pub R);

impl<R: BufRead> Answers for LineAnswers<R> {
    fn read_answer(&mut self, _hidden: bool) -> io::Result<String> {
        let mut line = String::new();
        self.0.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Answers typed at an interactive terminal; hidden ones are read in raw mode
pub struct TerminalAnswers;

impl Answers for TerminalAnswers {
    fn read_answer(&mut self, hidden: bool) -> io::Result<String> {
        if !hidden {
            return LineAnswers(io::stdin().lock()).read_answer(false);
        }

        terminal::enable_raw_mode()?;
        let answer = read_hidden_keys();
        let _ = terminal::disable_raw_mode();
        // Enter was not echoed
        eprintln!();
        answer
    }
}

fn read_hidden_keys() -> io::Result<String> {
    let mut answer = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(answer),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "prompt interrupted"));
            }
            KeyCode::Char(c) => answer.push(c),
            KeyCode::Backspace => {
                answer.pop();
            }
            _ => {}
        }
    }
}

/// Prompt for one argument; an empty answer takes the default.
///
/// `password` answers are requested hidden.
pub fn prompt_value<A: Answers, W: Write>(
    spec: &ArgSpec,
    input: &mut A,
    output: &mut W,
) -> Result<Value, UpError> {
    let label = spec.description.as_deref().unwrap_or(&spec.name);
    match &spec.default {
        Some(default) => write!(output, "{} [{}]: ", label, render_value(default))?,
        None => write!(output, "{}: ", label)?,
    }
    output.flush()?;

    let answer = input.read_answer(spec.arg_type == ArgType::Password)?;
    let answer = answer.as_str();

    if answer.is_empty() {
        if let Some(default) = &spec.default {
            return Ok(default.clone());
        }
    }

    let invalid = |error: String| ExecutionError::InvalidArgument {
        command: "args".to_string(),
        name: spec.name.clone(),
        error,
    };

    Ok(match spec.arg_type {
        ArgType::Int => answer
            .trim()
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| invalid(format!("'{}' is not an integer", answer)))?,
        ArgType::Bool => Value::Bool(parse_bool_value(answer).map_err(invalid)?),
        ArgType::Str | ArgType::Password => Value::String(answer.to_string()),
    })
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), UpError> {
    let args: Vec<String> = std::env::args().collect();
    let ask = args.iter().any(|arg| arg == "--ask");

    match extract_playbook_arg(&args) {
        Some(path) => App::with_playbook_file(path, ask)?.run(args),
        None => {
            // no playbook given: let clap report usage, help or version
            build_command(None, ask).get_matches_from(args);
            Ok(())
        }
    }
}

/// Extract the playbook path before clap parsing.
///
/// The playbook is the first free-standing word. A long flag other than the
/// built-in switches is taken to carry the next word as its value, so declared
/// options may come before the playbook (`up --greeting hi site.yml`).
fn extract_playbook_arg(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            return iter.next().map(PathBuf::from);
        }
        if arg.starts_with("--") {
            if !arg.contains('=') && !BOOLEAN_FLAGS.contains(&arg.as_str()) {
                iter.next();
            }
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}

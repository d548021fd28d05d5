use awsl::cli::{self, Args, Commands};
use awsl::config::{self, AppConfig};
use awsl::convert::to_json_string;
use awsl::diagnostic::{render_diagnostics, Diagnostic, Label};
use awsl::interpreter::{self, Environment, Interpreter, RunError};
use awsl::lexer::{is_unterminated_string, Lexer};
use awsl::token::TokenKind;
use awsl::Value;
use clap::Parser;
use owo_colors::OwoColorize;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to read {}: {source}", path.display())]
    ReadScript { path: PathBuf, source: io::Error },
    #[error("Failed to read from stdin: {0}")]
    Stdin(io::Error),
    #[error("No input provided. Pass a SCRIPT path, use --eval, or pipe source via stdin")]
    NoInput,
}

/// Source text plus the name shown in diagnostics.
struct Input {
    name: String,
    source: String,
}

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        cli::generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    config::init_tracing(&config);

    let input = match read_input(&args) {
        Ok(input) => input,
        Err(e) => {
            error_message(&config, &e.to_string());
            process::exit(1);
        }
    };
    tracing::debug!(name = %input.name, bytes = input.source.len(), "read script");

    let code = if args.tokens {
        dump_tokens(&input, &config)
    } else if args.ast {
        dump_ast(&input, &config)
    } else {
        run_script(&input, &config)
    };

    let _ = io::stdout().flush();
    process::exit(code);
}

fn read_input(args: &Args) -> Result<Input, CliError> {
    if let Some(code) = &args.eval {
        return Ok(Input {
            name: "<eval>".to_string(),
            source: code.clone(),
        });
    }

    if let Some(path) = &args.script {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::ReadScript {
            path: path.clone(),
            source,
        })?;
        return Ok(Input {
            name: path.display().to_string(),
            source,
        });
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(CliError::Stdin)?;
    if buffer.trim().is_empty() {
        return Err(CliError::NoInput);
    }
    Ok(Input {
        name: "<stdin>".to_string(),
        source: buffer,
    })
}

fn dump_tokens(input: &Input, config: &AppConfig) -> i32 {
    let mut out = io::stdout().lock();
    for token in Lexer::new(&input.source) {
        let shown = match token.kind {
            TokenKind::Eof => "<eof>".to_string(),
            TokenKind::String => format!("\"{}\"", token.literal),
            _ => token.literal.clone(),
        };

        if token.kind == TokenKind::Illegal {
            let message = if is_unterminated_string(&token) {
                "unterminated string literal".to_string()
            } else {
                format!("illegal character {:?}", token.literal)
            };
            let diagnostic = Diagnostic::error(message)
                .with_code("E0001")
                .with_label(Label::primary(token.position(), "").with_width(token.literal.chars().count()));
            report(input, &[diagnostic], config);
            return 1;
        }

        if writeln!(out, "{}:{}\t{}\t{}", token.line, token.column, token.kind, shown).is_err() {
            return 1;
        }
    }
    0
}

fn dump_ast(input: &Input, config: &AppConfig) -> i32 {
    match interpreter::parse(&input.source) {
        Ok(program) => {
            for stmt in &program.statements {
                println!("{}", stmt);
            }
            0
        }
        Err(errors) => {
            report(input, &RunError::Parse(errors).diagnostics(), config);
            1
        }
    }
}

fn run_script(input: &Input, config: &AppConfig) -> i32 {
    let program = match interpreter::parse(&input.source) {
        Ok(program) => program,
        Err(errors) => {
            tracing::debug!(errors = errors.len(), "parse failed");
            report(input, &RunError::Parse(errors).diagnostics(), config);
            return 1;
        }
    };

    let env = Environment::with_stdout();
    interpreter::builtins::register(&env);
    let mut interp = Interpreter::new(env);

    match interp.eval_program(&program) {
        Ok(value) => {
            print_result(&value, config);
            0
        }
        Err(e) => {
            report(input, &[e.to_diagnostic()], config);
            1
        }
    }
}

fn print_result(value: &Value, config: &AppConfig) {
    if config.quiet {
        return;
    }
    if config.json {
        println!("{}", to_json_string(value, config.compact));
    } else if !matches!(value, Value::Null) {
        println!("{}", value);
    }
}

fn report(input: &Input, diagnostics: &[Diagnostic], config: &AppConfig) {
    let _ = io::stdout().flush();
    let rendered = render_diagnostics(&input.source, &input.name, diagnostics, config.color_enabled);
    eprint!("{}", rendered);
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}

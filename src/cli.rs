use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "awsl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AWSL scripting language interpreter", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    /// Script file to run
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Run inline source instead of a file
    #[arg(short, long, value_name = "CODE", conflicts_with = "script")]
    pub eval: Option<String>,

    /// Print the token stream and exit
    #[arg(long = "tokens", conflicts_with = "ast")]
    pub tokens: bool,

    /// Print the parsed program and exit
    #[arg(long = "ast")]
    pub ast: bool,

    /// Print the final value as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Single-line JSON output
    #[arg(long = "compact", requires = "json")]
    pub compact: bool,

    /// Do not print the final value
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Complete {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "Invalid color choice: {}. Must be 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_and_flags() {
        let args = Args::try_parse_from(["awsl", "deploy.awsl", "--json", "--compact", "-v"]).unwrap();
        assert_eq!(args.script, Some(PathBuf::from("deploy.awsl")));
        assert!(args.json && args.compact && args.verbose);
        assert_eq!(args.color, ColorChoice::Auto);
    }

    #[test]
    fn test_eval_conflicts_with_script() {
        assert!(Args::try_parse_from(["awsl", "a.awsl", "-e", "1;"]).is_err());
        let args = Args::try_parse_from(["awsl", "-e", "1;"]).unwrap();
        assert_eq!(args.eval.as_deref(), Some("1;"));
    }

    #[test]
    fn test_color_choice() {
        assert_eq!("NEVER".parse::<ColorChoice>(), Ok(ColorChoice::Never));
        assert!("sometimes".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_complete_subcommand() {
        let args = Args::try_parse_from(["awsl", "complete", "bash"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Complete { shell: Shell::Bash })));
    }

    #[test]
    fn test_command_is_valid() {
        Args::command().debug_assert();
    }
}

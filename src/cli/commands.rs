// src/cli/commands.rs

use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("elearn")
        .about("Terminal client for the e-learning platform")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv trace)")
                .global(true)
                .action(ArgAction::Count),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session")
                .arg(
                    Arg::new("username")
                        .short('u')
                        .long("username")
                        .help("Account username or email")
                        .env("ELEARN_USERNAME")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Account password")
                        .env("ELEARN_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(
            Command::new("quizzes").about("List quizzes").arg(
                Arg::new("course")
                    .short('c')
                    .long("course")
                    .help("Only quizzes of this course")
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("take").about("Take a quiz").arg(
                Arg::new("quiz-id")
                    .help("Quiz to take")
                    .required(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("review").about("Review a submitted attempt").arg(
                Arg::new("attempt-id")
                    .help("Attempt to review")
                    .required(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
        )
}

/// Log filter for a `-v` count; without flags the configured filter is kept.
pub fn log_filter(verbosity: u8, configured: &str) -> String {
    match verbosity {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

//! Interactive shell: reads one command per line and runs it on the [`App`].
use std::io::{stdin, stdout, Write};

use clap::{CommandFactory, Parser};
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use log::debug;
use shell_words::split;

use crate::{
    cli::{
        display::{failure, notice},
        App, ShellLine,
    },
    Result,
};

const EXIT_WORDS: &[&str] = &["exit", "close"];

/// Every word the shell accepts as the first token of a line.
pub fn command_names() -> Vec<String> {
    let mut names: Vec<String> = ShellLine::command()
        .get_subcommands()
        .map(|c| c.get_name().to_string())
        .collect();
    names.push("help".to_string());
    names.extend(EXIT_WORDS.iter().map(|w| w.to_string()));
    names
}

/// Closest known command to a mistyped `input`, if any is close enough.
pub fn suggest_command<'a>(input: &str, names: &'a [String]) -> Option<&'a str> {
    let matcher = SkimMatcherV2::default();
    names
        .iter()
        .filter_map(|name| matcher.fuzzy_match(name, input).map(|score| (score, name)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, name)| name.as_str())
}

pub fn run_shell(app: &mut App) -> Result<()> {
    println!("Welcome to the assistant bot! Type help to see the commands.");
    let names = command_names();

    loop {
        print!("Enter a command: ");
        stdout().flush()?;

        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            println!("\nGood bye!");
            break;
        }

        let mut args = match split(line.trim()) {
            Ok(args) => args,
            Err(e) => {
                failure(format!("Could not read the command: {}", e));
                continue;
            }
        };
        let Some(first) = args.first_mut() else {
            continue;
        };
        *first = first.to_lowercase();
        let first = first.clone();

        if EXIT_WORDS.contains(&first.as_str()) {
            println!("Good bye!");
            break;
        }
        if first == "help" {
            ShellLine::command().print_help()?;
            continue;
        }
        if !names.contains(&first) {
            match suggest_command(&first, &names) {
                Some(suggestion) => {
                    notice(format!("Invalid command. Did you mean: {}?", suggestion))
                }
                None => failure("Invalid command. Type help to see the commands."),
            }
            continue;
        }

        debug!("Shell command: {:?}", args);
        match ShellLine::try_parse_from(&args) {
            Ok(parsed) => {
                if let Err(e) = app.run(parsed.command) {
                    failure(e.to_string());
                }
            }
            Err(e) => e.print()?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_subcommands_and_shell_words() {
        let names = command_names();
        for expected in ["add-contact", "sort-notes", "config", "help", "exit", "close"] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn close_typos_get_a_suggestion() {
        let names = command_names();
        assert_eq!(suggest_command("ad-contact", &names), Some("add-contact"));
        assert_eq!(suggest_command("birthday", &names), Some("birthdays"));
        assert_eq!(suggest_command("qqq", &names), None);
    }
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::SearchFilter;
use crate::domain::models::WorkspaceName;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn debug_log_path() -> path::PathBuf {
    if let Ok(dir) = std::env::var("TUTLY_LOG_DIR") {
        return path::PathBuf::from(dir).join("debug.log");
    }

    return dirs::cache_dir()
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("tutly")
        .join("debug.log");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!(
        "Created default config file at {}",
        config_file_path.display()
    );
    return Ok(());
}

fn arg_assignment_id() -> Arg {
    return Arg::new("assignment-id")
        .help("Assignment ID, as shown by `tutly explorer --all`.")
        .num_args(1)
        .required(true);
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Tutly")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Tutly with environment variable RUST_LOG=tutly")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_signin() -> Command {
    return Command::new("signin")
        .about("Sign in to Tutly. The password is read from TUTLY_PASSWORD when set, otherwise prompted for.")
        .arg(
            Arg::new("username")
                .short('u')
                .long("username")
                .env("TUTLY_USERNAME")
                .num_args(1)
                .help("Username to sign in with. Prompted for when omitted."),
        );
}

fn subcommand_explorer() -> Command {
    return Command::new("explorer")
        .about("Lists your enrolled courses and their assignments.")
        .arg(
            Arg::new("all")
                .short('a')
                .long("all")
                .help("Load the assignments of every course.")
                .action(ArgAction::SetTrue),
        );
}

fn subcommand_delete() -> Command {
    return Command::new("delete")
        .about("Deletes the local folder of a downloaded assignment.")
        .arg(arg_assignment_id())
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Skip the confirmation prompt.")
                .action(ArgAction::SetTrue),
        );
}

fn subcommand_search() -> Command {
    return Command::new("search")
        .about("Pick an assignment from every course and open it.")
        .arg(
            Arg::new("solved")
                .long("solved")
                .help("Only list submitted assignments.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("unsolved")
                .long("unsolved")
                .help("Only list assignments that have not been submitted.")
                .action(ArgAction::SetTrue),
        )
        .group(ArgGroup::new("filter").args(["solved", "unsolved"]));
}

fn arg_config(key: ConfigKey, env: &'static str, help: &str) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(format!("{help} [default: {}]", Config::default(key)))
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("tutly")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_signin())
        .subcommand(Command::new("signout").about("Sign out and forget the local session."))
        .subcommand(Command::new("status").about("Shows who is signed in."))
        .subcommand(subcommand_explorer())
        .subcommand(
            Command::new("preview")
                .about("Prints the description of an assignment.")
                .arg(arg_assignment_id()),
        )
        .subcommand(
            Command::new("open")
                .about("Downloads the starter repository of an assignment if needed and opens its folder.")
                .arg(arg_assignment_id()),
        )
        .subcommand(subcommand_delete())
        .subcommand(subcommand_search())
        .subcommand(
            Command::new("submit")
                .about("Submits the files of a downloaded assignment.")
                .arg(arg_assignment_id()),
        )
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(arg_config(
            ConfigKey::ApiURL,
            "TUTLY_API_URL",
            "Tutly API URL.",
        ))
        .arg(arg_config(
            ConfigKey::AssignmentsDir,
            "TUTLY_ASSIGNMENTS_DIR",
            "Directory assignments are downloaded to.",
        ))
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("TUTLY_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(arg_config(
            ConfigKey::RequestTimeout,
            "TUTLY_REQUEST_TIMEOUT",
            "Time to wait in milliseconds before timing out a request to the Tutly API.",
        ))
        .arg(arg_config(
            ConfigKey::ScaffoldRepoURL,
            "TUTLY_SCAFFOLD_REPO_URL",
            "Starter repository cloned for every assignment.",
        ))
        .arg(arg_config(
            ConfigKey::StateFile,
            "TUTLY_STATE_FILE",
            "File the signed in session is stored in.",
        ))
        .arg(arg_config(
            ConfigKey::UserAgent,
            "TUTLY_USER_AGENT",
            "Client identifier sent with every request.",
        ))
        .arg(
            Arg::new(ConfigKey::Workspace.to_string())
                .short('w')
                .long(ConfigKey::Workspace.to_string())
                .env("TUTLY_WORKSPACE")
                .num_args(1)
                .help(format!("Where assignment folders are opened. [default: {}]", Config::default(ConfigKey::Workspace)))
                .value_parser(PossibleValuesParser::new(WorkspaceName::VARIANTS))
                .global(true),
        );
}

fn assignment_id(matches: &ArgMatches) -> String {
    return matches
        .get_one::<String>("assignment-id")
        .map(|id| return id.to_string())
        .unwrap_or_default();
}

/// Maps a subcommand onto the action it runs. Helper subcommands map to
/// `None`.
pub fn to_action(name: &str, matches: &ArgMatches) -> Option<Action> {
    match name {
        "signin" => {
            let username = matches
                .get_one::<String>("username")
                .map(|username| return username.to_string());
            return Some(Action::SignIn(username));
        }
        "signout" => return Some(Action::SignOut()),
        "status" => return Some(Action::Status()),
        "explorer" => {
            return Some(Action::Explorer {
                expand_all: matches.get_flag("all"),
            });
        }
        "preview" => return Some(Action::Preview(assignment_id(matches))),
        "open" => return Some(Action::Open(assignment_id(matches))),
        "delete" => {
            return Some(Action::Delete {
                id: assignment_id(matches),
                confirmed: matches.get_flag("yes"),
            });
        }
        "search" => {
            let filter = if matches.get_flag("solved") {
                SearchFilter::Solved
            } else if matches.get_flag("unsolved") {
                SearchFilter::Unsolved
            } else {
                SearchFilter::All
            };
            return Some(Action::Search(filter));
        }
        "submit" => return Some(Action::Submit(assignment_id(matches))),
        _ => return None,
    }
}

/// Parses the command line, handling helper subcommands in place. Returns
/// the action to run once configuration has been loaded.
pub async fn parse() -> Result<Option<Action>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", debug_log_path().display());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(None);
        }
        Some((name, subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(to_action(name, subcmd_matches));
        }
        None => {
            build().print_long_help()?;
            return Ok(None);
        }
    }
}

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use super::output::OutputFormat;
use crate::remote::RemoteArgs;

/// Run a command on remote hosts, directly or through SSH jump hosts.
#[derive(Parser, Debug)]
#[command(name = "jumprun", version, disable_help_flag = true)]
#[command(
    after_help = "Examples:\n  jumprun -R ssh://admin:pw@10.0.0.1 -R 10.0.0.2 hostname\n  jumprun -J ssh://me@bastion -R ssh://me@db01 df -h\n  jumprun -R ssh://admin:pw@10.0.0.1 --sudo exec systemctl restart nginx\n\nExit codes: 0 (all succeed), 1 (any remote failed), 99 (fatal)"
)]
pub struct Cli {
    /// Print help (`-h` is left to commands such as `df -h`)
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Increase verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Disable logging
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'F', long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short = 'O', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Remotes processed concurrently [default: 16, env: JUMPRUN_MAX_PARALLEL]
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// List available commands and exit
    #[arg(long)]
    pub list_commands: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Command to run, see --list-commands
    #[arg(value_name = "COMMAND", required_unless_present = "list_commands")]
    pub command: Option<String>,

    /// Arguments of the command
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_full_invocation() {
        let cli = Cli::try_parse_from([
            "jumprun",
            "-vv",
            "-F",
            "json",
            "-J",
            "ssh://me@bastion",
            "-R",
            "ssh://admin:pw@10.0.0.1:2222",
            "-R",
            "10.0.0.2",
            "--sudo",
            "--cmd-timeout",
            "30",
            "--strict-host-key-checking",
            "exec",
            "ls",
            "-la",
            "/tmp",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.remote.jump_hosts, ["ssh://me@bastion"]);
        assert_eq!(cli.remote.remotes, ["ssh://admin:pw@10.0.0.1:2222", "10.0.0.2"]);
        assert!(cli.remote.sudo);
        assert!(cli.remote.strict_host_key_checking);
        assert_eq!(cli.remote.cmd_timeout, Some(30));
        assert_eq!(cli.remote.login_timeout, None);
        assert_eq!(cli.command.as_deref(), Some("exec"));
        assert_eq!(cli.args, ["ls", "-la", "/tmp"]);
    }

    #[test]
    fn test_list_commands_needs_no_command() {
        let cli = Cli::try_parse_from(["jumprun", "--list-commands"]).unwrap();
        assert!(cli.list_commands);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["jumprun", "-R", "ssh://h"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["jumprun", "-v", "-q", "hostname"]).is_err());
    }

    mod command_flags {
        use super::*;
        use crate::cli::CommandRegistry;

        #[test]
        fn test_short_h_reaches_command() {
            let cli = Cli::try_parse_from(["jumprun", "-R", "ssh://u@h", "df", "-h"]).unwrap();
            assert_eq!(cli.command.as_deref(), Some("df"));
            assert_eq!(cli.args, ["-h"]);

            let task = CommandRegistry::builtin().create("df", &cli.args).unwrap();
            assert_eq!(task.name(), "df");
        }

        #[test]
        fn test_long_flag_reaches_command() {
            let cli =
                Cli::try_parse_from(["jumprun", "-R", "ssh://u@h", "df", "--human"]).unwrap();
            assert_eq!(cli.args, ["--human"]);
        }

        #[test]
        fn test_long_help_still_prints_help() {
            let err = Cli::try_parse_from(["jumprun", "--help"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        }
    }

    #[test]
    fn test_identity_and_output_file() {
        let cli = Cli::try_parse_from([
            "jumprun",
            "-i",
            "/keys/id_ed25519",
            "-O",
            "report.json",
            "-R",
            "ssh://u@h",
            "hostname",
        ])
        .unwrap();
        assert_eq!(cli.remote.identity_file, Some(PathBuf::from("/keys/id_ed25519")));
        assert_eq!(cli.output, Some(PathBuf::from("report.json")));
        assert_eq!(cli.format, OutputFormat::Text);
    }
}

//! Verb-first command line surface.
//!
//! Parsing only: each subcommand is turned into a [`Request`] that the
//! binary executes. Argument gaps that clap cannot express (an identifier
//! from either a flag or a position, a goal from a flag or trailing words)
//! are resolved here and reported as `Input` errors.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::Invocation;
use crate::error::{FactoryError, FactoryResult};

/// Exit status for command-line usage errors (BSD `EX_USAGE`). Kept apart
/// from every [`FactoryError::exit_code`] so scripts can tell a typo from a
/// rejected model reply.
pub const USAGE_EXIT_CODE: i32 = 64;

/// Exit status for a clap parse outcome: `0` for help and version output,
/// [`USAGE_EXIT_CODE`] for everything else.
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        USAGE_EXIT_CODE
    } else {
        0
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "factoryctl",
    version,
    about = "Cell and organ lifecycle control for the factory API"
)]
pub struct Cli {
    /// YAML config file; environment variables override its values.
    #[arg(long, global = true, value_name = "FILE", env = "FACTORY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a cell specification without persisting it.
    DryrunCell {
        #[arg(long, value_name = "FILE")]
        spec: Option<PathBuf>,
    },
    /// Create a cell from a specification file.
    CreateCell {
        #[arg(long, value_name = "FILE")]
        spec: Option<PathBuf>,
        /// Ask the control plane to hold the cell for human approval.
        #[arg(long)]
        hitl: bool,
    },
    /// Approve a pending cell (asks for confirmation).
    ApproveCell(CellTarget),
    /// Disable an active cell (asks for confirmation).
    DisableCell(CellTarget),
    /// Roll a cell back (asks for confirmation).
    RollbackCell(CellTarget),
    /// Build an organ from a template file.
    OrganBuild {
        #[arg(long, value_name = "FILE")]
        template: Option<PathBuf>,
        /// Validate the template without building.
        #[arg(long)]
        dryrun: bool,
    },
    /// Show the build status of an organ.
    OrganStatus(OrganTarget),
    /// Cancel an in-flight organ build (asks for confirmation).
    OrganCancel {
        #[command(flatten)]
        target: OrganTarget,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Let the configured LLM choose one tool for a goal.
    Agent {
        #[arg(long)]
        goal: Option<String>,
        /// Goal given as trailing words instead of --goal.
        #[arg(value_name = "WORDS")]
        words: Vec<String>,
        /// Allow the agent to run sensitive tools.
        #[arg(long)]
        yes: bool,
    },
    /// List the tool registry as JSON.
    Tools,
}

#[derive(Args, Debug)]
pub struct CellTarget {
    /// Cell identifier.
    #[arg(long, visible_alias = "cell", value_name = "CELL_ID")]
    pub id: Option<String>,
    /// Cell identifier given positionally.
    #[arg(value_name = "ID")]
    pub target: Option<String>,
    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct OrganTarget {
    /// Organ identifier.
    #[arg(long, value_name = "ORGAN_ID")]
    pub id: Option<String>,
    /// Organ identifier given positionally.
    #[arg(value_name = "ID")]
    pub target: Option<String>,
}

/// What the binary should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Run { invocation: Invocation, yes: bool },
    Agent { goal: String, yes: bool },
    ListTools,
}

/// First non-blank candidate, trimmed.
fn pick(candidates: [Option<String>; 2]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn require<T>(value: Option<T>, usage: &str) -> FactoryResult<T> {
    value.ok_or_else(|| FactoryError::Input(format!("{usage} is required")))
}

fn cell_id(target: CellTarget) -> FactoryResult<(String, bool)> {
    let id = require(pick([target.id, target.target]), "--id <cell_id>")?;
    Ok((id, target.yes))
}

fn organ_id(target: OrganTarget) -> FactoryResult<String> {
    require(pick([target.id, target.target]), "--id <organ_id>")
}

impl Command {
    /// Resolve arguments into a request. Missing inputs are `Input` errors.
    pub fn into_request(self) -> FactoryResult<Request> {
        let request = match self {
            Command::DryrunCell { spec } => Request::Run {
                invocation: Invocation::DryrunCell {
                    spec: require(spec, "--spec <file>")?,
                },
                yes: false,
            },
            Command::CreateCell { spec, hitl } => Request::Run {
                invocation: Invocation::CreateCell {
                    spec: require(spec, "--spec <file>")?,
                    hitl,
                },
                yes: false,
            },
            Command::ApproveCell(target) => {
                let (id, yes) = cell_id(target)?;
                Request::Run {
                    invocation: Invocation::ApproveCell { id },
                    yes,
                }
            }
            Command::DisableCell(target) => {
                let (id, yes) = cell_id(target)?;
                Request::Run {
                    invocation: Invocation::DisableCell { id },
                    yes,
                }
            }
            Command::RollbackCell(target) => {
                let (id, yes) = cell_id(target)?;
                Request::Run {
                    invocation: Invocation::RollbackCell { id },
                    yes,
                }
            }
            Command::OrganBuild { template, dryrun } => Request::Run {
                invocation: Invocation::OrganBuild {
                    template: require(template, "--template <file>")?,
                    dryrun,
                },
                yes: false,
            },
            Command::OrganStatus(target) => Request::Run {
                invocation: Invocation::OrganStatus {
                    id: organ_id(target)?,
                },
                yes: false,
            },
            Command::OrganCancel { target, yes } => Request::Run {
                invocation: Invocation::OrganCancel {
                    id: organ_id(target)?,
                },
                yes,
            },
            Command::Agent { goal, words, yes } => {
                let joined = (!words.is_empty()).then(|| words.join(" "));
                Request::Agent {
                    goal: require(pick([goal, joined]), "--goal \"...\"")?,
                    yes,
                }
            }
            Command::Tools => Request::ListTools,
        };
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn request(args: &[&str]) -> FactoryResult<Request> {
        let mut argv = vec!["factoryctl"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command.into_request()
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn create_cell_with_hitl() {
        assert_eq!(
            request(&["create-cell", "--spec", "cell.json", "--hitl"]).unwrap(),
            Request::Run {
                invocation: Invocation::CreateCell {
                    spec: "cell.json".into(),
                    hitl: true
                },
                yes: false
            }
        );
    }

    #[test]
    fn missing_spec_is_input_error() {
        let err = request(&["dryrun-cell"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(err.to_string().contains("--spec"));
    }

    #[test]
    fn cell_id_sources() {
        let expect = |id: &str, yes: bool| Request::Run {
            invocation: Invocation::RollbackCell { id: id.into() },
            yes,
        };
        assert_eq!(
            request(&["rollback-cell", "--id", "abc"]).unwrap(),
            expect("abc", false)
        );
        assert_eq!(
            request(&["rollback-cell", "--cell", "abc", "--yes"]).unwrap(),
            expect("abc", true)
        );
        assert_eq!(
            request(&["rollback-cell", "abc"]).unwrap(),
            expect("abc", false)
        );
        assert_eq!(
            request(&["rollback-cell", "--id", "first", "second"]).unwrap(),
            expect("first", false)
        );
    }

    #[test]
    fn missing_or_blank_id_is_input_error() {
        for args in [&["approve-cell"][..], &["approve-cell", "--id", " "][..]] {
            let err = request(args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Input);
        }
        assert_eq!(
            request(&["organ-status"]).unwrap_err().kind(),
            ErrorKind::Input
        );
    }

    #[test]
    fn yes_is_never_implied() {
        match request(&["disable-cell", "--id", "c1"]).unwrap() {
            Request::Run { yes, .. } => assert!(!yes),
            other => panic!("unexpected {other:?}"),
        }
        match request(&["organ-cancel", "o1"]).unwrap() {
            Request::Run { invocation, yes } => {
                assert_eq!(invocation, Invocation::OrganCancel { id: "o1".into() });
                assert!(!yes);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn organ_build_flags() {
        assert_eq!(
            request(&["organ-build", "--template", "organ.json", "--dryrun"]).unwrap(),
            Request::Run {
                invocation: Invocation::OrganBuild {
                    template: "organ.json".into(),
                    dryrun: true
                },
                yes: false
            }
        );
    }

    #[test]
    fn agent_goal_from_flag_or_words() {
        assert_eq!(
            request(&["agent", "--goal", "check organ x status"]).unwrap(),
            Request::Agent {
                goal: "check organ x status".into(),
                yes: false
            }
        );
        assert_eq!(
            request(&["agent", "--yes", "check", "organ", "x"]).unwrap(),
            Request::Agent {
                goal: "check organ x".into(),
                yes: true
            }
        );
        assert_eq!(request(&["agent"]).unwrap_err().kind(), ErrorKind::Input);
    }

    #[test]
    fn unknown_verb_is_usage_error() {
        let err = Cli::try_parse_from(["factoryctl", "delete-cell", "--id", "x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn usage_errors_have_their_own_exit_code() {
        let usage = Cli::try_parse_from(["factoryctl", "delete-cell", "--id", "x"]).unwrap_err();
        let code = usage_exit_code(&usage);
        assert_eq!(code, USAGE_EXIT_CODE);

        let rejected_reply = FactoryError::InvalidToolCall {
            reason: "reply is not valid JSON".into(),
            output: "not json at all".into(),
        };
        assert_ne!(code, rejected_reply.exit_code());
        assert_ne!(code, FactoryError::Refused("x".into()).exit_code());
        assert_ne!(code, FactoryError::Input("x".into()).exit_code());

        let bad_flag = Cli::try_parse_from(["factoryctl", "agent", "--bogus"]).unwrap_err();
        assert_eq!(usage_exit_code(&bad_flag), USAGE_EXIT_CODE);
    }

    #[test]
    fn help_and_version_exit_cleanly() {
        let help = Cli::try_parse_from(["factoryctl", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&help), 0);
        let version = Cli::try_parse_from(["factoryctl", "--version"]).unwrap_err();
        assert_eq!(usage_exit_code(&version), 0);
    }

    #[test]
    fn tools_listing() {
        assert_eq!(request(&["tools"]).unwrap(), Request::ListTools);
    }
}

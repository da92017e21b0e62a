#![forbid(unsafe_code)]

mod commands;
mod config;
mod logging;

use alm_core::{NodeId, NodeType, RevisionId};
use alm_storage::{AddNodeRequest, DataModel, UpdateNodeRequest};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use commands::Credentials;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "alm", version, about = "Revisioned project and requirement tree")]
struct Cli {
    /// Directory holding the database file.
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// TOML configuration file. Defaults to `alm.toml` inside the storage directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Auth {
    #[arg(long, env = "ALM_USER", default_value = "admin")]
    user: String,

    #[arg(long, env = "ALM_PASSWORD", hide_env_values = true)]
    password: String,
}

impl From<Auth> for Credentials {
    fn from(auth: Auth) -> Self {
        Credentials {
            user: auth.user,
            password: auth.password,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the store, or check an existing one.
    Init,
    /// Print the tree as of a revision (latest by default).
    Tree {
        #[arg(long)]
        revision: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Add a project or requirement.
    Add {
        #[arg(long = "type", value_parser = parse_node_type)]
        node_type: NodeType,
        #[arg(long)]
        name: String,
        #[arg(long)]
        parent: Option<i64>,
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        auth: Auth,
    },
    /// Rename, re-describe or deactivate a node.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// An empty string clears the description.
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        active: Option<bool>,
        #[command(flatten)]
        auth: Auth,
    },
    /// Print the latest revision id (0 when empty).
    Revisions,
    /// Append a comment to a node.
    Comment {
        id: i64,
        text: String,
        #[command(flatten)]
        auth: Auth,
    },
}

fn parse_node_type(value: &str) -> Result<NodeType, String> {
    NodeType::parse(value).ok_or_else(|| {
        let known: Vec<&str> = NodeType::ALL.iter().map(|kind| kind.as_str()).collect();
        format!("unknown node type {value:?} (expected one of {})", known.join(", "))
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref(), cli.storage_dir.as_deref())
        .context("loading configuration")?;
    logging::init_logging(&config.logging).context("initializing logging")?;
    debug!(storage_dir = %config.storage_dir.display(), "configuration loaded");

    let mut model = DataModel::open(&config.storage_dir, &config.store).with_context(|| {
        format!("opening store in {}", config.storage_dir.display())
    })?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Command::Init => commands::init(&model, &mut out),
        Command::Tree { revision, json } => {
            commands::print_tree(&mut model, revision.map(RevisionId::new), json, &mut out)
        }
        Command::Add {
            node_type,
            name,
            parent,
            description,
            auth,
        } => commands::add(
            &mut model,
            &auth.into(),
            AddNodeRequest {
                parent: parent.map(NodeId::new),
                node_type,
                name,
                description,
            },
            &mut out,
        ),
        Command::Update {
            id,
            name,
            description,
            active,
            auth,
        } => commands::update(
            &mut model,
            &auth.into(),
            NodeId::new(id),
            UpdateNodeRequest {
                name,
                description,
                active,
            },
            &mut out,
        ),
        Command::Revisions => commands::revisions(&model, &mut out),
        Command::Comment { id, text, auth } => {
            commands::comment(&mut model, &auth.into(), NodeId::new(id), &text, &mut out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn node_types_parse_case_insensitively() {
        assert_eq!(parse_node_type("project"), Ok(NodeType::Project));
        assert_eq!(parse_node_type("REQUIREMENT"), Ok(NodeType::Requirement));
        assert!(parse_node_type("epic").is_err());
    }
}

//! Command dispatch
//!
//! Mutating commands follow load, apply, save: the document is read from its
//! store, changed in memory and written back as a whole.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, info, instrument};

use crate::application::services::DocumentStore;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, PositionArg, RemoteCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{self, Settings};
use crate::domain::{DocumentHandle, DocumentId, DomainResult, NodePath, TreeDocument};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `arbor --help`".into(),
        ));
    };

    match command {
        Commands::Show { paths } => cmd_show(cli, container, *paths),
        Commands::Add {
            label,
            parent,
            index,
        } => {
            let label = label.clone();
            edit(cli, container, move |doc| {
                let parent_path = parse_path(parent.as_deref().unwrap_or("/"))?;
                let parent = parent_path.resolve_parent(doc)?;
                let handle = doc.create_node(parent, label.clone(), *index)?;
                Ok(format!("added {:?} at {}", label, doc.path_of(handle)?))
            })
        }
        Commands::Rename { path, label } => edit(cli, container, |doc| {
            let handle = parse_path(path)?.resolve(doc)?;
            let old = doc.label(handle)?.to_string();
            doc.rename_node(handle, label.clone())?;
            Ok(format!("renamed {old:?} to {label:?}"))
        }),
        Commands::Delete { path } => edit(cli, container, |doc| {
            let handle = parse_path(path)?.resolve(doc)?;
            let removed = doc.subtree_size(handle)?;
            doc.delete_node(handle)?;
            Ok(format!("deleted {path} ({removed} nodes)"))
        }),
        Commands::Clear => edit(cli, container, |doc| {
            let removed = doc.len();
            doc.clear();
            Ok(format!("cleared {removed} nodes"))
        }),
        Commands::Move {
            node,
            target,
            position,
        } => edit(cli, container, |doc| {
            let moved = parse_path(node)?.resolve(doc)?;
            let target_handle = parse_path(target)?.resolve(doc)?;
            doc.relocate(moved, target_handle, (*position).into())?;
            Ok(format!(
                "moved {node} {} {target}, now at {}",
                position_word(*position),
                doc.path_of(moved)?
            ))
        }),
        Commands::SaveAs { file, remote } => cmd_save_as(cli, container, file, remote),
        Commands::Remote { command } => cmd_remote(container, command),
        Commands::Config { command } => cmd_config(cli, container, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn position_word(position: PositionArg) -> &'static str {
    match position {
        PositionArg::Before => "before",
        PositionArg::After => "after",
        PositionArg::Child => "into",
    }
}

fn parse_path(raw: &str) -> DomainResult<NodePath> {
    raw.parse()
}

/// Document the command operates on: `--source`, else the `document` setting.
fn resolve_source(cli: &Cli, settings: &Settings) -> CliResult<DocumentHandle> {
    if let Some(raw) = &cli.source {
        return Ok(DocumentHandle::parse(raw, settings.data_source)?);
    }
    settings.document_handle()?.ok_or_else(|| {
        CliError::Usage("no document: pass --source or set `document` in the config".into())
    })
}

/// Load the source document. A file that does not exist yet starts empty.
fn load_source(
    container: &ServiceContainer,
    handle: &DocumentHandle,
) -> CliResult<TreeDocument> {
    if let DocumentHandle::File(path) = handle {
        if !container.fs.exists(path) {
            info!("{} does not exist, starting empty", path.display());
            return Ok(TreeDocument::new());
        }
    }
    Ok(container.store_for(handle).load(handle)?)
}

/// Load, apply `op`, save back. `op` returns the confirmation message.
#[instrument(level = "debug", skip(cli, container, op))]
fn edit<F>(cli: &Cli, container: &ServiceContainer, op: F) -> CliResult<()>
where
    F: FnOnce(&mut TreeDocument) -> DomainResult<String>,
{
    let handle = resolve_source(cli, &container.settings)?;
    let mut doc = load_source(container, &handle)?;

    let message = op(&mut doc)?;
    debug!("document now has {} nodes", doc.len());

    container.store_for(&handle).save(&handle, &doc)?;
    if container.settings.show_messages {
        output::success(&message);
    }
    Ok(())
}

fn cmd_show(cli: &Cli, container: &ServiceContainer, paths: bool) -> CliResult<()> {
    let handle = resolve_source(cli, &container.settings)?;
    let doc = container.store_for(&handle).load(&handle)?;
    output::info(&output::document_tree(&doc, &handle.to_string(), paths));
    Ok(())
}

fn cmd_save_as(
    cli: &Cli,
    container: &ServiceContainer,
    file: &Option<PathBuf>,
    remote: &Option<String>,
) -> CliResult<()> {
    let source = resolve_source(cli, &container.settings)?;
    let doc = load_source(container, &source)?;

    let saved = match (file, remote) {
        (Some(path), _) => container.local_store().save_as(path, &doc)?,
        (None, Some(name)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(CliError::InvalidArgs("remote name must not be empty".into()));
            }
            container.remote_store().save_as(name, &doc)?
        }
        (None, None) => {
            return Err(CliError::InvalidArgs("pass --file or --remote".into()));
        }
    };

    if container.settings.show_messages {
        output::success(&format!("saved {} nodes", doc.len()));
    }
    output::action("document", &saved);
    Ok(())
}

fn parse_id(raw: &str) -> CliResult<DocumentId> {
    Ok(raw.parse::<DocumentId>()?)
}

fn cmd_remote(container: &ServiceContainer, command: &RemoteCommands) -> CliResult<()> {
    let store = container.remote_store();
    match command {
        RemoteCommands::List => {
            let entries = store.list()?;
            if entries.is_empty() {
                output::info("no documents");
            }
            for entry in entries {
                output::info(&format!("{:>4}  {}", entry.id, entry.name));
            }
        }
        RemoteCommands::Fetch { id } => {
            let id = parse_id(id)?;
            let doc = store.fetch(id)?;
            output::info(&output::document_tree(&doc, &format!("Id: {id}"), false));
        }
        RemoteCommands::Select => match store.select(container.selector.as_ref())? {
            Some(entry) => {
                let handle = DocumentHandle::Remote {
                    id: entry.id,
                    name: entry.name,
                };
                output::info(&handle);
            }
            None => output::warning("nothing selected"),
        },
        RemoteCommands::Rename { id, name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(CliError::InvalidArgs("name must not be empty".into()));
            }
            store.rename(parse_id(id)?, name)?;
            if container.settings.show_messages {
                output::success(&format!("renamed {id} to {name:?}"));
            }
        }
        RemoteCommands::Delete { id } => {
            store.delete(parse_id(id)?)?;
            if container.settings.show_messages {
                output::success(&format!("deleted {id}"));
            }
        }
    }
    Ok(())
}

fn local_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().map_err(|e| {
            CliError::from(ApplicationError::io("determine current directory", e))
        }),
    }
}

fn cmd_config(cli: &Cli, container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => {
            output::header("Config files (lowest to highest precedence)");
            match config::global_config_path() {
                Some(path) => output::detail(&describe(&path)),
                None => output::detail(&"global: no config directory on this platform"),
            }
            output::detail(&describe(&config::local_config_path(&local_dir(cli)?)));
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                config::global_config_path().ok_or_else(|| {
                    CliError::Usage("no global config directory on this platform".into())
                })?
            } else {
                config::local_config_path(&local_dir(cli)?)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .map_err(|e| ApplicationError::io(format!("create {}", path.display()), e))?;
            container
                .fs
                .write_atomic(&path, Settings::template().as_bytes())
                .map_err(|e| ApplicationError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}

fn describe(path: &Path) -> String {
    let state = if path.exists() { "exists" } else { "missing" };
    format!("{} ({state})", path.display())
}

//! Integration tests for command dispatch with fake I/O

mod common;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;

use arbor::application::services::LocalFileStore;
use arbor::cli::args::Cli;
use arbor::cli::commands::execute_command;
use arbor::config::Settings;
use arbor::domain::{DataSource, NodeSnapshot, TreeDocument};
use arbor::exitcode;
use arbor::infrastructure::di::ServiceContainer;
use arbor::infrastructure::traits::RealFileSystem;

use common::{FakeDocumentService, MockSelector, ReadOnlyFileSystem, BASE_URL};

fn container(service: Arc<FakeDocumentService>) -> ServiceContainer {
    let settings = Settings {
        webservice_url: BASE_URL.into(),
        show_messages: false,
        ..Settings::default()
    };
    ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        service,
        Arc::new(MockSelector::new(Some(0))),
    )
}

fn run(container: &ServiceContainer, args: &[&str]) -> Result<(), arbor::cli::CliError> {
    let mut argv = vec!["arbor"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("valid arguments");
    execute_command(&cli, container)
}

fn load(path: &Path) -> TreeDocument {
    LocalFileStore::new(Arc::new(RealFileSystem))
        .load(path)
        .unwrap()
}

#[test]
fn given_new_file_when_adding_nodes_then_file_created_with_tree() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("tree.xml");
    let source = file.to_str().unwrap();
    let container = container(Arc::new(FakeDocumentService::new()));

    // Act
    run(&container, &["-s", source, "add", "Root"]).unwrap();
    run(&container, &["-s", source, "add", "B", "--parent", "0"]).unwrap();
    run(&container, &["-s", source, "add", "A", "--parent", "0", "--index", "0"]).unwrap();

    // Assert
    let expected = TreeDocument::from_snapshots(&[NodeSnapshot::new("Root")
        .with_children(vec![NodeSnapshot::new("A"), NodeSnapshot::new("B")])]);
    assert_eq!(load(&file), expected);
}

#[test]
fn given_file_when_moving_renaming_and_deleting_then_saved_each_time() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("tree.xml");
    LocalFileStore::new(Arc::new(RealFileSystem))
        .save(&file, &common::sample_document())
        .unwrap();
    let source = file.to_str().unwrap();
    let container = container(Arc::new(FakeDocumentService::new()));

    // Act: B before A, rename A1, delete B
    run(&container, &["-s", source, "move", "0/1", "0/0", "--position", "before"]).unwrap();
    run(&container, &["-s", source, "rename", "0/1/0", "Leaf"]).unwrap();
    run(&container, &["-s", source, "delete", "0/0"]).unwrap();

    // Assert
    let expected = TreeDocument::from_snapshots(&[NodeSnapshot::new("Root").with_children(
        vec![NodeSnapshot::new("A").with_children(vec![NodeSnapshot::new("Leaf")])],
    )]);
    assert_eq!(load(&file), expected);
}

#[test]
fn given_cyclic_move_when_running_then_usage_exit_code_and_file_unchanged() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("tree.xml");
    LocalFileStore::new(Arc::new(RealFileSystem))
        .save(&file, &common::sample_document())
        .unwrap();
    let before = std::fs::read_to_string(&file).unwrap();
    let container = container(Arc::new(FakeDocumentService::new()));

    // Act
    let err = run(
        &container,
        &["-s", file.to_str().unwrap(), "move", "0", "0/0/0"],
    )
    .unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), before);
}

#[test]
fn given_file_document_when_saving_as_remote_then_service_holds_copy() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("tree.xml");
    LocalFileStore::new(Arc::new(RealFileSystem))
        .save(&file, &common::sample_document())
        .unwrap();
    let service = Arc::new(FakeDocumentService::new());
    let container = container(service.clone());

    // Act
    run(
        &container,
        &["-s", file.to_str().unwrap(), "save-as", "--remote", "copy"],
    )
    .unwrap();

    // Assert
    assert_eq!(service.name_of(1).as_deref(), Some("copy"));
    let xml = service.xml_of(1).unwrap();
    assert_eq!(
        arbor::domain::codec::deserialize(&xml).unwrap(),
        common::sample_document()
    );
}

#[test]
fn given_remote_source_when_adding_node_then_document_updated_on_service() {
    // Arrange
    let service = Arc::new(
        FakeDocumentService::new().with_document("doc", r#"<TreeView><Node Text="R"/></TreeView>"#),
    );
    let container = container(service.clone());

    // Act
    run(&container, &["-s", "Id: 1 Name: doc", "add", "child", "-p", "0"]).unwrap();

    // Assert
    assert_eq!(
        service.xml_of(1).unwrap(),
        r#"<TreeView><Node Text="R"><Node Text="child"/></Node></TreeView>"#
    );
}

#[test]
fn given_bare_id_with_web_service_source_when_showing_then_fetches_remote() {
    let service = Arc::new(
        FakeDocumentService::new().with_document("doc", r#"<TreeView><Node Text="R"/></TreeView>"#),
    );
    let mut settings = Settings {
        webservice_url: BASE_URL.into(),
        data_source: DataSource::WebService,
        ..Settings::default()
    };
    settings.document = Some("1".into());
    let container = ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        service.clone(),
        Arc::new(MockSelector::new(None)),
    );

    run(&container, &["show"]).unwrap();

    assert_eq!(service.requests().len(), 1);
}

#[test]
fn given_missing_remote_document_when_showing_then_noinput_exit_code() {
    let container = container(Arc::new(FakeDocumentService::new()));

    let err = run(&container, &["-s", "remote:3", "show"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_config_dir_when_init_then_template_written_once() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let container = container(Arc::new(FakeDocumentService::new()));
    let config_dir = dir.path().to_str().unwrap();

    // Act
    run(&container, &["-C", config_dir, "config", "init"]).unwrap();
    let second = run(&container, &["-C", config_dir, "config", "init"]);

    // Assert
    let written = std::fs::read_to_string(dir.path().join(".arbor.toml")).unwrap();
    assert_eq!(written, Settings::template());
    assert_eq!(second.unwrap_err().exit_code(), exitcode::USAGE);
}

#[test]
fn given_failing_filesystem_when_init_then_io_error_and_nothing_written() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let container = ServiceContainer::with_deps(
        Settings::default(),
        Arc::new(ReadOnlyFileSystem),
        Arc::new(FakeDocumentService::new()),
        Arc::new(MockSelector::new(None)),
    );

    // Act
    let err = run(
        &container,
        &["-C", dir.path().to_str().unwrap(), "config", "init"],
    )
    .unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::IOERR);
    assert!(!dir.path().join(".arbor.toml").exists());
}

#[test]
fn given_no_source_when_editing_then_usage_error() {
    let container = container(Arc::new(FakeDocumentService::new()));

    let err = run(&container, &["clear"]).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_remote_commands_when_running_then_catalog_changes() {
    // Arrange
    let service = Arc::new(FakeDocumentService::new().with_document("a", "<TreeView/>"));
    let container = container(service.clone());

    // Act
    run(&container, &["remote", "list"]).unwrap();
    run(&container, &["remote", "select"]).unwrap();
    run(&container, &["remote", "rename", "1", "renamed"]).unwrap();
    let rename_name = service.name_of(1);
    run(&container, &["remote", "delete", "1"]).unwrap();

    // Assert
    assert_eq!(rename_name.as_deref(), Some("renamed"));
    assert_eq!(service.document_count(), 0);
    assert_eq!(
        run(&container, &["remote", "fetch", "1"])
            .unwrap_err()
            .exit_code(),
        exitcode::NOINPUT
    );
}

//! Focused unit tests covering command configuration resolution.

use super::helpers::Workspace;
use super::*;
use crate::connection::ConnectionConfig;
use crate::sync::{
    AvailabilityArgs, IngestArgs, IngestConfig, SyncConfig, ingest_config_from_layers_for_test,
};
use carpark_data::credentials::{ACCESS_KEY_VAR, TOKEN_VAR};
use carpark_data::feed::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use rstest::{fixture, rstest};

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn ingest_args(workspace: &Workspace) -> IngestArgs {
    IngestArgs {
        credentials_file: Some(workspace.credentials_path()),
        ..IngestArgs::default()
    }
}

#[rstest]
fn credentials_fall_back_to_the_credentials_file(workspace: Workspace) {
    workspace.write_credentials("URA_ACCESS_KEY=file-key\nURA_TOKEN=file-token\n");

    let config = IngestConfig::try_from(ingest_args(&workspace)).expect("config resolves");
    let credentials = &config.sync.connection.credentials;
    assert_eq!(credentials.access_key, "file-key");
    assert_eq!(credentials.token.as_deref(), Some("file-token"));
    assert_eq!(config.sync.database, DEFAULT_DATABASE);
    assert_eq!(config.sync.connection.source.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.sync.connection.source.user_agent, DEFAULT_USER_AGENT);
}

#[rstest]
fn explicit_options_take_precedence_over_the_file(workspace: Workspace) {
    workspace.write_credentials("URA_ACCESS_KEY=file-key\nURA_TOKEN=file-token\n");
    let args = IngestArgs {
        access_key: Some("flag-key".into()),
        token: Some("flag-token".into()),
        base_url: Some("http://localhost:8080/ura".into()),
        user_agent: Some("tests/1.0".into()),
        ..ingest_args(&workspace)
    };

    let config = IngestConfig::try_from(args).expect("config resolves");
    let connection = &config.sync.connection;
    assert_eq!(connection.credentials.access_key, "flag-key");
    assert_eq!(connection.credentials.token.as_deref(), Some("flag-token"));
    assert_eq!(connection.source.base_url, "http://localhost:8080/ura");
    assert_eq!(connection.source.user_agent, "tests/1.0");
}

#[rstest]
#[case("", ARG_ACCESS_KEY, ACCESS_KEY_VAR)]
#[case("URA_ACCESS_KEY=file-key\n", ARG_TOKEN, TOKEN_VAR)]
#[case("URA_ACCESS_KEY=file-key\nURA_TOKEN=   \n", ARG_TOKEN, TOKEN_VAR)]
fn missing_credentials_are_reported(
    workspace: Workspace,
    #[case] contents: &str,
    #[case] expected_field: &'static str,
    #[case] expected_key: &'static str,
) {
    workspace.write_credentials(contents);
    let args = AvailabilityArgs {
        credentials_file: Some(workspace.credentials_path()),
        ..AvailabilityArgs::default()
    };

    let err = SyncConfig::try_from(args).expect_err("credential is missing");
    match err {
        CliError::MissingCredential { field, key, path } => {
            assert_eq!(field, expected_field);
            assert_eq!(key, expected_key);
            assert_eq!(path, workspace.credentials_path());
        }
        other => panic!("expected MissingCredential, found {other:?}"),
    }
}

#[rstest]
fn missing_credentials_file_is_treated_as_empty(workspace: Workspace) {
    let args = IngestArgs {
        access_key: Some("flag-key".into()),
        token: Some("flag-token".into()),
        ..ingest_args(&workspace)
    };
    let config = IngestConfig::try_from(args).expect("flags are enough");
    assert_eq!(config.sync.connection.credentials.access_key, "flag-key");
}

#[rstest]
fn renewal_needs_only_the_access_key(workspace: Workspace) {
    workspace.write_credentials("URA_ACCESS_KEY=file-key\n");
    let args = RenewTokenArgs {
        credentials_file: Some(workspace.credentials_path()),
        ..RenewTokenArgs::default()
    };

    let config = ConnectionConfig::try_from(args).expect("token is not required");
    assert_eq!(config.credentials.access_key, "file-key");
    assert_eq!(config.credentials.token, None);
    assert_eq!(config.credentials_file.path(), workspace.credentials_path());
}

#[rstest]
#[case(None, &["K0025"])]
#[case(Some(vec!["B0001".to_owned(), "C0002".to_owned()]), &["B0001", "C0002"])]
fn exclusions_default_or_are_replaced(
    workspace: Workspace,
    #[case] exclude: Option<Vec<String>>,
    #[case] expected: &[&str],
) {
    workspace.write_credentials("URA_ACCESS_KEY=k\nURA_TOKEN=t\n");
    let args = IngestArgs {
        exclude,
        ..ingest_args(&workspace)
    };

    let config = IngestConfig::try_from(args).expect("config resolves");
    let codes: Vec<&str> = config.exclusions.iter().collect();
    assert_eq!(codes, expected);
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "database": 42 }));

    let err = ingest_config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honour_cli_over_environment_over_file(workspace: Workspace) {
    use ortho_config::MergeComposer;
    use serde_json::json;

    workspace.write_credentials("URA_ACCESS_KEY=file-key\nURA_TOKEN=file-token\n");
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "credentials_file": workspace.credentials_path().as_str(),
            "database": workspace.root().join("from-file.db").as_str(),
            "base_url": "http://from-file/ura",
        }),
        None,
    );
    composer.push_environment(json!({
        "database": workspace.root().join("from-env.db").as_str(),
        "token": "env-token",
    }));
    composer.push_cli(json!({
        "database": workspace.root().join("from-cli.db").as_str(),
    }));

    let config =
        ingest_config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.sync.database, workspace.root().join("from-cli.db"));
    assert_eq!(config.sync.connection.source.base_url, "http://from-file/ura");
    assert_eq!(config.sync.connection.credentials.access_key, "file-key");
    assert_eq!(
        config.sync.connection.credentials.token.as_deref(),
        Some("env-token")
    );
}

#[rstest]
fn command_line_parses_repeated_exclusions() {
    let cli = Cli::try_parse_from([
        "carpark",
        "ingest",
        "--exclude",
        "K0025",
        "--exclude",
        "B0001",
        "--database",
        "var/car_parks.db",
    ])
    .expect("arguments parse");
    match cli.command {
        Command::Ingest(args) => {
            assert_eq!(
                args.exclude,
                Some(vec!["K0025".to_owned(), "B0001".to_owned()])
            );
            assert_eq!(
                args.database.as_deref().map(|path| path.as_str()),
                Some("var/car_parks.db")
            );
        }
        other => panic!("expected ingest command, found {other:?}"),
    }
}

#[rstest]
fn renew_token_rejects_dataset_options() {
    let err = Cli::try_parse_from(["carpark", "renew-token", "--database", "x.db"])
        .expect_err("renew-token has no database option");
    assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
}

#[rstest]
#[case("--help", clap::error::ErrorKind::DisplayHelp)]
#[case("--version", clap::error::ErrorKind::DisplayVersion)]
fn help_and_version_requests_exit_successfully(
    #[case] flag: &str,
    #[case] expected: clap::error::ErrorKind,
) {
    let err = parse_cli(["carpark", flag]).expect_err("informational request");
    match err {
        CliError::ArgumentParsing(clap_err) => {
            assert_eq!(clap_err.kind(), expected);
            assert_eq!(clap_err.exit_code(), 0);
        }
        other => panic!("expected ArgumentParsing, found {other:?}"),
    }
}

#[rstest]
fn unknown_subcommand_exits_with_usage_status() {
    let err = parse_cli(["carpark", "vacuum"]).expect_err("unknown subcommand");
    match err {
        CliError::ArgumentParsing(clap_err) => assert_eq!(clap_err.exit_code(), 2),
        other => panic!("expected ArgumentParsing, found {other:?}"),
    }
}

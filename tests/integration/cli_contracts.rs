use pathtree::config::{PathTreeConfig, TreeConfig};
use pathtree::tooling::cli::{CliContext, Commands};
use pathtree::{PathTree, TreeError};
use tempfile::TempDir;

fn context(temp_dir: &TempDir, tree: TreeConfig) -> CliContext {
    let config = PathTreeConfig {
        tree,
        ..PathTreeConfig::default()
    };
    CliContext::with_config(temp_dir.path().join("data").join("tree.ptree"), config)
}

fn run(cli: &CliContext, command: Commands) -> String {
    cli.execute(&command).unwrap()
}

fn populate(cli: &CliContext) {
    run(cli, Commands::Init { force: false });
    run(
        cli,
        Commands::Mkdir {
            path: "/net/dns".to_string(),
            description: Some("resolvers".to_string()),
        },
    );
    run(
        cli,
        Commands::Set {
            parent: "/net/dns".to_string(),
            name: "primary".to_string(),
            value: "10.0.0.1".to_string(),
            description: None,
        },
    );
    run(
        cli,
        Commands::Set {
            parent: "/net".to_string(),
            name: "mtu".to_string(),
            value: "1500".to_string(),
            description: Some("bytes".to_string()),
        },
    );
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir, TreeConfig::default());
    run(&cli, Commands::Init { force: false });
    assert!(cli.tree_file().exists());

    let err = cli.execute(&Commands::Init { force: false }).unwrap_err();
    assert!(matches!(err, TreeError::Io(_)));
    run(&cli, Commands::Init { force: true });
}

#[test]
fn mutations_are_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir, TreeConfig::default());
    populate(&cli);

    assert_eq!(
        run(&cli, Commands::Get { path: "/net/dns/primary".to_string() }),
        "10.0.0.1"
    );
    run(
        &cli,
        Commands::Update {
            path: "/net/dns/primary".to_string(),
            value: "10.0.0.53".to_string(),
            description: None,
        },
    );

    let tree = PathTree::<String>::open(cli.tree_file()).unwrap();
    assert_eq!(tree.get("/net/dns/primary").unwrap(), "10.0.0.53");
    assert_eq!(tree.description("/net/dns").unwrap().as_deref(), Some("resolvers"));
    assert_eq!(tree.scope_count(), 2);
    assert_eq!(tree.value_count(), 2);
}

#[test]
fn rm_reports_removed_counts() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir, TreeConfig::default());
    populate(&cli);

    let output = run(&cli, Commands::Rm { path: "/net/dns".to_string() });
    assert!(output.contains("1 scope(s), 1 value(s)"));
    let err = cli
        .execute(&Commands::Get { path: "/net/dns/primary".to_string() })
        .unwrap_err();
    assert!(matches!(err, TreeError::NotFound(_)));
}

#[test]
fn ls_json_contract_has_required_fields() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir, TreeConfig::default());
    populate(&cli);

    let output = run(
        &cli,
        Commands::Ls {
            path: "/net".to_string(),
            format: "json".to_string(),
        },
    );
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.get("path").and_then(|v| v.as_str()), Some("/net"));
    let children = parsed.get("children").and_then(|v| v.as_array()).unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["name"], "dns");
    assert_eq!(children[0]["kind"], "scope");
    assert!(children[0]["value"].is_null());
    assert_eq!(children[1]["name"], "mtu");
    assert_eq!(children[1]["value"], "1500");
    assert_eq!(children[1]["description"], "bytes");
}

#[test]
fn ls_text_renders_table() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir, TreeConfig::default());
    populate(&cli);

    let output = run(
        &cli,
        Commands::Ls {
            path: "/".to_string(),
            format: "text".to_string(),
        },
    );
    assert!(output.contains("Name"));
    assert!(output.contains("net"));

    let err = cli
        .execute(&Commands::Ls {
            path: "/".to_string(),
            format: "yaml".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, TreeError::Config(_)));
}

#[test]
fn tree_prints_pre_order_with_indentation() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir, TreeConfig::default());
    populate(&cli);

    let output = run(&cli, Commands::Tree);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "/",
            "  net/",
            "    dns/",
            "      primary = 10.0.0.1",
            "    mtu = 1500",
        ]
    );
}

#[test]
fn stat_json_reports_policy_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(
        &temp_dir,
        TreeConfig {
            case_sensitive_paths: false,
            sorted: false,
        },
    );
    populate(&cli);

    let output = run(
        &cli,
        Commands::Stat {
            format: "json".to_string(),
        },
    );
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["scopes"], 2);
    assert_eq!(parsed["values"], 2);
    assert_eq!(parsed["case_sensitive_paths"], false);
    assert_eq!(parsed["sorted"], false);
    assert!(parsed["serial"].as_u64().is_some());

    assert_eq!(
        run(&cli, Commands::Get { path: "/NET/mtu".to_string() }),
        "1500"
    );
}

#[test]
fn commands_on_missing_file_fail() {
    let temp_dir = TempDir::new().unwrap();
    let cli = context(&temp_dir, TreeConfig::default());
    let err = cli.execute(&Commands::Tree).unwrap_err();
    assert!(matches!(err, TreeError::Io(_)));
}

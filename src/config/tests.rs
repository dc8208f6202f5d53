use super::*;

#[test]
fn defaults_resolve_without_sources() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr, "127.0.0.1:8080".parse().unwrap());
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.site.origin.as_str(), "https://notebook.example.com");
    assert_eq!(settings.site.title, "Notebook");
    assert_eq!(settings.content.directory, PathBuf::from("./content"));
    assert_eq!(settings.database.path, PathBuf::from("./notebook.db"));
    assert_eq!(settings.database.max_connections.get(), 4);
    assert_eq!(settings.render.theme, "InspiredGitHub");
    assert_eq!(settings.reload.environment, ReloadEnvironment::Prod);
    assert!(settings.reload.token.is_none());
    assert_eq!(settings.logging.level, LevelFilter::INFO);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        content: ContentOverrides {
            log_level: Some("debug".to_string()),
            content_directory: Some(PathBuf::from("/srv/notes")),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.content.directory, PathBuf::from("/srv/notes"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ContentOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_content_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_port_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn zero_pool_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.database.max_connections = Some(0);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.max_connections",
            ..
        }
    ));
}

#[test]
fn base_url_must_be_http() {
    let mut raw = RawSettings::default();
    raw.site.base_url = Some("ftp://example.com".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "site.base_url", .. }));
}

#[test]
fn reload_environment_is_parsed() {
    let mut raw = RawSettings::default();
    raw.reload.environment = Some("DEV".to_string());
    raw.reload.token = Some("  ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.reload.environment, ReloadEnvironment::Dev);
    assert!(settings.reload.token.is_none());

    let mut raw = RawSettings::default();
    raw.reload.environment = Some("staging".to_string());
    assert!(matches!(
        Settings::from_raw(raw).unwrap_err(),
        LoadError::Invalid {
            key: "reload.environment",
            ..
        }
    ));
}

#[test]
fn reload_token_is_redacted_in_debug_output() {
    let mut raw = RawSettings::default();
    raw.reload.token = Some("hunter2".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    let debug = format!("{:?}", settings.reload);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("<redacted>"));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["notebook"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "notebook",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-path",
        "/var/lib/notebook.db",
    ]);
    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.content.database_path.as_deref(),
                Some(std::path::Path::new("/var/lib/notebook.db"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_load_and_stylesheet_arguments() {
    let args = CliArgs::parse_from(["notebook", "load", "--content-directory", "notes"]);
    match args.command.expect("load command") {
        Command::Load(load) => {
            assert_eq!(
                load.content.content_directory.as_deref(),
                Some(std::path::Path::new("notes"))
            );
        }
        _ => panic!("wrong command parsed"),
    }

    let args = CliArgs::parse_from(["notebook", "stylesheet", "--render-theme", "Solarized (dark)"]);
    match args.command.expect("stylesheet command") {
        Command::Stylesheet(sheet) => assert_eq!(sheet.theme.as_deref(), Some("Solarized (dark)")),
        _ => panic!("wrong command parsed"),
    }
}

// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{Level, info};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use propdesk::api::{self, UploadLimits};
use propdesk::app_state::AppState;
use propdesk::bootstrap;
use propdesk::config::ValidatedConfig;
use propdesk::projects::{ProjectService, YamlProjectRepository};
use propdesk::runtime_paths::RuntimePaths;
use propdesk::util::{self, BlockingPool, LevelRule};

const STALE_UPLOAD_AGE: Duration = Duration::from_secs(60 * 60);

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if matches!(parsed_args.mode, RunMode::Help) {
        print!("{}", help_text());
        return 0;
    }

    let bootstrap = match bootstrap::bootstrap_runtime(&parsed_args.runtime_root) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("❌ Bootstrap error: {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    match System::new().block_on(run_server(bootstrap)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(bootstrap: bootstrap::BootstrapResult) -> std::io::Result<()> {
    let validated_config = Arc::new(bootstrap.validated_config);
    let runtime_paths = bootstrap.runtime_paths;

    // Configure logging with a stable format
    let logger = env_logger::Builder::from_default_env()
        .filter_level(validated_config.log_level_filter())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();

    util::init_logger(
        vec![
            LevelRule::new("actix_server", Level::Info, Level::Debug),
            LevelRule::new("mio", Level::Debug, Level::Trace),
        ],
        logger,
    )
    .map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    log_startup_info(&validated_config, &runtime_paths);

    let swept = util::sweep_stale_uploads(&runtime_paths.incoming_dir, STALE_UPLOAD_AGE);
    if swept > 0 {
        info!("Removed {} stale upload spool file(s)", swept);
    }

    let repository = match YamlProjectRepository::open(&runtime_paths.projects_data_dir) {
        Ok(repository) => Arc::new(repository),
        Err(error) => {
            eprintln!("❌ Failed to open project store: {}", error);
            eprintln!("❌ Application cannot start without project storage.");
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    let projects = Arc::new(ProjectService::new(
        repository,
        runtime_paths.asset_root().to_path_buf(),
    ));
    info!("✅ Project service initialized successfully");

    let app_state = Arc::new(AppState::new(
        runtime_paths.clone(),
        projects,
        BlockingPool::for_saves(validated_config.upload.max_concurrent_saves),
        UploadLimits::from(&validated_config.upload),
    ));
    info!(
        "✅ App state initialized with app name: {}",
        validated_config.app.name
    );

    let workers = validated_config.server.workers;
    let (host, port) = validated_config.bind_address();
    let uploads_dir = runtime_paths.uploads_dir.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(app_state.clone()))
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(api::configure)
            .service(actix_files::Files::new("/uploads", uploads_dir.clone()))
    })
    .workers(workers)
    .bind((host.to_string(), port))?
    .run()
    .await
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    let (host, port) = config.bind_address();
    info!("Starting {}", config.app.name);
    info!("Workers: {}", config.server.workers);
    info!("Listening on {}:{}", host, port);
    match config.upload.max_file_size_bytes() {
        Some(limit) => info!(
            "Upload limits: {} bytes per file, {} files per request",
            limit, config.upload.max_files
        ),
        None => info!(
            "Upload limits: unlimited size, {} files per request",
            config.upload.max_files
        ),
    }

    // Log canonical paths being used by the server
    info!(
        "Project data directory (canonical): {}",
        runtime_paths.projects_data_dir.display()
    );
    info!(
        "Uploads directory (canonical): {}",
        runtime_paths.uploads_dir.display()
    );
    info!("Config file: {}", runtime_paths.config_file.display());
    info!("Runtime root: {}", runtime_paths.root.display());

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {}", current_dir.display());
    }
}

fn help_text() -> &'static str {
    "Usage: propdesk [-C <root>]\n\n\
     Options:\n  \
     -C <root>    Runtime directory holding config.yaml, data/ and uploads/ (default: .)\n  \
     -h, --help   Show this help\n"
}

#[derive(Debug)]
enum RunMode {
    Serve,
    Help,
}

struct ParsedArgs {
    runtime_root: std::path::PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: std::path::PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = std::path::PathBuf::from(".");

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = std::path::PathBuf::from(value);
        } else {
            return Err(format!("Unexpected argument '{}'", arg));
        }
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;
    Ok(ParsedArgs {
        runtime_root,
        mode: RunMode::Serve,
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(
    runtime_root: std::path::PathBuf,
) -> Result<std::path::PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::{RunMode, parse_args_from};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_serve() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Serve));
        assert!(parsed.runtime_root.is_absolute());
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "runtime"])).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Serve));
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_ignores_double_dash() {
        let parsed = parse_args_from(args(&["--", "-C", "runtime"])).expect("parse args");
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_requires_runtime_root_value() {
        match parse_args_from(args(&["-C"])) {
            Err(error) => assert!(error.contains("-C")),
            Ok(_) => panic!("expected missing value error"),
        }
    }

    #[test]
    fn parse_args_rejects_unknown_arguments() {
        assert!(parse_args_from(args(&["serve"])).is_err());
    }

    #[test]
    fn parse_args_accepts_help_flag() {
        let parsed = parse_args_from(args(&["-C", "runtime", "--help"])).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Help));
    }
}

//! sitebuilder CLI entry point
//!
//! Usage:
//!   sitebuilder fetch --owner <o> --repository <r> --branch <b>
//!   sitebuilder build <script|jekyll|hugo|static> --owner <o> --repository <r> --branch <b>
//!   sitebuilder detect              Show manifests found in the clone directory
//!   sitebuilder headers --path <p>  Resolve headers from federalist.json
//!   sitebuilder config              Show configuration

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitebuilder::build::{detect_manifests, fetch_repo, Builder, FetchRequest, HttpFetcher, Shell};
use sitebuilder::cli::{
    commands::{BuildCommand, ConfigArgs, DetectArgs, FetchArgs, HeadersArgs, OutputFormat},
    Cli, Commands,
};
use sitebuilder::config::{find_config_files, load_config, Config};
use sitebuilder::error::{BuildError, ErrorInfo};
use sitebuilder::executor::ShellRunner;
use sitebuilder::repo_config::RepoConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);

            let code = match e.downcast_ref::<BuildError>() {
                Some(build_err) => {
                    if let Some(suggestion) = ErrorInfo::from(build_err).suggestion {
                        eprintln!("{}: {}", "hint".yellow().bold(), suggestion);
                    }
                    build_err.exit_code()
                }
                None => 1,
            };

            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitebuilder={}", level)));

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Build(cmd) => build_site(cmd, &config),
        Commands::Fetch(args) => fetch_site(args, &config),
        Commands::Detect(args) => show_manifests(args, &config),
        Commands::Headers(args) => show_headers(args, &config),
        Commands::Config(args) => show_config(args, &config),
    }
}

fn shell_runner(config: &Config) -> Result<ShellRunner> {
    let runner = ShellRunner::from_config(&config.shell)
        .with_context(|| format!("Cannot use shell '{}'", config.shell.program))?;
    Ok(runner.in_dir(config.paths.working_dir()))
}

/// Build the cloned site
fn build_site(cmd: BuildCommand, config: &Config) -> Result<()> {
    let request = cmd.into_request();
    let started = Instant::now();

    let mut runner = shell_runner(config)?;
    let mut shell = Shell::new(&mut runner);

    Builder::new(config, &HttpFetcher).build(&mut shell, &request)?;

    println!(
        "{}: {} build of {}/{} in {:.1}s",
        "Built".green(),
        request.generator,
        request.owner,
        request.repository,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Clone the site repository
fn fetch_site(args: FetchArgs, config: &Config) -> Result<()> {
    let request = FetchRequest::from(args);

    let mut runner = shell_runner(config)?;
    let mut shell = Shell::new(&mut runner);

    fetch_repo(&mut shell, config, &request)?;

    println!(
        "{}: {}/{} ({}) into {}",
        "Cloned".green(),
        request.owner,
        request.repository,
        request.branch,
        config.paths.clone_dir().display()
    );
    Ok(())
}

fn site_dir(dir: Option<PathBuf>, config: &Config) -> PathBuf {
    dir.unwrap_or_else(|| config.paths.clone_dir())
}

/// Show manifests and version pins in a site directory
fn show_manifests(args: DetectArgs, config: &Config) -> Result<()> {
    let dir = site_dir(args.dir, config);
    if !dir.is_dir() {
        anyhow::bail!("Directory '{}' does not exist", dir.display());
    }

    let manifests = detect_manifests(&dir, config);
    let script = &config.node.custom_script;
    let node_version = manifests.node_version();
    let ruby_version = manifests.ruby_version();
    let has_script = manifests.has_script(script);

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "path": dir,
                "manifests": manifests,
                "node_version": node_version,
                "ruby_version": ruby_version,
                "custom_script": script,
                "has_custom_script": has_script,
            }))?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            for path in [
                &manifests.package_json,
                &manifests.nvmrc,
                &manifests.ruby_version,
                &manifests.gemfile,
                &manifests.jekyll_config,
            ]
            .into_iter()
            .flatten()
            {
                println!("{}", path.display());
            }
        }
        OutputFormat::Table => {
            println!("{}: {}", "Path".cyan(), dir.display());
            println!();

            println!("{}:", "Files Found".cyan());
            let found = [
                ("package.json", manifests.has_package_json()),
                (".nvmrc", manifests.nvmrc.is_some()),
                (".ruby-version", manifests.ruby_version.is_some()),
                ("Gemfile", manifests.has_gemfile()),
                (config.ruby.jekyll_config.as_str(), manifests.jekyll_config.is_some()),
            ];
            for (name, present) in found {
                if present {
                    println!("  - {}", name);
                }
            }

            println!();
            let pin = |v: Option<String>| v.unwrap_or_else(|| "default".to_string());
            println!("{}: {}", "Node".cyan(), pin(node_version));
            println!("{}: {}", "Ruby".cyan(), pin(ruby_version));
            if has_script {
                println!("{}: {}", "Script".green(), script);
            } else {
                println!("{}: {}", "Script".yellow(), "None");
            }
        }
    }

    Ok(())
}

/// Resolve the headers served for a path
fn show_headers(args: HeadersArgs, config: &Config) -> Result<()> {
    let dir = site_dir(args.dir, config);
    let repo_config = RepoConfig::load(&dir, config.headers.defaults.clone())?;
    let headers = repo_config.headers_for_path(&args.path);

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&headers)?);
        }
        OutputFormat::Plain => {
            for (key, value) in &headers {
                println!("{}: {}", key, value);
            }
        }
        OutputFormat::Table => {
            println!("{}: {}", "Path".cyan(), args.path);
            println!();
            if headers.is_empty() {
                println!("No headers.");
            } else {
                let width = headers.keys().map(String::len).max().unwrap_or(10);
                for (key, value) in &headers {
                    println!("  {:width$}  {}", key.green(), value, width = width);
                }
            }
        }
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Plain => {
            print!("{}", render_toml(config)?);
        }
        OutputFormat::Table => {
            println!("{}:", "Config Files".cyan());
            let files = find_config_files();
            if files.is_empty() {
                println!("  None (defaults and environment only)");
            }
            for file in &files {
                println!("  - {}", file.display());
            }
            println!();
            print!("{}", render_toml(config)?);
        }
    }

    Ok(())
}

fn render_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render config")
}

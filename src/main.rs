//! bowersync - Bower project dependency manager CLI tool
//!
//! Shows whether installed packages match bower.json and runs bower
//! commands one at a time against the project.

use bowersync::cli::{CliArgs, Command, EntryArgs, InstallArgs};
use bowersync::domain::{DependencyType, SyncStatus};
use bowersync::logging;
use bowersync::manifest::PackageEntryUpdate;
use bowersync::output::{create_formatter, OutputConfig, OutputFormat, OutputFormatter};
use bowersync::progress::Progress;
use bowersync::{AppError, InstallOptions, ProjectConfig, ProjectContext};
use clap::Parser;
use std::future::Future;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    logging::init(args.verbose, args.log_json);

    let output_config = OutputConfig::from_cli(args.json, args.verbose > 0, args.quiet);
    let formatter = create_formatter(output_config.clone());

    // Run the main logic and handle errors
    match run(args, &output_config, formatter.as_ref()).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app_error) if output_config.format == OutputFormat::Json => {
                    let _ = formatter.format_error(app_error, &mut io::stdout().lock());
                }
                Some(app_error) => {
                    let _ = formatter.format_error(app_error, &mut io::stderr().lock());
                }
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

/// Await `task` behind a spinner
async fn with_progress<T>(show: bool, message: &str, task: impl Future<Output = T>) -> T {
    let mut progress = Progress::new(show);
    progress.spinner(message);
    let result = task.await;
    progress.finish_and_clear();
    result
}

/// Main application logic
async fn run(
    args: CliArgs,
    output_config: &OutputConfig,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    let command = args.command();
    let config = ProjectConfig::from_cli(&args).map_err(AppError::from)?;
    let context = ProjectContext::open_system(config).await?;
    let show = output_config.shows_progress();
    let mut stdout = io::stdout().lock();

    match command {
        Command::Status => {
            with_progress(show, "Reading project...", context.reload()).await?;
            let report = context.status().await;
            formatter.format_status(&report, &context.packages().await, &mut stdout)?;
            stdout.flush()?;
            if report.status == SyncStatus::OutOfSync {
                return Ok(ExitCode::from(2));
            }
        }
        Command::List => {
            with_progress(show, "Reading project...", context.reload()).await?;
            formatter.format_packages(&context.packages().await, &mut stdout)?;
        }
        Command::Install(InstallArgs {
            name,
            range,
            save,
            save_dev,
        }) => {
            let summary = match name {
                Some(name) => {
                    let mut options = InstallOptions::default();
                    if let Some(range) = range {
                        options = options.version(range);
                    }
                    if save {
                        options = options.save(DependencyType::Production);
                    } else if save_dev {
                        options = options.save(DependencyType::Development);
                    }
                    let message = format!("Installing {}...", name);
                    with_progress(show, &message, context.install_package(&name, options)).await?
                }
                None => {
                    with_progress(show, "Installing from bower.json...", context.install_from_manifest())
                        .await?
                }
            };
            formatter.format_summary("install", &summary, &mut stdout)?;
        }
        Command::Uninstall { name, force } => {
            let message = format!("Uninstalling {}...", name);
            let summary = with_progress(show, &message, context.uninstall(&name, force)).await?;
            formatter.format_summary("uninstall", &summary, &mut stdout)?;
        }
        Command::Update { name } => {
            let summary =
                with_progress(show, "Updating...", context.update(name.as_deref())).await?;
            formatter.format_summary("update", &summary, &mut stdout)?;
        }
        Command::Prune => {
            let summary = with_progress(show, "Pruning...", context.prune()).await?;
            formatter.format_summary("prune", &summary, &mut stdout)?;
        }
        Command::Search { query } => {
            let hits = with_progress(show, "Searching...", context.search(&query)).await?;
            formatter.format_search(&hits, &mut stdout)?;
        }
        Command::Info { name } => {
            let info = with_progress(show, "Fetching package info...", context.info(&name)).await?;
            formatter.format_info(&info, &mut stdout)?;
        }
        Command::Init => {
            // Queued behind the reload so the manifest reflects installed packages
            let reload = context.reload();
            let create = context.create_manifest();
            with_progress(show, "Reading project...", reload).await?;
            let handle = create.await?;
            formatter.format_manifest("created", Some(&handle), &mut stdout)?;
        }
        Command::RemoveManifest => {
            context.remove_manifest().await?;
            formatter.format_manifest("removed bower.json", None, &mut stdout)?;
        }
        Command::Entry(EntryArgs {
            name,
            range,
            dev,
            prod,
        }) => {
            let dependency_type = if dev {
                Some(DependencyType::Development)
            } else if prod {
                Some(DependencyType::Production)
            } else {
                None
            };
            let update = PackageEntryUpdate {
                version: range,
                dependency_type,
            };
            context.update_package_entry(&name, update).await?;
            formatter.format_manifest("updated bower.json", None, &mut stdout)?;
        }
        Command::Config => {
            let config = context.configuration().await?;
            formatter.format_configuration(&config, &mut stdout)?;
        }
    }

    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

// ABOUTME: Entry point for the keyward CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use keyward::auth::{self, HashKind, RemoteOptions};
use keyward::config::{Config, RepositoryConfig, SshConfig};
use keyward::error::{Error, Result};
use keyward::vcs::{self, CloneOptions, GitClient, Repository};
use output::{Output, OutputMode};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));

    if cli.insecure_skip_host_verification {
        auth::set_insecure_skip_host_verification(true);
    }

    if let Err(e) = run(cli.command, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;

    match command {
        Commands::Clone {
            url,
            dir,
            bare,
            key,
            user,
        } => {
            let mut config = Config::discover_or_default(&cwd)?;
            if key.is_some() || user.is_some() {
                let ssh = config.ssh.get_or_insert_with(SshConfig::default);
                if let Some(key) = key {
                    ssh.private_key = Some(key);
                    ssh.public_key = None;
                }
                if let Some(user) = user {
                    ssh.user = Some(user);
                }
            }

            let dir = match dir {
                Some(dir) => dir,
                None => RepositoryConfig::default_dir(&url, bare).map_err(Error::InvalidConfig)?,
            };
            clone(&config, url, dir, bare, output).await
        }
        Commands::Update { dir } => {
            let config = Config::discover_or_default(&cwd)?;
            update(&config, dir, output).await
        }
        Commands::Sync => {
            let config = Config::discover(&cwd)?;
            sync(config, output).await
        }
        Commands::KnownHosts { host } => {
            let config = Config::discover_or_default(&cwd)?;
            show_known_hosts(&config, &host, output);
            Ok(())
        }
    }
}

async fn clone(config: &Config, url: String, dir: PathBuf, bare: bool, output: &Output) -> Result<()> {
    let client = config.git_client();
    let options = CloneOptions::new()
        .bare(bare)
        .remote(config.remote_options()?);

    output.progress(&format!("Cloning {} into {}...", url, dir.display()));
    let message = format!("Cloned {} into {}", url, dir.display());
    tokio::task::spawn_blocking(move || client.clone_repository(&url, &dir, &options)).await??;

    output.success(&message);
    Ok(())
}

async fn update(config: &Config, dir: PathBuf, output: &Output) -> Result<()> {
    let client = config.git_client();
    let options = config.remote_options()?;

    output.progress(&format!("Fetching into {}...", dir.display()));
    let message = format!("Updated {}", dir.display());
    tokio::task::spawn_blocking(move || {
        let repository = Repository::open(&dir)?;
        client.update_everything(&repository, &options)
    })
    .await??;

    output.success(&message);
    Ok(())
}

/// Clone or update every configured repository concurrently.
async fn sync(config: Config, output: &Output) -> Result<()> {
    if config.repositories.is_empty() {
        return Err(Error::NoRepositories);
    }

    let client = Arc::new(config.git_client());
    let options = config.remote_options()?;
    let total = config.repositories.len();
    output.progress(&format!("Syncing {total} repositories..."));

    let tasks = config.repositories.into_iter().map(|repository| {
        let client = Arc::clone(&client);
        let options = options.clone();
        tokio::task::spawn_blocking(move || {
            let result = sync_one(&client, &repository, &options);
            (repository, result)
        })
    });

    let mut failed = 0;
    for joined in futures::future::join_all(tasks).await {
        match joined {
            Ok((repository, Ok(action))) => {
                output.progress(&format!("  {} {}", action, repository.url));
            }
            Ok((repository, Err(e))) => {
                failed += 1;
                output.failure(&repository.url, &e.to_string());
            }
            Err(e) => {
                failed += 1;
                output.error(&format!("sync task failed: {e}"));
            }
        }
    }

    if failed > 0 {
        return Err(Error::SyncFailed { failed, total });
    }
    output.success(&format!("Synced {total} repositories"));
    Ok(())
}

fn sync_one(
    client: &GitClient,
    repository: &RepositoryConfig,
    options: &RemoteOptions,
) -> vcs::Result<&'static str> {
    if repository.dir.exists() {
        let local = Repository::open(&repository.dir)?;
        client.update_everything(&local, options)?;
        Ok("updated")
    } else {
        let clone_options = CloneOptions::new()
            .bare(repository.bare)
            .remote(options.clone());
        client.clone_repository(&repository.url, &repository.dir, &clone_options)?;
        Ok("cloned")
    }
}

fn show_known_hosts(config: &Config, host: &str, output: &Output) {
    let known_hosts = config.known_hosts();
    let trusted = known_hosts.lookup(host).unwrap_or_default();
    let revoked = known_hosts.revoked(host);

    if trusted.is_empty() && revoked.is_empty() {
        output.info(&format!("no trusted keys for {host}"));
        return;
    }

    for key in trusted {
        output.info(&format!(
            "{} {} {} ({})",
            host,
            key.algorithm,
            key.fingerprint(HashKind::Sha256),
            key.location
        ));
    }
    for key in revoked {
        output.info(&format!(
            "{} {} {} (revoked, {})",
            host,
            key.algorithm,
            key.fingerprint(HashKind::Sha256),
            key.location
        ));
    }
}

//! Thin CLI driver for the four operations: configures logging the way
//! the teacher's original runner did (crate-level verbosity toggled by
//! `--debug`/`--verbose`, external crates pinned at `info`), then maps
//! the parsed subcommand onto one `orchestrate::*::run` call and prints
//! the tagged `ApiResult`.

use crate::cli::{Cli, Commands};
use reconsage::api::types::{ApiResult, DirectoryScanRequest, FalsePositiveRequest, RateLimitScanRequest, WafScanRequest};
use reconsage::{orchestrate, wordlist};

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!("reconsage={crate_level},reqwest=info,hyper=info,h2=info");
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan { target, wordlist, wordlist_2, json_file_path, json_file_name, concurrency, timeout } => {
            tracing::info!(%target, "starting directory scan");
            let req = DirectoryScanRequest {
                target,
                wordlist,
                wordlist_2,
                json_file_path,
                json_file_name,
                concurrency,
                timeout,
            };
            print_result(orchestrate::directory_scan::run(req).await);
        }
        Commands::WafScan { target, wordlist, json_file_path, json_file_name, concurrency, timeout } => {
            tracing::info!(%target, "starting WAF/CDN scan");
            let req = WafScanRequest {
                target,
                wordlist: wordlist::load(&wordlist),
                json_file_name,
                json_file_path,
                concurrency,
                timeout,
                attack_headers: None,
            };
            print_result(orchestrate::waf_scan::run(req).await);
        }
        Commands::RateScan { target, domains, user_paths, json_file_path, json_file_name, concurrency, timeout } => {
            tracing::info!(%target, "starting rate-limit scan");
            let req = RateLimitScanRequest {
                target,
                timeout,
                concurrency,
                json_file_name,
                json_file_path,
                domains: wordlist::load(&domains),
                user_paths: wordlist::load(&user_paths),
                attack_headers: None,
            };
            print_result(orchestrate::ratelimit_scan::run(req).await);
        }
        Commands::FpScan { json_file_to_read, targets_file, json_full_path, json_file_name, concurrency, timeout } => {
            tracing::info!("starting false-positive analysis");
            let list_of_targets = targets_file.as_deref().map(wordlist::load);
            let req = FalsePositiveRequest {
                target: None,
                json_file_name,
                json_full_path,
                timeout,
                concurrency,
                json_file_to_read,
                list_of_targets,
            };
            print_result(orchestrate::fp_scan::run(req).await);
        }
    }
    Ok(())
}

fn print_result<T: serde::Serialize>(result: ApiResult<T>) {
    match serde_json::to_string_pretty(&result) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize result: {e}"),
    }
}

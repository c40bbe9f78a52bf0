// src/lib.rs

pub mod action;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod trigger;
pub mod types;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::action::{Action, Host, TriggeredAction};
use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - building one `TriggeredAction` per `[action.<name>]`
/// - booting them on a `Host`
/// - Ctrl-C handling
///
/// Returns once Ctrl-C was received or every action ran out on its own, after
/// all actions have been ended.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let host = Host::start_all(build_actions(&cfg)).await?;
    info!(actions = ?host.names(), "all actions started");

    // An action listening for SIGINT fires on Ctrl-C as well; shutdown
    // follows right after.
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received; ending actions"),
            Err(e) => {
                warn!(error = %e, "failed to listen for Ctrl-C; waiting for actions to finish");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = shutdown => {}
        _ = host.wait_finished() => info!("all actions finished on their own"),
    }

    host.end_all().await;
    info!("tripline exiting");
    Ok(())
}

/// One boxed `TriggeredAction` per configured action, in name order.
///
/// Output files are created here; a failure is kept on the action and
/// reported when the host starts it.
pub fn build_actions(cfg: &ConfigFile) -> Vec<Box<dyn Action>> {
    cfg.action
        .iter()
        .map(|(name, action)| {
            Box::new(TriggeredAction::from_config(name.as_str(), action)) as Box<dyn Action>
        })
        .collect()
}

/// Simple dry-run output: print each action and its resolved triggers.
fn print_dry_run(cfg: &ConfigFile) {
    println!("tripline dry-run");
    println!();

    println!("actions ({}):", cfg.action.len());
    for (name, action) in cfg.action.iter() {
        println!("  - {name}");
        println!("      schedule: {}", action.schedule);
        if !action.signals.is_empty() {
            let signals: Vec<String> = action.signals.iter().map(|s| s.to_string()).collect();
            println!("      signals: {}", signals.join(", "));
        }
        match &action.output {
            Some(path) => println!("      output: {}", path.display()),
            None => println!("      output: <stdout>"),
        }
        println!("      run: {:?}", action.run);
    }

    debug!("dry-run complete (nothing started)");
}

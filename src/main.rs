use anyhow::Context;
use clap::Parser;
use project_triage::domain::ports::Assigner;
use project_triage::utils::error::ErrorSeverity;
use project_triage::utils::logger;
use project_triage::utils::validation::{validate_required_field, Validate};
use project_triage::{
    CliArgs, DryRunAssigner, GithubClient, GithubProjectAssigner, Orchestrator, TriageError,
};
use tokio_util::sync::CancellationToken;

fn exit_code(e: &TriageError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 130,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: &TriageError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting project-triage");

    let (config, github) = args.resolve().unwrap_or_else(|e| fail(&e));
    if args.verbose {
        tracing::debug!("Triage config: {:?}", config);
        tracing::debug!("GitHub settings: {:?}", github);
    }

    if let Err(e) = config
        .validate()
        .and_then(|_| github.validate())
        .and_then(|_| validate_required_field("github.token", &github.token).map(|_| ()))
    {
        fail(&e);
    }

    let client = GithubClient::new(&github).context("Failed to build GitHub client")?;
    let assigner: Box<dyn Assigner> = if config.assign {
        tracing::info!("Matched items will be added to the project");
        Box::new(GithubProjectAssigner::new(client.clone()))
    } else {
        tracing::info!("Dry run: matched items are reported, not added (use --assign)");
        Box::new(DryRunAssigner)
    };

    let orchestrator = Orchestrator::new(config, client.clone(), client, assigner);
    let cancel = CancellationToken::new();
    let run = orchestrator.run(&cancel);
    tokio::pin!(run);

    let result = tokio::select! {
        result = &mut run => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling scan");
            cancel.cancel();
            run.await
        }
    };

    match result {
        Ok(report) => {
            let config = orchestrator.config();
            println!(
                "Project {:?} ({}), column {:?} ({})",
                config.project, report.project_id, config.column, report.column.option_id
            );
            for scan in report.repositories.iter().filter(|s| !s.items.is_empty()) {
                println!(
                    "  {}/{}: {} issues, {} pull requests",
                    config.org,
                    scan.repository,
                    scan.issue_count(),
                    scan.pull_request_count()
                );
            }
            if config.assign {
                println!(
                    "✅ Added {} of {} matching items across {} repositories",
                    report.assigned,
                    report.total_matched(),
                    report.repositories.len()
                );
            } else {
                println!(
                    "✅ Found {} matching items across {} repositories (dry run)",
                    report.total_matched(),
                    report.repositories.len()
                );
            }
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

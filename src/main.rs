use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, error};
use release_bump::{
    arguments::Arguments,
    config::ReleaseConfig,
    credentials::CredentialChain,
    git::LazyGitTracker,
    publisher::ReleasePublisher,
    release::{ReleaseOrchestrator, ReleaseStage},
    test_runner::TestRunner,
};

#[tokio::main]
async fn main() {
    let args = Arguments::parse();
    pretty_env_logger::env_logger::builder()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .format_timestamp(None)
        .parse_default_env()
        .init();

    if let Err(err) = run(&args).await {
        error!("❌ Error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: &Arguments) -> Result<()> {
    let config = ReleaseConfig::from(args);
    let project = &config.project;

    let git = LazyGitTracker::new(&project.root, project.remote.clone());
    if !config.run.dry_run {
        // a real release needs the repository before anything is written
        git.tracker()?;
    }
    let test_runner = TestRunner::new(project.test_command.clone(), &project.root);
    let credentials = CredentialChain::standard(config.run.token.clone(), &project.root);
    let publisher = ReleasePublisher::new(&project.api_root, &project.mainline_branch, credentials);

    let outcome = ReleaseOrchestrator::new(&config, &git, test_runner, publisher).run().await?;
    if outcome.stage == ReleaseStage::Done {
        log::info!("🎉 Released {} (was {})", outcome.next, outcome.current);
    }
    Ok(())
}

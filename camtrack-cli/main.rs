use anyhow::{Context, Result};
use camtrack_cli::{Cli, PipelineConfig, Tracker};
use clap::Parser;
use log::{info, warn};

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn print_settings(config: &PipelineConfig) {
    println!("========== SETTING ==========");
    println!("detectorType : {}", config.kinds.detector);
    println!("descriptorType : {}", config.kinds.descriptor);
    println!("matcherType : {}", config.kinds.matcher);
    println!("selectorType : {}", config.kinds.selector);
    println!("bVis : {}", u8::from(config.visualize));
    println!("bLimitKpts : {}", u8::from(config.limit_keypoints));
    println!("bFocusOnVehicle : {}", u8::from(config.focus_on_vehicle));
    println!("=============================");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    let notices = cli.apply(&mut config);

    env_logger::Builder::new()
        .filter_level(config.level_filter())
        .parse_default_env()
        .init();

    for notice in &notices {
        println!("{notice}");
    }
    print_settings(&config);

    if let Some(path) = &cli.write_config {
        config
            .save(path)
            .with_context(|| format!("failed to write configuration {}", path.display()))?;
        println!("Saved configuration to {}", path.display());
        return Ok(());
    }

    if let Err(e) = camtrack_core::init_thread_pool(config.threads) {
        warn!("keeping the existing thread pool: {e}");
    }
    info!("{}", config.summary());

    let mut tracker = Tracker::new(config).context("cannot start tracking")?;
    let summary = tracker.run().context("tracking run failed")?;
    println!("{}", summary.summary());
    Ok(())
}

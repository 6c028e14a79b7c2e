//! `drivelog` - CLI for the driving incident logger
//!
//! This binary runs the interactive logging console and a few helper
//! commands for checking the location provider and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;

use drivelog::cli::{Cli, Command, ConfigCommand, LocateCommand, ProviderArg, SessionCommand};
use drivelog::{init_logging, location, Config, Console, EventCapture, Exporter, IncidentKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config validate` reports load errors itself
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        handle_validate(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Session(cmd) => handle_session(config, &cmd).await,
        Command::Kinds => {
            handle_kinds();
            Ok(())
        }
        Command::Locate(cmd) => handle_locate(config, &cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Apply a `--provider` override and re-check the result.
fn with_provider(mut config: Config, provider: Option<ProviderArg>) -> anyhow::Result<Config> {
    if let Some(provider) = provider {
        config.location.provider = provider.into();
        config
            .validate()
            .context("configuration is invalid for the selected provider")?;
    }
    Ok(config)
}

async fn handle_session(config: Config, cmd: &SessionCommand) -> anyhow::Result<()> {
    let config = with_provider(config, cmd.provider)?;

    let capture =
        EventCapture::from_config(&config).context("failed to set up event capture")?;
    let mut exporter = Exporter::from_config(&config);
    if let Some(dir) = &cmd.output_dir {
        exporter = exporter.with_directory(dir);
    }
    let format = cmd.format.map_or(config.export.format, Into::into);

    let mut console = Console::new(capture, exporter, format, std::io::stdout());
    let summary = console
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .context("console failed")?;

    println!();
    println!(
        "Session closed: {} trip(s), {} event(s), {} export(s). The log is not saved.",
        summary.trips, summary.events, summary.exports
    );
    Ok(())
}

fn handle_kinds() {
    println!("Button  Type                Label");
    println!("------  ------------------  -----");
    for kind in IncidentKind::ALL {
        println!("{:<6}  {:<18}  {}", kind.button(), kind.as_str(), kind.label());
    }
}

async fn handle_locate(config: Config, cmd: &LocateCommand) -> anyhow::Result<()> {
    let config = with_provider(config, cmd.provider)?;
    let capture =
        EventCapture::from_config(&config).context("failed to set up location provider")?;
    let request = capture.request();

    let outcome = location::locate(capture.provider(), &request).await;

    if cmd.json {
        let coords = outcome.coordinates();
        let report = serde_json::json!({
            "provider": capture.provider().name(),
            "timeout_ms": request.timeout.as_millis(),
            "high_accuracy": request.high_accuracy,
            "resolved": outcome.is_resolved(),
            "latitude": coords.map(|c| c.latitude),
            "longitude": coords.map(|c| c.longitude),
            "outcome": outcome.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Provider:  {}", capture.provider().name());
        println!("Timeout:   {} ms", request.timeout.as_millis());
        println!("Outcome:   {outcome}");
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Location]");
                println!("  Provider:           {}", config.location.provider);
                println!("  Timeout (ms):       {}", config.location.timeout_ms);
                println!("  High accuracy:      {}", config.location.high_accuracy);
                println!("  gpsd address:       {}", config.location.gpsd_address);
                if let (Some(lat), Some(lon)) =
                    (config.location.fixed_latitude, config.location.fixed_longitude)
                {
                    println!("  Fixed position:     {lat}, {lon}");
                }
                println!();
                println!("[Clock]");
                println!("  Zone:               {}", config.clock.zone_name);
                println!("  UTC offset (min):   {}", config.clock.utc_offset_minutes);
                println!("  Format:             {}", config.clock.format);
                println!();
                println!("[Export]");
                println!("  Directory:          {}", config.export_dir().display());
                println!("  Format:             {}", config.export.format);
                println!("  Trips file:         {}", config.export.trips_file_name);
                println!("  Events file:        {}", config.export.events_file_name);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => handle_validate(file),
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}

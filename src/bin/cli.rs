use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use clap_serde_derive::ClapSerde;
use tracing::error;

use lingua_runner::config::DEFAULT_CONFIG_FILE;
use lingua_runner::exit_err;
use lingua_runner::inference::models::exaone::ExaoneModel;
use lingua_runner::telemetry::{init_telemetry, shutdown_telemetry};
use lingua_runner::{Config, Orchestrator, TaskOutput, TaskRegistry};

#[derive(Parser)]
#[command(author, version, about = "Run a single command against the local model", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(long, env, default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,

    /// Task keyword followed by the text, e.g. `t-to-en 안녕하세요`
    #[arg(required = true, num_args = 1..)]
    command: Vec<String>,

    /// Configuration options
    #[command(flatten)]
    pub opt_config: <Config as ClapSerde>::Opt,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let mut args = Args::parse();
    let config_result = Config::load(&args.config_file);
    let config = match &config_result {
        Ok(conf) => conf.clone().merge(&mut args.opt_config),
        Err(_) => Config::default().merge(&mut args.opt_config),
    };

    init_telemetry(&config.log_dir, &config.log_name, config.otlp_endpoint())?;
    if let Err(err) = config_result {
        exit_err!(
            1,
            "Failed to read configuration file {} with error: {}",
            args.config_file,
            err
        );
    }

    let command = args.command.join(" ");
    let outcome = tokio::task::spawn_blocking(move || -> Result<_> {
        let model = ExaoneModel::from_config(&config)?;
        let mut orchestrator = Orchestrator::new(TaskRegistry::new(config.match_policy), model);
        Ok(orchestrator.handle(&command)?)
    })
    .await?;

    let code = match outcome {
        Ok(result) => {
            match result.output {
                TaskOutput::Translation(text) => println!("{text}"),
                TaskOutput::Grammar(parsed) => {
                    println!("Rate: {}, {}", parsed.rating, parsed.tier());
                    println!("Feedback: {}", parsed.feedback);
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    };

    shutdown_telemetry();
    Ok(code)
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod job;

const LIB_MODULES: &[&str] = &["common"];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every comparison of a job
    Plot {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
    },
    /// Print mean and confidence interval of every compared group
    Stats {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
    },
    /// Print the graph display order
    Order {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("bench_plots={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in LIB_MODULES.iter().chain(default_plots::PLOT_MODULES) {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_plots::init_plots();

    let result = match &args.command {
        Commands::Plot { config_file } => job::run_plots(config_file, args.no_progress).await,
        Commands::Stats { config_file } => job::print_stats(config_file).await,
        Commands::Order { config_file } => job::print_order(config_file).await,
    };
    if let Err(err) = &result {
        error!("{err:#?}");
    }
    result
}

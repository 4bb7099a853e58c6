use std::path::{Path, PathBuf};

use common::{
    config::Config,
    pipeline::{PreparedJob, prepare},
};
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{fs::read_to_string, task::spawn_blocking};
use tracing::{debug, info};

/// Reads the job config. Relative paths inside it are taken relative to the
/// config file.
pub async fn load_config(config_file: &Path) -> Result<Config> {
    let data = read_to_string(config_file)
        .await
        .wrap_err_with(|| format!("Read config {config_file:?}"))?;
    let mut config: Config =
        serde_yml::from_str(&data).wrap_err_with(|| format!("Parse config {config_file:?}"))?;
    let base = config_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    config.resolve_paths(&base);
    debug!("Loaded config {}", config.name);
    Ok(config)
}

/// Loads both input tables and computes every chart of the batch.
pub async fn prepare_job(config: &Config) -> Result<PreparedJob> {
    let metadata = read_to_string(&config.settings.metadata)
        .await
        .wrap_err_with(|| format!("Read graph metadata {:?}", config.settings.metadata))?;
    let measurements = read_to_string(&config.settings.measurements)
        .await
        .wrap_err_with(|| format!("Read measurements {:?}", config.settings.measurements))?;
    prepare(config, metadata.as_bytes(), measurements.as_bytes())
}

pub async fn run_plots(config_file: &Path, no_progress: bool) -> Result<()> {
    let config = load_config(config_file).await?;
    let job = prepare_job(&config).await?;
    info!(
        "Rendering {} charts with {} from {} observations over {} graphs, range {:?}",
        job.charts.len(),
        config.surface.name(),
        job.observations.len(),
        job.order.len(),
        job.range
    );

    let progress = if no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(job.charts.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?,
    );

    let surface = config.surface.clone();
    let bar = progress.clone();
    let job = spawn_blocking(move || -> Result<PreparedJob> {
        job.render(&*surface, |chart| {
            bar.set_message(chart.title.clone());
            bar.inc(1);
        })?;
        Ok(job)
    })
    .await??;
    progress.finish_and_clear();

    for chart in &job.charts {
        println!("{} -> {}", chart.title, chart.output.display());
    }
    Ok(())
}

pub async fn print_stats(config_file: &Path) -> Result<()> {
    let config = load_config(config_file).await?;
    let job = prepare_job(&config).await?;
    println!("confidence level {}", job.confidence().get());
    println!(
        "{:<24} {:<24} {:>4} {:>14} {:>14}",
        "algorithm", "graph", "n", "mean (s)", "ci half (s)"
    );
    for stat in job.group_stats() {
        let half_width = stat
            .ci_half_width
            .filter(|_| !stat.is_degenerate())
            .map_or_else(|| "-".to_owned(), |h| format!("{h:.6}"));
        println!(
            "{:<24} {:<24} {:>4} {:>14.6} {:>14}",
            stat.algorithm, stat.graph, stat.n, stat.mean, half_width
        );
    }
    println!("shared range {:.6} .. {:.6}", job.range.min, job.range.max);
    Ok(())
}

pub async fn print_order(config_file: &Path) -> Result<()> {
    let config = load_config(config_file).await?;
    let job = prepare_job(&config).await?;
    for (idx, meta) in job.ordered_metadata().into_iter().enumerate() {
        println!(
            "{idx:>3} {} (vertexes {}, edges {})",
            meta.graph, meta.vertex_count, meta.edge_count
        );
    }
    Ok(())
}

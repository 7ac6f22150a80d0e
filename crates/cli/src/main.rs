//! vidscout command-line entry point.
//!
//! Analyzes one or more pages and writes one export per target. Logging goes
//! to stderr so `--stdout` output stays clean.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use vidscout_client::{
    Analyzer, AnalyzerConfig, CancellationToken, ExportFormat, export, export_file_name, with_default_scheme,
};
use vidscout_core::{AppConfig, SiteAnalysis};

/// Find the videos on web pages and the articles that embed them.
#[derive(Parser, Debug)]
#[command(name = "vidscout", version, about, long_about = None)]
struct Args {
    /// Page URLs to analyze. A missing scheme defaults to https.
    urls: Vec<String>,

    /// File with one URL per line. Blank lines and lines starting with '#' are skipped.
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,

    /// Export format (json or html).
    #[arg(long, default_value = "json")]
    format: ExportFormat,

    /// Directory export files are written to.
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Print exports to stdout instead of writing files.
    #[arg(long)]
    stdout: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = AppConfig::load().context("failed to load configuration")?;
    let targets = collect_targets(&args.urls, args.file.as_deref()).await?;
    if targets.is_empty() {
        bail!("no URLs to analyze; pass them as arguments or with --file");
    }

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling analysis");
            on_interrupt.cancel();
        }
    });

    tracing::info!(targets = targets.len(), batch_size = config.batch_size, "starting analysis");
    let analyzer = Analyzer::new(AnalyzerConfig::from(&config));
    let analyses = analyzer.analyze_many_with_cancellation(&targets, &token).await?;

    let timestamp = chrono::Utc::now().timestamp();
    for (index, analysis) in analyses.iter().enumerate() {
        report(analysis);
        let bytes = export(analysis, args.format)?;

        if args.stdout {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            writeln!(stdout)?;
            continue;
        }

        tokio::fs::create_dir_all(&args.output_dir)
            .await
            .with_context(|| format!("failed to create {}", args.output_dir.display()))?;
        let path = args.output_dir.join(output_name(args.format, timestamp, index, analyses.len()));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("wrote {}", path.display());
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Command-line URLs followed by the ones listed in `file`.
async fn collect_targets(urls: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut targets: Vec<String> = urls.iter().map(|url| with_default_scheme(url)).collect();
    if let Some(path) = file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        targets.extend(parse_url_list(&contents));
    }
    targets.retain(|url| !url.is_empty());
    Ok(targets)
}

fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(with_default_scheme)
        .collect()
}

/// `video_analysis_<ts>.<ext>`, numbered from 1 when a run exports several analyses.
fn output_name(format: ExportFormat, timestamp: i64, index: usize, total: usize) -> String {
    if total <= 1 {
        return export_file_name(format, timestamp);
    }
    export_file_name(format, timestamp).replacen('.', &format!("_{}.", index + 1), 1)
}

fn report(analysis: &SiteAnalysis) {
    eprintln!(
        "{}: {} videos, {} articles, {} errors ({:.2}s)",
        analysis.target_url,
        analysis.videos.len(),
        analysis.articles.len(),
        analysis.error_log.len(),
        analysis.processing_time
    );
    for error in &analysis.error_log {
        eprintln!("  {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list() {
        let contents = "# targets\nhttps://a.com/post\n\n  b.com/page  \n#c.com\n";
        assert_eq!(parse_url_list(contents), vec!["https://a.com/post", "https://b.com/page"]);
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name(ExportFormat::Json, 42, 0, 1), "video_analysis_42.json");
        assert_eq!(output_name(ExportFormat::Html, 42, 2, 3), "video_analysis_42_3.html");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["vidscout", "a.com", "--format", "html", "--stdout"]);
        assert_eq!(args.urls, vec!["a.com"]);
        assert_eq!(args.format, ExportFormat::Html);
        assert!(args.stdout);
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_collect_targets_applies_default_scheme() {
        let targets = collect_targets(&["x.com".to_string()], None).await.unwrap();
        assert_eq!(targets, vec!["https://x.com"]);
    }
}

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use honest_charts::render::{Renderer, SvgRenderer};
use honest_charts::{
    ChartSpec, ChartType, Normalization, NormalizedChartSpec, Normalizer, NormalizerConfig,
    Severity, classify, storage,
};

#[derive(Parser, Debug)]
#[command(
    name = "honest-charts",
    version,
    about = "Validate chart specs and normalize them into honest, minimal-ink charts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tell whether a chart type is banned and what to use instead.
    Classify(ClassifyArgs),
    /// Normalize a JSON chart spec and print its checklist.
    Check(CheckArgs),
    /// Normalize a JSON chart spec and render it to SVG.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Chart type, e.g. pie, 3d-bar, stacked-area
    chart_type: String,
    /// Number of series (some types are only banned above a count).
    #[arg(long, default_value_t = 1)]
    series: usize,
    /// Print the decision as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Path to a JSON chart spec.
    spec: PathBuf,
    /// JSON config file overriding normalizer defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Accept a banned chart type after reading its rationale.
    #[arg(long, default_value_t = false)]
    confirm: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input: NormalizeArgs,
    /// Print the full normalized result as JSON instead of the checklist.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Save the checklist as CSV.
    #[arg(long)]
    report_csv: Option<PathBuf>,
    /// Save the normalized result (or the confirmation request) as JSON.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: NormalizeArgs,
    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 500)]
    height: u32,
    /// Locale for tick labels (e.g. en, de, fr).
    #[arg(long, default_value = "en")]
    locale: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Classify(args) => cmd_classify(args),
        Command::Check(args) => cmd_check(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_classify(args: ClassifyArgs) -> Result<()> {
    let chart = ChartType::from(args.chart_type.as_str());
    let decision = classify(&chart, args.series);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else if let Some(sub) = decision.substitute_type.filter(|_| decision.is_banned) {
        println!("{chart}: banned, use {sub}");
        println!("  {}", decision.rationale);
    } else {
        println!("{chart}: allowed");
    }
    Ok(())
}

fn load_normalizer(config: Option<&PathBuf>) -> Result<Normalizer> {
    let cfg = match config {
        Some(path) => NormalizerConfig::from_json_file(path)?,
        None => NormalizerConfig::default(),
    };
    Ok(Normalizer::new(cfg))
}

/// Run the chart through the normalizer. With `confirm`, a banned type goes
/// through the whole override protocol in-process: the rationale is shown on
/// stderr, the session is marked educated, and the chart is resubmitted.
fn normalize(
    normalizer: &Normalizer,
    mut spec: ChartSpec,
    confirm: bool,
) -> Result<Normalization> {
    if confirm && spec.request_id.is_none() {
        spec.request_id = Some(format!("cli-{}", chrono::Utc::now().timestamp_millis()));
    }
    let first = normalizer.normalize(&spec)?;
    let Normalization::NeedsConfirmation(ask) = &first else {
        return Ok(first);
    };
    if !confirm {
        return Ok(first);
    }
    eprintln!("{} is banned: {}", ask.banned_type, ask.rationale);
    if let Some(sub) = ask.substitute_type {
        eprintln!("Suggested substitute: {sub}. Proceeding because --confirm was given.");
    }
    if let Some(id) = ask.request_id.as_deref() {
        normalizer.sessions().mark_educated(id, &ask.banned_type)?;
    }
    Ok(normalizer.normalize(&spec.confirmed(true))?)
}

fn explain_refusal(ask: &honest_charts::NeedsConfirmation) -> anyhow::Error {
    let sub = ask
        .substitute_type
        .map(|s| s.to_string())
        .unwrap_or_else(|| "another chart type".to_string());
    anyhow::anyhow!(
        "{} is banned: {}\nuse {sub}, or rerun with --confirm to render it anyway",
        ask.banned_type,
        ask.rationale
    )
}

fn print_checklist(chart: &NormalizedChartSpec) {
    let report = &chart.checklist;
    println!("checklist v{} for {}", report.version, chart.spec.chart_type);
    for e in &report.entries {
        let status = match (e.passed, e.severity) {
            (true, _) => "ok  ",
            (false, Severity::Info) => "info",
            (false, Severity::Warning) => "WARN",
        };
        println!("  {status}  {:<30} {}", e.rule_id, e.message);
    }
    let warnings = report.warnings().count();
    if warnings > 0 {
        eprintln!("{warnings} warning(s)");
    }
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let normalizer = load_normalizer(args.input.config.as_ref())?;
    let spec = storage::load_spec(&args.input.spec)?;
    let outcome = normalize(&normalizer, spec, args.input.confirm)?;

    if let Some(path) = args.out.as_ref() {
        storage::save_json(&outcome, path)?;
        eprintln!("Saved result to {}", path.display());
    }
    let chart = match &outcome {
        Normalization::Normalized(chart) => chart,
        Normalization::NeedsConfirmation(ask) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            return Err(explain_refusal(ask));
        }
    };
    if let Some(path) = args.report_csv.as_ref() {
        storage::save_report_csv(&chart.checklist, path)?;
        eprintln!("Saved checklist to {}", path.display());
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_checklist(chart);
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let normalizer = load_normalizer(args.input.config.as_ref())?;
    let spec = storage::load_spec(&args.input.spec)?;
    let chart = match normalize(&normalizer, spec, args.input.confirm)? {
        Normalization::Normalized(chart) => chart,
        Normalization::NeedsConfirmation(ask) => return Err(explain_refusal(&ask)),
    };
    if args.width == 0 || args.height == 0 {
        bail!("--width and --height must be positive");
    }
    let renderer = SvgRenderer::new(args.width, args.height).with_locale(&args.locale);
    let svg = renderer.render(&chart)?;
    std::fs::write(&args.out, svg)?;
    eprintln!("Wrote chart to {}", args.out.display());
    for e in chart.checklist.warnings() {
        eprintln!("warning: {}: {}", e.rule_id, e.message);
    }
    Ok(())
}

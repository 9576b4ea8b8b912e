use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use healthxai::config::load_profile;
use healthxai::export::{self, json::export_json, render_bundle};
use healthxai::{
    advice_context, AppConfig, BatchSummary, ExerciseCategory, ExplainerStrategy, ExportFormat,
    HealthProfile, LogFormat, LogLevel, MetricsCalculator, RecommendationBundle,
    RecommendationEngine, ReferenceData, TrackingTemplate,
};

/// healthxai - Explainable Health Recommendation CLI
///
/// Computes body metrics, a daily diet plan and a weekly exercise plan for a
/// health profile, together with an explanation of what drove them.
#[derive(Parser)]
#[command(name = "healthxai")]
#[command(author = "healthxai Contributors")]
#[command(version)]
#[command(about = "Explainable diet and exercise recommendations", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate recommendations for one or more profiles
    Recommend {
        /// Profile files (JSON or TOML)
        #[arg(required = true)]
        profiles: Vec<PathBuf>,

        /// Output format (json, text, csv); guessed from --output when omitted
        #[arg(short = 'f', long)]
        format: Option<String>,

        /// Output file, or output directory when several profiles are given
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Feature-importance method
        #[arg(short, long, value_enum, default_value_t = ExplainerArg::RuleBased)]
        explainer: ExplainerArg,

        /// Also print the plan summary used for advice generation
        #[arg(long)]
        advice: bool,
    },

    /// Show BMI, BMR and TDEE for a profile
    Metrics {
        /// Profile file (JSON or TOML)
        profile: PathBuf,
    },

    /// Create a weekly tracking template from a profile's plan
    Template {
        /// Profile file (JSON or TOML)
        profile: PathBuf,

        /// Output JSON file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the food and exercise catalogs
    Catalog {
        /// Which catalog to list
        #[arg(value_enum, default_value_t = CatalogKind::Foods)]
        kind: CatalogKind,

        /// Only foods compatible with these dietary restrictions
        #[arg(short, long)]
        restriction: Vec<String>,

        /// Only low-impact exercises
        #[arg(long)]
        low_impact: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExplainerArg {
    RuleBased,
    Sensitivity,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CatalogKind {
    Foods,
    Exercises,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let config = if cli.config.is_some() || config_path.exists() {
        AppConfig::load_from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    // Set up logging based on verbosity
    let mut log_config = config.logging.clone();
    log_config.level = match cli.verbose {
        0 => log_config.level,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    if let Some(format) = &cli.log_format {
        log_config.format = format.parse::<LogFormat>().map_err(anyhow::Error::msg)?;
    }
    healthxai::logging::init_logging(&log_config)?;

    if cli.verbose > 0 {
        eprintln!("{}", format!("Log level: {}", log_config.level.to_filter()).dimmed());
    }

    match cli.command {
        Commands::Recommend {
            profiles,
            format,
            output,
            explainer,
            advice,
        } => {
            let reference = config.load_reference_data()?;
            let strategy = match explainer {
                ExplainerArg::RuleBased => ExplainerStrategy::RuleBased,
                ExplainerArg::Sensitivity => ExplainerStrategy::sensitivity(Arc::clone(&reference)),
            };
            let engine = RecommendationEngine::new(reference).with_strategy(strategy);
            let format = resolve_format(format.as_deref(), output.as_deref(), profiles.len() > 1)?;

            if let [path] = profiles.as_slice() {
                recommend_one(&engine, path, format, output.as_deref(), advice)?;
            } else {
                recommend_many(&engine, &profiles, format, output.as_deref())?;
            }
        }

        Commands::Metrics { profile } => {
            let reference = config.load_reference_data()?;
            let profile = load_profile(&profile)?;
            let metrics =
                MetricsCalculator::new(&reference.config().activity_multipliers).calculate(&profile)?;

            println!("{}", "Body metrics".blue().bold());
            println!("  BMI:  {:.1} ({})", metrics.bmi, metrics.bmi_category);
            println!("  BMR:  {:.0} kcal/day", metrics.bmr);
            println!(
                "  TDEE: {:.0} kcal/day ({} activity)",
                metrics.tdee, profile.activity_level
            );
        }

        Commands::Template { profile, output } => {
            let engine = RecommendationEngine::new(config.load_reference_data()?);
            let profile = load_profile(&profile)?;
            let bundle = engine.recommend(&profile)?;
            let template = TrackingTemplate::from_bundle(&bundle);

            match output {
                Some(path) => {
                    export_json(&template, &path)?;
                    println!(
                        "{}",
                        format!("✓ Tracking template written to {}", path.display()).green()
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&template)?),
            }
        }

        Commands::Catalog {
            kind,
            restriction,
            low_impact,
        } => {
            let reference = config.load_reference_data()?;
            match kind {
                CatalogKind::Foods => print_foods(&reference, &restriction),
                CatalogKind::Exercises => print_exercises(&reference, low_impact),
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                if config_path.exists() && !force {
                    bail!(
                        "Config file already exists: {} (use --force to overwrite)",
                        config_path.display()
                    );
                }
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&config_path)?;
                println!(
                    "{}",
                    format!("✓ Configuration written to {}", config_path.display()).green()
                );
            }
            ConfigAction::Show => {
                config.engine.validate()?;
                println!(
                    "{}",
                    toml::to_string_pretty(&config).context("Failed to render configuration")?
                );
            }
            ConfigAction::Path => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

fn resolve_format(format: Option<&str>, output: Option<&Path>, batch: bool) -> Result<ExportFormat> {
    match (format, output) {
        (Some(format), _) => Ok(format.parse()?),
        (None, Some(path)) if !batch => Ok(ExportFormat::from_path(path)?),
        _ => Ok(ExportFormat::Text),
    }
}

fn recommend_one(
    engine: &RecommendationEngine,
    path: &Path,
    format: ExportFormat,
    output: Option<&Path>,
    advice: bool,
) -> Result<()> {
    let profile = load_profile(path)?;
    let bundle = engine.recommend(&profile)?;

    match output {
        Some(output) => {
            export::export_bundle(&bundle, format, output)?;
            println!(
                "{}",
                format!("✓ Recommendation written to {}", output.display()).green()
            );
        }
        None => println!("{}", render_bundle(&bundle, format)?),
    }

    report_degradations(&bundle);

    if advice {
        println!("\n{}", advice_context(&profile, &bundle).to_prompt());
    }
    Ok(())
}

fn recommend_many(
    engine: &RecommendationEngine,
    paths: &[PathBuf],
    format: ExportFormat,
    output_dir: Option<&Path>,
) -> Result<()> {
    let profiles = paths
        .iter()
        .map(load_profile)
        .collect::<Result<Vec<HealthProfile>>>()?;

    println!(
        "{}",
        format!("Generating recommendations for {} profiles...", profiles.len())
            .green()
            .bold()
    );

    let started = Instant::now();
    let results = engine.recommend_batch(&profiles);
    let summary = BatchSummary::from_results(&results, started);

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    for (path, result) in paths.iter().zip(&results) {
        let bundle = match result {
            Ok(bundle) => bundle,
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), path.display(), e);
                continue;
            }
        };

        match output_dir {
            Some(dir) => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("profile");
                let target = dir.join(format!("{}.{}", stem, format.extension()));
                export::export_bundle(bundle, format, &target)?;
                println!("  {} {}", "✓".green(), target.display());
            }
            None => {
                println!("{}", format!("== {} ==", path.display()).cyan().bold());
                println!("{}", render_bundle(bundle, format)?);
            }
        }
        report_degradations(bundle);
    }

    println!("\n{}", summary.to_string_pretty());
    if !summary.is_fully_successful() {
        bail!("{} of {} profiles failed", summary.failed, summary.total_profiles);
    }
    Ok(())
}

fn report_degradations(bundle: &RecommendationBundle) {
    for degradation in &bundle.explanation.degradations {
        eprintln!("{} {:?}", "⚠ Partial result:".yellow(), degradation);
    }
}

fn print_foods(reference: &ReferenceData, restrictions: &[String]) {
    let restrictions: BTreeSet<String> = restrictions.iter().cloned().collect();
    let foods = reference.foods().allowed(&restrictions);

    println!("{}", format!("{} foods", foods.len()).magenta().bold());
    for food in foods {
        let slots: Vec<String> = food.slots.iter().map(|s| s.to_string()).collect();
        println!(
            "  {:<28} {:>5.0} g  {:>5.0} kcal  P{:>4.1} C{:>5.1} F{:>4.1}  [{}]",
            food.name,
            food.serving_g,
            food.calories(),
            food.protein_g,
            food.carbs_g,
            food.fats_g,
            slots.join(", ")
        );
    }
}

fn print_exercises(reference: &ReferenceData, low_impact: bool) {
    for category in ExerciseCategory::ALL {
        let pool = reference.exercises().pool(category, low_impact);
        println!("{}", format!("{} ({})", category, pool.len()).magenta().bold());
        for exercise in pool {
            let impact = if exercise.high_impact { "high impact" } else { "" };
            println!("  {:<24} MET {:>4.1}  {}", exercise.name, exercise.met, impact.dimmed());
        }
    }
}

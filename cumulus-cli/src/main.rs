use clap::{Parser, Subcommand};
use colored::Colorize;

use cumulus_core::provider::Provider;
use cumulus_core::resource::{ResourceId, Value};
use cumulus_harness::settings::DEFAULT_PREFIX;
use cumulus_harness::sweep::{ResourceSweeper, SweepRegistry, SweepReport};
use cumulus_provider_aws::{AwsSettings, CloudControlProvider};

#[derive(Parser)]
#[command(name = "cumulus")]
#[command(about = "Cloud resource sweeping and inspection for acceptance tests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Garbage-collect leftover test resources matching the naming prefix
    Sweep {
        /// Naming-convention prefix to match
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,

        /// AWS region (defaults to the environment)
        #[arg(long)]
        region: Option<String>,

        /// List what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,

        /// Restrict the sweep to one resource type
        #[arg(long = "type")]
        resource_type: Option<String>,
    },
    /// Read one resource and print its observed attributes
    Check {
        /// Resource type (e.g., s3_bucket)
        resource_type: String,

        /// Remote identifier (e.g., a bucket name or vpc-xxx)
        identifier: String,

        /// AWS region (defaults to the environment)
        #[arg(long)]
        region: Option<String>,
    },
    /// List resource types known to the provider
    Types,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sweep {
            prefix,
            region,
            dry_run,
            resource_type,
        } => run_sweep(&prefix, region.as_deref(), dry_run, resource_type.as_deref()).await,
        Commands::Check {
            resource_type,
            identifier,
            region,
        } => run_check(&resource_type, &identifier, region.as_deref()).await,
        Commands::Types => run_types().await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn get_provider(region: Option<&str>) -> CloudControlProvider {
    let mut settings = AwsSettings::from_env();
    if let Some(region) = region {
        settings.region = region.to_string();
    }
    CloudControlProvider::new(&settings).await
}

/// One sweeper per registered resource type, named after the type
fn default_registry(provider: &CloudControlProvider) -> Result<SweepRegistry, String> {
    let mut registry = SweepRegistry::new();
    for mapping in provider.registry().mappings() {
        registry
            .register(ResourceSweeper::new(&mapping.name, &mapping.name))
            .map_err(|e| e.to_string())?;
    }
    Ok(registry)
}

async fn run_sweep(
    prefix: &str,
    region: Option<&str>,
    dry_run: bool,
    resource_type: Option<&str>,
) -> Result<(), String> {
    let provider = get_provider(region).await;

    if let Some(resource_type) = resource_type
        && !provider.registry().contains(resource_type)
    {
        return Err(format!("Unknown resource type: {}", resource_type));
    }

    let registry = default_registry(&provider)?;
    let report = registry
        .run_filtered(&provider, prefix, dry_run, resource_type)
        .await
        .map_err(|e| e.to_string())?;

    print_report(&report);

    if report.is_success() {
        Ok(())
    } else {
        Err(format!("{} resource(s) failed to sweep", report.failure_count()))
    }
}

fn print_report(report: &SweepReport) {
    let verb = if report.dry_run { "Would sweep" } else { "Swept" };

    for outcome in &report.outcomes {
        if outcome.swept.is_empty() && outcome.failures.is_empty() {
            continue;
        }

        println!("{}", outcome.resource_type.bold());
        for identifier in &outcome.swept {
            println!("  {} {}", "-".green(), identifier);
        }
        for failure in &outcome.failures {
            println!("  {} {}: {}", "!".red(), failure.identifier, failure.message);
        }
    }

    println!(
        "\n{} {} resource(s), {} skipped, {} failed",
        verb,
        report.swept_count(),
        report.outcomes.iter().map(|o| o.skipped).sum::<usize>(),
        report.failure_count()
    );
}

async fn run_check(
    resource_type: &str,
    identifier: &str,
    region: Option<&str>,
) -> Result<(), String> {
    let provider = get_provider(region).await;
    let id = ResourceId::new(resource_type, identifier);

    let state = provider
        .read(&id, Some(identifier))
        .await
        .map_err(|e| e.to_string())?;

    if !state.exists {
        return Err(format!("{} {} does not exist", resource_type, identifier));
    }

    println!(
        "{} {} {}",
        "Found".green().bold(),
        resource_type,
        identifier
    );

    let mut keys: Vec<&String> = state.attributes.keys().collect();
    keys.sort();
    for key in keys {
        if let Some(value) = state.attributes.get(key) {
            println!("  {} = {}", key.cyan(), format_value(value));
        }
    }

    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .iter()
                .filter_map(|k| map.get(*k).map(|v| format!("{} = {}", k, format_value(v))))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

async fn run_types() -> Result<(), String> {
    let provider = get_provider(None).await;

    for mapping in provider.registry().mappings() {
        println!("{}  {}", mapping.name.bold(), mapping.cloud_type.dimmed());
    }

    Ok(())
}

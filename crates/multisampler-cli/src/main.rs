//! multisampler - build multisample instruments from a folder of samples
//!
//! Sample files are named after their note (`Piano C3.wav`, `Piano C3-64.wav`)
//! and packed into a `.multisample` archive with key and velocity zones.

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use multisampler_core::notes::key_name;
use multisampler_core::{
    build_package, plan, scan_directory, BuildConfig, BuildPlan, DuplicateReport, FsPackageIo,
    ValueMode,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisampler")]
#[command(author, version, about = "Build multisample instruments from a folder of samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a .multisample package from a sample directory
    Build(BuildArgs),
    /// List how the files of a sample directory are recognised
    Scan(ScanArgs),
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
}

#[derive(Args)]
struct BuildArgs {
    /// Directory containing the samples
    dir: PathBuf,

    /// Instrument name (default: the directory name)
    #[arg(short, long)]
    name: Option<String>,

    /// Instrument author
    #[arg(short, long)]
    author: Option<String>,

    /// Crossfade width between key ranges (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    key_fade: Option<u8>,

    /// Meaning of the number after the note: velocity or selection
    #[arg(short, long)]
    mode: Option<ValueMode>,

    /// Crossfade width between velocity or selection bands (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    secondary_fade: Option<u8>,

    /// Spread samples sharing a key over the selection axis with this fade
    #[arg(long, value_name = "FADE", value_parser = clap::value_parser!(u8).range(0..=127))]
    redistribute: Option<u8>,

    /// Store samples without compression
    #[arg(long)]
    no_compress: bool,

    /// Directory to write the package to (default: the sample directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file path (default: ~/.config/multisampler/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the zones and descriptor without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl BuildArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, mut config: BuildConfig) -> BuildConfig {
        if let Some(name) = &self.name {
            config.name = Some(name.clone());
        }
        if let Some(author) = &self.author {
            config.author = author.clone();
        }
        if let Some(fade) = self.key_fade {
            config.key_fade = fade;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(fade) = self.secondary_fade {
            config.secondary_fade = fade;
        }
        if let Some(fade) = self.redistribute {
            config.redistribute_fade = Some(fade);
        }
        if self.no_compress {
            config.compress = false;
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
        config
    }
}

#[derive(Args)]
struct ScanArgs {
    /// Directory containing the samples
    dir: PathBuf,

    /// Meaning of the number after the note: velocity or selection
    #[arg(short, long, default_value_t = ValueMode::Velocity)]
    mode: ValueMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build(args),
        Commands::Scan(args) => scan(args),
        Commands::Init => {
            let path = config::create_default_config_file()?;
            println!("Created default config at: {}", path.display());
            Ok(())
        }
        Commands::ConfigPath => {
            let path = config::config_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn build(args: BuildArgs) -> Result<()> {
    let config = args.apply(config::load(args.config.as_deref())?);

    if args.dry_run {
        let plan = plan(&args.dir, &config)
            .with_context(|| format!("Failed to plan {}", args.dir.display()))?;
        print_plan(&plan);
        return Ok(());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let result = build_package(
        &args.dir,
        &config,
        &mut FsPackageIo,
        &mut |done, total, name| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
            pb.set_message(name.to_string());
        },
    );
    pb.finish_and_clear();

    let outcome = result.with_context(|| format!("Failed to build {}", args.dir.display()))?;
    println!(
        "Created {} ({} zones, {} bytes)",
        outcome.archive_path.display(),
        outcome.zone_count,
        outcome.archive_size
    );
    Ok(())
}

fn print_plan(plan: &BuildPlan) {
    println!("Instrument: {}", plan.info.name);
    println!("Package:    {}", plan.archive_path.display());
    println!("Mode:       {}", plan.settings.mode);
    println!();
    println!(
        "{:<32} {:>5} {:>9} {:>9} {:>9}",
        "FILE", "ROOT", "KEYS", "VELOCITY", "SELECT"
    );
    for zone in &plan.zones {
        println!(
            "{:<32} {:>5} {:>9} {:>9} {:>9}",
            zone.source_name,
            key_name(zone.key),
            zone.key_range.to_string(),
            zone.velocity.to_string(),
            zone.select.to_string()
        );
    }
    println!();
    print!("{}", plan.descriptor);
}

fn scan(args: ScanArgs) -> Result<()> {
    let report = scan_directory(&args.dir, args.mode)
        .with_context(|| format!("Failed to scan {}", args.dir.display()))?;

    for desc in &report.descriptors {
        let value = desc
            .secondary
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:>4}{} {} {}",
            desc.full_name, desc.note, desc.octave, args.mode, value
        );
    }

    let warnings: Vec<_> = report.warnings().collect();
    if !warnings.is_empty() {
        println!();
        println!("Rejected:");
        for (name, reason) in warnings {
            println!("  {}: {}", name, reason);
        }
    }

    let duplicates = DuplicateReport::from_descriptors(&report.descriptors)?;
    println!();
    if duplicates.has_duplicates() {
        let keys: Vec<String> = duplicates
            .duplicate_keys()
            .into_iter()
            .map(key_name)
            .collect();
        println!("Keys with several samples: {}", keys.join(", "));
        for (key, tag, count) in duplicates.shared_groups() {
            let group = if tag.is_empty() { "no number" } else { tag };
            println!("  {}: {} samples with {}", key_name(key), count, group);
        }
        println!("Use --redistribute FADE to spread them over the selection axis");
    } else {
        println!("No key has more than one sample");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "multisampler",
            "build",
            "samples",
            "--key-fade",
            "6",
            "--mode",
            "selection",
            "--no-compress",
        ]);
        let Commands::Build(args) = cli.command else {
            panic!("expected build command");
        };

        let file = BuildConfig {
            author: "From File".to_string(),
            key_fade: 2,
            secondary_fade: 9,
            ..Default::default()
        };
        let config = args.apply(file);
        assert_eq!(config.author, "From File");
        assert_eq!(config.key_fade, 6);
        assert_eq!(config.secondary_fade, 9);
        assert_eq!(config.mode, ValueMode::Selection);
        assert!(!config.compress);
        assert_eq!(config.redistribute_fade, None);
    }

    #[test]
    fn test_fade_flags_are_bounded() {
        let result = Cli::try_parse_from(["multisampler", "build", "samples", "--key-fade", "200"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

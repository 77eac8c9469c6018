use std::path::Path;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use platebind::app::{App, CheckResult, GenerateOptions, GenerateResult};
use platebind::config::{ConfigLoader, ConfigOverrides, parse_key_list};
use platebind::error::PlatebindError;
use platebind::input;
use platebind::output::{JsonOutput, OutputMode, write_file_list};

#[derive(Parser)]
#[command(name = "platebind")]
#[command(about = "Bind microscopy plate images to their illumination-correction artifacts")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate one load-data manifest per joined group")]
    Generate(GenerateArgs),
    #[command(about = "Report grouping and join diagnostics without writing manifests")]
    Check(CheckArgs),
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long, help = "JSON index of image records")]
    images: String,

    #[arg(long, help = "JSON index of correction artifacts")]
    corrections: String,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, help = "Comma-separated grouping keys (default batch,plate)")]
    group_by: Option<String>,

    #[arg(long, help = "Comma-separated join keys (default batch,plate)")]
    join_by: Option<String>,

    #[arg(long)]
    out_dir: Option<String>,

    #[arg(long, help = "Keep every n-th distinct site")]
    site_stride: Option<usize>,

    #[arg(long, help = "Write a JSON staging file list to this path")]
    file_list: Option<String>,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct CheckArgs {
    #[arg(long, help = "JSON index of image records")]
    images: String,

    #[arg(long, help = "JSON index of correction artifacts")]
    corrections: String,

    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    group_by: Option<String>,

    #[arg(long)]
    join_by: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<PlatebindError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PlatebindError) -> u8 {
    match error {
        PlatebindError::MissingKey { .. }
        | PlatebindError::MissingJoinKeys { .. }
        | PlatebindError::EmptyImageStream
        | PlatebindError::InvalidMetadataValue { .. }
        | PlatebindError::InputRead(_)
        | PlatebindError::InputParse(_)
        | PlatebindError::ConfigRead(_)
        | PlatebindError::ConfigParse(_)
        | PlatebindError::InvalidKeyList(_)
        | PlatebindError::InvalidStride(_) => 2,
        PlatebindError::ManifestEncode(_) | PlatebindError::ManifestWrite { .. } => 3,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Generate(args) => run_generate(args, output_mode),
        Commands::Check(args) => run_check(args, output_mode),
    }
}

fn run_generate(args: GenerateArgs, output_mode: OutputMode) -> miette::Result<()> {
    let overrides = ConfigOverrides {
        grouping_keys: parse_keys(args.group_by.as_deref())?,
        join_keys: parse_keys(args.join_by.as_deref())?,
        output_dir: args.out_dir,
        site_stride: args.site_stride,
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), overrides).into_diagnostic()?;

    let images = input::load_images(Path::new(&args.images)).into_diagnostic()?;
    let corrections = input::load_corrections(Path::new(&args.corrections)).into_diagnostic()?;

    let app = App::new(config);
    let options = GenerateOptions {
        dry_run: args.dry_run,
    };
    let result = app
        .generate(images, corrections, options, &JsonOutput)
        .into_diagnostic()?;

    if let Some(path) = &args.file_list {
        write_file_list(&result, Path::new(path)).into_diagnostic()?;
    }

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_generate(&result).into_diagnostic()?,
        OutputMode::Interactive => print_generate_summary(&result),
    }

    if result.failures.is_empty() {
        Ok(())
    } else {
        Err(miette::Report::msg(format!(
            "{} group(s) failed; see output for details",
            result.failures.len()
        )))
    }
}

fn run_check(args: CheckArgs, output_mode: OutputMode) -> miette::Result<()> {
    let overrides = ConfigOverrides {
        grouping_keys: parse_keys(args.group_by.as_deref())?,
        join_keys: parse_keys(args.join_by.as_deref())?,
        output_dir: None,
        site_stride: None,
    };
    let config = ConfigLoader::resolve(args.config.as_deref(), overrides).into_diagnostic()?;

    let images = input::load_images(Path::new(&args.images)).into_diagnostic()?;
    let corrections = input::load_corrections(Path::new(&args.corrections)).into_diagnostic()?;

    let app = App::new(config);
    let result = app.check(images, corrections, &JsonOutput).into_diagnostic()?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_check(&result).into_diagnostic()?,
        OutputMode::Interactive => print_check_summary(&result),
    }
    Ok(())
}

fn parse_keys(raw: Option<&str>) -> miette::Result<Option<Vec<String>>> {
    raw.map(parse_key_list).transpose().into_diagnostic()
}

fn print_generate_summary(result: &GenerateResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}platebind summary{reset}");
    println!("{green}manifests: {} -> {}{reset}", result.groups.len(), result.output_dir);
    for group in &result.groups {
        let target = group.manifest_path.as_deref().unwrap_or("(dry run)");
        println!(
            "{green}  {} ({} image(s), {} correction(s)) -> {target}{reset}",
            group.group_id,
            group.images.len(),
            group.corrections.len()
        );
    }
    for dropped in &result.unmatched {
        println!(
            "{yellow}  unmatched: {} (join key {}){reset}",
            dropped.group_id,
            dropped.join_id.as_deref().unwrap_or("<none>")
        );
    }
    for ambiguity in &result.ambiguous {
        println!(
            "{yellow}  ambiguous: {} matched {}{reset}",
            ambiguity.group_id,
            ambiguity.matches.join(", ")
        );
    }
    for failure in &result.failures {
        println!("{red}  failed: {} ({}){reset}", failure.group_id, failure.error);
    }
}

fn print_check_summary(result: &CheckResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}platebind check{reset}");
    println!("{green}image groups: {}{reset}", result.image_groups.len());
    for group in &result.image_groups {
        println!(
            "{green}  {} ({} record(s)) join={} matches=[{}]{reset}",
            group.group_id,
            group.members,
            group.join_id.as_deref().unwrap_or("<none>"),
            group.matches.join(", ")
        );
    }
    println!("{green}correction groups: {}{reset}", result.correction_groups.len());
    for group in &result.correction_groups {
        println!("{green}  {} ({} artifact(s)){reset}", group.group_id, group.members);
    }
    for dropped in &result.unmatched {
        println!("{yellow}  unmatched: {}{reset}", dropped.group_id);
    }
    for ambiguity in &result.ambiguous {
        println!(
            "{yellow}  ambiguous: {} matched {}{reset}",
            ambiguity.group_id,
            ambiguity.matches.join(", ")
        );
    }
}

mod manifest;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shadelink_ast::Printer;
use shadelink_core::ShadelinkConfig;
use shadelink_transform::{transform_pipeline, Pipeline, TransformReport};

use crate::manifest::{load_document, StageManifest};

#[derive(Parser)]
#[command(
    name = "shadelink",
    version,
    about = "Shadelink: make GLSL stage programs acceptable to strict drivers",
    long_about = "Shadelink normalizes each GLSL stage program and reconciles the outputs of every\nstage with the inputs of the next one, patching the producing stage where it can."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch every stage listed in a manifest
    Patch {
        /// Path to the stage manifest (.toml)
        #[arg()]
        manifest: PathBuf,

        /// Configuration file (default: built-in settings)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report every diagnostic instead of the first of each repetitive kind
        #[arg(short, long)]
        verbose: bool,

        /// Write <stage>.glsl files here instead of printing to stdout
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print one syntax tree file as GLSL
    Print {
        /// Path to the .json syntax tree
        #[arg()]
        file: PathBuf,
    },

    /// Write the default configuration
    Config {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // GLSL goes to stdout, so logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Patch {
            manifest,
            config,
            verbose,
            output_dir,
        } => cmd_patch(&manifest, config.as_deref(), verbose, output_dir.as_deref()),
        Commands::Print { file } => cmd_print(&file),
        Commands::Config { output } => cmd_config(output.as_deref()),
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<ShadelinkConfig> {
    let mut config = match path {
        Some(path) => ShadelinkConfig::load_from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => ShadelinkConfig::default(),
    };
    config.verbose_diagnostics |= verbose;
    Ok(config)
}

fn cmd_patch(
    manifest_path: &Path,
    config_path: Option<&Path>,
    verbose: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path, verbose)?;
    let manifest = StageManifest::load(manifest_path)?;
    let mut pipeline = manifest.load_pipeline()?;

    let report = transform_pipeline(&mut pipeline, &config)
        .with_context(|| format!("failed to patch {}", manifest_path.display()))?;
    log_report(&report);

    match output_dir {
        Some(dir) => write_stages(&pipeline, dir),
        None => {
            print!("{}", render_stages(&pipeline));
            Ok(())
        }
    }
}

fn log_report(report: &TransformReport) {
    for (stage, normalized) in &report.normalized {
        if !normalized.is_empty() {
            tracing::info!(
                "{}: removed {} function(s), stripped {} const declaration(s), removed {} empty declaration(s)",
                stage,
                normalized.removed_functions.len(),
                normalized.stripped_declarations,
                normalized.removed_empty_declarations
            );
        }
    }
    if report.reconciled.aborted {
        tracing::warn!("Interface reconciliation stopped early; stage interfaces left as they were");
    }
    for unpatched in &report.reconciled.unpatchable {
        tracing::info!(
            "'{}' between {} and {} was left for the compiler",
            unpatched.name,
            unpatched.producer,
            unpatched.consumer
        );
    }
}

/// All stages as one text, each under a `// <stage>` banner.
fn render_stages(pipeline: &Pipeline) -> String {
    let mut output = String::new();
    for (stage, doc) in pipeline.iter() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&format!("// {}\n", stage));
        output.push_str(&Printer::print(doc));
    }
    output
}

fn write_stages(pipeline: &Pipeline, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    for (stage, doc) in pipeline.iter() {
        let path = dir.join(format!("{}.glsl", stage.name()));
        std::fs::write(&path, Printer::print(doc))
            .with_context(|| format!("failed to write: {}", path.display()))?;
        println!("   Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_print(file: &Path) -> Result<()> {
    let doc = load_document(file)?;
    print!("{}", Printer::print(&doc));
    Ok(())
}

fn cmd_config(output: Option<&Path>) -> Result<()> {
    let config = ShadelinkConfig::default();
    match output {
        Some(path) => {
            config
                .save_to_file(path)
                .with_context(|| format!("failed to write config: {}", path.display()))?;
            println!("   Wrote {}", path.display());
        }
        None => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadelink_ast::syntax::{ExternalDeclaration, TranslationUnit};
    use shadelink_ast::Document;
    use shadelink_core::PatchStage;

    fn program(version: &str) -> Document {
        let unit = TranslationUnit::new()
            .with(ExternalDeclaration::directive(version))
            .with(ExternalDeclaration::function("main", vec![]));
        Document::from_syntax(&unit).unwrap()
    }

    #[test]
    fn test_render_stages_in_pipeline_order() {
        let pipeline = Pipeline::new()
            .with(PatchStage::Fragment, program("#version 150"))
            .with(PatchStage::Vertex, program("#version 120"));
        let text = render_stages(&pipeline);
        assert!(text.starts_with("// vertex\n#version 120\n"));
        assert!(text.contains("}\n\n// fragment\n#version 150\n"));
    }

    #[test]
    fn test_verbose_flag_overrides_config() {
        let config = load_config(None, true).unwrap();
        assert!(config.verbose_diagnostics);
        assert_eq!(config.entry_point, "main");
    }

    #[test]
    fn test_cli_parses_patch_arguments() {
        let cli = Cli::parse_from(["shadelink", "patch", "program.toml", "-v", "--output-dir", "out"]);
        match cli.command {
            Commands::Patch {
                manifest,
                verbose,
                output_dir,
                config,
            } => {
                assert_eq!(manifest, PathBuf::from("program.toml"));
                assert!(verbose);
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert!(config.is_none());
            }
            _ => panic!("expected the patch command"),
        }
    }
}

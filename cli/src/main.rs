//! manualsync CLI - manual spec to DOCX reconciliation tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use manualsync::docx::document::{is_paragraph, is_table, paragraph_text};
use manualsync::{
    apply_template, to_latex, to_markdown, DocxDocument, LatexSource, ManualSpec, ManualSync,
    SyncMode, SyncReport,
};

#[derive(Parser)]
#[command(name = "manualsync")]
#[command(version)]
#[command(about = "Reconcile a manual spec into a styled DOCX document", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize a DOCX document from a spec or a LaTeX source
    Sync {
        /// Target DOCX file
        #[arg(value_name = "DOCX")]
        docx: PathBuf,

        /// Manual spec JSON (token mode)
        #[arg(short, long, value_name = "FILE")]
        spec: Option<PathBuf>,

        /// LaTeX source (legacy heading-anchored mode)
        #[arg(short, long, value_name = "FILE")]
        tex: Option<PathBuf>,

        /// Output file (in place if not specified)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Directory figure images resolve against (defaults to the
        /// spec or tex file's directory)
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,

        /// Report changes without writing the document
        #[arg(long)]
        dry_run: bool,
    },

    /// Render a spec into tokenized LaTeX and Markdown outputs
    Render {
        /// Manual spec JSON
        #[arg(value_name = "FILE")]
        spec: PathBuf,

        /// LaTeX template with __TOKEN__ placeholders
        #[arg(long, value_name = "FILE")]
        tex_template: Option<PathBuf>,

        /// Markdown template with __TOKEN__ placeholders
        #[arg(long, value_name = "FILE")]
        md_template: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "out")]
        output: PathBuf,
    },

    /// Validate a manual spec
    Validate {
        /// Manual spec JSON
        #[arg(value_name = "FILE")]
        spec: PathBuf,
    },

    /// Show document information
    Info {
        /// Target DOCX file
        #[arg(value_name = "DOCX")]
        docx: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            docx,
            spec,
            tex,
            out,
            base_dir,
            dry_run,
        } => cmd_sync(
            &docx,
            spec.as_deref(),
            tex.as_deref(),
            out.as_deref(),
            base_dir,
            dry_run,
        ),
        Commands::Render {
            spec,
            tex_template,
            md_template,
            output,
        } => cmd_render(
            &spec,
            tex_template.as_deref(),
            md_template.as_deref(),
            &output,
        ),
        Commands::Validate { spec } => cmd_validate(&spec),
        Commands::Info { docx } => cmd_info(&docx),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_sync(
    docx: &Path,
    spec: Option<&Path>,
    tex: Option<&Path>,
    out: Option<&Path>,
    base_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = match (spec, tex) {
        (Some(_), Some(_)) => return Err("pass either --spec or --tex, not both".into()),
        (None, None) => return Err("pass --spec (token mode) or --tex (legacy mode)".into()),
        (Some(s), None) => s,
        (None, Some(t)) => t,
    };

    let base = base_dir.unwrap_or_else(|| {
        source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let mut runner = ManualSync::new().with_base_dir(base);
    if let Some(out) = out {
        runner = runner.with_out(out);
    }
    if dry_run {
        runner = runner.dry_run();
    }

    println!("{}: {}", "docx".bold(), docx.display());

    let report = if let Some(spec_path) = spec {
        println!("{}: {}", "spec".bold(), spec_path.display());
        let spec = ManualSpec::from_file(spec_path)?;
        spec.validate()?;
        runner.sync_spec(docx, &spec)?
    } else {
        println!("{}: {}", "tex".bold(), source.display());
        let latex = LatexSource::from_file(source)?;
        runner.sync_latex(docx, &latex)?
    };

    if let Some(out) = out {
        println!("{}: {}", "out".bold(), out.display());
    }
    print_report(&report);

    if dry_run {
        println!("{}", "dry run, document not written".yellow());
    } else {
        println!("{}", "updated docx".green().bold());
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("{}: {}", "changes".bold(), report.changed);
    println!("{}: {}", "skipped_blocks".bold(), report.skipped_blocks);
    println!("{}: {}", "removed_old_blocks".bold(), report.removed_blocks);
    println!("{}: {}", "inserted_blocks".bold(), report.inserted_blocks);
}

fn cmd_render(
    spec_path: &Path,
    tex_template: Option<&Path>,
    md_template: Option<&Path>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = ManualSpec::from_file(spec_path)?;
    spec.validate()?;

    fs::create_dir_all(output)?;

    let tex = match tex_template {
        Some(path) => apply_template(&fs::read_to_string(path)?, &spec),
        None => to_latex(&spec),
    };
    fs::write(output.join("main.tex"), &tex)?;

    let md = match md_template {
        Some(path) => apply_template(&fs::read_to_string(path)?, &spec),
        None => to_markdown(&spec),
    };
    fs::write(output.join("manual.md"), &md)?;

    println!("{}", "Output files:".green().bold());
    println!("  {} main.tex", "├─".dimmed());
    println!("  {} manual.md", "└─".dimmed());

    Ok(())
}

fn cmd_validate(spec_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let spec = ManualSpec::from_file(spec_path)?;
    spec.validate()?;

    let blocks: usize = spec.sections.iter().map(|s| s.blocks.len()).sum();
    println!("{} {}", "Valid:".green().bold(), spec_path.display());
    println!("{}: {}", "App".bold(), spec.meta.app_target);
    println!("{}: {}", "Sections".bold(), spec.sections.len());
    println!("{}: {}", "Blocks".bold(), blocks);

    Ok(())
}

fn cmd_info(docx: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = DocxDocument::open(docx)?;
    let mode = SyncMode::detect(&doc)?;
    let body = doc.body()?;

    let paragraphs = body.elements().filter(|n| is_paragraph(n)).count();
    let tables = body.elements().filter(|n| is_table(n)).count();
    let tokens = body
        .elements()
        .filter(|n| is_paragraph(n))
        .filter(|p| manualsync::sync::contains_token(paragraph_text(p).trim()))
        .count();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), docx.display());
    println!(
        "{}: {}",
        "Mode".bold(),
        match mode {
            SyncMode::Token => "token",
            SyncMode::Legacy => "legacy",
        }
    );
    println!("{}: {}", "Paragraphs".bold(), paragraphs);
    println!("{}: {}", "Tables".bold(), tables);
    println!("{}: {}", "Placeholder tokens".bold(), tokens);

    Ok(())
}

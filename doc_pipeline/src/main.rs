use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use docproc_pipeline::{apply_branding, brand_docx_file, convert_pdf, DocxPackage};

#[derive(Parser)]
#[command(name = "docproc-pipeline", about = "Document branding and conversion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Brand every DOCX/PDF in a directory
    Brand {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(long)]
        template: PathBuf,
    },
    /// Convert a single PDF to DOCX (no branding)
    Convert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// List the parts of a DOCX package
    Inspect {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let Cli { command } = Cli::parse();

    match command {
        Command::Brand {
            input_dir,
            output_dir,
            template,
        } => brand_dir(&input_dir, &output_dir, &template)?,
        Command::Convert { input, output } => {
            let converted = convert_pdf(&input)?;
            converted.write_to(&output)?;
            println!("[convert] {} -> {}", input.display(), output.display());
        }
        Command::Inspect { input } => {
            let package = DocxPackage::open(&input)?;
            for name in package.part_names() {
                println!("{:>8}  {name}", package.part_size(name).unwrap_or(0));
            }
        }
    }

    Ok(())
}

fn brand_dir(input_dir: &Path, output_dir: &Path, template: &Path) -> eyre::Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let mut entries: Vec<PathBuf> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("docx") => {
                let output = output_dir.join(&name);
                match brand_docx_file(template, &path, &output) {
                    Ok(()) => println!("[brand] {name}"),
                    Err(e) => {
                        println!("[brand] {name} failed: {e}");
                        fallback_copy(&path, output_dir)?;
                    }
                }
            }
            Some("pdf") => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output = output_dir.join(format!("{stem}.docx"));
                match convert_and_brand(template, &path, &output) {
                    Ok(()) => println!("[brand] {name} (converted)"),
                    Err(e) => {
                        println!("[brand] {name} failed: {e}");
                        fallback_copy(&path, output_dir)?;
                    }
                }
            }
            _ => println!("[brand] skipping unsupported file: {name}"),
        }
    }

    Ok(())
}

fn convert_and_brand(
    template_path: &Path,
    input: &Path,
    output: &Path,
) -> docproc_pipeline::Result<()> {
    let template = DocxPackage::open(template_path)?;
    let mut converted = convert_pdf(input)?;
    apply_branding(&template, &mut converted)?;
    converted.write_to(output)
}

/// Keep the original available next to the outputs when processing
/// fails.
fn fallback_copy(path: &Path, output_dir: &Path) -> eyre::Result<()> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_fallback.{ext}"),
        None => format!("{stem}_fallback"),
    };
    std::fs::copy(path, output_dir.join(name))?;
    Ok(())
}

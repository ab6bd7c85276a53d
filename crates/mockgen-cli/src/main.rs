use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use mockgen_contracts::MANIFEST_SCHEMA_VERSION;
use mockgen_core::{generate_output, model::load_model_json, GenerateOptions};
use sha2::{Digest, Sha256};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mockgen")]
#[command(about = "Deterministic pegomock mock generator for Go interfaces.", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v: info, -vv: debug, -vvv+: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate mocks for every interface in one model file.
    Generate {
        /// Interface model JSON (`mockgen.model@0.1.0`).
        #[arg(long)]
        model: PathBuf,
        /// Package clause of the generated file.
        #[arg(long)]
        package: String,
        /// Label for the `// Source:` header line. Defaults to the model path.
        #[arg(long)]
        source: Option<String>,
        /// Overrides the `Mock<Interface>` type name.
        #[arg(long)]
        mock_name: Option<String>,
        /// Import path of the output package; its types stay unqualified.
        #[arg(long)]
        self_package: Option<String>,
        /// Output file. Without it the source is written to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// If set, fail if output differs; do not write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Generate multiple mock files from a manifest.
    Batch {
        #[arg(long)]
        manifest: PathBuf,
        /// If set, fail if any output differs; do not write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Print the diagnostic code catalog as Markdown.
    Diagnostics,
}

fn main() -> Result<()> {
    try_main().map_err(|err| {
        eprintln!("{err:#}");
        err
    })
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Generate {
            model,
            package,
            source,
            mock_name,
            self_package,
            out,
            check,
        } => {
            let opts = GenerateOptions {
                source: source.unwrap_or_else(|| model.display().to_string()),
                mock_name,
                package_name: package,
                self_package,
            };
            let src = generate_from_file(&model, &opts)?;
            match out {
                Some(out_path) => write_output(&out_path, &src, check),
                None if check => anyhow::bail!("--check needs --out"),
                None => {
                    print!("{src}");
                    Ok(())
                }
            }
        }
        Command::Batch { manifest, check } => run_batch(&manifest, check),
        Command::Diagnostics => {
            print!("{}", mockgen_core::diagnostics::render_diagnostics_md());
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(verbose))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "mockgen=warn,mockgen_core=warn",
        1 => "mockgen=info,mockgen_core=info",
        2 => "mockgen=debug,mockgen_core=debug",
        _ => "mockgen=trace,mockgen_core=trace",
    }
}

fn generate_from_file(model_path: &Path, opts: &GenerateOptions) -> Result<String> {
    let bytes = std::fs::read(model_path)
        .with_context(|| format!("read model: {}", model_path.display()))?;
    let pkg = load_model_json(&bytes)
        .with_context(|| format!("load model: {}", model_path.display()))?;
    let src = generate_output(&pkg, opts)
        .with_context(|| format!("generate mocks for: {}", model_path.display()))?;
    info!(
        model = %model_path.display(),
        interfaces = pkg.interfaces.len(),
        sha256 = %sha256_hex(&src),
        "generated mock source"
    );
    Ok(src)
}

fn sha256_hex(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    schema_version: String,
    entries: Vec<ManifestEntry>,
}

#[derive(Debug, serde::Deserialize)]
struct ManifestEntry {
    model: String,
    out: String,
    package: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    mock_name: Option<String>,
    #[serde(default)]
    self_package: Option<String>,
}

fn run_batch(manifest_path: &Path, check: bool) -> Result<()> {
    let bytes = std::fs::read(manifest_path)
        .with_context(|| format!("read manifest: {}", manifest_path.display()))?;
    let m: Manifest = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse manifest JSON: {}", manifest_path.display()))?;
    if m.schema_version.trim() != MANIFEST_SCHEMA_VERSION {
        anyhow::bail!(
            "manifest schema_version mismatch: expected {MANIFEST_SCHEMA_VERSION} got {:?}",
            m.schema_version
        );
    }

    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    for (idx, e) in m.entries.iter().enumerate() {
        let model_path = base.join(&e.model);
        let out_path = base.join(&e.out);
        let opts = GenerateOptions {
            source: e.source.clone().unwrap_or_else(|| e.model.clone()),
            mock_name: e.mock_name.clone(),
            package_name: e.package.clone(),
            self_package: e.self_package.clone(),
        };
        generate_from_file(&model_path, &opts)
            .and_then(|src| write_output(&out_path, &src, check))
            .with_context(|| format!("manifest entry[{idx}] {}", e.model))?;
    }
    Ok(())
}

fn write_output(out_path: &Path, src: &str, check: bool) -> Result<()> {
    if check {
        let cur = std::fs::read_to_string(out_path)
            .with_context(|| format!("read existing output: {}", out_path.display()))?;
        if cur != src {
            anyhow::bail!("generated output differs: {}", out_path.display());
        }
        return Ok(());
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }
    std::fs::write(out_path, src.as_bytes())
        .with_context(|| format!("write output: {}", out_path.display()))?;
    Ok(())
}

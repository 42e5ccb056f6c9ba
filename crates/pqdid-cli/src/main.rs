//! pqdid CLI: the `pqdid` command.
//!
//! Creates, rotates and verifies DID documents, and exposes the canonical
//! encoders and the Multikey decoder for inspection.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use pqdid::method::DID_PREFIX;
use pqdid::{
    canonicalize, decode_key, encode_core, verify_document_with, CoreValue, DocumentBuilder,
    IdentityDocument, Service, SoftwareKeys, VerifyOptions,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// pqdid CLI: content-addressed DID documents anchored by ML-DSA-65 and ES256.
#[derive(Parser, Debug)]
#[command(
    name = "pqdid",
    about = "pqdid CLI",
    version,
    long_about = "pqdid: create, rotate and verify DID documents.\n\nEach document version is anchored by a post-quantum attestation over its\ncanonical core and a classical proof over the core's CID."
)]
struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a sequence-1 document with fresh software keys
    Create {
        /// Method-specific suffix (default: derived from the root key)
        #[arg(long)]
        suffix: Option<String>,

        /// Service as `id,type,endpoint` (repeatable)
        #[arg(long = "service")]
        services: Vec<String>,

        /// alsoKnownAs entry (repeatable)
        #[arg(long = "alias")]
        aliases: Vec<String>,

        /// Write the pretty JSON document here (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the canonical JSON bytes here
        #[arg(long)]
        canonical_out: Option<PathBuf>,
    },

    /// Create the next version of a document with fresh software keys
    Rotate {
        /// The current document (JSON)
        #[arg(long)]
        previous: PathBuf,

        /// Write the pretty JSON document here (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the canonical JSON bytes here
        #[arg(long)]
        canonical_out: Option<PathBuf>,
    },

    /// Verify a document against its stored canonical bytes
    Verify {
        /// The document (JSON)
        #[arg(long)]
        document: PathBuf,

        /// The stored canonical bytes
        #[arg(long)]
        canonical: PathBuf,

        /// Accept extra @context entries after the required ones
        #[arg(long)]
        allow_extra_contexts: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical JSON form of a JSON file
    Canonicalize {
        /// Input JSON file
        file: PathBuf,
    },

    /// Print the CID of a JSON value's canonical binary encoding
    Cid {
        /// Input JSON file (no null, no fractional numbers)
        file: PathBuf,
    },

    /// Decode a Multikey and describe it
    InspectKey {
        /// Multibase-encoded Multikey
        multikey: String,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Create {
            suffix,
            services,
            aliases,
            out,
            canonical_out,
        } => cmd_create(
            suffix.as_deref(),
            &services,
            &aliases,
            out.as_deref(),
            canonical_out.as_deref(),
            verbose,
        ),
        Commands::Rotate {
            previous,
            out,
            canonical_out,
        } => cmd_rotate(&previous, out.as_deref(), canonical_out.as_deref(), verbose),
        Commands::Verify {
            document,
            canonical,
            allow_extra_contexts,
            json,
        } => cmd_verify(&document, &canonical, allow_extra_contexts, json),
        Commands::Canonicalize { file } => cmd_canonicalize(&file),
        Commands::Cid { file } => cmd_cid(&file, verbose),
        Commands::InspectKey { multikey } => cmd_inspect_key(&multikey),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── File helpers ──────────────────────────────────────────────────────────────

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_document(path: &Path) -> Result<IdentityDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    IdentityDocument::from_json(&text)
        .with_context(|| format!("{} is not an identity document", path.display()))
}

/// Write the pretty document to `out` (or stdout) and its canonical bytes to
/// `canonical_out` when given.
fn emit_document(
    doc: &IdentityDocument,
    out: Option<&Path>,
    canonical_out: Option<&Path>,
) -> Result<()> {
    let pretty = doc
        .to_json_pretty()
        .context("failed to serialize document")?;
    match out {
        Some(path) => std::fs::write(path, &pretty)
            .with_context(|| format!("failed to write to {}", path.display()))?,
        None => println!("{pretty}"),
    }

    if let Some(path) = canonical_out {
        let canonical = doc
            .canonical_bytes()
            .context("failed to canonicalize document")?;
        std::fs::write(path, canonical)
            .with_context(|| format!("failed to write to {}", path.display()))?;
    }
    Ok(())
}

fn parse_service(spec: &str) -> Result<Service> {
    let mut parts = spec.splitn(3, ',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(service_type), Some(endpoint)) if !id.is_empty() => {
            Ok(Service::new(id, service_type, endpoint))
        }
        _ => Err(anyhow!(
            "service '{spec}' must have the form id,type,endpoint"
        )),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `pqdid create [--suffix S] [--service id,type,endpoint]... [--alias A]...`
fn cmd_create(
    suffix: Option<&str>,
    services: &[String],
    aliases: &[String],
    out: Option<&Path>,
    canonical_out: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let keys = SoftwareKeys::generate().context("failed to generate keys")?;
    let identifier = match suffix {
        Some(s) => format!("{DID_PREFIX}{s}"),
        None => keys.did(),
    };

    let mut builder = DocumentBuilder::new(&identifier);
    for spec in services {
        builder = builder.service(parse_service(spec)?);
    }
    for alias in aliases {
        builder = builder.alias(alias.as_str());
    }
    let doc = builder
        .sign(&keys.to_key_material())
        .context("failed to create document")?;

    emit_document(&doc, out, canonical_out)?;

    if out.is_some() {
        println!("Created {identifier}");
        println!("  Sequence:    {}", doc.sequence);
        println!("  CurrentCore: {}", doc.current_core);
    }
    if verbose {
        eprintln!("software keys are ephemeral and were not stored");
    }
    Ok(())
}

/// `pqdid rotate --previous FILE`
fn cmd_rotate(
    previous_path: &Path,
    out: Option<&Path>,
    canonical_out: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let previous = read_document(previous_path)?;
    let keys = SoftwareKeys::generate().context("failed to generate keys")?;

    let mut builder = DocumentBuilder::new(&previous.id).succeeding(&previous);
    for service in &previous.service {
        builder = builder.service(service.clone());
    }
    for alias in &previous.also_known_as {
        builder = builder.alias(alias.as_str());
    }
    let doc = builder
        .sign(&keys.to_key_material())
        .context("failed to create rotated document")?;

    emit_document(&doc, out, canonical_out)?;

    if out.is_some() {
        println!("Rotated {}", doc.id);
        println!("  Sequence:    {} -> {}", previous.sequence, doc.sequence);
        println!("  Prev:        {}", previous.current_core);
        println!("  CurrentCore: {}", doc.current_core);
    }
    if verbose {
        eprintln!("keyHistory now holds {} entries", doc.key_history.len());
    }
    Ok(())
}

/// `pqdid verify --document FILE --canonical FILE [--allow-extra-contexts] [--json]`
fn cmd_verify(
    document: &Path,
    canonical: &Path,
    allow_extra_contexts: bool,
    as_json: bool,
) -> Result<()> {
    let doc = read_document(document)?;
    let stored = std::fs::read(canonical)
        .with_context(|| format!("failed to read {}", canonical.display()))?;

    let options = if allow_extra_contexts {
        VerifyOptions::default().allow_extra_contexts()
    } else {
        VerifyOptions::default()
    };
    let result = verify_document_with(&doc, &stored, &options);

    if as_json {
        let errors: Vec<Value> = result
            .errors
            .iter()
            .map(|e| json!({"kind": e.kind(), "message": e.to_string()}))
            .collect();
        let report = json!({
            "id": doc.id,
            "sequence": doc.sequence,
            "structureValid": result.structure_valid,
            "canonicalValid": result.canonical_valid,
            "attestationValid": result.attestation_valid,
            "proofValid": result.proof_valid,
            "isValid": result.is_valid,
            "errors": errors,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        let mark = |ok: bool| if ok { "ok" } else { "FAILED" };
        println!("Document {} (sequence {})", doc.id, doc.sequence);
        println!("  Structure:   {}", mark(result.structure_valid));
        println!("  Canonical:   {}", mark(result.canonical_valid));
        println!("  Attestation: {}", mark(result.attestation_valid));
        println!("  Proof:       {}", mark(result.proof_valid));
        for e in &result.errors {
            println!("  - [{}] {e}", e.kind());
        }
    }

    if !result.is_valid {
        return Err(anyhow!(
            "document is invalid ({} errors)",
            result.errors.len()
        ));
    }
    Ok(())
}

/// `pqdid canonicalize FILE`
fn cmd_canonicalize(file: &Path) -> Result<()> {
    let value = read_json(file)?;
    let bytes = canonicalize(&value).context("failed to canonicalize")?;
    let text = String::from_utf8(bytes).context("canonical form is not UTF-8")?;
    println!("{text}");
    Ok(())
}

/// `pqdid cid FILE`
fn cmd_cid(file: &Path, verbose: bool) -> Result<()> {
    let value = read_json(file)?;
    let core = CoreValue::try_from(&value).context("value has no canonical binary form")?;
    let (bytes, cid) = encode_core(&core).context("failed to encode")?;
    println!("{cid}");
    if verbose {
        eprintln!("{} bytes: {}", bytes.len(), hex::encode(&bytes));
    }
    Ok(())
}

/// `pqdid inspect-key MULTIKEY`
fn cmd_inspect_key(multikey: &str) -> Result<()> {
    let (codec, raw) = decode_key(multikey).context("not a valid Multikey")?;
    println!("Codec:        0x{:x}", codec.code());
    println!("Algorithm:    {}", codec.algorithm());
    println!("Key length:   {} bytes", raw.len());
    println!("Post-quantum: {}", codec.is_post_quantum());
    Ok(())
}

mod output;

use anyhow::{Context as _, Result};
use cairn_core::{Algorithm, Context, ObjectType, Path, PathResolver, Store};
use clap::{Parser, Subcommand};
use output::{
    AddOutput, AddedObject, EntryInfo, InitOutput, LsOutput, NameInfo, NameListOutput, NameOutput,
    NameRmOutput, OutputWriter, ResolveOutput,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Cairn - resolve named and content-addressed paths
#[derive(Parser)]
#[command(name = "cairn")]
#[command(about = "Resolve /named/ and /content/ paths over a BLAKE3 object store", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to CAIRN_ROOT env var or ./cairn-store)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new store
    Init {
        /// Hash algorithm to use
        #[arg(long, default_value = "blake3")]
        algo: String,
    },

    /// Add files or directories to the store
    Add {
        /// Paths to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Point this name at the added content
        #[arg(long)]
        name: Option<String>,
    },

    /// Resolve a path to the object it denotes
    Resolve {
        /// Path such as /named/<name>/a/b or /content/<hash>/a/b
        path: String,

        #[command(flatten)]
        timeout: TimeoutArgs,
    },

    /// Resolve a path and write the blob to stdout
    Cat {
        path: String,

        #[command(flatten)]
        timeout: TimeoutArgs,
    },

    /// Resolve a path and list the tree it denotes
    Ls {
        path: String,

        /// Show type, mode and hash of each entry
        #[arg(short, long)]
        long: bool,

        #[command(flatten)]
        timeout: TimeoutArgs,
    },

    /// Manage names
    #[command(subcommand)]
    Name(NameCommands),
}

#[derive(Subcommand)]
enum NameCommands {
    /// Point a name at a path (or bare hash)
    Set { name: String, target: String },

    /// Show a name's current target
    Get { name: String },

    /// List all names
    List,

    /// Remove a name
    Rm { name: String },
}

#[derive(clap::Args)]
struct TimeoutArgs {
    /// Give up after this many milliseconds
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,
}

impl TimeoutArgs {
    fn context(&self) -> Context {
        match self.timeout_ms {
            Some(ms) => Context::background().with_timeout(Duration::from_millis(ms)),
            None => Context::background(),
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    // Store root: CLI arg > CAIRN_ROOT env var > ./cairn-store
    let root = cli
        .root
        .or_else(|| std::env::var("CAIRN_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./cairn-store"));

    let result = match cli.command {
        Commands::Init { algo } => cmd_init(&output, &root, &algo),
        Commands::Add { paths, name } => cmd_add(&output, &root, paths, name),
        Commands::Resolve { path, timeout } => cmd_resolve(&output, &root, &path, &timeout),
        Commands::Cat { path, timeout } => cmd_cat(&root, &path, &timeout),
        Commands::Ls {
            path,
            long,
            timeout,
        } => cmd_ls(&output, &root, &path, long, &timeout),
        Commands::Name(name_cmd) => match name_cmd {
            NameCommands::Set { name, target } => cmd_name_set(&output, &root, &name, &target),
            NameCommands::Get { name } => cmd_name_get(&output, &root, &name),
            NameCommands::List => cmd_name_list(&output, &root),
            NameCommands::Rm { name } => cmd_name_rm(&output, &root, &name),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = result_code(&err);
            output.write_error(&err, code);
            ExitCode::from(code)
        }
    }
}

/// Log to stderr, filtered by RUST_LOG (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Map the underlying core error to a process exit code.
///
/// 2: usage (no naming service, malformed path, bad ref name), 3: not found,
/// 4: cancelled or timed out, 1: anything else.
fn result_code(err: &anyhow::Error) -> u8 {
    use cairn_core::Error;

    let Some(core) = err.chain().find_map(|e| e.downcast_ref::<Error>()) else {
        return 1;
    };

    if core.is_cancellation() {
        4
    } else if core.is_not_found() {
        3
    } else {
        match core {
            Error::NoNamingService | Error::MalformedPath { .. } | Error::InvalidRef { .. } => 2,
            Error::NameResolution { .. } => 3,
            _ => 1,
        }
    }
}

fn open_store(root: &std::path::Path) -> Result<Store> {
    Store::open(root).with_context(|| format!("Failed to open store at {}", root.display()))
}

fn parse_path(raw: &str) -> Result<Path> {
    Path::parse(raw).with_context(|| format!("Invalid path: {}", raw))
}

/// Run the full resolution pipeline against the store.
fn resolve_in(store: &Store, raw: &str, timeout: &TimeoutArgs) -> Result<cairn_core::Node> {
    let path = parse_path(raw)?;
    let refs = store.refs();
    let resolver = PathResolver::new(store).with_name_system(&refs);
    resolver
        .resolve(&timeout.context(), path)
        .with_context(|| format!("Failed to resolve {}", raw))
}

fn cmd_init(output: &OutputWriter, root: &std::path::Path, algo: &str) -> Result<()> {
    let algorithm = Algorithm::parse(algo)?;

    Store::init(root, algorithm)
        .with_context(|| format!("Failed to initialize store at {}", root.display()))?;

    let data = InitOutput {
        success: true,
        result_code: 0,
        root: root.display().to_string(),
        algorithm: algorithm.as_str().to_string(),
    };
    output.write(&data, || {
        format!(
            "Initialized cairn store at {}\nAlgorithm: {}\n",
            data.root, data.algorithm
        )
    })
}

fn cmd_add(
    output: &OutputWriter,
    root: &std::path::Path,
    paths: Vec<PathBuf>,
    name: Option<String>,
) -> Result<()> {
    let store = open_store(root)?;

    let mut objects = Vec::new();
    for path in paths {
        let hash = store
            .add_path(&path)
            .with_context(|| format!("Failed to add path: {}", path.display()))?;
        objects.push(AddedObject {
            hash,
            path: path.display().to_string(),
            content_path: Path::content(&hash, Vec::<String>::new()),
        });
    }

    // The name points at the last added path
    let name = match (name, objects.last()) {
        (Some(name), Some(last)) => {
            store
                .refs()
                .set(&name, &last.content_path)
                .with_context(|| format!("Failed to set name: {}", name))?;
            Some(NameInfo {
                name,
                target: last.content_path.clone(),
            })
        }
        _ => None,
    };

    let data = AddOutput {
        success: true,
        result_code: 0,
        objects,
        name,
    };
    output.write(&data, || {
        let mut text = String::new();
        for obj in &data.objects {
            text.push_str(&format!("{} {}\n", obj.hash, obj.path));
        }
        if let Some(name) = &data.name {
            text.push_str(&format!("/named/{} -> {}\n", name.name, name.target));
        }
        text
    })
}

fn cmd_resolve(
    output: &OutputWriter,
    root: &std::path::Path,
    raw: &str,
    timeout: &TimeoutArgs,
) -> Result<()> {
    let store = open_store(root)?;
    let node = resolve_in(&store, raw, timeout)?;

    let data = ResolveOutput {
        success: true,
        result_code: 0,
        input: parse_path(raw)?,
        node,
    };
    output.write(&data, || {
        format!(
            "{}\n{} {} ({} bytes)\n",
            data.node.path,
            data.node.kind.as_str(),
            data.node.hash,
            data.node.size
        )
    })
}

fn cmd_cat(root: &std::path::Path, raw: &str, timeout: &TimeoutArgs) -> Result<()> {
    let store = open_store(root)?;
    let node = resolve_in(&store, raw, timeout)?;

    if node.kind != ObjectType::Blob {
        anyhow::bail!("{} is a {}, not a blob", raw, node.kind.as_str());
    }

    let payload = store
        .get_blob(&node.hash)
        .with_context(|| format!("Failed to read blob {}", node.hash))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&payload)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_ls(
    output: &OutputWriter,
    root: &std::path::Path,
    raw: &str,
    long: bool,
    timeout: &TimeoutArgs,
) -> Result<()> {
    let store = open_store(root)?;
    let node = resolve_in(&store, raw, timeout)?;

    let entries: Vec<EntryInfo> = match node.kind {
        ObjectType::Tree => store
            .get_tree(&node.hash)
            .with_context(|| format!("Failed to read tree {}", node.hash))?
            .into_iter()
            .map(EntryInfo::from)
            .collect(),
        ObjectType::Blob => Vec::new(),
    };

    let data = LsOutput {
        success: true,
        result_code: 0,
        node,
        entries,
    };
    output.write(&data, || {
        if data.node.kind == ObjectType::Blob {
            return if long {
                format!("blob {} bytes\n", data.node.size)
            } else {
                "blob\n".to_string()
            };
        }

        let mut text = String::new();
        for entry in &data.entries {
            if long {
                let type_char = match entry.kind {
                    ObjectType::Blob => 'b',
                    ObjectType::Tree => 't',
                };
                text.push_str(&format!(
                    "{} {} {} {}\n",
                    type_char, entry.mode, entry.hash, entry.name
                ));
            } else {
                text.push_str(&format!("{}\n", entry.name));
            }
        }
        text
    })
}

fn cmd_name_set(
    output: &OutputWriter,
    root: &std::path::Path,
    name: &str,
    target: &str,
) -> Result<()> {
    let store = open_store(root)?;
    let target = parse_path(target)?;

    store
        .refs()
        .set(name, &target)
        .with_context(|| format!("Failed to set name: {}", name))?;

    let data = NameOutput {
        success: true,
        result_code: 0,
        name: NameInfo {
            name: name.to_string(),
            target,
        },
    };
    output.write(&data, || {
        format!("/named/{} -> {}\n", data.name.name, data.name.target)
    })
}

fn cmd_name_get(output: &OutputWriter, root: &std::path::Path, name: &str) -> Result<()> {
    let store = open_store(root)?;

    let target = store
        .refs()
        .get(name)
        .with_context(|| format!("Failed to read name: {}", name))?
        .ok_or_else(|| cairn_core::Error::ref_not_found(name))?;

    let data = NameOutput {
        success: true,
        result_code: 0,
        name: NameInfo {
            name: name.to_string(),
            target,
        },
    };
    output.write(&data, || format!("{}\n", data.name.target))
}

fn cmd_name_list(output: &OutputWriter, root: &std::path::Path) -> Result<()> {
    let store = open_store(root)?;

    let names: Vec<NameInfo> = store
        .refs()
        .list()
        .context("Failed to list names")?
        .into_iter()
        .map(|(name, target)| NameInfo { name, target })
        .collect();

    let data = NameListOutput {
        success: true,
        result_code: 0,
        names,
    };
    output.write(&data, || {
        if data.names.is_empty() {
            return "No names (use 'cairn add --name' to create one)\n".to_string();
        }
        let mut text = String::new();
        for info in &data.names {
            text.push_str(&format!("/named/{} -> {}\n", info.name, info.target));
        }
        text
    })
}

fn cmd_name_rm(output: &OutputWriter, root: &std::path::Path, name: &str) -> Result<()> {
    let store = open_store(root)?;

    store
        .refs()
        .remove(name)
        .with_context(|| format!("Failed to remove name: {}", name))?;

    let data = NameRmOutput {
        success: true,
        result_code: 0,
        name: name.to_string(),
    };
    output.write(&data, || format!("Removed name: {}\n", data.name))
}

use clap::{Parser, Subcommand};
use crychunks::registry;
use crychunks::{
    certify_files, ChunkKind, CertifyOptions, Container, Dialect, FileHeader, SummaryEntry,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crychunks", about = "CryTek chunk file inspector and round-trip checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the file header and chunk table
    Info {
        input: PathBuf,
        /// Header dialect: padded (default) or exact
        #[arg(short, long, default_value = "padded")]
        dialect: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode, re-encode and compare each file
    Verify {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        #[arg(short, long, default_value = "padded")]
        dialect: String,
        /// Do not tolerate the legacy table bytes 31 and 51
        #[arg(long)]
        strict: bool,
        /// Extra byte range to tolerate, as START:END (repeatable)
        #[arg(long = "ignore", value_name = "START:END")]
        ignore: Vec<String>,
    },
    /// Certify a file and write its canonical encoding
    Rewrite {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, default_value = "padded")]
        dialect: String,
    },
}

#[derive(Serialize)]
struct ChunkInfo {
    #[serde(flatten)]
    entry: SummaryEntry,
    kind:  Option<ChunkKind>,
}

#[derive(Serialize)]
struct FileInfo {
    header: FileHeader,
    chunks: Vec<ChunkInfo>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, dialect, json } => {
            let info = read_info(&input, parse_dialect(&dialect))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }

            println!("── CryTek chunk file ────────────────────────────────────");
            println!("  Path      {}", input.display());
            println!("  Dialect   {}", info.header.dialect.name());
            println!("  Type      {:?}", info.header.file_type);
            println!("  Version   {:?}", info.header.file_version);
            println!("  Chunks    {}", info.header.chunk_count);
            println!("{:>6}  {:<34} {:>7}  {:>10} {:>9}  Kind", "Id", "Type", "Version", "Offset", "Size");
            for c in &info.chunks {
                let h = &c.entry.header;
                println!(
                    "{:>6}  {:<34} {:>5x}{}  {:>#10x} {:>9}  {}",
                    h.id,
                    h.chunk_type.to_string(),
                    h.version(),
                    if h.is_big_endian() { "BE" } else { "  " },
                    h.offset,
                    c.entry.size,
                    c.kind.map(ChunkKind::name).unwrap_or("UNSUPPORTED"),
                );
            }
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { files, dialect, strict, ignore } => {
            let options = CertifyOptions {
                dialect:      parse_dialect(&dialect),
                legacy_zones: !strict,
                extra_zones:  ignore.iter().map(|s| parse_range(s)).collect::<Result<_, _>>()?,
            };

            let mut failures = 0usize;
            for (path, result) in certify_files(&files, &options) {
                match result {
                    Ok(report) => println!(
                        "  ok    {}  ({} bytes, {} tolerated in {} zones)",
                        path.display(),
                        report.original_len,
                        report.tolerated_bytes,
                        report.zones.len(),
                    ),
                    Err(e) => {
                        failures += 1;
                        println!("  FAIL  {}  {}", path.display(), e);
                    }
                }
            }
            if failures > 0 {
                eprintln!("{failures} of {} file(s) failed", files.len());
                std::process::exit(1);
            }
        }

        // ── Rewrite ──────────────────────────────────────────────────────────
        Commands::Rewrite { input, output, dialect } => {
            let dialect = parse_dialect(&dialect);
            let mut container = Container::open(&input, dialect)?;
            container.save(&output, dialect)?;
            println!("Rewrote {} chunks → {}", container.len(), output.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

/// Header and table only, so files with unsupported chunks can still be listed.
fn read_info(path: &PathBuf, dialect: Dialect) -> Result<FileInfo, Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = FileHeader::read(&mut reader, dialect, 0)?;
    let mut chunks = Vec::new();
    for _ in 0..header.chunk_count {
        let entry = SummaryEntry::read(&mut reader)?;
        let kind = registry::lookup(entry.header.chunk_type, entry.header.version()).ok();
        chunks.push(ChunkInfo { entry, kind });
    }
    Ok(FileInfo { header, chunks })
}

fn parse_dialect(s: &str) -> Dialect {
    Dialect::from_name(s).unwrap_or_else(|| {
        eprintln!("Unknown dialect '{}', defaulting to padded", s);
        Dialect::Padded
    })
}

fn parse_range(s: &str) -> Result<Range<usize>, String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("ignore range '{s}' is not START:END"))?;
    let start: usize = start.trim().parse().map_err(|e| format!("ignore range '{s}': {e}"))?;
    let end: usize = end.trim().parse().map_err(|e| format!("ignore range '{s}': {e}"))?;
    if end < start {
        return Err(format!("ignore range '{s}' ends before it starts"));
    }
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crychunks::{FileType, FileVersion};
    use tempfile::NamedTempFile;

    #[test]
    fn huge_chunk_count_is_an_error() {
        let mut bytes = Vec::new();
        FileHeader {
            dialect:      Dialect::Exact,
            file_type:    FileType::Geometry,
            file_version: FileVersion::V0745,
            chunk_count:  u32::MAX,
        }
        .write(&mut bytes)
        .unwrap();
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &bytes).unwrap();

        assert!(read_info(&file.path().to_path_buf(), Dialect::Exact).is_err());
    }

    #[test]
    fn ignore_ranges_parse() {
        assert_eq!(parse_range("31:32").unwrap(), 31..32);
        assert!(parse_range("32:31").is_err());
        assert!(parse_range("31").is_err());
    }
}

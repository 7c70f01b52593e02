use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gsm_mining::{
    mine_partitioned, parse_record, Dictionary, DictionaryBuilder, MinerConfig, PatternCollector,
    PatternSink, SequenceDatabase, Taxonomy, TextPatternWriter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Generalized sequential pattern mining over item taxonomies
#[derive(Parser)]
#[command(name = "gsm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Dictionary serialization formats
#[derive(Debug, Clone, Copy, ValueEnum)]
enum DictionaryFormat {
    /// Tab-separated values, one item per line
    Tsv,
    /// Pretty-printed JSON array
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine frequent generalized sequences from a corpus
    Mine {
        /// Input corpus: a file, a directory (recursed), or '-' for stdin
        #[arg(short, long, value_name = "PATH", default_value = "-")]
        input: String,

        /// Output file for mined patterns (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Taxonomy file with one child-parent pair per line
        #[arg(short, long, value_name = "FILE")]
        taxonomy: Option<PathBuf>,

        /// Minimum support (sigma)
        #[arg(short, long, default_value_t = 1)]
        support: u64,

        /// Maximum gap between consecutive pattern items (gamma)
        #[arg(short, long, default_value_t = 0)]
        gap: usize,

        /// Maximum pattern length (lambda)
        #[arg(short, long, default_value_t = 5)]
        length: usize,

        /// Number of item-range partitions mined in parallel
        #[arg(short, long, default_value_t = 1)]
        partitions: usize,

        /// Token separator; splits on whitespace when omitted
        #[arg(long, value_name = "CHAR")]
        separator: Option<char>,

        /// Also write the constructed dictionary to this TSV file
        #[arg(long, value_name = "FILE")]
        keep_dictionary: Option<PathBuf>,
    },

    /// Build an item dictionary from a corpus and write it out
    Dictionary {
        /// Input corpus: a file, a directory (recursed), or '-' for stdin
        #[arg(short, long, value_name = "PATH", default_value = "-")]
        input: String,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Taxonomy file with one child-parent pair per line
        #[arg(short, long, value_name = "FILE")]
        taxonomy: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "tsv")]
        format: DictionaryFormat,

        /// Token separator; splits on whitespace when omitted
        #[arg(long, value_name = "CHAR")]
        separator: Option<char>,
    },

    /// Translate encoded item-ID sequences back to item names
    Translate {
        /// Input file of encoded sequences (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Dictionary TSV file produced by the 'dictionary' command
        #[arg(short, long, value_name = "FILE")]
        dictionary: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Mine {
            input,
            output,
            taxonomy,
            support,
            gap,
            length,
            partitions,
            separator,
            keep_dictionary,
        } => mine_command(
            &input,
            &output,
            taxonomy.as_deref(),
            MinerConfig::new(support, gap, length),
            partitions,
            separator,
            keep_dictionary.as_deref(),
            cli.quiet,
        ),
        Commands::Dictionary {
            input,
            output,
            taxonomy,
            format,
            separator,
        } => dictionary_command(&input, &output, taxonomy.as_deref(), format, separator),
        Commands::Translate {
            input,
            output,
            dictionary,
        } => translate_command(&input, &output, &dictionary),
    }
}

/// Route log records to stderr at a level derived from the verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

/// Read input from file or stdin
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("Failed to read input file: {}", input))
    }
}

/// Write output to file or stdout
fn write_output(output: &str, content: &[u8]) -> Result<()> {
    if output == "-" {
        io::stdout()
            .write_all(content)
            .context("Failed to write to stdout")?;
        io::stdout().flush().context("Failed to flush stdout")?;
    } else {
        fs::write(output, content)
            .with_context(|| format!("Failed to write output file: {}", output))?;
    }
    Ok(())
}

/// Corpus inputs may be a single file, '-', or a directory whose files are
/// read in sorted order, recursively.
fn collect_corpus_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![path.to_path_buf()];
    while let Some(current) = pending.pop() {
        if current.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(&current)
                .with_context(|| format!("Failed to read directory: {}", current.display()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<io::Result<_>>()?;
            entries.sort();
            pending.extend(entries);
        } else {
            files.push(current);
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenate a corpus input into one line-oriented buffer.
fn read_corpus(input: &str, quiet: bool) -> Result<String> {
    if input == "-" || !Path::new(input).is_dir() {
        return read_input(input);
    }
    let files = collect_corpus_files(Path::new(input))?;
    if files.is_empty() {
        bail!("Input directory contains no files: {}", input);
    }
    log::debug!("reading {} corpus files from {}", files.len(), input);

    let progress = if quiet || files.len() < 2 {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let mut buffer = String::new();
    for file in &files {
        let content = fs::read_to_string(file)
            .with_context(|| format!("Failed to read input file: {}", file.display()))?;
        buffer.push_str(&content);
        if !buffer.ends_with('\n') {
            buffer.push('\n');
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    Ok(buffer)
}

fn load_taxonomy(path: Option<&Path>, separator: Option<char>) -> Result<Taxonomy> {
    let Some(path) = path else {
        return Ok(Taxonomy::new());
    };
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open taxonomy file: {}", path.display()))?;
    Taxonomy::read_from(BufReader::new(file), separator)
        .with_context(|| format!("Failed to parse taxonomy file: {}", path.display()))
}

/// Build the dictionary from a corpus buffer, counting every record once.
fn build_dictionary(
    corpus: &str,
    taxonomy: Taxonomy,
    separator: Option<char>,
) -> Result<Dictionary> {
    let mut builder = DictionaryBuilder::new(taxonomy);
    for line in corpus.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_record(line, separator)?;
        builder.count_sequence(record.items.iter().copied(), 1);
    }
    Ok(builder.build()?)
}

#[allow(clippy::too_many_arguments)]
fn mine_command(
    input: &str,
    output: &str,
    taxonomy: Option<&Path>,
    config: MinerConfig,
    partitions: usize,
    separator: Option<char>,
    keep_dictionary: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let started = Instant::now();
    let taxonomy = load_taxonomy(taxonomy, separator)?;
    let corpus = read_corpus(input, quiet)?;

    let dictionary = build_dictionary(&corpus, taxonomy, separator)?;
    if dictionary.is_empty() {
        bail!("Input corpus contains no items");
    }
    log::info!("dictionary holds {} items", dictionary.len());

    if let Some(path) = keep_dictionary {
        dictionary
            .to_path(path)
            .with_context(|| format!("Failed to write dictionary file: {}", path.display()))?;
        log::debug!("dictionary written to {}", path.display());
    }

    let database =
        SequenceDatabase::read_from(io::Cursor::new(corpus.as_str()), &dictionary, separator)?;
    log::info!("encoded {} sequences", database.len());

    let (count, collector) = mine_partitioned(
        &dictionary,
        &database,
        &config,
        partitions,
        PatternCollector::new(),
    )?;

    // Partition arrival order is nondeterministic; sort before writing.
    let mut patterns = collector.into_patterns();
    patterns.sort();

    let mut buffer = Vec::new();
    let mut writer = TextPatternWriter::new(&dictionary, &mut buffer);
    for (pattern, support) in &patterns {
        writer.write(pattern, *support)?;
    }
    writer.finish()?;
    write_output(output, &buffer)?;

    log::info!(
        "mined {} patterns in {:.2}s (sigma={}, gamma={}, lambda={})",
        count,
        started.elapsed().as_secs_f64(),
        config.min_support,
        config.max_gap,
        config.max_length
    );
    Ok(())
}

fn dictionary_command(
    input: &str,
    output: &str,
    taxonomy: Option<&Path>,
    format: DictionaryFormat,
    separator: Option<char>,
) -> Result<()> {
    let taxonomy = load_taxonomy(taxonomy, separator)?;
    let corpus = read_corpus(input, true)?;
    let dictionary = build_dictionary(&corpus, taxonomy, separator)?;
    log::info!("dictionary holds {} items", dictionary.len());

    let mut buffer = Vec::new();
    match format {
        DictionaryFormat::Tsv => dictionary.write_to(&mut buffer)?,
        DictionaryFormat::Json => dictionary.write_json(&mut buffer)?,
    }
    write_output(output, &buffer)
}

fn translate_command(input: &str, output: &str, dictionary: &Path) -> Result<()> {
    let dictionary = Dictionary::from_path(dictionary)
        .with_context(|| format!("Failed to read dictionary file: {}", dictionary.display()))?;

    let content = read_input(input)?;
    let mut buffer = String::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let id = tokens
            .next()
            .context("Encoded record has no sequence identifier")?;
        buffer.push_str(id);
        for token in tokens {
            let value: i64 = token
                .parse()
                .with_context(|| format!("Invalid item ID '{}' in record '{}'", token, id))?;
            buffer.push('\t');
            if value < 0 {
                // Gap markers pass through untranslated.
                buffer.push_str(token);
            } else if value >= 1 && value <= dictionary.len() as i64 {
                buffer.push_str(dictionary.name(value as u32));
            } else {
                bail!("Item ID {} in record '{}' is not in the dictionary", value, id);
            }
        }
        buffer.push('\n');
    }
    write_output(output, buffer.as_bytes())
}

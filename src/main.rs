use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use diffalump::chunk::{ChunkConfig, DEFAULT_MAX_CHUNK_LINES, chunks};
use diffalump::write::{temp_output_dir, write_split, write_stream};
use diffalump::{DEFAULT_CONTEXT_LINES, Diff, Diffalump};
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "diffalump")]
#[command(about = "Chunk git diffs for easier AI code review")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two revisions and print the diff as review chunks.
    ///
    /// Large files are split at hunk boundaries, small changes are combined.
    Chunk {
        /// Revision to compare against the base
        #[arg(required_unless_present = "diff_file")]
        target: Option<String>,

        /// Directory of the git repository
        #[arg(short, long, default_value = ".")]
        directory: String,

        /// Base revision for comparison
        #[arg(short, long = "base-branch", default_value = "main")]
        base: String,

        /// Paths to exclude from the diff (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Read an existing diff instead of running git ("-" for stdin)
        #[arg(long, conflicts_with_all = ["directory", "base", "exclude"])]
        diff_file: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long, conflicts_with = "split")]
        output: Option<PathBuf>,

        /// Line budget per chunk
        #[arg(
            long,
            env = "DIFFALUMP_MAX_CHUNK_LINES",
            default_value_t = DEFAULT_MAX_CHUNK_LINES as u32,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        max_chunk_lines: u32,

        /// Context lines around each change
        #[arg(
            short = 'U',
            long,
            env = "DIFFALUMP_CONTEXT_LINES",
            default_value_t = DEFAULT_CONTEXT_LINES
        )]
        context: u32,

        /// Still emit a final chunk when no small changes are left over
        #[arg(long)]
        emit_empty_tail: bool,

        /// Write one file per chunk instead of a single stream
        #[arg(long)]
        split: bool,

        /// Directory for split output (defaults to a new temporary directory)
        #[arg(long, requires = "split")]
        output_dir: Option<PathBuf>,

        /// File name prefix for split output
        #[arg(long, default_value = "chunk", requires = "split")]
        prefix: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Generate a man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries chunk output, so logs go to stderr
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Chunk {
            target,
            directory,
            base,
            exclude,
            diff_file,
            output,
            max_chunk_lines,
            context,
            emit_empty_tail,
            split,
            output_dir,
            prefix,
        } => {
            let diff = match diff_file {
                Some(path) => Diff::parse(&read_diff_file(&path)?)?,
                None => {
                    let target = target.ok_or("a target revision is required")?;
                    Diffalump::new(&directory)
                        .context_lines(context)
                        .exclude(&exclude)
                        .diff(&base, &target)?
                }
            };

            let config = ChunkConfig {
                max_chunk_lines: max_chunk_lines as usize,
                emit_empty_tail,
            };
            let chunks = chunks(&diff, config);

            if split {
                let dir = match output_dir {
                    Some(dir) => dir,
                    None => temp_output_dir()?,
                };
                let paths = write_split(&dir, &prefix, chunks)?;
                info!("wrote {} chunks to {}", paths.len(), dir.display());
                for path in paths {
                    println!("{}", path.display());
                }
            } else {
                let written = match output {
                    Some(path) => write_stream(&mut BufWriter::new(File::create(&path)?), chunks)?,
                    None => write_stream(&mut BufWriter::new(io::stdout().lock()), chunks)?,
                };
                info!("wrote {} chunks", written);
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "diffalump", &mut io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut io::stdout())?;
        }
    }

    Ok(())
}

fn read_diff_file(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

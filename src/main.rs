use clap::{ArgAction, Args, Parser, Subcommand};
use fastqio::sink::DEFAULT_NAME;
use fastqio::{FastqReader, FastqReaderBuilder, FastqWriter, ParquetSink, Record, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "fastqio", version, about = "Chunked parallel FASTQ processing")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Worker threads
    #[arg(short = 'w', long = "threads", default_value_t = 4, global = true)]
    threads: usize,

    /// Records per chunk
    #[arg(long = "chunk-size", default_value_t = 1_000_000, global = true)]
    chunk_size: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args, Debug)]
struct Output {
    /// Write FASTQ here instead of stdout (.gz compresses)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count records
    Count { input: PathBuf },
    /// Print the first records
    Head {
        input: PathBuf,
        #[arg(short = 'n', long = "records", default_value_t = 10)]
        records: usize,
    },
    /// Trim a fixed number of bases from both read ends
    Trim {
        input: PathBuf,
        #[arg(short = 'f', long = "five-prime", default_value_t = 0)]
        five_prime: usize,
        #[arg(short = 't', long = "three-prime", default_value_t = 0)]
        three_prime: usize,
        #[command(flatten)]
        output: Output,
    },
    /// Keep reads with mean Phred+33 quality at or above a threshold
    Filter {
        input: PathBuf,
        #[arg(short = 'q', long = "min-quality", default_value_t = 20.0)]
        min_quality: f64,
        #[command(flatten)]
        output: Output,
    },
    /// Extract seq[start:end] from every read
    Extract {
        input: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        start: isize,
        #[arg(long, allow_hyphen_values = true)]
        end: isize,
        /// Save to <NAME>.parquet instead of printing (NAME defaults to "extracted")
        #[arg(
            long = "parquet",
            value_name = "NAME",
            num_args = 0..=1,
            default_missing_value = DEFAULT_NAME
        )]
        parquet: Option<String>,
        /// Directory for the parquet file
        #[arg(long = "dir", default_value = ".")]
        dir: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn open_reader(cli: &Cli, input: &Path) -> Result<FastqReader> {
    FastqReaderBuilder::new()
        .workers(cli.threads)
        .chunk_size(cli.chunk_size)
        .open(input)
}

fn write_fastq(records: &[Record], output: &Output) -> Result<()> {
    let written = match &output.output {
        Some(path) => {
            let mut writer = FastqWriter::to_file(path)?;
            let n = writer.write_records(records)?;
            writer.finish()?;
            n
        }
        None => {
            let mut writer = FastqWriter::new(io::stdout().lock());
            let n = writer.write_records(records)?;
            writer.finish()?;
            n
        }
    };
    info!(records = written, "Wrote FASTQ output");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let started = Instant::now();

    match &cli.command {
        Command::Count { input } => {
            let count = open_reader(&cli, input)?.count_reads()?;
            println!("{}", count);
        }
        Command::Head { input, records } => {
            let mut reader = open_reader(&cli, input)?;
            let mut writer = FastqWriter::new(io::stdout().lock());
            for record in reader.records()?.take(*records) {
                writer.write_record(&record?)?;
            }
            writer.finish()?;
        }
        Command::Trim {
            input,
            five_prime,
            three_prime,
            output,
        } => {
            let trimmed = open_reader(&cli, input)?.trim(*five_prime, *three_prime)?;
            write_fastq(&trimmed, output)?;
        }
        Command::Filter {
            input,
            min_quality,
            output,
        } => {
            let kept = open_reader(&cli, input)?.filter_quality(*min_quality)?;
            write_fastq(&kept, output)?;
        }
        Command::Extract {
            input,
            start,
            end,
            parquet,
            dir,
        } => {
            let mut reader = open_reader(&cli, input)?;
            match parquet {
                Some(name) => {
                    let path = reader.extract_to(*start, *end, &ParquetSink::new(dir), name)?;
                    eprintln!("Saved {}", path.display());
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    for subseq in reader.extract(*start, *end)? {
                        writeln!(stdout, "{}", subseq)?;
                    }
                }
            }
        }
    }

    info!(
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Processing finished"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parquet_name(args: &[&str]) -> Option<String> {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Extract { parquet, .. } => parquet,
            other => panic!("Expected extract, got {:?}", other),
        }
    }

    #[test]
    fn test_parquet_flag_without_name_uses_default() {
        let name = parquet_name(&[
            "fastqio", "extract", "in.fastq", "--start", "0", "--end", "4", "--parquet",
        ]);
        assert_eq!(name.as_deref(), Some(DEFAULT_NAME));
        assert_eq!(name.as_deref(), Some("extracted"));
    }

    #[test]
    fn test_parquet_flag_with_name() {
        let name = parquet_name(&[
            "fastqio", "extract", "in.fastq", "--parquet", "subseqs", "--start", "-3", "--end",
            "100",
        ]);
        assert_eq!(name.as_deref(), Some("subseqs"));
    }

    #[test]
    fn test_extract_prints_without_parquet_flag() {
        let name = parquet_name(&["fastqio", "extract", "in.fastq", "--start", "0", "--end", "4"]);
        assert_eq!(name, None);
    }
}

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use memmap2::Mmap;

use alog_region::{LogRegion, ReadCursor};

#[derive(Parser)]
struct DumpCommand {
    /// Print header statistics of the region instead of its entries.
    #[arg(long)]
    stats: bool,

    /// Print undecoded message blocks, payload as hex, instead of formatted lines.
    #[arg(long)]
    raw: bool,

    #[arg(help = "The captured log region image")]
    image: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let DumpCommand { stats, raw, image } = DumpCommand::parse();

    let region = match open_region(&image) {
        Ok(region) => region,
        Err(err) => {
            tracing::error!(image = %image.display(), %err, "cannot open log region");
            return ExitCode::from(1);
        }
    };

    if stats {
        print_stats(&region);
        return ExitCode::SUCCESS;
    }

    let mut cursor = ReadCursor::new();
    let mut entries = 0u64;
    loop {
        let line = if raw {
            region.next_block(&mut cursor).map(|block| block.map(raw_line))
        } else {
            region.next_line(&mut cursor)
        };

        match line {
            Ok(Some(line)) => {
                println!("{line}");
                entries += 1;
            }
            Ok(None) => break,
            Err(err) => {
                // Everything decoded so far was printed; the remainder of the
                // region cannot be trusted.
                tracing::error!(%err, entries, "log ends in an undecodable entry");
                return ExitCode::from(2);
            }
        }
    }

    ExitCode::SUCCESS
}

enum OpenError {
    Io(std::io::Error),
    Region(alog_region::RegionError),
}

fn open_region(image: &PathBuf) -> Result<LogRegion, OpenError> {
    let file = std::fs::File::open(image).map_err(OpenError::Io)?;
    let map = unsafe { Mmap::map(&file) }.map_err(OpenError::Io)?;

    // The mapping must outlive every entry decoded from it; the dumper never
    // unmaps, so leaking it is the honest lifetime.
    let map: &'static Mmap = Box::leak(Box::new(map));
    let region = unsafe { LogRegion::from_raw(map.as_ptr(), map.len()) };
    region.map_err(OpenError::Region)
}

fn print_stats(region: &LogRegion) {
    println!("version:   {}", region.version());
    println!("capacity:  {}", region.capacity());
    println!("used:      {}", region.used());
    println!("overflow:  {}", region.overflowed());
    println!("discarded: {}", region.discarded());
}

fn raw_line(block: alog_region::MessageBlock) -> String {
    let mut line = String::new();
    let _ = write!(
        line,
        "{:>12} {:#04x} {:#04x}",
        block.timestamp(),
        block.severity_raw(),
        block.origin_raw(),
    );

    for byte in block.payload() {
        let _ = write!(line, " {byte:02x}");
    }

    line
}

impl std::fmt::Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenError::Io(err) => write!(f, "{err}"),
            OpenError::Region(err) => write!(f, "{err}"),
        }
    }
}

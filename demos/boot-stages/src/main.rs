//! Walk one simulated boot through every stage of the log's lifecycle: reserve
//! and initialize, log from the early stage, hand off, rediscover, log from the
//! later contexts, then dump. With a path argument, additionally save the region
//! image for `alog-dump`.
use alog_handoff::{Discovery, HandoffList, HandoffRecord, LoggerHandle};
use alog_region::{reserve_block, Clock, LogRegion, ReadCursor, Severity, Stage, Writer, HEADER_LEN};

fn main() {
    let image_path = std::env::args_os().nth(1);
    let clock = Clock::new();

    // The early stage carves the region out of its memory map and starts the log.
    let memory = reserve_block(HEADER_LEN + 16 * 1024);
    let region = LogRegion::init(memory, clock.ticks()).expect("reserved block holds a region");

    let early = Writer::new(region, Stage::Early, clock.clone());
    early.write(Severity::Info, b"memory training complete");
    early.write(Severity::Verbose, b"console not yet available");

    // Stage boundary one: the record rides the configuration list.
    let mut list = HandoffList::new();
    list.deposit_raw(b"some-vendor-table".to_vec());
    list.deposit(HandoffRecord::for_region(&region));

    let record = list.take_logger_record().expect("the early stage deposited a record");
    let region = unsafe { record.attach() }.expect("record points at the live region");

    // The full boot environment publishes a handle; later producers locate it.
    let mut discovery = Discovery::new();
    discovery.publish(LoggerHandle::new(region));

    let located = discovery
        .locate()
        .expect("a logger handle is published")
        .region()
        .expect("the handle is of this revision");

    let boot = Writer::new(located, Stage::Boot, clock.clone());
    boot.write(Severity::Info, b"loading drivers");
    boot.write(Severity::Warning, b"option ROM checksum mismatch, skipped");

    let mgmt = Writer::new(located, Stage::Management, clock.clone());
    mgmt.write(Severity::Info, b"management interrupt handled");

    let runtime = Writer::new(located, Stage::Runtime, clock).with_threshold(Severity::Warning);
    runtime.write(Severity::Verbose, b"filtered out by the runtime threshold");
    runtime.write(Severity::Error, b"variable store write failed");

    let mut cursor = ReadCursor::new();
    loop {
        match located.next_line(&mut cursor) {
            Ok(Some(line)) => println!("{line}"),
            Ok(None) => break,
            Err(err) => {
                eprintln!("undecodable entry: {err}");
                std::process::exit(2);
            }
        }
    }

    eprintln!(
        "used {} of {} bytes, {} entries discarded",
        located.used(),
        located.capacity(),
        located.discarded(),
    );

    if let Some(path) = image_path {
        std::fs::write(&path, located.image()).expect("image path is writable");
        eprintln!("image saved to {}", path.to_string_lossy());
    }
}

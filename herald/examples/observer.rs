//! A download monitor wired up with events.
//!
//! A `Downloader` raises progress and completion events. A `ProgressBar` listens inline on
//! the main thread, while an `Archiver` handles completion on a background pool. Dropping
//! the progress bar unsubscribes it without any explicit bookkeeping.

use std::sync::Arc;

use crossbeam::channel::{Sender, unbounded};
use herald::{DisposeBag, Event, Executor, PoolConfig, ThreadPool};
use log::{Level, LevelFilter, Metadata, Record};

struct StdoutLogger;

impl log::Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

struct Downloader {
    progress: Event<u8>,
    finished: Event<String>,
}

impl Downloader {
    fn run(&self, file: &str) {
        for percent in [0, 25, 50, 75, 100] {
            self.progress.raise(percent);
        }
        self.finished.raise(file.to_string());
    }
}

struct ProgressBar {
    label: String,
}

impl ProgressBar {
    fn on_progress(&self, percent: u8) {
        let filled = usize::from(percent / 10);
        println!("{} [{:<10}] {percent}%", self.label, "#".repeat(filled));
    }
}

struct Archiver {
    archived: Sender<String>,
}

impl Archiver {
    fn on_finished(&self, file: String) {
        let thread = std::thread::current();
        println!("archiving {file} on {}", thread.name().unwrap_or("?"));
        // The receiver outlives every delivery in this demo.
        let _ = self.archived.send(file);
    }
}

fn main() -> std::io::Result<()> {
    log::set_logger(&LOGGER).expect("no other logger is installed");
    log::set_max_level(LevelFilter::Debug);

    let pool: Arc<dyn Executor> = Arc::new(ThreadPool::with_config(PoolConfig {
        threads: 2,
        name: String::from("archiver"),
    })?);

    let downloader = Downloader {
        progress: Event::new(),
        finished: Event::new(),
    };
    downloader
        .progress
        .set_watchers_change_handler(|event, added| {
            println!(
                "progress watchers changed: +{} ({} total)",
                added.len(),
                event.handlers_count()
            );
        });

    let bar = Arc::new(ProgressBar {
        label: String::from("report.pdf"),
    });
    let (archived_tx, archived_rx) = unbounded();
    let archiver = Arc::new(Archiver {
        archived: archived_tx,
    });

    let mut bag = DisposeBag::new();
    downloader
        .progress
        .add_handler(&bar, None, ProgressBar::on_progress)
        .disposed_by(&mut bag);
    downloader
        .finished
        .add_handler(&archiver, Some(pool), Archiver::on_finished)
        .disposed_by(&mut bag);

    downloader.run("report.pdf");

    // The bar goes away; its registration is dropped on the next raise.
    drop(bar);
    downloader.run("notes.txt");
    println!(
        "progress handlers left: {}",
        downloader.progress.handlers_count()
    );

    let archived: Vec<String> = (0..2)
        .map(|_| archived_rx.recv().expect("archiver is still registered"))
        .collect();
    println!("archived: {archived:?}");

    drop(bag);
    println!("finished handlers left: {}", downloader.finished.handlers_count());
    Ok(())
}

// Print the table row for one APK, or for every APK under a folder
// Usage: cargo run --example inspect_apk [-v] <file.apk | folder>
//   -v  trace-level logs with file:line, for digging into a parse failure

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use apkmeta_lib::apk::ApkParser;
use apkmeta_lib::batch::{discover_packages, run_batch, BatchStep, BatchWalker};
use apkmeta_lib::metadata::{extract_record, Record, COLUMNS};

fn print_record(record: &Record) {
    for (name, value) in COLUMNS.iter().zip(record.values()) {
        println!("  {:<14} {}", name, value);
    }
    println!();
}

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(pos) = args.iter().position(|a| a == "-v") {
        args.remove(pos);
        apkmeta_lib::logging::init_verbose();
    } else {
        apkmeta_lib::logging::init();
    }

    let Some(target) = args.first().map(PathBuf::from) else {
        eprintln!("Usage: inspect_apk [-v] <file.apk | folder>");
        std::process::exit(2);
    };

    if target.is_file() {
        match extract_record(&target, &ApkParser::new()) {
            Ok(record) => print_record(&record),
            Err(e) => {
                eprintln!("{}: {}", target.display(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    let files = match discover_packages(&target) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}: {}", target.display(), e);
            std::process::exit(1);
        }
    };
    println!("Found {} APK files under {}\n", files.len(), target.display());

    let walker = BatchWalker::new(files, Arc::new(ApkParser::new()));
    let summary = run_batch(walker, |step| {
        match step {
            BatchStep::Parsed { index, total, path, record } => {
                println!("[{}/{}] {}", index + 1, total, path.display());
                print_record(record);
            }
            BatchStep::Skipped { index, total, path, error } => {
                println!("[{}/{}] {} SKIPPED: {}\n", index + 1, total, path.display(), error);
            }
            BatchStep::Finished(_) => {}
        }
        ControlFlow::Continue(())
    });

    println!("Done: {} parsed, {} failed, {} total", summary.parsed, summary.failed, summary.total);
}

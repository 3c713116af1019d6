// Measure single-pass MD5 + SHA1 + SHA256 throughput against separate passes
// Usage: cargo run --release --example bench_hash <file> [md5,sha1,sha256]

use std::time::Instant;

use apkmeta_lib::common::{compute_hash, hash_file_with_progress, HashAlgorithm};

fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: bench_hash <file>");
        std::process::exit(2);
    };
    let path = std::path::Path::new(&path);

    // Algorithms to time separately; all of them by default
    let separate: Vec<HashAlgorithm> = match std::env::args().nth(2) {
        Some(list) => match list.split(',').map(str::parse::<HashAlgorithm>).collect::<Result<Vec<_>, _>>() {
            Ok(algos) => algos,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        },
        None => HashAlgorithm::ALL.to_vec(),
    };

    let size = std::fs::metadata(path).expect("Cannot read file metadata").len();
    let size_mb = size as f64 / (1024.0 * 1024.0);
    println!("File: {} ({:.2} MiB)\n", path.display(), size_mb);

    let start = Instant::now();
    let mut last_percent = 0;
    let digests = hash_file_with_progress(path, |done, total| {
        let percent = if total == 0 { 100 } else { done * 100 / total };
        if percent >= last_percent + 25 {
            last_percent = percent;
            println!("  {:>3}%", percent);
        }
    })
    .expect("Hashing failed");
    let elapsed = start.elapsed().as_secs_f64();
    println!("Single pass: {:.3}s ({:.2} MiB/s)", elapsed, size_mb / elapsed.max(f64::EPSILON));
    for algo in HashAlgorithm::ALL {
        println!("  {:<7} {}", algo.name(), digests.get(algo));
    }

    let data = std::fs::read(path).expect("Cannot read file");
    println!("\nSeparate in-memory passes:");
    for algo in separate {
        let start = Instant::now();
        let hash = compute_hash(&data, algo);
        let elapsed = start.elapsed().as_secs_f64();
        assert_eq!(hash, digests.get(algo));
        println!("  {:<7} {:.3}s ({:.2} MiB/s)", algo.name(), elapsed, size_mb / elapsed.max(f64::EPSILON));
    }
}

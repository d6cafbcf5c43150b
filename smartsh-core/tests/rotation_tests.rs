// smartsh-core/tests/rotation_tests.rs
use std::fs;
use std::io::Read;

use smartsh_core::{list_segments, LogRotator, RotationConfig};
use tempfile::tempdir;

fn small_config() -> RotationConfig {
    RotationConfig {
        max_segment_bytes: 1024,
        max_segments: 8,
        max_age_secs: 3600,
    }
}

#[test]
fn single_small_write_stays_in_segment_zero() {
    let dir = tempdir().unwrap();
    let rotator = LogRotator::create(dir.path(), small_config()).unwrap();
    rotator.write(b"hello world\n");
    rotator.finish();

    let segments = list_segments(dir.path()).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].seq, 0);
    assert!(!segments[0].compressed);
    let content = fs::read(&segments[0].path).unwrap();
    assert_eq!(content, b"hello world\n");
}

#[test]
fn writing_three_segments_worth_seals_and_compresses_three() {
    let dir = tempdir().unwrap();
    let config = small_config();
    let rotator = LogRotator::create(dir.path(), config).unwrap();

    let payload = vec![b'x'; (config.max_segment_bytes * 3) as usize];
    rotator.write(&payload);
    rotator.wait_for_compression();

    let segments = list_segments(dir.path()).unwrap();
    // Three sealed (compressed) segments plus the empty current one.
    assert_eq!(segments.len(), 4);
    let sealed: Vec<_> = segments.iter().filter(|s| s.compressed).collect();
    assert_eq!(sealed.len(), 3);
    assert_eq!(
        sealed.iter().map(|s| s.seq).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    let current: Vec<_> = segments.iter().filter(|s| !s.compressed).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].seq, 3);
    assert_eq!(fs::metadata(&current[0].path).unwrap().len(), 0);
    assert_eq!(rotator.current_seq(), 3);
}

#[test]
fn sealed_segments_never_exceed_the_bound() {
    let dir = tempdir().unwrap();
    let config = small_config();
    let rotator = LogRotator::create(dir.path(), config).unwrap();

    // Interleave odd-sized writes, including one larger than a whole
    // segment, and verify the pre-compression bound via decompression.
    for size in [100usize, 700, 3000, 17, 1024, 999] {
        rotator.write(&vec![b'y'; size]);
    }
    rotator.finish();

    let mut total = 0u64;
    for segment in list_segments(dir.path()).unwrap() {
        let len = if segment.compressed {
            let mut decoded = Vec::new();
            flate2::read::GzDecoder::new(fs::File::open(&segment.path).unwrap())
                .read_to_end(&mut decoded)
                .unwrap();
            decoded.len() as u64
        } else {
            fs::metadata(&segment.path).unwrap().len()
        };
        assert!(
            len <= config.max_segment_bytes,
            "segment {} holds {len} bytes",
            segment.path.display()
        );
        total += len;
    }
    assert_eq!(total, 100 + 700 + 3000 + 17 + 1024 + 999);
}

#[test_log::test]
fn retention_keeps_at_most_max_segments() {
    let dir = tempdir().unwrap();
    let config = RotationConfig {
        max_segment_bytes: 64,
        max_segments: 2,
        max_age_secs: 3600,
    };
    let rotator = LogRotator::create(dir.path(), config).unwrap();

    rotator.write(&vec![b'z'; 64 * 6]);
    rotator.finish();

    let segments = list_segments(dir.path()).unwrap();
    let sealed: Vec<_> = segments.iter().filter(|s| s.seq != 6).collect();
    assert!(
        sealed.len() <= config.max_segments,
        "retained {} sealed segments",
        sealed.len()
    );
    // The survivors are the newest ones.
    for segment in sealed {
        assert!(segment.seq >= 4, "old segment {} survived", segment.seq);
    }
}

#[test]
fn retention_drops_segments_older_than_max_age() {
    let dir = tempdir().unwrap();
    let config = RotationConfig {
        max_segment_bytes: 64,
        max_segments: 100,
        max_age_secs: 1,
    };
    let rotator = LogRotator::create(dir.path(), config).unwrap();

    // Seal two segments, let them age past the bound, then rotate twice
    // more so the sweep sees them as expired.
    rotator.write(&vec![b'a'; 64 * 2]);
    std::thread::sleep(std::time::Duration::from_secs(2));
    rotator.write(&vec![b'b'; 64 * 2]);
    rotator.finish();

    let segments = list_segments(dir.path()).unwrap();
    for segment in &segments {
        assert!(
            segment.seq >= 2,
            "expired segment {} survived",
            segment.seq
        );
    }
}

#[test]
fn compressed_content_round_trips() {
    let dir = tempdir().unwrap();
    let config = RotationConfig {
        max_segment_bytes: 16,
        max_segments: 8,
        max_age_secs: 3600,
    };
    let rotator = LogRotator::create(dir.path(), config).unwrap();
    rotator.write(b"0123456789abcdef"); // exactly one segment, sealed
    rotator.wait_for_compression();

    let segments = list_segments(dir.path()).unwrap();
    let sealed = segments.iter().find(|s| s.compressed).unwrap();
    let mut decoded = Vec::new();
    flate2::read::GzDecoder::new(fs::File::open(&sealed.path).unwrap())
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, b"0123456789abcdef");
}

#[test]
fn zero_segment_bound_is_rejected() {
    let dir = tempdir().unwrap();
    let config = RotationConfig {
        max_segment_bytes: 0,
        ..Default::default()
    };
    assert!(LogRotator::create(dir.path(), config).is_err());
}

#[test]
fn writes_after_finish_are_dropped_quietly() {
    let dir = tempdir().unwrap();
    let rotator = LogRotator::create(dir.path(), small_config()).unwrap();
    rotator.write(b"before");
    rotator.finish();
    rotator.write(b"after");

    let segments = list_segments(dir.path()).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(fs::read(&segments[0].path).unwrap(), b"before");
}

#[test]
fn concurrent_writers_never_interleave_a_seal() {
    use std::sync::Arc;

    let dir = tempdir().unwrap();
    let config = RotationConfig {
        max_segment_bytes: 256,
        max_segments: 64,
        max_age_secs: 3600,
    };
    let rotator = Arc::new(LogRotator::create(dir.path(), config).unwrap());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let rotator = Arc::clone(&rotator);
        handles.push(std::thread::spawn(move || {
            for _ in 0..50 {
                rotator.write(&[b'w'; 33]);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    rotator.finish();

    // Total bytes are preserved across all segments.
    let mut total = 0usize;
    for segment in list_segments(dir.path()).unwrap() {
        let bytes = if segment.compressed {
            let mut decoded = Vec::new();
            flate2::read::GzDecoder::new(fs::File::open(&segment.path).unwrap())
                .read_to_end(&mut decoded)
                .unwrap();
            decoded.len()
        } else {
            fs::metadata(&segment.path).unwrap().len() as usize
        };
        assert!(bytes <= 256);
        total += bytes;
    }
    assert_eq!(total, 4 * 50 * 33);
}

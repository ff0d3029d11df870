//! Payload format tests

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::payload::{
    build_payload, sample_payload_size, validate_payload, PriorityMode, CHECKSUM_LEN,
};

#[test]
fn test_build_and_validate_round_trip() {
    let payload = build_payload("emitter_test_1", 42, 512);

    assert_eq!(payload.len(), 512);
    assert!(validate_payload(&payload));
    assert!(payload.starts_with(b"emitter_test_1:"));
}

#[test]
fn test_tampered_payload_fails_validation() {
    let mut payload = build_payload("emitter_test_1", 7, 256);

    // Flip one padding byte
    let mid = payload.len() - CHECKSUM_LEN - 10;
    payload[mid] ^= 0x01;
    assert!(!validate_payload(&payload));
}

#[test]
fn test_tampered_checksum_fails_validation() {
    let mut payload = build_payload("e", 0, 128);

    let last = payload.len() - 1;
    payload[last] = if payload[last] == b'0' { b'1' } else { b'0' };
    assert!(!validate_payload(&payload));
}

#[test]
fn test_short_payload_is_invalid() {
    assert!(!validate_payload(b"too short"));
    assert!(!validate_payload(b""));
}

#[test]
fn test_target_smaller_than_overhead_still_checksummed() {
    // Header + checksum don't fit in 10 bytes; the payload grows instead
    let payload = build_payload("id", 1, 10);

    assert!(payload.len() > CHECKSUM_LEN);
    assert!(validate_payload(&payload));
}

#[test]
fn test_uppercase_checksum_accepted() {
    let mut payload = build_payload("id", 1, 200);

    let start = payload.len() - CHECKSUM_LEN;
    payload[start..].make_ascii_uppercase();
    assert!(validate_payload(&payload));
}

#[test]
fn test_sample_size_respects_bounds() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..10_000 {
        let size = sample_payload_size(&mut rng, 512.0, 0.5, 64, 8192);
        assert!((64..=8192).contains(&size));
    }
}

#[test]
fn test_sample_size_centers_near_mean() {
    let mut rng = StdRng::seed_from_u64(11);

    let n = 50_000;
    let sum: usize = (0..n)
        .map(|_| sample_payload_size(&mut rng, 512.0, 0.5, 1, 1_000_000))
        .sum();
    let avg = sum as f64 / n as f64;

    // Log-normal with mu = ln(mean) - sigma^2/2 has expectation `mean`
    assert!(
        (450.0..=580.0).contains(&avg),
        "average size {avg} strayed from 512"
    );
}

#[test]
fn test_priority_mode_single() {
    let mut rng = StdRng::seed_from_u64(1);
    for counter in 0..100 {
        assert_eq!(PriorityMode::Single.next(counter, &mut rng), 1);
    }
}

#[test]
fn test_priority_mode_cyclic() {
    let mut rng = StdRng::seed_from_u64(1);
    let picked: Vec<u8> = (0..16)
        .map(|c| PriorityMode::Cyclic.next(c, &mut rng))
        .collect();
    assert_eq!(picked, vec![0, 1, 2, 3, 4, 5, 6, 7, 0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_priority_mode_random_stays_in_range() {
    let mut rng = StdRng::seed_from_u64(3);
    for counter in 0..10_000 {
        assert!(PriorityMode::Random.next(counter, &mut rng) < 16);
    }
}

#[test]
fn test_priority_mode_weighted_distribution() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut counts = [0u32; 8];
    let n = 100_000;
    for counter in 0..n {
        counts[PriorityMode::Weighted.next(counter, &mut rng) as usize] += 1;
    }

    // 50% / 30% / 15% / 5% with generous slack
    assert!((45_000..=55_000).contains(&counts[0]));
    assert!((25_000..=35_000).contains(&counts[1]));
    assert!((12_000..=18_000).contains(&counts[2]));
    let tail: u32 = counts[3..8].iter().sum();
    assert!((3_000..=7_000).contains(&tail));
}

#[test]
fn test_priority_mode_parsing() {
    assert_eq!("single".parse::<PriorityMode>().unwrap(), PriorityMode::Single);
    assert_eq!("random".parse::<PriorityMode>().unwrap(), PriorityMode::Random);
    assert_eq!(
        "weighted".parse::<PriorityMode>().unwrap(),
        PriorityMode::Weighted
    );
    assert_eq!("cyclic".parse::<PriorityMode>().unwrap(), PriorityMode::Cyclic);
    assert!("fancy".parse::<PriorityMode>().is_err());
}

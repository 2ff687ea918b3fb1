use std::time::{Duration, Instant};

use bcrypt_rust::{hash, hash_with_salt, verify, BCryptError, BCryptResult, HashParts};

fn is_well_formed(encoded: &str) -> bool {
    let bytes = encoded.as_bytes();
    bytes.len() == 60
        && encoded.starts_with("$2a$")
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
        && bytes[6] == b'$'
        && bytes[7..]
            .iter()
            .all(|&b| b == b'.' || b == b'/' || b.is_ascii_alphanumeric())
}

#[test]
fn hashing_is_deterministic_for_fixed_salt() -> BCryptResult<()> {
    let salt = [42u8; 16];
    for password in ["", "a", "correct horse battery staple"] {
        assert_eq!(
            hash_with_salt(password, &salt, 4)?,
            hash_with_salt(password, &salt, 4)?
        );
    }
    Ok(())
}

#[test]
fn generated_salts_differ() -> BCryptResult<()> {
    assert_ne!(hash("password", 4)?, hash("password", 4)?);
    Ok(())
}

#[test]
fn hashes_verify_round_trip() -> BCryptResult<()> {
    for (password, cost) in [("", 4), ("p", 4), ("MySecretP@ssw0rd", 5), ("ünïcödé", 4)] {
        let hashed = hash(password, cost)?;
        assert!(is_well_formed(&hashed), "{hashed}");
        assert!(verify(password, &hashed)?);
    }
    Ok(())
}

#[test]
fn wrong_passwords_are_rejected() -> BCryptResult<()> {
    let hashed = hash("MySecretP@ssw0rd", 4)?;
    for attempt in ["", "MySecretP@ssw0rD", "MySecretP@ssw0rd ", "mysecretp@ssw0rd"] {
        assert!(!verify(attempt, &hashed)?, "{attempt:?} should not verify");
    }
    Ok(())
}

#[test]
fn output_format_is_canonical() -> BCryptResult<()> {
    for cost in [4, 5, 9] {
        let hashed = hash_with_salt("format", &[0xa5; 16], cost)?;
        assert!(is_well_formed(&hashed), "{hashed}");
        assert_eq!(&hashed[4..6], format!("{:02}", cost));
    }
    Ok(())
}

#[test]
fn single_bit_flips_avalanche() -> BCryptResult<()> {
    let salt = [0x5c; 16];
    let base_password = b"avalanche-test-password".to_vec();
    let base: HashParts = hash_with_salt(&base_password, &salt, 4)?.parse()?;

    let mut total_changed = 0u32;
    let mut trials = 0u32;
    for byte in 0..base_password.len() {
        for bit in [0u8, 3, 6] {
            let mut password = base_password.clone();
            password[byte] ^= 1 << bit;
            let flipped: HashParts = hash_with_salt(&password, &salt, 4)?.parse()?;

            let changed: u32 = base
                .digest()
                .iter()
                .zip(flipped.digest())
                .map(|(a, b)| (a ^ b).count_ones())
                .sum();
            assert!(changed > 40, "only {changed} of 184 bits changed");
            total_changed += changed;
            trials += 1;
        }
    }

    let mean = f64::from(total_changed) / f64::from(trials);
    assert!((80.0..104.0).contains(&mean), "mean bits changed {mean}");
    Ok(())
}

fn fastest_of(runs: usize, cost: u32) -> BCryptResult<Duration> {
    let mut best = Duration::MAX;
    for _ in 0..runs {
        let start = Instant::now();
        hash_with_salt("timing", &[1; 16], cost)?;
        best = best.min(start.elapsed());
    }
    Ok(best)
}

#[test]
fn each_cost_step_doubles_the_work() -> BCryptResult<()> {
    let lower = fastest_of(5, 6)?;
    let higher = fastest_of(5, 7)?;
    let ratio = higher.as_secs_f64() / lower.as_secs_f64();
    assert!((1.2..4.0).contains(&ratio), "cost 7 / cost 6 took {ratio:.2}x");
    Ok(())
}

#[test]
fn concurrent_calls_are_independent() -> BCryptResult<()> {
    let expected = hash_with_salt("shared", &[9; 16], 4)?;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let expected = &expected;
                scope.spawn(move || -> BCryptResult<()> {
                    assert_eq!(&hash_with_salt("shared", &[9; 16], 4)?, expected);
                    let own = hash(format!("thread-{i}"), 4)?;
                    assert!(verify(format!("thread-{i}"), &own)?);
                    assert!(!verify("shared", &own)?);
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("hashing thread panicked")?;
        }
        Ok(())
    })
}

#[test]
fn malformed_hashes_are_errors() {
    let digest_and_salt = "..CA.uOD/eaGAOmJB.yMBu0Vg.IqgE5e1N3Jo7bVq9ebueyvZWNbi";
    let malformed = [
        String::new(),
        "$2a$12$tooshort".to_string(),
        format!("$3x$12${digest_and_salt}"),
        format!("$2y$04${digest_and_salt}"),
        format!("$2a$4a${digest_and_salt}"),
        "$2a$04$..CA.uOD/eaGAOmJB.yMBu0Vg.IqgE5e1N3Jo7bVq9ebueyvZWNb=".to_string(),
        "$2a$04$..CA.uOD/eaGAOmJB.yMBu0Vg.IqgE5e1N3Jo7bVq9ebueyvZWNbi ".to_string(),
        "x".repeat(60),
    ];

    for encoded in &malformed {
        assert!(
            matches!(
                verify("anything", encoded),
                Err(BCryptError::MalformedEncoding(_))
            ),
            "{encoded:?} should be malformed"
        );
    }
}

#[test]
fn out_of_range_cost_in_hash_is_rejected() {
    let encoded = "$2a$32$..CA.uOD/eaGAOmJB.yMBu0Vg.IqgE5e1N3Jo7bVq9ebueyvZWNbi";
    assert!(matches!(
        verify("anything", encoded),
        Err(BCryptError::InvalidCost(32))
    ));
}

use anyhow::Result;
use mark_flaky_tests::flaky;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use reclink::{AliasTable, AttributeIndex, ValueId};
use std::collections::HashMap;

fn counts(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
    pairs.iter().map(|(v, c)| (v.to_string(), *c)).collect()
}

fn empirical(index: &AttributeIndex, seed: u64, draws: usize, hint: usize) -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut hits = vec![0u64; index.domain_size()];
    for _ in 0..draws {
        hits[index.sample(&mut rng, hint).raw() as usize] += 1;
    }
    hits.iter().map(|&h| h as f64 / draws as f64).collect()
}

#[test]
fn samples_are_always_valid_ids() -> Result<()> {
    let index =
        AttributeIndex::from_counts("name", &counts(&[("ann", 2), ("bob", 1), ("cy", 7)]), 4)?;
    let mut rng = SmallRng::seed_from_u64(11);
    for hint in 0..8 {
        for _ in 0..200 {
            let id = index.sample(&mut rng, hint);
            assert!(index.value_of(id).is_ok());
        }
    }
    Ok(())
}

#[flaky]
#[test]
fn empirical_frequencies_converge_to_count_proportions() -> Result<()> {
    // ann:2, bob:1 -> 2/3 and 1/3.
    let index = AttributeIndex::from_counts("name", &counts(&[("ann", 2), ("bob", 1)]), 10)?;
    let freqs = empirical(&index, 42, 60_000, 3);

    let ann = index.id_of("ann")?.raw() as usize;
    let bob = index.id_of("bob")?.raw() as usize;
    assert!((freqs[ann] - 2.0 / 3.0).abs() < 0.01, "ann: {}", freqs[ann]);
    assert!((freqs[bob] - 1.0 / 3.0).abs() < 0.01, "bob: {}", freqs[bob]);
    Ok(())
}

#[flaky]
#[test]
fn cached_and_recomputed_hints_agree_in_distribution() -> Result<()> {
    let source = counts(&[("a", 10), ("b", 30), ("c", 60)]);
    let index = AttributeIndex::from_counts("attr", &source, 5)?;

    // Hint 3 hits the precomputed aids; hint 50 takes the recompute path.
    let cached = empirical(&index, 7, 60_000, 3);
    let recomputed = empirical(&index, 8, 60_000, 50);
    for (a, b) in cached.iter().zip(&recomputed) {
        assert!((a - b).abs() < 0.015, "cached {a} vs recomputed {b}");
    }

    let expected = [0.6, 0.3, 0.1]; // id order is frequency-descending
    for (i, e) in expected.iter().enumerate() {
        assert!((cached[i] - e).abs() < 0.01);
    }
    Ok(())
}

#[test]
fn sampling_is_reproducible_given_a_seed() -> Result<()> {
    let index =
        AttributeIndex::from_counts("name", &counts(&[("ann", 5), ("bob", 2), ("cy", 1)]), 4)?;

    let draw = |seed: u64| -> Vec<ValueId> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..100).map(|_| index.sample(&mut rng, 2)).collect()
    };

    assert_eq!(draw(123), draw(123));
    assert_ne!(draw(123), draw(456));
    Ok(())
}

#[test]
fn singleton_domain_always_samples_itself() -> Result<()> {
    let index = AttributeIndex::from_counts("name", &counts(&[("only", 9)]), 3)?;
    let mut rng = SmallRng::seed_from_u64(1);
    for hint in [0usize, 1, 3, 99] {
        assert_eq!(index.value_of(index.sample(&mut rng, hint))?, "only");
    }
    Ok(())
}

#[flaky]
#[test]
fn alias_table_matches_its_weights() {
    let table = AliasTable::new(&[1.0, 2.0, 5.0]);
    assert_eq!(table.len(), 3);

    let mut rng = SmallRng::seed_from_u64(99);
    let draws = 80_000;
    let mut hits = [0u64; 3];
    for _ in 0..draws {
        hits[table.sample(&mut rng)] += 1;
    }
    let expected = [1.0 / 8.0, 2.0 / 8.0, 5.0 / 8.0];
    for (h, e) in hits.iter().zip(&expected) {
        let freq = *h as f64 / draws as f64;
        assert!((freq - e).abs() < 0.01, "freq {freq} vs expected {e}");
    }
}

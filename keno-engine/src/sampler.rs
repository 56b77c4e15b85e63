use chrono::Datelike;
use rand::Rng;
use rand::seq::index;

use keno_db::models::POOL_SIZE;

/// Deterministic seed from today's date (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

/// `count` distinct numbers drawn uniformly from the pool, in draw order.
pub fn sample_distinct<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<u8> {
    index::sample(rng, POOL_SIZE, count.min(POOL_SIZE))
        .into_iter()
        .map(|i| (i + 1) as u8)
        .collect()
}

/// `count` distinct entries of `pool`, in draw order.
pub fn sample_from<R: Rng + ?Sized>(rng: &mut R, pool: &[u8], count: usize) -> Vec<u8> {
    index::sample(rng, pool.len(), count.min(pool.len()))
        .into_iter()
        .map(|i| pool[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_sample_distinct_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let picked = sample_distinct(&mut rng, 14);
            assert_eq!(picked.len(), 14);
            let unique: HashSet<u8> = picked.iter().copied().collect();
            assert_eq!(unique.len(), 14);
            assert!(picked.iter().all(|&n| (1..=80).contains(&n)));
        }
    }

    #[test]
    fn test_sample_distinct_seeded() {
        let a = sample_distinct(&mut StdRng::seed_from_u64(42), 14);
        let b = sample_distinct(&mut StdRng::seed_from_u64(42), 14);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_whole_pool() {
        let mut picked = sample_distinct(&mut StdRng::seed_from_u64(1), 200);
        picked.sort();
        assert_eq!(picked, (1..=80).collect::<Vec<u8>>());
    }

    #[test]
    fn test_sample_from_stays_in_pool() {
        let pool = [3u8, 13, 23, 33];
        let picked = sample_from(&mut StdRng::seed_from_u64(5), &pool, 3);
        assert_eq!(picked.len(), 3);
        assert!(picked.iter().all(|n| pool.contains(n)));
        assert_eq!(sample_from(&mut StdRng::seed_from_u64(5), &pool, 10).len(), 4);
    }

    #[test]
    fn test_date_seed_format() {
        let seed = date_seed();
        assert!(seed > 20_000_000 && seed < 99_999_999);
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SYMBOLS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789!@#$_";

const COMMON_WORDS: &[&str] = &[
    "password", "123456", "qwerty", "letmein", "dragon", "monkey", "football", "iloveyou", "admin",
    "welcome", "sunshine", "princess", "shadow", "master", "baseball", "trustno1",
];

/// Builds a wordlist-shaped candidate list: about a fifth are exact repeats
/// of common words, a fifth are common words with a short numeric suffix
/// (which repeat often too), and the rest are random 6..=12 character strings.
/// Seeded so every run benchmarks the same input.
pub fn generate_wordlist(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let word = COMMON_WORDS[rng.gen_range(0..COMMON_WORDS.len())];
            match rng.gen_range(0..10) {
                0..=1 => word.to_string(),
                2..=3 => format!("{}{}", word, rng.gen_range(0..100)),
                _ => {
                    let length = rng.gen_range(6..=12);
                    (0..length)
                        .map(|_| SYMBOLS[rng.gen_range(0..SYMBOLS.len())] as char)
                        .collect()
                }
            }
        })
        .collect()
}

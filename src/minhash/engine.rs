use std::collections::HashSet;

/// Signature length; also the number of hash functions.
pub const NUM_HASHES: usize = 100;

/// First prime larger than 2^32, the modulus of the hash family.
const MINHASH_PRIME: u64 = 4_294_967_311;

/// Build-time seed for the coefficient generator. Changing it invalidates
/// every signature ever produced, so it stays fixed.
const COEFF_SEED: u64 = 42;

const SHINGLE_SIZE: usize = 3;

/// A MinHash signature: the per-hash minima over all shingles of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(pub Vec<u32>);

impl Signature {
    /// Fraction of positions at which the two signatures agree.
    /// Signatures of unequal length compare as 0.0.
    pub fn jaccard(&self, other: &Signature) -> f64 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }
        let matches = self
            .0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.0.len() as f64
    }
}

/// Signature generator with a fixed, deterministic hash family
/// `h_i(x) = (a_i * H(x) + b_i) mod p`.
pub struct MinHasher {
    coeff_a: Vec<u64>,
    coeff_b: Vec<u64>,
}

impl MinHasher {
    pub fn new() -> Self {
        // Cheap deterministic LCG; only coefficient generation depends on it.
        let mut state = COEFF_SEED;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            state
        };

        let mut coeff_a = Vec::with_capacity(NUM_HASHES);
        let mut coeff_b = Vec::with_capacity(NUM_HASHES);
        for _ in 0..NUM_HASHES {
            coeff_a.push(next() % (u32::MAX as u64) + 1);
            coeff_b.push(next() % (u32::MAX as u64 + 1));
        }
        Self { coeff_a, coeff_b }
    }

    /// Computes the signature of a text. An empty shingle set yields the
    /// all-MAX signature, which only matches other empty texts.
    pub fn text_signature(&self, text: &str) -> Signature {
        let shingles = shingle_hashes(text);

        let mut values = vec![u32::MAX; NUM_HASHES];
        if shingles.is_empty() {
            return Signature(values);
        }

        for (i, value) in values.iter_mut().enumerate() {
            let mut min_hash = u64::MAX;
            for &shingle in &shingles {
                let hash = (self.coeff_a[i] * shingle as u64 + self.coeff_b[i]) % MINHASH_PRIME;
                if hash < min_hash {
                    min_hash = hash;
                }
            }
            *value = min_hash.min(u32::MAX as u64) as u32;
        }

        Signature(values)
    }
}

impl Default for MinHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercases, strips non-alphanumerics and cuts the token sequence into
/// hashed 3-word shingles. Texts shorter than 3 tokens use each token as
/// its own shingle.
fn shingle_hashes(text: &str) -> HashSet<u32> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    let mut shingles = HashSet::new();
    if words.is_empty() {
        return shingles;
    }

    if words.len() < SHINGLE_SIZE {
        for word in &words {
            shingles.insert(fnv1a32(word));
        }
    } else {
        for window in words.windows(SHINGLE_SIZE) {
            shingles.insert(fnv1a32(&window.join(" ")));
        }
    }
    shingles
}

// Stable 32-bit FNV-1a; std's DefaultHasher makes no cross-version
// stability guarantees.
fn fnv1a32(text: &str) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c9dc5;
    const PRIME: u32 = 0x01000193;
    let mut state = OFFSET_BASIS;
    for byte in text.as_bytes() {
        state ^= *byte as u32;
        state = state.wrapping_mul(PRIME);
    }
    state
}

//! Hash-based proof-of-work puzzles.
//!
//! A [`Puzzle`] is a random hex prefix plus a difficulty `d`. A nonce solves
//! it when `SHA-256(prefix ‖ nonce)`, read as a big-endian 256-bit integer, is
//! strictly below `2^(256 - d)`. That is the same as the digest starting with
//! at least `d` zero bits. Checking a nonce costs one hash; finding one costs
//! about `2^d` hashes on average.
//!
//! Nonces travel as hexadecimal text. The solver emits the lowercase
//! rendering of a `u64` counter ([`encode_nonce`]); the verifier accepts any
//! non-empty run of hex digits and lets the hash decide.
//!
//! Puzzles are never stored. Verification only sees the prefix the client
//! echoes back, so a client may pick its own prefix and solve it ahead of
//! time, and a solved pair can be replayed. Prefixes are not bound to an
//! issue time or a server secret.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DefenseError, DefenseResult};

/// Width of the SHA-256 digest in bits.
pub const HASH_BITS: u32 = 256;

/// Random bytes drawn for each puzzle prefix.
pub const PREFIX_BYTES: usize = 16;

/// Difficulty used when none is configured.
pub const DEFAULT_DIFFICULTY: u32 = 20;

/// Separator between prefix and nonce in the solution wire form.
pub const SOLUTION_DELIMITER: char = ':';

/// A challenge handed to a client that exceeded its rate limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Puzzle {
    /// Hex-encoded random prefix.
    pub prefix: String,
    /// Required leading zero bits.
    pub difficulty: u32,
}

impl Puzzle {
    /// Brute-force a nonce for this puzzle.
    ///
    /// See [`solve`] for the search order and termination rules.
    #[must_use]
    pub fn solve(&self) -> SolvedPuzzle {
        solve(&self.prefix, self.difficulty)
    }

    /// Check whether `nonce` solves this puzzle.
    #[must_use]
    pub fn is_solved_by(&self, nonce: &str) -> bool {
        verify_solution(&self.prefix, nonce, self.difficulty)
    }
}

/// Result of a brute-force search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedPuzzle {
    /// The winning nonce in canonical encoding.
    pub nonce: String,
    /// Number of hashes evaluated, including the winning one.
    pub attempts: u64,
}

/// Generate a fresh puzzle from the OS entropy source.
///
/// # Errors
///
/// Returns `DefenseError::Entropy` if the OS cannot supply random bytes.
pub fn generate_puzzle(difficulty: u32) -> DefenseResult<Puzzle> {
    generate_puzzle_with(&mut OsRng, difficulty)
}

/// Generate a fresh puzzle from the given random source.
///
/// # Errors
///
/// Returns `DefenseError::Entropy` if `rng` fails to fill the prefix.
pub fn generate_puzzle_with<R: RngCore + ?Sized>(
    rng: &mut R,
    difficulty: u32,
) -> DefenseResult<Puzzle> {
    let mut bytes = [0u8; PREFIX_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| DefenseError::Entropy(e.to_string()))?;

    Ok(Puzzle {
        prefix: hex::encode(bytes),
        difficulty,
    })
}

/// Check `SHA-256(prefix ‖ nonce)` against the difficulty target.
#[must_use]
pub fn verify_solution(prefix: &str, nonce: &str, difficulty: u32) -> bool {
    let digest = Sha256::new_with_prefix(prefix.as_bytes())
        .chain_update(nonce.as_bytes())
        .finalize();
    meets_difficulty(&digest, difficulty)
}

/// Whether `digest` is below `2^(HASH_BITS - difficulty)`.
///
/// A difficulty of zero accepts every digest; one above [`HASH_BITS`]
/// accepts none.
#[must_use]
pub fn meets_difficulty(digest: &[u8], difficulty: u32) -> bool {
    difficulty <= HASH_BITS && leading_zero_bits(digest) >= difficulty
}

/// Count zero bits before the first set bit, most significant byte first.
#[must_use]
pub fn leading_zero_bits(digest: &[u8]) -> u32 {
    let mut count = 0;
    for byte in digest {
        if *byte == 0 {
            count += 8;
        } else {
            count += byte.leading_zeros();
            break;
        }
    }
    count
}

/// Render a nonce counter in its canonical text form.
#[must_use]
pub fn encode_nonce(counter: u64) -> String {
    format!("{counter:x}")
}

/// Parse a hex nonce back into a counter.
///
/// Either case and leading zeros are accepted. Returns `None` for empty
/// text, non-hex characters (signs included), or values wider than 64 bits.
#[must_use]
pub fn decode_nonce(text: &str) -> Option<u64> {
    if !is_hex_nonce(text) {
        return None;
    }
    u64::from_str_radix(text, 16).ok()
}

/// Whether `text` is a non-empty run of hexadecimal digits.
#[must_use]
pub fn is_hex_nonce(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Search nonces `0, 1, 2, …` until one meets `difficulty`.
///
/// There is no attempt cap: the expected cost is `2^difficulty` hashes and
/// the loop runs until it pays it. A difficulty above [`HASH_BITS`] can never
/// be met, so callers must reject such puzzles before calling this.
#[must_use]
pub fn solve(prefix: &str, difficulty: u32) -> SolvedPuzzle {
    let seeded = Sha256::new_with_prefix(prefix.as_bytes());
    let mut counter: u64 = 0;
    loop {
        let nonce = encode_nonce(counter);
        let digest = seeded.clone().chain_update(nonce.as_bytes()).finalize();
        if meets_difficulty(&digest, difficulty) {
            return SolvedPuzzle {
                nonce,
                attempts: counter.saturating_add(1),
            };
        }
        counter = counter.wrapping_add(1);
    }
}

/// A client's claimed answer, carried as `prefix:nonce`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Prefix the client says it solved.
    pub prefix: String,
    /// Hex nonce, hashed exactly as written.
    pub nonce: String,
}

impl Solution {
    /// Build a solution from a prefix and a nonce counter.
    #[must_use]
    pub fn new(prefix: impl Into<String>, counter: u64) -> Self {
        Self {
            prefix: prefix.into(),
            nonce: encode_nonce(counter),
        }
    }

    /// Check this solution at the given difficulty.
    ///
    /// Any prefix is accepted; only the hash is checked.
    #[must_use]
    pub fn verify(&self, difficulty: u32) -> bool {
        verify_solution(&self.prefix, &self.nonce, difficulty)
    }
}

impl From<(&Puzzle, SolvedPuzzle)> for Solution {
    fn from((puzzle, solved): (&Puzzle, SolvedPuzzle)) -> Self {
        Self {
            prefix: puzzle.prefix.clone(),
            nonce: solved.nonce,
        }
    }
}

impl FromStr for Solution {
    type Err = DefenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, nonce) = s.split_once(SOLUTION_DELIMITER).ok_or_else(|| {
            DefenseError::MalformedSolution(format!("missing '{SOLUTION_DELIMITER}' delimiter"))
        })?;

        if nonce.contains(SOLUTION_DELIMITER) {
            return Err(DefenseError::MalformedSolution(format!(
                "more than one '{SOLUTION_DELIMITER}' delimiter"
            )));
        }
        if !is_hex_nonce(nonce) {
            return Err(DefenseError::MalformedSolution(format!(
                "nonce {nonce:?} is not hexadecimal"
            )));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            nonce: nonce.to_string(),
        })
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SOLUTION_DELIMITER}{}", self.prefix, self.nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::BrokenRng;
    use test_case::test_case;

    const FIXTURE_PREFIX: &str = "00112233445566778899aabbccddeeff";

    #[test]
    fn test_generate_puzzle_shape() {
        let puzzle = generate_puzzle(12).unwrap();

        assert_eq!(puzzle.difficulty, 12);
        assert_eq!(puzzle.prefix.len(), PREFIX_BYTES * 2);
        assert!(puzzle.prefix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_puzzle_is_fresh() {
        let a = generate_puzzle(4).unwrap();
        let b = generate_puzzle(4).unwrap();
        assert_ne!(a.prefix, b.prefix);
    }

    #[test]
    fn test_generate_puzzle_entropy_failure() {
        let result = generate_puzzle_with(&mut BrokenRng, 8);
        match result {
            Err(DefenseError::Entropy(msg)) => assert!(msg.contains("entropy exhausted")),
            other => panic!("expected entropy error, got {other:?}"),
        }
    }

    // Digests for these nonces were computed offline:
    //   "0"     -> dcfa3d2d... (0 leading zero bits)
    //   "2"     -> 14850e58... (3)
    //   "79"    -> 00967a59... (8)
    //   "1373"  -> 000d341c... (12)
    //   "41c52" -> 0000e5b2... (16)
    #[test_case("0", 0 ; "no leading zeros")]
    #[test_case("2", 3 ; "three bits")]
    #[test_case("79", 8 ; "one zero byte")]
    #[test_case("1373", 12 ; "byte and a half")]
    #[test_case("41c52", 16 ; "two zero bytes")]
    fn test_verify_solution_exact_threshold(nonce: &str, zero_bits: u32) {
        for difficulty in 0..=zero_bits {
            assert!(verify_solution(FIXTURE_PREFIX, nonce, difficulty));
        }
        assert!(!verify_solution(FIXTURE_PREFIX, nonce, zero_bits + 1));
        assert!(!verify_solution(FIXTURE_PREFIX, nonce, HASH_BITS));
    }

    #[test]
    fn test_verify_solution_hashes_concatenation() {
        // SHA-256("abc") = ba7816bf..., top bit set
        assert!(verify_solution("ab", "c", 0));
        assert!(!verify_solution("ab", "c", 1));
        assert!(!verify_solution("abc", "", 1));
    }

    #[test]
    fn test_difficulty_wider_than_hash_never_met() {
        let zeros = [0u8; 32];
        assert!(meets_difficulty(&zeros, HASH_BITS));
        assert!(!meets_difficulty(&zeros, HASH_BITS + 1));
        assert!(!meets_difficulty(&zeros, u32::MAX));
    }

    #[test]
    fn test_leading_zero_bits() {
        assert_eq!(leading_zero_bits(&[0x80, 0x00]), 0);
        assert_eq!(leading_zero_bits(&[0x01, 0xff]), 7);
        assert_eq!(leading_zero_bits(&[0x00, 0x0f, 0x00]), 12);
        assert_eq!(leading_zero_bits(&[0x00, 0x00]), 16);
        assert_eq!(leading_zero_bits(&[]), 0);
    }

    #[test]
    fn test_solve_finds_first_nonce() {
        let solved = solve(FIXTURE_PREFIX, 8);
        assert_eq!(solved.nonce, "79");
        assert_eq!(solved.attempts, 0x79 + 1);

        let solved = solve(FIXTURE_PREFIX, 4);
        assert_eq!(solved.nonce, "2a");
        assert_eq!(solved.attempts, 0x2a + 1);
    }

    #[test]
    fn test_solve_zero_difficulty_is_immediate() {
        let solved = solve("anything", 0);
        assert_eq!(solved.nonce, "0");
        assert_eq!(solved.attempts, 1);
    }

    #[test]
    fn test_solve_difficulty_eight_within_ceiling() {
        // Expected cost is 256 hashes; 100k is a regression ceiling.
        let puzzle = generate_puzzle(8).unwrap();
        let solved = puzzle.solve();

        assert!(solved.attempts <= 100_000, "took {} attempts", solved.attempts);
        assert!(puzzle.is_solved_by(&solved.nonce));
    }

    #[test_case(0, "0")]
    #[test_case(10, "a")]
    #[test_case(255, "ff")]
    #[test_case(u64::MAX, "ffffffffffffffff")]
    fn test_nonce_encoding(counter: u64, text: &str) {
        assert_eq!(encode_nonce(counter), text);
        assert_eq!(decode_nonce(text), Some(counter));
    }

    #[test_case("0a", 10 ; "leading zero")]
    #[test_case("FF", 255 ; "uppercase")]
    #[test_case("00000000000000000001", 1 ; "long zero padding")]
    fn test_decode_nonce_lenient(text: &str, counter: u64) {
        assert_eq!(decode_nonce(text), Some(counter));
    }

    #[test_case("" ; "empty")]
    #[test_case("+a" ; "sign")]
    #[test_case("xyz" ; "not hex")]
    #[test_case("10000000000000000" ; "wider than u64")]
    fn test_decode_nonce_rejects(text: &str) {
        assert_eq!(decode_nonce(text), None);
    }

    #[test]
    fn test_solution_parse_and_display() {
        let solution: Solution = "abcd:1f".parse().unwrap();
        assert_eq!(solution.prefix, "abcd");
        assert_eq!(solution.nonce, "1f");
        assert_eq!(solution.to_string(), "abcd:1f");
        assert_eq!(Solution::new("abcd", 31), solution);
    }

    #[test_case("abcd" ; "no delimiter")]
    #[test_case("ab:cd:1" ; "two delimiters")]
    #[test_case("abcd:" ; "empty nonce")]
    #[test_case("abcd:zz" ; "non numeric nonce")]
    #[test_case("abcd:-1" ; "negative nonce")]
    fn test_solution_parse_rejects(raw: &str) {
        assert!(matches!(
            raw.parse::<Solution>(),
            Err(DefenseError::MalformedSolution(_))
        ));
    }

    #[test_case("abcd:00" ; "zero padded")]
    #[test_case("abcd:C" ; "uppercase")]
    #[test_case(":0" ; "empty prefix")]
    #[test_case("abcd:10000000000000000" ; "wider than u64")]
    fn test_solution_parse_keeps_nonce_verbatim(raw: &str) {
        let solution: Solution = raw.parse().unwrap();
        assert_eq!(solution.to_string(), raw);
    }

    // "09" and "C" hash to 4 leading zero bits, their canonical forms do not.
    #[test_case("09" ; "zero padded")]
    #[test_case("C" ; "uppercase")]
    fn test_non_canonical_nonce_verifies_by_hash(nonce: &str) {
        let solution: Solution = format!("{FIXTURE_PREFIX}:{nonce}").parse().unwrap();
        assert!(solution.verify(4));
        assert!(!solution.verify(5));
    }

    #[test]
    fn test_solution_from_solved_puzzle() {
        let puzzle = Puzzle {
            prefix: FIXTURE_PREFIX.to_string(),
            difficulty: 8,
        };
        let solution = Solution::from((&puzzle, puzzle.solve()));

        assert_eq!(solution.to_string(), format!("{FIXTURE_PREFIX}:79"));
        assert!(solution.verify(8));
        assert!(!solution.verify(9));
    }

    #[test]
    fn test_puzzle_json_shape() {
        let puzzle = Puzzle {
            prefix: "ab".into(),
            difficulty: 3,
        };
        let json = serde_json::to_value(&puzzle).unwrap();
        assert_eq!(json, serde_json::json!({"prefix": "ab", "difficulty": 3}));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// `hash < 2^(256 - d)` evaluated on 33-byte big-endian integers.
        fn below_target(digest: &[u8; 32], difficulty: u32) -> bool {
            if difficulty > HASH_BITS {
                return false;
            }
            let bit = (HASH_BITS - difficulty) as usize;
            let mut target = [0u8; 33];
            target[32 - bit / 8] = 1 << (bit % 8);

            let mut value = [0u8; 33];
            value[1..].copy_from_slice(digest);
            value < target
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn solve_then_verify(prefix in "[0-9a-f]{32}", difficulty in 0u32..=10) {
                let solved = solve(&prefix, difficulty);
                prop_assert!(verify_solution(&prefix, &solved.nonce, difficulty));
                prop_assert_eq!(decode_nonce(&solved.nonce), Some(solved.attempts - 1));
            }

            #[test]
            fn leading_bits_match_integer_target(
                digest in prop::array::uniform32(any::<u8>()),
                zero_bytes in 0usize..=32,
                difficulty in 0u32..=260,
            ) {
                let mut digest = digest;
                digest[..zero_bytes].fill(0);
                prop_assert_eq!(meets_difficulty(&digest, difficulty), below_target(&digest, difficulty));
            }
        }
    }
}

use rand::{Rng, distributions::Uniform};

pub const RESET_CODE_LEN: usize = 6;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six characters drawn from `[A-Z0-9]`.
pub fn generate_reset_code() -> String {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..ALPHABET.len());
    (0..RESET_CODE_LEN)
        .map(|_| ALPHABET[rng.sample(dist)] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_the_upper_alphanumeric_alphabet() {
        for _ in 0..50 {
            let code = generate_reset_code();
            assert_eq!(code.len(), RESET_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}

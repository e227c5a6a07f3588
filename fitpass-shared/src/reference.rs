use rand::Rng;

/// Booking references are 8 uppercase alphanumeric characters, shown to
/// customers and unique across all bookings. Uniqueness is enforced by the
/// caller checking the store and regenerating on collision.
pub const REFERENCE_LEN: usize = 8;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERENCE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

pub fn is_valid(reference: &str) -> bool {
    reference.len() == REFERENCE_LEN
        && reference
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_reference_format() {
        for _ in 0..100 {
            let reference = generate();
            assert!(is_valid(&reference), "bad reference: {}", reference);
        }
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        assert!(!is_valid("short"));
        assert!(!is_valid("toolongref"));
        assert!(!is_valid("abcd1234")); // lowercase
        assert!(!is_valid("ABCD-123"));
        assert!(is_valid("7GYMPASS"));
    }
}

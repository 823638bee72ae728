use rand::distr::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

pub fn build_id() -> String {
    let uuid = Uuid::new_v4().simple();
    format!("{}", uuid)
}

/// 随机字母数字串（OAuth state 等）
pub fn random_token(len: usize) -> String {
    rand::rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_32_hex_chars_and_distinct() {
        let a = build_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, build_id());
    }

    #[test]
    fn random_token_has_requested_length() {
        let t = random_token(13);
        assert_eq!(t.len(), 13);
        assert!(t.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

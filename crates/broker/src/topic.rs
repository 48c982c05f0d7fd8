//! AMQP topic pattern matching.

/// Returns true if `routing_key` matches the topic `pattern`.
///
/// Words are separated by `.`; `*` matches exactly one word and `#` matches
/// zero or more words.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| matches_words(rest, &key[skip..])),
        Some((&word, rest)) => match key.split_first() {
            Some((&first, key_rest)) => {
                (word == "*" || word == first) && matches_words(rest, key_rest)
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_one_word() {
        assert!(topic_matches("order.*", "order.created"));
        assert!(topic_matches("order.*", "order.cancelled"));
        assert!(!topic_matches("order.*", "order"));
        assert!(!topic_matches("order.*", "order.created.v2"));
        assert!(!topic_matches("order.*", "invoice.created"));
    }

    #[test]
    fn test_hash_matches_any_suffix() {
        assert!(topic_matches("#", "anything.at.all"));
        assert!(topic_matches("order.#", "order"));
        assert!(topic_matches("order.#", "order.created.v2"));
        assert!(topic_matches("#.created", "order.created"));
        assert!(!topic_matches("order.#", "invoice.created"));
    }

    #[test]
    fn test_literal_pattern() {
        assert!(topic_matches("order.created", "order.created"));
        assert!(!topic_matches("order.created", "order.updated"));
    }
}

pub const MAX_CHIRP_LEN: usize = 120;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

pub fn is_too_long(body: &str) -> bool {
    body.chars().count() > MAX_CHIRP_LEN
}

/// Mask whole space-separated words from the profanity list, ignoring case.
/// Words with attached punctuation are left alone.
pub fn clean_words(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.iter().any(|bad| word.eq_ignore_ascii_case(bad)) {
                "****"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_profane_words_case_insensitively() {
        assert_eq!(
            clean_words("I had something interesting for breakfast"),
            "I had something interesting for breakfast"
        );
        assert_eq!(
            clean_words("I hear Mastodon is better than Chirpy. sharbert I need to migrate"),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(
            clean_words("I really need a kerfuffle to go to bed sooner, Fornax !"),
            "I really need a **** to go to bed sooner, **** !"
        );
    }

    #[test]
    fn punctuation_attached_words_pass_through() {
        assert_eq!(clean_words("Sharbert! kerfuffle."), "Sharbert! kerfuffle.");
    }

    #[test]
    fn length_is_counted_in_characters() {
        assert!(!is_too_long(&"a".repeat(MAX_CHIRP_LEN)));
        assert!(is_too_long(&"a".repeat(MAX_CHIRP_LEN + 1)));
        assert!(!is_too_long(&"é".repeat(MAX_CHIRP_LEN)));
    }
}

use rand::Rng;

pub const ARTICLE_PREFIX: &str = "PM-";
const ARTICLE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ARTICLE_LEN: usize = 6;

/// Random article code such as `PM-7KQ2ZD`. Uniqueness is enforced by the
/// store, which retries on collision.
pub fn generate_article<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..ARTICLE_LEN)
        .map(|_| ARTICLE_ALPHABET[rng.gen_range(0..ARTICLE_ALPHABET.len())] as char)
        .collect();
    format!("{ARTICLE_PREFIX}{suffix}")
}

pub fn is_valid_article(article: &str) -> bool {
    article
        .strip_prefix(ARTICLE_PREFIX)
        .is_some_and(|rest| {
            rest.len() == ARTICLE_LEN && rest.bytes().all(|b| ARTICLE_ALPHABET.contains(&b))
        })
}

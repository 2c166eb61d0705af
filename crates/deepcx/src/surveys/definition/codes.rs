use rand::Rng;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_SUFFIX_LEN: usize = 7;

pub const SURVEY_CODE_PREFIX: char = 'S';
pub const INSTANCE_CODE_PREFIX: char = 'I';

/// `prefix` followed by seven characters drawn uniformly from `[A-Z0-9]`.
///
/// Uniqueness is enforced by the store; callers retry on conflict.
pub fn generate_code(prefix: char) -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(1 + CODE_SUFFIX_LEN);
    code.push(prefix);
    for _ in 0..CODE_SUFFIX_LEN {
        let index = rng.gen_range(0..CODE_ALPHABET.len());
        code.push(char::from(CODE_ALPHABET[index]));
    }
    code
}

pub fn generate_survey_code() -> String {
    generate_code(SURVEY_CODE_PREFIX)
}

pub fn generate_instance_code() -> String {
    generate_code(INSTANCE_CODE_PREFIX)
}

/// Shape check for codes arriving in public URLs.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == 1 + CODE_SUFFIX_LEN
        && code
            .bytes()
            .all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit())
}

use getrandom::getrandom;

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_WIDTH: usize = 4;
const ID_SUFFIX_SPACE: u32 = 36u32.pow(ID_SUFFIX_WIDTH as u32);

pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-' or '_'"
    ))
}

fn base36_encode_u64(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.into_iter().rev().collect()
}

fn base36_encode_fixed_u32(mut value: u32, width: usize) -> String {
    let mut digits = vec!['0'; width];
    for slot in (0..width).rev() {
        digits[slot] = BASE36_ALPHABET[(value % 36) as usize] as char;
        value /= 36;
    }
    digits.into_iter().collect()
}

pub fn generate_record_id(prefix: &str, now_millis: i64) -> Result<String, String> {
    let timestamp = u64::try_from(now_millis)
        .map_err(|_| format!("{prefix} id requires a non-negative timestamp"))?;
    let mut bytes = [0_u8; 4];
    getrandom(&mut bytes)
        .map_err(|err| format!("{prefix} id randomness unavailable: {err}"))?;
    let sample = u32::from_le_bytes(bytes) % ID_SUFFIX_SPACE;
    Ok(format!(
        "{prefix}-{}-{}",
        base36_encode_u64(timestamp),
        base36_encode_fixed_u32(sample, ID_SUFFIX_WIDTH)
    ))
}

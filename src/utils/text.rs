/// Normalizes a free-text answer for comparison: trims, collapses inner
/// whitespace, lowercases and strips the accents of Latin letters.
pub fn normalize_answer(input: &str) -> String {
    let mut result = String::with_capacity(input.len());

    for word in input.split_whitespace() {
        if !result.is_empty() {
            result.push(' ');
        }
        for c in word.chars() {
            for lower in c.to_lowercase() {
                result.push(fold_diacritic(lower));
            }
        }
    }

    result
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Parses a decimal number written with either `.` or `,` as separator.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

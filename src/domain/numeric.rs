/// Lenient number parsing for form inputs.
///
/// Skips leading whitespace and reads the longest prefix that forms a decimal
/// number (optional sign, digits, optional fraction, optional exponent), or
/// `Infinity`. Trailing text is ignored. Anything without a numeric prefix
/// yields NaN rather than an error.
pub fn parse_float_loose(input: &str) -> f64 {
    let trimmed = input.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };

    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    let bytes = rest.as_bytes();
    let count_digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let int_digits = count_digits(0);
    let mut end = int_digits;
    let mut mantissa_digits = int_digits;

    if bytes.get(end) == Some(&b'.') {
        let frac_digits = count_digits(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
            mantissa_digits += frac_digits;
        }
    }

    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_digits = count_digits(exp_start.min(bytes.len()));
        if exp_digits > 0 {
            end = exp_start + exp_digits;
        }
    }

    rest[..end]
        .parse::<f64>()
        .map(|value| sign * value)
        .unwrap_or(f64::NAN)
}

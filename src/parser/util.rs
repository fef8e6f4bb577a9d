/// Cooks the raw text between the quotes of a string or template literal.
pub fn unescape_string(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => return Err("Invalid escape at end of string".to_string()),
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' if !matches!(chars.peek(), Some(d) if d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(code_point(&hex, 2)?);
            }
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(h) => hex.push(h),
                            None => return Err("Unterminated Unicode escape".to_string()),
                        }
                    }
                    out.push(code_point(&hex, hex.len().max(1))?);
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    let unit = parse_hex(&hex, 4)?;
                    if (0xD800..0xDC00).contains(&unit) {
                        // High surrogate; try to pair it with a following \uXXXX.
                        let rest: String = chars.clone().take(6).collect();
                        if rest.starts_with("\\u") {
                            if let Ok(low) = parse_hex(&rest[2..], 4) {
                                if (0xDC00..0xE000).contains(&low) {
                                    for _ in 0..6 {
                                        chars.next();
                                    }
                                    let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                                    out.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
                                    continue;
                                }
                            }
                        }
                        out.push('\u{FFFD}');
                    } else {
                        out.push(char::from_u32(unit).unwrap_or('\u{FFFD}'));
                    }
                }
            }
            // Line continuation.
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn parse_hex(hex: &str, expected_len: usize) -> Result<u32, String> {
    if hex.len() != expected_len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Invalid hexadecimal escape sequence: {}", hex));
    }
    u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
}

fn code_point(hex: &str, expected_len: usize) -> Result<char, String> {
    let value = parse_hex(hex, expected_len)?;
    char::from_u32(value).ok_or_else(|| format!("Undefined Unicode code-point: {}", hex))
}

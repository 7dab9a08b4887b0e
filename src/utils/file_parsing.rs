/// Removes one pair of matching single or double quotes around `s`.
pub fn strip_surrounding_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Splits a comma separated line, keeping commas that sit inside quotes.
/// Tokens are trimmed but quotes are left in place.
pub fn split_csv_preserving_quotes(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in line.trim().chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ',' => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            None => current.push(c),
        }
    }
    tokens.push(current.trim().to_string());
    tokens
}

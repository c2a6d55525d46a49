//! Quote-aware tokenizer and its inverse.

/// Split a line into a verb and its arguments.
///
/// A `"` toggles quoting unless the previous input character is `\`, in
/// which case the backslash is replaced by a literal quote. An unquoted
/// space ends the current token. The first non-empty token ends up as the
/// verb; every later token, empty ones included, is an argument. Finally
/// each token loses one pair of surrounding quotes and any `\"` left over
/// becomes `"`.
pub fn tokenize(line: &str) -> (String, Vec<String>) {
    let mut verb = String::new();
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for c in line.chars() {
        match c {
            '"' if prev == Some('\\') => {
                current.pop();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                push_token(std::mem::take(&mut current), &mut verb, &mut args);
            }
            _ => current.push(c),
        }
        prev = Some(c);
    }

    if !current.is_empty() {
        push_token(current, &mut verb, &mut args);
    }

    let verb = unquote(&verb);
    let args = args.iter().map(|a| unquote(a)).collect();
    (verb, args)
}

fn push_token(token: String, verb: &mut String, args: &mut Vec<String>) {
    if verb.is_empty() {
        *verb = token;
    } else {
        args.push(token);
    }
}

fn unquote(token: &str) -> String {
    let inner = if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        &token[1..token.len() - 1]
    } else {
        token
    };
    inner.replace("\\\"", "\"")
}

/// Serialize arguments into a line fragment that [`tokenize`] reads back.
///
/// Every argument is wrapped in quotes with embedded quotes escaped.
pub fn encode<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|a| format!("\"{}\"", a.as_ref().replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

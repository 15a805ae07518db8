use indexmap::IndexMap;

/// Per-field annotation record: `key:"value"` pairs in the conventional
/// struct-tag syntax, e.g. `json:"name,omitempty" required:"true" min:"1"`.
///
/// Parsing is permissive. Malformed input ends the scan and whatever was read
/// up to that point is kept. A key that appears twice keeps its first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: IndexMap<String, String>,
}

/// Comma-separated options that follow the name in a `json` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonOptions(String);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(src: &str) -> Self {
        let mut entries = IndexMap::new();
        let mut rest = src;
        while !rest.is_empty() {
            rest = rest.trim_start_matches(' ');
            let key_len = rest
                .bytes()
                .take_while(|&b| b > b' ' && b != b':' && b != b'"' && b != 0x7f)
                .count();
            let bytes = rest.as_bytes();
            if key_len == 0 || key_len + 1 >= bytes.len() || bytes[key_len] != b':' || bytes[key_len + 1] != b'"' {
                break;
            }
            let key = &rest[..key_len];
            let Some((value, tail)) = scan_quoted(&rest[key_len + 1..]) else {
                break;
            };
            entries.entry(key.to_string()).or_insert(value);
            rest = tail;
        }
        Self { entries }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.entry(key.into()).or_insert_with(|| value.into());
        self
    }

    /// Value for `key`; presence matters even when the value is empty.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value for `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.lookup(key).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split the `json` tag into the external name and its options.
    pub fn json(&self) -> (&str, JsonOptions) {
        let tag = self.get("json");
        match tag.split_once(',') {
            Some((name, opts)) => (name, JsonOptions(opts.to_string())),
            None => (tag, JsonOptions::default()),
        }
    }
}

impl JsonOptions {
    pub fn contains(&self, option: &str) -> bool {
        !self.0.is_empty() && self.0.split(',').any(|o| o == option)
    }
}

/// Read one double-quoted value from the front of `s`, returning the unescaped
/// value and the remainder.
fn scan_quoted(s: &str) -> Option<(String, &str)> {
    let mut chars = s.char_indices();
    if !matches!(chars.next(), Some((_, '"'))) {
        return None;
    }
    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &s[i + 1..])),
            '\\' => match chars.next()?.1 {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                other => out.push(other),
            },
            other => out.push(other),
        }
    }
    None
}

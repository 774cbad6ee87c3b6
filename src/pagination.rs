use url::form_urlencoded;
use url::Url;

pub fn next_offset(current: u64, step: u64) -> u64 {
    current + step
}

pub fn prev_offset(current: u64, step: u64) -> u64 {
    current.saturating_sub(step)
}

// Read an offset parameter out of a URL fragment treated as a query string.
// A missing or non-numeric value reads as 0.
pub fn fragment_offset(url: &Url, key: &str) -> u64 {
    offset_from_pairs(url.fragment().unwrap_or(""), key)
}

pub fn query_offset(url: &Url, key: &str) -> u64 {
    offset_from_pairs(url.query().unwrap_or(""), key)
}

pub fn with_fragment_offset(url: &Url, key: &str, value: u64) -> Url {
    let rewritten = set_pair(url.fragment().unwrap_or(""), key, value);
    let mut next = url.clone();
    next.set_fragment(Some(&rewritten));
    next
}

pub fn with_query_offset(url: &Url, key: &str, value: u64) -> Url {
    let rewritten = set_pair(url.query().unwrap_or(""), key, value);
    let mut next = url.clone();
    next.set_query(Some(&rewritten));
    next
}

pub fn shift_fragment_offset(url: &Url, key: &str, step: u64, forward: bool) -> Url {
    let current = fragment_offset(url, key);
    let value = if forward {
        next_offset(current, step)
    } else {
        prev_offset(current, step)
    };
    with_fragment_offset(url, key, value)
}

pub fn shift_query_offset(url: &Url, key: &str, step: u64, forward: bool) -> Url {
    let current = query_offset(url, key);
    let value = if forward {
        next_offset(current, step)
    } else {
        prev_offset(current, step)
    };
    with_query_offset(url, key, value)
}

fn offset_from_pairs(pairs: &str, key: &str) -> u64 {
    form_urlencoded::parse(pairs.as_bytes())
        .find(|(name, _)| name == key)
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(0)
}

// Rewrite one key, preserving every other parameter and their order.
fn set_pair(pairs: &str, key: &str, value: u64) -> String {
    let mut rewritten: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (name, old) in form_urlencoded::parse(pairs.as_bytes()) {
        if name == key {
            rewritten.push((key.to_string(), value.to_string()));
            replaced = true;
        } else {
            rewritten.push((name.into_owned(), old.into_owned()));
        }
    }
    if !replaced {
        rewritten.push((key.to_string(), value.to_string()));
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(rewritten);
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_arithmetic() {
        assert_eq!(next_offset(24, 12), 36);
        assert_eq!(prev_offset(24, 12), 12);
        assert_eq!(prev_offset(0, 12), 0);
        assert_eq!(prev_offset(5, 12), 0);
    }

    #[test]
    fn fragment_offset_reads_missing_as_zero() {
        let url = Url::parse("https://example.com/dir#sort=relevancy").unwrap();
        assert_eq!(fragment_offset(&url, "first"), 0);

        let url = Url::parse("https://example.com/dir").unwrap();
        assert_eq!(fragment_offset(&url, "first"), 0);
    }

    #[test]
    fn shift_fragment_forward_and_back() {
        let url = Url::parse("https://example.com/dir#first=24&sort=relevancy").unwrap();

        let next = shift_fragment_offset(&url, "first", 12, true);
        assert_eq!(fragment_offset(&next, "first"), 36);

        let prev = shift_fragment_offset(&url, "first", 12, false);
        assert_eq!(fragment_offset(&prev, "first"), 12);
    }

    #[test]
    fn shift_clamps_at_zero() {
        let url = Url::parse("https://example.com/dir#first=4").unwrap();
        let prev = shift_fragment_offset(&url, "first", 12, false);
        assert_eq!(fragment_offset(&prev, "first"), 0);
    }

    #[test]
    fn shift_preserves_other_fragment_params() {
        let url = Url::parse("https://example.com/dir#first=12&sort=relevancy&f=Staff").unwrap();
        let next = shift_fragment_offset(&url, "first", 12, true);

        assert_eq!(fragment_offset(&next, "first"), 24);
        let fragment = next.fragment().unwrap();
        assert!(fragment.contains("sort=relevancy"));
        assert!(fragment.contains("f=Staff"));
    }

    #[test]
    fn missing_key_is_appended_on_shift() {
        let url = Url::parse("https://example.com/dir#sort=relevancy").unwrap();
        let next = shift_fragment_offset(&url, "first", 12, true);
        assert_eq!(fragment_offset(&next, "first"), 12);
        assert!(next.fragment().unwrap().contains("sort=relevancy"));
    }

    #[test]
    fn query_variant_shifts_start_param() {
        let url = Url::parse("https://example.com/list?start=12&dept=13540").unwrap();

        let next = shift_query_offset(&url, "start", 12, true);
        assert_eq!(query_offset(&next, "start"), 24);
        assert!(next.query().unwrap().contains("dept=13540"));

        let prev = shift_query_offset(&url, "start", 24, false);
        assert_eq!(query_offset(&prev, "start"), 0);
    }

    #[test]
    fn set_fragment_offset_directly() {
        let url = Url::parse("https://example.com/dir#first=24&sort=relevancy").unwrap();
        let jumped = with_fragment_offset(&url, "first", 48);
        assert_eq!(fragment_offset(&jumped, "first"), 48);
    }
}

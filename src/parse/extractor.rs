use once_cell::sync::Lazy;
use regex::Regex;

/// Which certificate field a page is scanned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    CommonName,
    San,
}

// crt.sh renders `commonName&nbsp;=&nbsp;example.com<BR>` in its certificate dump
static COMMON_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)commonName(?:\s|&nbsp;)*=(?:\s|&nbsp;)*(.*?)<br\s*/?>").expect("common name regex")
});

static DNS_SAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)DNS:(?:\s|&nbsp;)*(.*?)<br\s*/?>").expect("dns san regex")
});

/// Pull raw name candidates of `kind` out of a certificate detail page.
///
/// For [`NameKind::CommonName`] the first match is dropped: the issuer block
/// precedes the subject block, so it is always the CA's own name.
pub fn extract(body: &str, kind: NameKind) -> Vec<String> {
    let (re, skip) = match kind {
        NameKind::CommonName => (&*COMMON_NAME_RE, 1),
        NameKind::San => (&*DNS_SAN_RE, 0),
    };
    re.captures_iter(body)
        .skip(skip)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

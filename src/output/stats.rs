use ahash::AHashMap;

use crate::concurrent::ResultSet;

/// Count names per registrable domain (eTLD+1), most frequent first.
pub fn domain_statistics(names: &ResultSet) -> Vec<(String, usize)> {
    let mut counts: AHashMap<String, usize> = AHashMap::new();
    for name in names {
        let host = name.trim_start_matches("*.");
        match psl::domain_str(host) {
            Some(domain) => *counts.entry(domain.to_string()).or_insert(0) += 1,
            None => tracing::warn!(name = %name, "no registrable domain, skipping"),
        }
    }

    let mut out: Vec<(String, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

pub fn log_statistics(names: &ResultSet) {
    for (domain, occurrences) in domain_statistics(names) {
        tracing::info!(domain = %domain, occurrences, " . . . ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_by_registrable_domain() {
        let names: ResultSet = ["www.example.com", "*.api.example.com", "shop.example.co.uk", "example.co.uk", "intranet"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let stats = domain_statistics(&names);
        assert_eq!(stats[0], ("example.co.uk".to_string(), 2));
        assert_eq!(stats[1], ("example.com".to_string(), 2));
        assert_eq!(stats.len(), 2);
    }
}

use san_crawler::parse::{extract, NameKind};

fn page(common_names: &[&str], sans: &[&str]) -> String {
    let mut body = String::from("<TABLE><TR><TD>");
    for cn in common_names {
        body.push_str(&format!("&nbsp;&nbsp;&nbsp;&nbsp;commonName&nbsp;=&nbsp;{}<BR>", cn));
    }
    for san in sans {
        body.push_str(&format!("&nbsp;&nbsp;&nbsp;&nbsp;DNS:{}<BR>", san));
    }
    body.push_str("</TD></TR></TABLE>");
    body
}

#[test]
fn common_names_drop_the_first_occurrence() {
    let body = page(&["Let's Encrypt R3", "Example.com", "mail.example.com"], &[]);
    assert_eq!(extract(&body, NameKind::CommonName), vec!["Example.com", "mail.example.com"]);

    assert!(extract(&page(&["Only Issuer"], &[]), NameKind::CommonName).is_empty());
    assert!(extract(&page(&[], &[]), NameKind::CommonName).is_empty());
}

#[test]
fn every_dns_san_is_kept() {
    let body = page(&["Issuer"], &["a.example.com", "b.example.com", "*.example.com"]);
    assert_eq!(
        extract(&body, NameKind::San),
        vec!["a.example.com", "b.example.com", "*.example.com"]
    );
}

#[test]
fn matching_is_case_insensitive() {
    let body = "COMMONNAME = issuer<br>commonname = Subject.Example<br>dns:x.example<BR>";
    assert_eq!(extract(body, NameKind::CommonName), vec!["Subject.Example"]);
    assert_eq!(extract(body, NameKind::San), vec!["x.example"]);
}

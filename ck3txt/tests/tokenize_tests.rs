use ck3txt::{Ck3Txt, Ck3TxtToken, DefaultCk3Txt, read_block};
use std::io::Write;
use tempfile::NamedTempFile;

fn tokenize_file(bytes: &[u8]) -> Vec<Ck3TxtToken> {
    let mut file = NamedTempFile::new().expect("TempFile");
    file.write_all(bytes).expect("Write");
    DefaultCk3Txt::open_txt(file.path()).expect("Tokenize")
}

#[test]
fn test_landed_titles_snippet() {
    let data = br#"
        c_test = {
            color = { 10 20 30 }   # county color
            b_test = {
                province = 42
            }
        }
    "#;
    let tokens = tokenize_file(data);
    assert_eq!(tokens[0], Ck3TxtToken::Identifier("c_test".to_string()));
    let (inner, next) = read_block(&tokens, 2).unwrap();
    assert_eq!(next, tokens.len());
    assert!(inner.contains(&Ck3TxtToken::IntValue(42)));
    assert!(!inner.iter().any(|t| matches!(t, Ck3TxtToken::Identifier(s) if s == "county")));
}

#[test]
fn test_default_map_snippet() {
    let data = b"sea_zones = RANGE { 10 15 }\nlakes = LIST { 3 4 } # trailing\n";
    let tokens = tokenize_file(data);
    assert_eq!(
        tokens[..4],
        [
            Ck3TxtToken::Identifier("sea_zones".to_string()),
            Ck3TxtToken::Equals,
            Ck3TxtToken::Identifier("RANGE".to_string()),
            Ck3TxtToken::LeftBrace,
        ]
    );
    assert_eq!(tokens.len(), 14);
}

#[test]
fn test_windows_1252_file() {
    let data = b"name = \"M\xFCnster\"";
    let tokens = tokenize_file(data);
    assert_eq!(tokens[2], Ck3TxtToken::StringValue("M\u{fc}nster".to_string()));
}

#[test]
fn test_utf8_bom_file() {
    let data = "\u{feff}k_france = { }".as_bytes();
    let tokens = tokenize_file(data);
    assert_eq!(tokens[0].as_identifier(), Some("k_france"));
}

#[test]
fn test_empty_file() {
    assert!(tokenize_file(b"").is_empty());
}

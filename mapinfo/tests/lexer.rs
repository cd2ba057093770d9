use mapinfo::{LexOptions, Lexer, TextLoc, Token, TokenKind, tokenize, tokenize_with};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("tokenize failed")
        .iter()
        .map(|t| t.kind)
        .collect()
}

fn texts<'s>(source: &'s str, tokens: &[Token]) -> Vec<&'s str> {
    tokens.iter().map(|t| t.text(source)).collect()
}

fn numbers(source: &str) -> Vec<f32> {
    tokenize(source)
        .expect("tokenize failed")
        .iter()
        .map(|t| {
            assert_eq!(t.kind, TokenKind::Number, "not a number token");
            t.number
        })
        .collect()
}

fn lex_error(source: &str) -> String {
    tokenize(source).expect_err("expected a lexical error").to_string()
}

#[test]
fn token_kinds() {
    use TokenKind::*;
    assert_eq!(
        kinds("Map 1 \"E1M1\" { Music = 5, true }"),
        vec![
            Identifier, Number, String, OpenBlock, Identifier, Equals, Number, NextValue, True,
            CloseBlock
        ]
    );
    assert!(kinds("").is_empty());
    assert!(kinds("  \t\r\n  ").is_empty());
}

#[test]
fn string_text_excludes_quotes() {
    let source = "\"E1M1\" \"\" Name";
    let tokens = tokenize(source).unwrap();
    assert_eq!(texts(source, &tokens), vec!["E1M1", "", "Name"]);
    assert_eq!(tokens[0].size(), 6);
    assert_eq!(tokens[0].span(), 0..6);
    assert_eq!(tokens[0].text_range(), 1..5);
    assert_eq!(tokens[1].size(), 2);
}

#[test]
fn strings_keep_inner_characters_verbatim() {
    let source = r#""Hell's {Gate}, = 2" "a\b""#;
    let tokens = tokenize(source).unwrap();
    assert_eq!(texts(source, &tokens), vec!["Hell's {Gate}, = 2", r"a\b"]);
}

#[test]
fn locations_track_lines_and_columns() {
    let source = "Map\n  Music = 1\n\n}";
    let tokens = tokenize(source).unwrap();

    assert_eq!(tokens[0].begin, TextLoc::new(0, 0, 0));
    assert_eq!(tokens[0].end, TextLoc::new(0, 3, 3));
    assert_eq!(tokens[1].begin, TextLoc::new(1, 2, 6));
    assert_eq!(tokens[1].end, TextLoc::new(1, 7, 11));
    assert_eq!(tokens[2].begin, TextLoc::new(1, 8, 12));
    assert_eq!(tokens[3].begin, TextLoc::new(1, 10, 14));
    assert_eq!(tokens[4].begin, TextLoc::new(3, 0, 17));
}

#[test]
fn number_forms() {
    assert_eq!(
        numbers("5 -5 +2.5 0x1F 0X1f .5 1e3 2.5E-1 -0x10 3. -.25"),
        vec![5.0, -5.0, 2.5, 31.0, 31.0, 0.5, 1000.0, 0.25, -16.0, 3.0, -0.25]
    );
}

#[test]
fn non_number_tokens_have_zero_value() {
    let tokens = tokenize("Map \"12\" true =").unwrap();
    assert!(tokens.iter().all(|t| t.number == 0.0));
}

#[test]
fn booleans_are_case_insensitive() {
    use TokenKind::*;
    assert_eq!(
        kinds("true TRUE tRuE false FALSE trueish false_ _true"),
        vec![True, True, True, False, False, Identifier, Identifier, Identifier]
    );
}

#[test]
fn identifiers() {
    let source = "_Map E1M1 no_intermission x";
    let tokens = tokenize(source).unwrap();
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Identifier));
    assert_eq!(texts(source, &tokens), vec!["_Map", "E1M1", "no_intermission", "x"]);
}

#[test]
fn comments_are_skipped() {
    let source = "// header comment\nMap /* spans\n lines */ 1 // trailing";
    let tokens = tokenize(source).unwrap();
    assert_eq!(texts(source, &tokens), vec!["Map", "1"]);
    assert_eq!(tokens[0].begin, TextLoc::new(1, 0, 18));
    assert_eq!(tokens[1].begin.line, 2);
    assert_eq!(tokens[1].begin.column, 10);
}

#[test]
fn comments_can_be_disabled() {
    let options = LexOptions {
        line_comments: false,
        ..LexOptions::default()
    };
    let err = tokenize_with("Map // x", &options).unwrap_err();
    assert_eq!(err.message, "Unexpected character '/'!");
    assert_eq!((err.line(), err.column()), (1, 5));

    let options = LexOptions {
        block_comments: false,
        ..LexOptions::default()
    };
    assert!(tokenize_with("/* x */", &options).is_err());
    assert_eq!(tokenize_with("// still fine", &options).unwrap().len(), 0);
}

#[test]
fn hex_can_be_disabled() {
    let options = LexOptions {
        hex_numbers: false,
        ..LexOptions::default()
    };
    let err = tokenize_with("0x10", &options).unwrap_err();
    assert_eq!(err.message, "Invalid number '0x10'!");
}

#[test]
fn unexpected_character() {
    assert_eq!(
        lex_error("Map\n  @"),
        "Error parsing MAPINFO at line 2 column 3!\nUnexpected character '@'!"
    );
    assert!(lex_error("Map ;").contains("Unexpected character ';'!"));
    assert!(lex_error("- 5").contains("Unexpected character '-'!"));
    assert!(lex_error("Map é").contains("Unexpected character 'é'!"));
}

#[test]
fn unterminated_string_reports_opening_quote() {
    let err = tokenize("Map \"Hangar\n}").unwrap_err();
    assert_eq!(err.message, "Unterminated string!");
    assert_eq!(err.loc, TextLoc::new(0, 4, 4));

    assert!(tokenize("\"abc").is_err());
}

#[test]
fn unterminated_block_comment() {
    let err = tokenize("Map\n/* never closed").unwrap_err();
    assert_eq!(err.message, "Unterminated block comment!");
    assert_eq!((err.line(), err.column()), (2, 1));
}

#[test]
fn malformed_numbers() {
    assert_eq!(tokenize("12abc").unwrap_err().message, "Invalid number '12abc'!");
    assert_eq!(tokenize("1e").unwrap_err().message, "Invalid number '1e'!");
    assert!(tokenize("0x").is_err());

    let err = tokenize("Map 1.2.3").unwrap_err();
    assert_eq!(err.message, "Invalid number '1.2.3'!");
    assert_eq!(err.span, 4..9);
    assert_eq!(tokenize("0x1F.5").unwrap_err().message, "Invalid number '0x1F.5'!");
    assert_eq!(tokenize("1..").unwrap_err().message, "Invalid number '1..'!");
}

#[test]
fn out_of_range_numbers() {
    let err = tokenize("0x1FFFFFFFFFFFFFFFF").unwrap_err();
    assert_eq!(err.message, "Hex number is too large!");
    assert_eq!(err.span, 0..19);

    let err = tokenize("x = 1e99999").unwrap_err();
    assert_eq!(err.message, "Invalid number '1e99999'!");
    assert_eq!(err.span, 4..11);
}

#[test]
fn leading_byte_order_mark_is_skipped() {
    let source = "\u{feff}Map 1";
    let tokens = tokenize(source).unwrap();
    assert_eq!(texts(source, &tokens), ["Map", "1"]);
    assert_eq!(tokens[0].begin, TextLoc::new(0, 0, 3));

    // Only at the very start.
    assert!(lex_error("Map \u{feff}").contains("Unexpected character"));
}

#[test]
fn lexer_keeps_returning_null() {
    let mut lexer = Lexer::new("Map", LexOptions::default(), 0);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    for _ in 0..3 {
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Null);
        assert_eq!(token.begin, TextLoc::new(0, 3, 3));
        assert_eq!(token.size(), 0);
    }
}

#[test]
fn spans_reassemble_the_source() {
    let source = "Map 1 \"E1M1\"\n{\n\tMusic = 5, -2.5 , \"x\"\n\tNoIntermission\n}\n";
    let tokens = tokenize(source).unwrap();

    let mut rebuilt = String::new();
    let mut last = 0;
    for token in &tokens {
        assert!(token.begin.offset >= last, "token ranges must not overlap");
        rebuilt.push_str(&source[last..token.begin.offset]);
        rebuilt.push_str(&source[token.span()]);
        last = token.end.offset;
    }
    rebuilt.push_str(&source[last..]);

    assert_eq!(rebuilt, source);
}

#[test]
fn options_deserialize_from_toml() {
    let options: LexOptions = toml::from_str("line_comments = false").unwrap();
    assert_eq!(
        options,
        LexOptions {
            line_comments: false,
            block_comments: true,
            hex_numbers: true,
        }
    );
    assert_eq!(toml::from_str::<LexOptions>("").unwrap(), LexOptions::default());
    assert!(toml::from_str::<LexOptions>("nesting = true").is_err());
}

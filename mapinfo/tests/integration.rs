use mapinfo::{Document, LexOptions, ParseError, Parser, SmallString, TextLoc, TokenKind};

const SAMPLE: &str = r#"
// Episodes
Episode 1 "Ultimate Doom" {
    StartMap = 1
}

Map 1 "E1M1" true {
    Music = 5
    NoIntermission
    SpecialAction = 3, "Open", true
    "Sky Texture" = SKY1
    Cluster = "Knee Deep"
    Par = 30.5
    Secret = false
}

map 2 "Nuclear Plant" {
}

Defaults {
}
"#;

fn parse(source: &str) -> Document {
    mapinfo::parse(source).expect("parse failed")
}

fn parse_error(source: &str) -> ParseError {
    mapinfo::parse(source).expect_err("expected a parse error")
}

#[test]
fn blocks_in_document_order() {
    let doc = parse(SAMPLE);
    let types: Vec<&str> = doc.blocks().map(|b| b.type_name()).collect();
    assert_eq!(types, vec!["Episode", "Map", "map", "Defaults"]);
    assert_eq!(doc.block_count(), 4);
    assert!(doc.block(4).is_none());
}

#[test]
fn blocks_of_type_ignores_case() {
    let doc = parse(SAMPLE);
    let maps: Vec<i32> = doc
        .blocks_of_type("MAP")
        .map(|b| b.required_header_int(0).unwrap())
        .collect();
    assert_eq!(maps, vec![1, 2]);
    assert_eq!(doc.blocks_of_type("Cluster").count(), 0);
}

#[test]
fn required_header_accessors() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();

    assert_eq!(map.header_token_count(), 3);
    assert_eq!(map.required_header_int(0).unwrap(), 1);
    assert_eq!(map.required_header_str(1).unwrap(), "E1M1");
    assert_eq!(
        map.required_header_small_string::<32>(1).unwrap(),
        SmallString::<32>::new("E1M1")
    );
    assert_eq!(map.required_header_number(2).unwrap(), 1.0);
    assert!(map.ensure_min_header_token_count(3).is_ok());
}

#[test]
fn header_tokens_are_optional_lookups() {
    let doc = parse(SAMPLE);
    let defaults = doc.block(3).unwrap();

    assert_eq!(defaults.header_token_count(), 0);
    assert!(defaults.header_token(0).is_none());
    assert!(defaults.block().header.is_none());
    assert!(defaults.block().values.is_none());

    let map = doc.block(1).unwrap();
    let texts: Vec<&str> = map.header_tokens().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["1", "E1M1", "true"]);
    assert_eq!(map.header_token(1).unwrap().kind(), TokenKind::String);
    assert!(map.header_token(3).is_none());
}

#[test]
fn required_header_out_of_range_is_fatal() {
    let doc = parse(SAMPLE);
    for block in doc.blocks() {
        let count = block.header_token_count();
        assert!(block.required_header_token(count).is_err());
    }

    let episode = doc.block(0).unwrap();
    let err = episode.required_header_token(2).unwrap_err();
    // Reported at the end of the block's type name.
    assert_eq!(err.loc, TextLoc::new(2, 7, 20));
    assert_eq!(
        err.to_string(),
        "Error parsing MAPINFO at line 3 column 8!\n'Episode' block has an invalid header! Missing header value 3."
    );

    let err = episode.ensure_min_header_token_count(5).unwrap_err();
    assert!(err.message.contains("Expected at least 5 header value(s) but found 2."));
}

#[test]
fn required_header_number_rejects_text() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();
    let err = map.required_header_number(1).unwrap_err();
    assert!(err.message.contains("Header value 2 must be a number but found a string."));
    assert!(map.required_header_int(1).is_err());
    // Numbers still have text.
    assert_eq!(map.required_header_str(0).unwrap(), "1");
}

#[test]
fn block_error_points_at_block_start() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();
    let err = map.error("Invalid map number!");
    assert_eq!((err.line(), err.column()), (7, 1));
    assert_eq!(err.span, map.type_token().token().span());
}

#[test]
fn flag_values_read_as_one() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();

    assert_eq!(map.single_number_value("NoIntermission", 0.0), 1.0);
    assert_eq!(map.single_int_value("nointermission", 0), 1);
    assert!(map.value("NoIntermission").unwrap().next_data().is_none());
    // A flag has no string payload.
    assert_eq!(map.single_str_value("NoIntermission", "none"), "none");
}

#[test]
fn single_values_with_defaults() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();

    assert_eq!(map.single_int_value("Music", -1), 5);
    assert_eq!(map.single_int_value("Absent", -1), -1);
    assert_eq!(map.single_number_value("Par", 0.0), 30.5);
    assert_eq!(map.single_int_value("Par", 0), 30);
    assert_eq!(map.single_number_value("Secret", 7.0), 0.0);
    assert_eq!(map.single_str_value("Cluster", ""), "Knee Deep");
    assert_eq!(map.single_str_value("sky texture", ""), "SKY1");
    assert_eq!(map.single_str_value("Absent", "fallback"), "fallback");
}

#[test]
fn incompatible_data_yields_default() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();

    assert_eq!(map.single_number_value("Cluster", -3.0), -3.0);
    assert_eq!(map.single_int_value("Sky Texture", 9), 9);
}

#[test]
fn multi_valued_assignment_reads_first_entry() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();

    assert_eq!(map.single_number_value("SpecialAction", 0.0), 3.0);
    assert_eq!(map.single_str_value("SpecialAction", ""), "3");

    let value = map.value("SpecialAction").unwrap();
    let data: Vec<(TokenKind, &str)> = value.data().map(|t| (t.kind(), t.text())).collect();
    assert_eq!(
        data,
        vec![
            (TokenKind::Number, "3"),
            (TokenKind::String, "Open"),
            (TokenKind::True, "true"),
        ]
    );
    assert_eq!(value.num_data_tokens_ahead(), 3);
}

#[test]
fn value_lookup_is_case_insensitive_and_exact_length() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();

    assert!(map.value("MUSIC").is_some());
    assert!(map.value("Musi").is_none());
    assert!(map.value("MusicX").is_none());
    assert!(map.value("").is_none());
}

#[test]
fn value_chain_in_order() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();

    let names: Vec<&str> = map.values().map(|t| t.text()).collect();
    assert_eq!(
        names,
        vec!["Music", "NoIntermission", "SpecialAction", "Sky Texture", "Cluster", "Par", "Secret"]
    );
    assert_eq!(map.values().next().unwrap().num_tokens_ahead(), 6);
}

#[test]
fn small_string_values_truncate() {
    let doc = parse(SAMPLE);
    let map = doc.block(1).unwrap();
    let default = SmallString::<4>::new("none");

    assert_eq!(map.single_small_string_value("Cluster", &default), "Knee");
    assert_eq!(map.single_small_string_value("Absent", &default), "none");
    assert_eq!(map.required_header_small_string::<2>(1).unwrap(), "E1");
}

#[test]
fn token_text_equality() {
    let doc = parse("Map \"MAP\" Maps {}");
    let map = doc.block(0).unwrap();

    assert!(map.type_token().text_eq_ignore_case("MAP"));
    assert!(map.type_token().text_eq_ignore_case("map"));
    assert!(!map.type_token().text_eq_ignore_case("Maps"));
    assert!(map.header_token(0).unwrap().text_eq_ignore_case("Map"));
    assert!(!map.header_token(1).unwrap().text_eq_ignore_case("Map"));
}

#[test]
fn links_stay_within_the_arena() {
    let doc = parse(SAMPLE);
    let arena = doc.arena();

    for id in (0..arena.len()).filter_map(|i| arena.id(i)) {
        for link in [arena.next(id), arena.next_data(id)].into_iter().flatten() {
            assert!(link > id);
            assert!(link.index() < arena.len());
        }
    }
}

#[test]
fn chains_hold_only_allowed_kinds() {
    let doc = parse(SAMPLE);

    for block in doc.blocks() {
        assert_eq!(block.type_token().kind(), TokenKind::Identifier);
        for header in block.header_tokens() {
            assert!(header.kind().is_literal());
        }
        for value in block.values() {
            assert!(value.kind().is_value_name());
            for data in value.data() {
                assert!(data.kind().is_literal());
            }
        }
    }
}

#[test]
fn token_ranges_increase() {
    let doc = parse(SAMPLE);
    for pair in doc.tokens().windows(2) {
        assert!(pair[0].end.offset <= pair[1].begin.offset);
    }
}

#[test]
fn parsing_is_deterministic() {
    let a = parse(SAMPLE);
    let b = parse(SAMPLE);

    assert_eq!(a.block_count(), b.block_count());
    for (x, y) in a.blocks().zip(b.blocks()) {
        assert_eq!(x.type_name(), y.type_name());
        assert_eq!(x.block(), y.block());
        assert_eq!(x.header_token_count(), y.header_token_count());
        let xv: Vec<usize> = x.values().map(|v| v.num_data_tokens_ahead()).collect();
        let yv: Vec<usize> = y.values().map(|v| v.num_data_tokens_ahead()).collect();
        assert_eq!(xv, yv);
    }
}

#[test]
fn empty_document() {
    let doc = parse("  // nothing here\n");
    assert_eq!(doc.block_count(), 0);
    assert!(doc.tokens().is_empty());
}

#[test]
fn values_without_separators() {
    let doc = parse("Map { Music = 5 Sky = \"SKY2\" Flag }");
    let map = doc.block(0).unwrap();
    assert_eq!(map.single_int_value("Music", 0), 5);
    assert_eq!(map.single_str_value("Sky", ""), "SKY2");
    assert_eq!(map.single_int_value("Flag", 0), 1);
}

#[test]
fn missing_data_after_equals_is_fatal() {
    let err = parse_error("Map { X = }");
    assert_eq!(err.message, "Expected a value after '=' but found '}'!");
    assert_eq!(err.loc, TextLoc::new(0, 9, 9));
}

#[test]
fn trailing_separator_is_fatal() {
    let err = parse_error("Map {\n  X = 1,\n}");
    assert_eq!(err.message, "Expected a value after ',' but found '}'!");
    assert_eq!((err.line(), err.column()), (2, 9));
}

#[test]
fn separator_after_flag_is_fatal() {
    let err = parse_error("Map { X, Y }");
    assert!(err.message.starts_with("Unexpected ',' after a value with no '='!"));
    assert_eq!(err.loc.offset, 7);
}

#[test]
fn nested_blocks_are_rejected() {
    let err = parse_error("Map { Inner { } }");
    assert_eq!(err.message, "Nested blocks are not supported!");
    assert_eq!(err.loc.offset, 12);
}

#[test]
fn end_of_input_inside_block() {
    let err = parse_error("Map 1 {\n  Music = 1\n");
    assert_eq!(
        err.to_string(),
        "Error parsing MAPINFO at line 1 column 4!\nUnexpected end of MAPINFO inside a block! Expected '}'."
    );

    let err = parse_error("Map 1 \"E1M1\"");
    assert!(err.message.starts_with("Unexpected end of MAPINFO while reading a block header!"));
    assert_eq!(err.loc, TextLoc::new(0, 3, 3));

    let err = parse_error("Map { X = ");
    assert_eq!(err.message, "Expected a value after '=' but found end of input!");
}

#[test]
fn structural_errors_at_offending_token() {
    let err = parse_error("\"Map\" { }");
    assert_eq!(err.message, "Expected a block type identifier but found a string!");

    let err = parse_error("Map = 1 { }");
    assert!(err.message.starts_with("Unexpected '=' in block header!"));
    assert_eq!(err.loc.offset, 4);

    let err = parse_error("Map { 5 = 1 }");
    assert_eq!(err.message, "Expected a value name or '}' but found a number!");

    let err = parse_error("Map { } }");
    assert_eq!(err.message, "Expected a block type identifier but found '}'!");
}

#[test]
fn lexical_errors_abort_the_parse() {
    let err = parse_error("Map {\n  Music = @\n}");
    assert_eq!((err.line(), err.column()), (2, 11));
}

#[test]
fn malformed_header_number_is_not_split() {
    let err = parse_error("Map 1.2.3 \"Hangar\" {\n}");
    assert_eq!(err.message, "Invalid number '1.2.3'!");
    assert_eq!((err.line(), err.column()), (1, 5));
}

#[test]
fn token_ids_from_another_document() {
    let large = parse(SAMPLE);
    let small = parse("Map 1 { }");
    let foreign = large.arena().id(large.arena().len() - 1).unwrap();

    assert!(small.token(foreign).is_none());
    assert!(small.arena().get(foreign).is_none());
    assert!(small.arena().next(foreign).is_none());
    assert!(small.arena().next_data(foreign).is_none());

    let first = large.arena().id(0).unwrap();
    assert_eq!(large.token(first).unwrap().text(), "Episode");
}

#[test]
fn parser_carries_file_id_and_options() {
    let options = LexOptions {
        line_comments: false,
        ..LexOptions::default()
    };
    let err = Parser::new("Map { } // x".to_string(), 7)
        .with_options(options)
        .parse()
        .unwrap_err();
    assert_eq!(err.file_id, 7);

    let doc = Parser::new("Map { }".to_string(), 3).parse().unwrap();
    assert_eq!(doc.source_id(), 3);
    assert_eq!(doc.block(0).unwrap().error("x").file_id, 3);
}

#[test]
fn diagnostic_conversion() {
    let err = parse_error("Map { X = }");
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.message, err.message);
    assert_eq!(diagnostic.labels.len(), 1);
    assert_eq!(diagnostic.notes, vec!["Error parsing MAPINFO at line 1 column 10!".to_string()]);
}

#[test]
fn document_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Document>();

    let doc = parse(SAMPLE);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| doc.blocks_of_type("map").count()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    });
}

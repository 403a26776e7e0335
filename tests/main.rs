//! End-to-end coverage spanning the public `chario::csv` and `chario::json` surfaces: the
//! concrete worked scenarios, chunk-size invariance, and the boundary cases that only show up
//! once a reader and a writer are driven together.

use chario::csv::{read_str as read_csv, ColumnFilter, CsvOptions, CsvWriter, NewlineStyle, QuotePolicy};
use chario::json::{read_str as read_json, to_string as write_json, DefaultVisitor, Elide, FilteredVisitor, JSONReader, JsonOptions, Value};
use chario::supplier::{AllocatingSupplier, StrSource};
use chario::{CharReader, LineNumberReader};
use std::collections::BTreeMap;
use std::rc::Rc;

#[test]
fn csv_vehicle_example_round_trips_through_writer() {
    let rows = read_csv("Year,Make,Model\n1997,Ford,E350\n2000,Mercury,Cougar\n", CsvOptions::new()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].iter().map(|f| f.as_deref()).collect::<Vec<_>>(), vec![Some("1997"), Some("Ford"), Some("E350")]);

    let mut w = CsvWriter::new(Vec::new());
    for row in &rows {
        w.write_row(row.iter().map(|f| f.as_deref())).unwrap();
    }
    let text = String::from_utf8(w.into_inner()).unwrap();
    let reparsed = read_csv(&text, CsvOptions::new()).unwrap();
    assert_eq!(rows, reparsed);
}

#[test]
fn csv_quoted_field_with_embedded_newline() {
    let input = "a,\"line one\nline two\",c\n";
    let rows = read_csv(input, CsvOptions::new()).unwrap();
    assert_eq!(rows[0][1].as_deref(), Some("line one\nline two"));
}

#[test]
fn csv_terminator_styles_agree() {
    let expect = vec![vec![Some("a".to_string()), Some("b".to_string())]];
    for input in ["a,b\r\n", "a,b\n", "a,b\r", "a,b"] {
        assert_eq!(read_csv(input, CsvOptions::new()).unwrap(), expect, "failed for {input:?}");
    }
}

#[test]
fn csv_column_allow_list_by_name_after_header() {
    let input = "a,b,c\n1,2,3\n4,5,6\n";
    let opts = CsvOptions::new().with_columns(ColumnFilter::AllowNames(vec!["a".to_string(), "c".to_string()]));
    let rows = read_csv(input, opts).unwrap();
    assert_eq!(rows[1].iter().map(|f| f.as_deref()).collect::<Vec<_>>(), vec![Some("1"), Some("3")]);
    assert_eq!(rows[2].iter().map(|f| f.as_deref()).collect::<Vec<_>>(), vec![Some("4"), Some("6")]);
}

#[test]
fn csv_chunk_size_does_not_change_result() {
    let input = "id,name\n1,alice\n2,bob\n3,carol\n";
    let baseline = read_csv(input, CsvOptions::new()).unwrap();
    for size in [1usize, 2, 7, 1024] {
        let supplier = AllocatingSupplier::new(StrSource::new(input), size).unwrap();
        let mut reader = chario::csv::RowReader::new(CharReader::new(supplier), CsvOptions::new());
        let rows = reader.read_all().unwrap();
        assert_eq!(rows, baseline, "mismatch at chunk size {size}");
    }
}

#[test]
fn csv_writer_always_quote_round_trips_through_reader() {
    let rows = vec![vec!["has,comma", "has\"quote", "plain"]];
    let mut w = CsvWriter::with_options(Vec::new(), ',', '"', NewlineStyle::CrLf, QuotePolicy::Always, Some('#'));
    for row in &rows {
        w.write_row(row.iter().map(|f| Some(*f))).unwrap();
    }
    let text = String::from_utf8(w.into_inner()).unwrap();
    let parsed = read_csv(&text, CsvOptions::new().with_trim_leading(false).with_trim_trailing(false)).unwrap();
    let parsed: Vec<Vec<&str>> = parsed.iter().map(|r| r.iter().map(|f| f.as_deref().unwrap_or("")).collect()).collect();
    assert_eq!(parsed, rows);
}

#[test]
fn json_value_fn_elision_drops_the_key() {
    let input = r#"{"a":1,"b":2}"#;
    let supplier = AllocatingSupplier::new(StrSource::new(input), 1024).unwrap();
    let reader = LineNumberReader::new(CharReader::new(supplier));
    let visitor = FilteredVisitor::new(DefaultVisitor, |k| k, |k: &Rc<str>, v| if &**k == "a" { Err(Elide) } else { Ok(v) });
    let mut json = JSONReader::new(reader, JsonOptions::default(), visitor);
    let value = json.next_value().unwrap().unwrap();
    let mut expect = BTreeMap::new();
    expect.insert("b".to_string(), Value::Int(2));
    assert_eq!(value, Value::Object(expect));
}

#[test]
fn json_key_fn_renames_every_key() {
    let input = r#"{"a":1,"b":2}"#;
    let supplier = AllocatingSupplier::new(StrSource::new(input), 1024).unwrap();
    let reader = LineNumberReader::new(CharReader::new(supplier));
    let visitor = FilteredVisitor::new(DefaultVisitor, |k: Rc<str>| Rc::from(format!("{k}_renamed")), |_: &Rc<str>, v| Ok(v));
    let mut json = JSONReader::new(reader, JsonOptions::default(), visitor);
    let value = json.next_value().unwrap().unwrap();
    let obj = value.as_object().unwrap();
    assert!(obj.contains_key("a_renamed"));
    assert!(obj.contains_key("b_renamed"));
}

#[test]
fn json_big_integer_round_trips_through_writer() {
    let text = "123456789012345678901234567890";
    let value = read_json(text).unwrap();
    assert_eq!(value, Value::BigInt(text.to_string()));
    assert_eq!(write_json(&value).unwrap(), text);
}

#[test]
fn json_chunk_size_does_not_change_result() {
    let input = r#"{"a":[1,2.5,"three",null,true],"b":{"nested":[1,2,3]}}"#;
    let baseline = read_json(input).unwrap();
    for size in [1usize, 2, 3, 1024] {
        let supplier = AllocatingSupplier::new(StrSource::new(input), size).unwrap();
        let reader = LineNumberReader::new(CharReader::new(supplier));
        let mut json = JSONReader::new(reader, JsonOptions::default(), DefaultVisitor);
        let value = json.next_value().unwrap().unwrap();
        assert_eq!(value, baseline, "mismatch at chunk size {size}");
    }
}

#[test]
fn json_writer_set_order_matches_caller_iteration() {
    use chario::json::JSONWriter;

    let entries = [("z", Value::Int(1)), ("a", Value::Int(2))];
    let mut w = JSONWriter::new(Vec::new());
    w.write_map(entries.iter().map(|(k, v)| (*k, v)), 0).unwrap();
    assert_eq!(String::from_utf8(w.into_inner()).unwrap(), r#"{"z":1,"a":2}"#);
}

#[test]
fn csv_and_json_both_report_position_on_malformed_input() {
    let csv_err = read_csv("a,\"unterminated", CsvOptions::new()).unwrap_err();
    assert!(format!("{csv_err}").len() > 0);

    let json_err = read_json(r#"{"a":}"#).unwrap_err();
    assert!(format!("{json_err}").len() > 0);
}

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static RECORD_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]\s*=\s*\{").unwrap());
static KEY_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=\s*(.+?)(?:,\s*)?$").unwrap());
static STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\d+\.\d+$").unwrap());
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?\d+(?:\.\d+)?|\w+").unwrap());

/// Field name used to keep quoted strings salvaged from lines that match
/// neither a field assignment nor a closing brace.
pub const SALVAGE_FIELD: &str = "_extra_strings";

/// A scanned right-hand-side value. Quoted and unrecognized raw text both
/// land in `Str`; array literals always collect into string lists, numeric
/// array entries included.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Collect bare numeric/word tokens from array literals that contain no
    /// quoted strings.
    pub bare_tokens: bool,
    /// Keep quoted strings from unrecognized lines under [`SALVAGE_FIELD`]
    /// instead of dropping them.
    pub salvage_strings: bool,
}

/// Scan a table-literal file into id-keyed records.
///
/// The scanner is line oriented: `[<id>] = {` opens a record, `key = value`
/// lines assign fields, and the record closes when its brace depth returns to
/// zero. Lines that fit no pattern are skipped, so a malformed line costs at
/// most its own record, never the file.
pub fn scan_records(text: &str, options: &ScanOptions) -> BTreeMap<u32, Record> {
    let lines: Vec<&str> = text.lines().collect();
    let mut records = BTreeMap::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = RECORD_OPEN_RE.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let Ok(id) = caps[1].parse::<u32>() else {
            i += 1;
            continue;
        };
        let (record, end) = scan_record_body(&lines, i + 1, options);
        records.insert(id, record);
        i = end + 1;
    }

    records
}

fn scan_record_body(lines: &[&str], start: usize, options: &ScanOptions) -> (Record, usize) {
    let mut record = Record::new();
    let mut depth: i32 = 1;
    let mut i = start;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() || line.starts_with("--") {
            i += 1;
            continue;
        }

        // An unterminated record must not swallow the one that follows it.
        if depth == 1 && RECORD_OPEN_RE.is_match(line) {
            return (record, i.saturating_sub(1));
        }

        if let Some(caps) = KEY_VALUE_RE.captures(line) {
            let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let rhs = caps
                .get(2)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .trim_end_matches(',')
                .trim();

            if rhs.starts_with('{') && !rhs.contains('}') {
                let (values, end) = scan_multiline_array(lines, i + 1, options);
                record.insert(key.to_string(), Value::List(values));
                i = end + 1;
                continue;
            }

            record.insert(key.to_string(), scan_scalar(rhs, options));
            i += 1;
            continue;
        }

        // Not a field line: brace bookkeeping decides whether the record is
        // done, salvage collects whatever quoted text the line carried.
        let opens = line.matches('{').count() as i32;
        let closes = line.matches('}').count() as i32;
        depth += opens - closes;
        if depth <= 0 {
            return (record, i);
        }

        if options.salvage_strings {
            let salvaged: Vec<String> = quoted_strings(line);
            if !salvaged.is_empty() {
                let entry = record
                    .entry(SALVAGE_FIELD.to_string())
                    .or_insert_with(|| Value::List(Vec::new()));
                if let Value::List(list) = entry {
                    list.extend(salvaged);
                }
            }
        }

        i += 1;
    }

    (record, i)
}

fn scan_scalar(rhs: &str, options: &ScanOptions) -> Value {
    if rhs.starts_with('{') {
        return Value::List(inline_array_values(rhs, options));
    }
    if rhs.starts_with('"') {
        if let Some(caps) = STRING_RE.captures(rhs) {
            return Value::Str(caps[1].to_string());
        }
        return Value::Str(rhs.to_string());
    }
    if rhs.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if rhs.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if INT_RE.is_match(rhs) {
        if let Ok(n) = rhs.parse::<i64>() {
            return Value::Int(n);
        }
    }
    if FLOAT_RE.is_match(rhs) {
        if let Ok(f) = rhs.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Str(rhs.to_string())
}

fn inline_array_values(rhs: &str, options: &ScanOptions) -> Vec<String> {
    let strings = quoted_strings(rhs);
    if !strings.is_empty() || !options.bare_tokens {
        return strings;
    }
    bare_tokens(rhs)
}

fn scan_multiline_array(
    lines: &[&str],
    start: usize,
    options: &ScanOptions,
) -> (Vec<String>, usize) {
    let mut values = Vec::new();
    let mut i = start;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.starts_with('}') {
            return (values, i);
        }
        if line.is_empty() || line.starts_with("--") {
            i += 1;
            continue;
        }

        let strings = quoted_strings(line);
        if !strings.is_empty() {
            values.extend(strings);
        } else if options.bare_tokens {
            values.extend(bare_tokens(line));
        }

        i += 1;
    }

    (values, i)
}

fn quoted_strings(line: &str) -> Vec<String> {
    STRING_RE
        .captures_iter(line)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn bare_tokens(line: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(line)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTS: ScanOptions = ScanOptions {
        bare_tokens: true,
        salvage_strings: true,
    };

    #[test]
    fn scans_single_record_with_scalars_and_inline_array() {
        let text = r#"
tbl = {
	[501] = {
		identifiedDisplayName = "Red Potion",
		identifiedDescriptionName = { "A potion made", "from red herbs." },
		slotCount = 2,
		weight = 7.5,
		costume = false,
	},
}
"#;
        let records = scan_records(text, &OPTS);
        assert_eq!(records.len(), 1);
        let record = &records[&501];
        assert_eq!(
            record["identifiedDisplayName"],
            Value::Str("Red Potion".to_string())
        );
        assert_eq!(
            record["identifiedDescriptionName"],
            Value::List(vec![
                "A potion made".to_string(),
                "from red herbs.".to_string()
            ])
        );
        assert_eq!(record["slotCount"], Value::Int(2));
        assert_eq!(record["weight"], Value::Float(7.5));
        assert_eq!(record["costume"], Value::Bool(false));
    }

    #[test]
    fn collects_multiline_array_until_closing_brace() {
        let text = r#"
	[1101] = {
		unidentifiedDisplayName = "Sword",
		identifiedDescriptionName = {
			"A basic sword.",
			"Attack: 25",
		},
		slotCount = 3,
	},
	[1102] = {
		identifiedDisplayName = "Blade",
	},
"#;
        let records = scan_records(text, &OPTS);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[&1101]["identifiedDescriptionName"],
            Value::List(vec!["A basic sword.".to_string(), "Attack: 25".to_string()])
        );
        assert_eq!(records[&1101]["slotCount"], Value::Int(3));
        assert_eq!(
            records[&1102]["identifiedDisplayName"],
            Value::Str("Blade".to_string())
        );
    }

    #[test]
    fn nested_braces_do_not_close_the_record_early() {
        let text = r#"
	[2301] = {
		identifiedDisplayName = "Adventurer's Suit",
		EffectID = {
			{ 10, 20 },
		},
		slotCount = 1,
	},
"#;
        let records = scan_records(text, &OPTS);
        let record = &records[&2301];
        assert_eq!(
            record["EffectID"],
            Value::List(vec!["10".to_string(), "20".to_string()])
        );
        assert_eq!(record["slotCount"], Value::Int(1));
    }

    #[test]
    fn bare_tokens_only_collected_when_enabled() {
        let text = "[7] = {\n\tClassNum = { 1, 2, 3 },\n},\n";
        let strict = scan_records(text, &ScanOptions::default());
        assert_eq!(strict[&7]["ClassNum"], Value::List(Vec::new()));

        let tolerant = scan_records(
            text,
            &ScanOptions {
                bare_tokens: true,
                ..ScanOptions::default()
            },
        );
        assert_eq!(
            tolerant[&7]["ClassNum"],
            Value::List(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn salvages_quoted_strings_from_stray_lines() {
        let text = "[9] = {\n\t\"orphaned text\",\n\tidentifiedDisplayName = \"Hat\",\n},\n";
        let records = scan_records(text, &OPTS);
        assert_eq!(
            records[&9][SALVAGE_FIELD],
            Value::List(vec!["orphaned text".to_string()])
        );

        let strict = scan_records(text, &ScanOptions::default());
        assert!(!strict[&9].contains_key(SALVAGE_FIELD));
    }

    #[test]
    fn malformed_record_does_not_swallow_the_next_one() {
        // The first record never closes; the opener of the second must still
        // be recognized.
        let text = "[11] = {\n\tidentifiedDisplayName = \"Broken\",\n[12] = {\n\tidentifiedDisplayName = \"Fine\",\n},\n";
        let records = scan_records(text, &OPTS);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[&12]["identifiedDisplayName"],
            Value::Str("Fine".to_string())
        );
    }

    #[test]
    fn decimal_fractions_never_classify_as_integers() {
        let text = "[13] = {\n\trate = 1.5,\n\tcount = 15,\n},\n";
        let records = scan_records(text, &OPTS);
        assert_eq!(records[&13]["rate"], Value::Float(1.5));
        assert_eq!(records[&13]["count"], Value::Int(15));
    }

    #[test]
    fn escaped_quotes_stay_inside_one_string() {
        let text = r#"[14] = {
	identifiedDisplayName = "The \"Boss\" Hat",
},
"#;
        let records = scan_records(text, &OPTS);
        assert_eq!(
            records[&14]["identifiedDisplayName"],
            Value::Str(r#"The \"Boss\" Hat"#.to_string())
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "[15] = {\n\n\t-- legacy field\n\tidentifiedDisplayName = \"Ring\",\n},\n";
        let records = scan_records(text, &OPTS);
        assert_eq!(records[&15].len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(scan_records("", &OPTS).is_empty());
        assert!(scan_records("not a table at all\n", &OPTS).is_empty());
    }
}

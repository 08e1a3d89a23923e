use once_cell::sync::OnceCell;

/// Formats a decimal value (hours or degrees) as sexagesimal text.
/// `frac` selects the layout by its digit count: 3 = `H:MM`, 5 = `H:MM.m`,
/// 6 = `H:MM:SS`, 8 = `H:MM:SS.s`, 9 = `H:MM:SS.ss`.
pub fn value_to_sexagesimal(value: f64, zero_pad: bool, frac: u8) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let value = f64::abs(value);
    let mut whole = value.trunc() as i64;
    // half of the last displayed digit, in 1/100 of a second
    let round = match frac {
        9 => 0.5,
        8 => 5.0,
        6 => 50.0,
        5 => 300.0,
        3 => 3000.0,
        _ => 0.0,
    };
    let mut in_whole = (value.fract() * 360_000.0 + round) as i64;
    if in_whole >= 360_000 {
        whole += 1;
        in_whole -= 360_000;
    }
    let minutes = in_whole / 6000;
    let in_minute = in_whole % 6000; // 1/100 s below the minute
    match (frac, zero_pad) {
        (3, false) => format!("{}{}:{:02}", sign, whole, minutes),
        (3, true)  => format!("{}{:02}:{:02}", sign, whole, minutes),
        (5, false) => format!("{}{}:{:02}.{}", sign, whole, minutes, in_minute / 600),
        (5, true)  => format!("{}{:02}:{:02}.{}", sign, whole, minutes, in_minute / 600),
        (6, false) => format!("{}{}:{:02}:{:02}", sign, whole, minutes, in_minute / 100),
        (6, true)  => format!("{}{:02}:{:02}:{:02}", sign, whole, minutes, in_minute / 100),
        (8, false) => format!("{}{}:{:02}:{:02}.{}", sign, whole, minutes, in_minute / 100, (in_minute % 100) / 10),
        (8, true)  => format!("{}{:02}:{:02}:{:02}.{}", sign, whole, minutes, in_minute / 100, (in_minute % 100) / 10),
        (9, false) => format!("{}{}:{:02}:{:02}.{:02}", sign, whole, minutes, in_minute / 100, in_minute % 100),
        (9, true)  => format!("{}{:02}:{:02}:{:02}.{:02}", sign, whole, minutes, in_minute / 100, in_minute % 100),
        _          => value.to_string(),
    }
}

/// Parses `H:M`, `H:M.m`, `H:M:S`, `H:M:S.s` or `H:M:S.ss` text with an
/// optional sign into a decimal value. Minutes and seconds must stay
/// below 60.
pub fn sexagesimal_to_value(text: &str) -> Option<f64> {
    static RE: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        regex::Regex::new(r"^([+-]?)(\d+):(\d+(?:\.\d+)?)(?::(\d+(?:\.\d+)?))?$").unwrap()
    });
    let res = re.captures(text.trim())?;
    let is_neg = &res[1] == "-";
    let whole = res[2].parse::<f64>().ok()?;
    let minutes = res[3].parse::<f64>().ok()?;
    let seconds = match res.get(4) {
        Some(m) => m.as_str().parse::<f64>().ok()?,
        None => 0.0,
    };
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }
    let value = whole + minutes / 60.0 + seconds / 3600.0;
    Some(if !is_neg { value } else { -value })
}

#[test]
fn test_value_to_sexagesimal() {
    assert_eq!(value_to_sexagesimal(10.5, true, 6), "10:30:00");
    assert_eq!(value_to_sexagesimal(10.5, false, 3), "10:30");
    assert_eq!(value_to_sexagesimal(-10.5, false, 3), "-10:30");
    assert_eq!(value_to_sexagesimal(1.0, true, 8), "01:00:00.0");
    assert_eq!(value_to_sexagesimal(10.508333333333333, true, 8), "10:30:30.0");
    assert_eq!(value_to_sexagesimal(10.505, false, 5), "10:30.3");
    assert_eq!(value_to_sexagesimal(-0.2, true, 6), "-00:12:00");
    // rounding carries up to the whole part
    assert_eq!(value_to_sexagesimal(0.9999999, true, 6), "01:00:00");
}

#[test]
fn test_sexagesimal_to_value() {
    assert!(sexagesimal_to_value("").is_none());
    assert!(sexagesimal_to_value("1:00").unwrap() == 1.0);
    assert!(sexagesimal_to_value("-1:00").unwrap() == -1.0);
    assert!(sexagesimal_to_value("10:30").unwrap() == 10.5);
    assert!(sexagesimal_to_value("-10:30").unwrap() == -10.5);
    assert!(sexagesimal_to_value("10:30.3").unwrap() == 10.505);
    assert!(sexagesimal_to_value("-10:30.3").unwrap() == -10.505);
    assert!(sexagesimal_to_value("10:30:00").unwrap() == 10.5);
    assert!(sexagesimal_to_value("10:30:30").unwrap() == 10.508333333333333);
    assert!(sexagesimal_to_value(" +12:26:35.9 ").is_some());
    assert!(sexagesimal_to_value("10:65").is_none());
    assert!(sexagesimal_to_value("10:30:65").is_none());
    assert!(sexagesimal_to_value("stars").is_none());
}

#[test]
fn test_sexagesimal_text_round_trip() {
    for v in [0.0, 0.25, 10.505, 23.934469, -31.08, 150.944799] {
        let text = value_to_sexagesimal(v, true, 9);
        let parsed = sexagesimal_to_value(&text).unwrap();
        // half of 1/100 s
        assert!(f64::abs(parsed - v) < 0.5 / 360_000.0 + 1e-9, "{} -> {} -> {}", v, text, parsed);
    }
}

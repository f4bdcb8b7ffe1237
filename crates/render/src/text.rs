//! Pure text formatting helpers (no Cairo involved).

/// Which part of a string survives truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncateStyle {
    #[default]
    End,
    Middle,
    Start,
}

const ELLIPSIS: &str = "..";

/// Shorten to at most `max_chars` characters, marking the cut with "..".
pub fn truncate_with(text: &str, max_chars: usize, style: TruncateStyle) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return chars[..max_chars].iter().collect();
    }
    let keep = max_chars - ELLIPSIS.len();
    match style {
        TruncateStyle::End => chars[..keep].iter().collect::<String>() + ELLIPSIS,
        TruncateStyle::Start => {
            String::from(ELLIPSIS) + &chars[chars.len() - keep..].iter().collect::<String>()
        }
        TruncateStyle::Middle => {
            let head = keep - keep / 2;
            let tail = keep / 2;
            chars[..head].iter().collect::<String>()
                + ELLIPSIS
                + &chars[chars.len() - tail..].iter().collect::<String>()
        }
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    truncate_with(text, max_chars, TruncateStyle::End)
}

/// Format a number with `precision` decimals, or adaptively when `None`
pub fn format_number(value: f64, precision: Option<usize>) -> String {
    if let Some(p) = precision {
        return format!("{:.*}", p, value);
    }
    let abs = value.abs();
    if abs >= 1000.0 || value.fract() == 0.0 {
        format!("{:.0}", value)
    } else if abs >= 100.0 {
        format!("{:.1}", value)
    } else if abs >= 1.0 {
        let s = format!("{:.1}", value);
        s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
    } else {
        format!("{:.2}", value)
    }
}

/// "21.5°C", "45 %", "3 kWh". Units that read as symbols attach directly.
pub fn format_value_with_unit(value: &str, unit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        None => value.to_string(),
        Some(u) if u.starts_with('°') || u == "%" => format!("{}{}", value, u),
        Some(u) => format!("{} {}", value, u),
    }
}

/// Seconds as M:SS, or H:MM:SS from one hour up
pub fn format_duration(total_seconds: f64) -> String {
    let secs = total_seconds.max(0.0).floor() as u64;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

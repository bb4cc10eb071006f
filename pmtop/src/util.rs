//! Small display helpers: human-readable sizes and uptime phrases.

pub fn human_bytes(b: u64) -> String {
    const K: f64 = 1024.0;
    let b = b as f64;
    if b < K {
        return format!("{b:.0}B");
    }
    let kb = b / K;
    if kb < K {
        return format!("{kb:.1}KB");
    }
    let mb = kb / K;
    if mb < K {
        return format!("{mb:.1}MB");
    }
    let gb = mb / K;
    if gb < K {
        return format!("{gb:.1}GB");
    }
    let tb = gb / K;
    format!("{tb:.2}TB")
}

/// Expand the daemon's compact uptime ("3h") into words ("3 hours").
/// `None` when the string carries no digit+unit pair.
pub fn uptime_phrase(raw: &str) -> Option<String> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let digits: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let number: u64 = digits.parse().ok()?;
    let unit = match raw[start + digits.len()..].chars().next()? {
        'd' => "day",
        'h' => "hour",
        'm' => "minute",
        's' => "second",
        _ => return None,
    };
    if number == 1 {
        Some(format!("{number} {unit}"))
    } else {
        Some(format!("{number} {unit}s"))
    }
}

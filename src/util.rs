//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// True if unicode char belongs to CJK ideograph ranges.
pub fn is_cjk(ch: char) -> bool {
  ('\u{4E00}'..='\u{9FFF}').contains(&ch)
    || ('\u{3400}'..='\u{4DBF}').contains(&ch)
    || ('\u{20000}'..='\u{2A6DF}').contains(&ch)
    || ('\u{2A700}'..='\u{2CEAF}').contains(&ch)
    || ('\u{F900}'..='\u{FAFF}').contains(&ch)
}

pub fn is_kana(ch: char) -> bool {
  ('\u{3040}'..='\u{30FF}').contains(&ch) || ('\u{31F0}'..='\u{31FF}').contains(&ch)
}

pub fn is_hangul(ch: char) -> bool {
  ('\u{AC00}'..='\u{D7AF}').contains(&ch) || ('\u{1100}'..='\u{11FF}').contains(&ch) || ('\u{3130}'..='\u{318F}').contains(&ch)
}

/// Letters that only show up in Vietnamese among the supported languages.
fn is_vietnamese_letter(ch: char) -> bool {
  "ăâđêôơưĂÂĐÊÔƠƯạảấầẩẫậắằẳẵặẹẻẽếềểễệỉịọỏốồổỗộớờởỡợụủứừửữựỳỵỷỹ".contains(ch)
}

/// Best-effort guess of which supported language a snippet is written in.
/// Kana wins over Han (Japanese mixes both); Latin text defaults to English.
pub fn guess_language(text: &str) -> &'static str {
  if text.chars().any(is_kana) {
    "Japanese"
  } else if text.chars().any(is_hangul) {
    "Korean"
  } else if text.chars().any(is_cjk) {
    "Chinese"
  } else if text.chars().any(is_vietnamese_letter) {
    "Vietnamese"
  } else {
    "English"
  }
}

/// Lowercase and collapse whitespace, for lenient answer comparison.
pub fn normalize_answer(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Log-safe truncation for large strings (char-boundary safe).
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  let count = s.chars().count();
  if count <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{}… ({} chars total)", head, count)
  }
}

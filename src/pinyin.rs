//! Hanzi → Hanyu Pinyin (tone diacritics, space-separated), copy non-Chinese as-is.
//!
//! Used to fill in readings for Chinese vocabulary that arrives without one.
//!
//! Example:
//!   输入: "中国人计划 2025！"
//!   输出: "zhōng guó rén jì huà 2025！"
use pinyin::ToPinyin;

/// Convert Chinese text into Hanyu Pinyin with tone diacritics, space-separated.
/// Non-Chinese characters are copied as-is.
///
/// Converts per character (no word segmentation), so some polyphonic
/// characters get their default reading.
pub fn to_pinyin_diacritics(text: &str) -> String {
  let mut out = String::with_capacity(text.len() * 2);

  // Spaces go only between consecutive Hanzi syllables.
  let mut last_was_hanzi = false;

  for ch in text.chars() {
    if let Some(py) = ch.to_pinyin() {
      if last_was_hanzi {
        out.push(' ');
      }
      out.push_str(py.with_tone());
      last_was_hanzi = true;
    } else {
      out.push(ch);
      last_was_hanzi = false;
    }
  }

  out
}

/// Course languages whose vocabulary readings are pinyin.
pub fn is_chinese_language(language: &str) -> bool {
  matches!(
    language.trim().to_ascii_lowercase().as_str(),
    "chinese" | "zh" | "zh-cn" | "mandarin"
  )
}

/// The reading to store for `word`: the given one when present, generated
/// pinyin for Chinese courses, otherwise empty.
pub fn reading_for(language: &str, word: &str, given: &str) -> String {
  let given = given.trim();
  if !given.is_empty() {
    given.to_string()
  } else if is_chinese_language(language) {
    to_pinyin_diacritics(word)
  } else {
    String::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spaces_only_between_syllables() {
    assert_eq!(to_pinyin_diacritics("你好"), "nǐ hǎo");
    assert_eq!(to_pinyin_diacritics("中国!"), "zhōng guó!");
    assert_eq!(to_pinyin_diacritics("HSK 1"), "HSK 1");
  }

  #[test]
  fn readings_are_generated_only_for_chinese() {
    assert_eq!(reading_for("Chinese", "学习", ""), "xué xí");
    assert_eq!(reading_for("chinese", "学习", "xuéxí"), "xuéxí");
    assert_eq!(reading_for("japanese", "学習", ""), "");
  }
}

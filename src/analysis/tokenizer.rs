use crate::analysis::token::Token;
use unicode_segmentation::UnicodeSegmentation;

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Word tokenizer with bigram splitting for CJK scripts.
///
/// Text is split on Unicode word boundaries; segments without any letter, digit
/// or pictograph are dropped. Consecutive Han/Kana/Hangul characters carry no
/// word boundaries worth trusting, so each run is emitted as overlapping
/// character bigrams (a lone character stays a unigram). Offsets always refer
/// to the original text, terms are lowercased.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralTokenizer;

impl Tokenizer for GeneralTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut cjk_run: Vec<(usize, char)> = Vec::new();

        for (offset, segment) in text.split_word_bound_indices() {
            if segment.chars().all(is_cjk) {
                cjk_run.extend(segment.char_indices().map(|(i, c)| (offset + i, c)));
                continue;
            }

            flush_cjk_run(text, &mut cjk_run, &mut tokens);

            if is_word_like(segment) {
                tokens.push(Token::new(
                    segment.to_lowercase(),
                    offset,
                    offset + segment.len(),
                ));
            }
        }

        flush_cjk_run(text, &mut cjk_run, &mut tokens);
        tokens
    }
}

fn flush_cjk_run(text: &str, run: &mut Vec<(usize, char)>, tokens: &mut Vec<Token>) {
    match run.as_slice() {
        [] => {}
        [(start, c)] => {
            let end = start + c.len_utf8();
            tokens.push(Token::new(text[*start..end].to_lowercase(), *start, end));
        }
        chars => {
            for pair in chars.windows(2) {
                let (start, _) = pair[0];
                let (last, c) = pair[1];
                let end = last + c.len_utf8();
                tokens.push(Token::new(text[start..end].to_lowercase(), start, end));
            }
        }
    }
    run.clear();
}

fn is_word_like(segment: &str) -> bool {
    segment.chars().any(|c| c.is_alphanumeric() || is_pictographic(c))
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x11FF       // Hangul Jamo
        | 0x3040..=0x309F     // Hiragana
        | 0x30A0..=0x30FF     // Katakana (incl. prolonged sound mark)
        | 0x3130..=0x318F     // Hangul compatibility Jamo
        | 0x31F0..=0x31FF     // Katakana phonetic extensions
        | 0x3400..=0x4DBF     // CJK extension A
        | 0x4E00..=0x9FFF     // CJK unified ideographs
        | 0xAC00..=0xD7AF     // Hangul syllables
        | 0xF900..=0xFAFF     // CJK compatibility ideographs
        | 0xFF66..=0xFF9F     // Halfwidth Katakana
        | 0x20000..=0x2FA1F   // CJK extensions B-F, compatibility supplement
    )
}

fn is_pictographic(c: char) -> bool {
    matches!(c as u32,
        0x2300..=0x23FF
        | 0x2600..=0x27BF
        | 0x2B00..=0x2BFF
        | 0x1F000..=0x1FAFF
    )
}

use std::collections::HashSet;

/// Number of leading characters of a value probed against a block.
const PREFIX_CHARS: usize = 10;

/// Score how well a block's text matches an extracted value.
///
/// Both sides are lowercased and trimmed. Returns 1.0 for equal text, the
/// length ratio when one contains the other, 0.7 when the value's first ten
/// characters appear in the block, and otherwise the shared-token ratio over
/// the larger token set.
pub fn text_similarity(value: &str, block_text: &str) -> f32 {
    let value = value.trim().to_lowercase();
    let block = block_text.trim().to_lowercase();

    if value.is_empty() || block.is_empty() {
        return 0.0;
    }
    if value == block {
        return 1.0;
    }

    if value.contains(&block) || block.contains(&value) {
        let a = value.chars().count();
        let b = block.chars().count();
        return a.min(b) as f32 / a.max(b) as f32;
    }

    if value.chars().count() >= PREFIX_CHARS {
        let prefix: String = value.chars().take(PREFIX_CHARS).collect();
        if block.contains(&prefix) {
            return 0.7;
        }
    }

    let value_tokens: HashSet<&str> = value.split_whitespace().collect();
    let block_tokens: HashSet<&str> = block.split_whitespace().collect();
    let common = value_tokens.intersection(&block_tokens).count();
    let larger = value_tokens.len().max(block_tokens.len());
    if larger == 0 {
        0.0
    } else {
        common as f32 / larger as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_case_insensitive() {
        assert_eq!(text_similarity("Rev.10", "REV.10"), 1.0);
        assert_eq!(text_similarity("  TP-030-030-050 ", "tp-030-030-050"), 1.0);
    }

    #[test]
    fn test_containment_is_partial() {
        let score = text_similarity("TP-030-030-050", "문서번호: TP-030-030-050");
        assert!(score > 0.0 && score < 1.0);
        assert!((score - 14.0 / 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_prefix_match() {
        assert_eq!(
            text_similarity("압연 작업 기준서 개정본 안내", "압연 작업 기준서 개 정본"),
            0.7
        );
    }

    #[test]
    fn test_token_overlap() {
        let score = text_similarity("rolling mill", "mill standard rolling procedure");
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty() {
        assert_eq!(text_similarity("", "block"), 0.0);
        assert_eq!(text_similarity("value", "   "), 0.0);
    }
}

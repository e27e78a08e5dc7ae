use super::TextRun;

/// Bold delimiter (`**bold**`).
const DELIMITER: &str = "**";

/// Splits a plain run into alternating non-emphasized / emphasized runs.
///
/// Delimiters are matched left to right in pairs. An opening delimiter
/// without a partner is kept verbatim in the trailing plain run. Empty runs
/// are dropped, so `"**a**"` yields a single emphasized run.
pub fn split_emphasis(text: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(DELIMITER) {
        let inner = &rest[open + DELIMITER.len()..];
        let Some(close) = inner.find(DELIMITER) else {
            break;
        };
        push_run(&mut runs, &rest[..open], false);
        push_run(&mut runs, &inner[..close], true);
        rest = &inner[close + DELIMITER.len()..];
    }

    push_run(&mut runs, rest, false);
    runs
}

fn push_run(runs: &mut Vec<TextRun>, text: &str, emphasized: bool) {
    if !text.is_empty() {
        runs.push(TextRun::new(text, emphasized));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_single_run() {
        assert_eq!(split_emphasis("just text"), vec![TextRun::new("just text", false)]);
    }

    #[test]
    fn test_bold_in_the_middle() {
        assert_eq!(
            split_emphasis("a **b** c"),
            vec![
                TextRun::new("a ", false),
                TextRun::new("b", true),
                TextRun::new(" c", false),
            ]
        );
    }

    #[test]
    fn test_multiple_bold_spans() {
        let runs = split_emphasis("**one** and **two**");
        let emphasized: Vec<_> = runs
            .iter()
            .filter(|run| run.emphasized)
            .map(|run| run.text.as_str())
            .collect();
        assert_eq!(emphasized, vec!["one", "two"]);
    }

    #[test]
    fn test_unmatched_delimiter_stays_plain() {
        assert_eq!(
            split_emphasis("**ok** then **dangling"),
            vec![
                TextRun::new("ok", true),
                TextRun::new(" then **dangling", false),
            ]
        );
    }

    #[test]
    fn test_empty_bold_is_dropped() {
        assert_eq!(
            split_emphasis("a****b"),
            vec![TextRun::new("a", false), TextRun::new("b", false)]
        );
    }

    #[test]
    fn test_multibyte_text_around_delimiters() {
        assert_eq!(
            split_emphasis("héllo **wörld** ✓"),
            vec![
                TextRun::new("héllo ", false),
                TextRun::new("wörld", true),
                TextRun::new(" ✓", false),
            ]
        );
    }
}

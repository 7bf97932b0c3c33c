use crate::availability::WINDOW_LIST_COMMAND;
use crate::executor::CommandRunner;
use crate::Result;

/// Returns the title part of a `wmctrl -l` line
/// (`<id> <desktop> <host> <title>`), or `None` for short lines.
fn title_of(line: &str) -> Option<&str> {
    let mut rest = line.trim_start();
    for _ in 0..3 {
        let end = rest.find(char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

pub fn parse_window_list(output: &str) -> Vec<String> {
    output.lines().filter_map(title_of).map(str::to_string).collect()
}

/// Lists the titles of all open windows via `wmctrl -l`.
pub fn list_window_titles<R: CommandRunner + ?Sized>(runner: &R) -> Result<Vec<String>> {
    let argv = [WINDOW_LIST_COMMAND.to_string(), "-l".to_string()];
    let output = runner.run(&argv)?.into_checked()?;
    Ok(parse_window_list(&output.stdout))
}

/// Splits configured keyword entries into lower-cased words.
pub fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .flat_map(|entry| entry.as_ref().split_whitespace())
        .map(str::to_lowercase)
        .collect()
}

/// True if some title contains every keyword, ignoring case and order.
pub fn big_picture_visible<K: AsRef<str>, T: AsRef<str>>(keywords: &[K], titles: &[T]) -> bool {
    let keywords = normalize_keywords(keywords);
    titles.iter().any(|title| {
        let title = title.as_ref().to_lowercase();
        keywords.iter().all(|keyword| title.contains(keyword.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    const STEAM_KEYWORDS: [&str; 3] = ["steam", "big", "picture"];

    #[test]
    fn test_detects_big_picture_window() {
        assert!(big_picture_visible(&STEAM_KEYWORDS, &["Mozilla Firefox", "Steam Big Picture Mode"]));
    }

    #[test]
    fn test_library_window_is_not_big_picture() {
        assert!(!big_picture_visible(&STEAM_KEYWORDS, &["Mozilla Firefox", "Steam Library"]));
    }

    #[test]
    fn test_keywords_must_share_one_title() {
        // Every keyword appears somewhere, but never all in the same title.
        assert!(!big_picture_visible(&STEAM_KEYWORDS, &["Steam", "Big Picture Frames"]));
    }

    #[test]
    fn test_case_and_order_insensitive() {
        assert!(big_picture_visible(&["Mode", "STEAM"], &["steam big picture mode"]));
        assert!(big_picture_visible(&["Steam Big Picture mode"], &["STEAM BIG PICTURE MODE"]));
    }

    #[test]
    fn test_no_windows_is_not_visible() {
        let titles: [&str; 0] = [];
        assert!(!big_picture_visible(&STEAM_KEYWORDS, &titles));
    }

    #[test]
    fn test_normalize_keywords_splits_entries() {
        assert_eq!(
            normalize_keywords(&["Steam Big", " Picture  ", "mode"]),
            vec!["steam", "big", "picture", "mode"]
        );
    }

    #[test]
    fn test_parse_window_list() {
        let output = "0x03800003  0 desk Mozilla Firefox\n\
                      0x04a00002 -1 desk   Steam Big Picture Mode\n\
                      0x01200007  0 desk\n\
                      \n";
        assert_eq!(parse_window_list(output), vec!["Mozilla Firefox", "Steam Big Picture Mode"]);
    }

    #[test]
    fn test_list_window_titles_runs_wmctrl() {
        let runner = ScriptedRunner::new();
        runner.set_windows(&["Terminal", "Steam Big Picture Mode"]);

        let titles = list_window_titles(&runner).unwrap();

        assert_eq!(titles, vec!["Terminal", "Steam Big Picture Mode"]);
        assert_eq!(runner.calls(), vec![vec!["wmctrl".to_string(), "-l".to_string()]]);
    }

    #[test]
    fn test_list_window_titles_propagates_failure() {
        let runner = ScriptedRunner::new();
        runner.fail_windows();
        assert!(list_window_titles(&runner).is_err());
    }
}

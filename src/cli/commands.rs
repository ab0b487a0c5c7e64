use crate::model::SortKey;

/// One line typed into the interactive session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Page(usize),
    Sort(SortKey),
    Search(String),
    Clear,
    Refresh,
    Rank(String),
    Status,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        match verb.to_lowercase().as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" | "previous" => Self::Prev,
            "page" | "g" => match rest.parse::<usize>() {
                Ok(page) if page > 0 => Self::Page(page),
                _ => Self::Invalid(format!("expected a page number, got '{rest}'")),
            },
            "sort" => match SortKey::parse(rest) {
                Some(key) => Self::Sort(key),
                None => Self::Invalid(format!("unknown sort '{rest}', try none, cookies or players")),
            },
            "search" | "s" | "/" => Self::Search(rest.to_string()),
            "clear" | "c" => Self::Clear,
            "refresh" | "reload" | "r" => Self::Refresh,
            "rank" => {
                if rest.is_empty() {
                    Self::Invalid("please enter a Minecraft username".to_string())
                } else {
                    Self::Rank(rest.to_string())
                }
            }
            "status" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => Self::Invalid(format!("unknown command '{other}', type 'help'")),
        }
    }
}

pub const HELP: &str = "\
commands:
  n, next            next page
  p, prev            previous page
  page <N>           jump to page N
  sort <key>         none | cookies | players
  search <term>      keep houses whose name contains <term>
  clear              drop the search and show every house again
  refresh            fetch the listing again (counts against the limit)
  rank <player>      look up a player's rank
  status             show the call counter
  quit               leave
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation() {
        assert_eq!(Command::parse("n"), Command::Next);
        assert_eq!(Command::parse(" PREV "), Command::Prev);
        assert_eq!(Command::parse("page 3"), Command::Page(3));
        assert!(matches!(Command::parse("page zero"), Command::Invalid(_)));
        assert!(matches!(Command::parse("page 0"), Command::Invalid(_)));
    }

    #[test]
    fn parses_sort_and_search() {
        assert_eq!(Command::parse("sort cookies"), Command::Sort(SortKey::Cookies));
        assert_eq!(Command::parse("sort"), Command::Sort(SortKey::None));
        assert_eq!(
            Command::parse("search  Sky Wars "),
            Command::Search("Sky Wars".to_string())
        );
        assert_eq!(Command::parse("search"), Command::Search(String::new()));
    }

    #[test]
    fn parses_rank_and_misc() {
        assert_eq!(Command::parse("rank Notch"), Command::Rank("Notch".to_string()));
        assert!(matches!(Command::parse("rank"), Command::Invalid(_)));
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert!(matches!(Command::parse("dance"), Command::Invalid(_)));
    }
}

//! Bot command parsing.

/// A recognized bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Help,
    Set,
    Define(String),
    Audio(String),
    Add(Vec<String>),
    Remove(Vec<String>),
    Mdict(String),
    Chat(String),
    Jina(String),
}

pub const HELP: &str = "Commands:
/set - start the daily review schedule
/define <word> - links and explanation for a word
/audio <text> - pronounce a word or phrase
/add <words> - add words (comma or newline separated)
/remove <words> - remove words
/mdict <word> - look a word up in the local dictionary
/chat <question> - ask and get a published answer
/jina <url> - publish a web page as a readable article";

impl BotCommand {
    /// Parse a message text.
    ///
    /// Returns `None` for text that is not a known command and `Some(Err(_))`
    /// with a usage hint when a required argument is missing.
    pub fn parse(text: &str) -> Option<Result<Self, &'static str>> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, arg) = match rest.split_once(char::is_whitespace) {
            Some((head, arg)) => (head, arg.trim()),
            None => (rest, ""),
        };
        // Commands may be addressed as /cmd@botname in groups
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let required = |usage: &'static str| -> Result<String, &'static str> {
            if arg.is_empty() {
                Err(usage)
            } else {
                Ok(arg.to_string())
            }
        };
        let words = |usage: &'static str| -> Result<Vec<String>, &'static str> {
            let list = split_words(arg);
            if list.is_empty() {
                Err(usage)
            } else {
                Ok(list)
            }
        };

        let command = match name.as_str() {
            "start" | "help" => Ok(BotCommand::Help),
            "set" => Ok(BotCommand::Set),
            "define" => required("Usage: /define <word>").map(BotCommand::Define),
            "audio" => required("Usage: /audio <text>").map(BotCommand::Audio),
            "add" => words("Usage: /add <word1, word2>").map(BotCommand::Add),
            "remove" => words("Usage: /remove <word1, word2>").map(BotCommand::Remove),
            "mdict" => required("Usage: /mdict <word>").map(BotCommand::Mdict),
            "chat" => required("Usage: /chat <question>").map(BotCommand::Chat),
            "jina" => required("Usage: /jina <url>").map(BotCommand::Jina),
            _ => return None,
        };
        Some(command)
    }

    /// Whether only allowed users may run this command.
    pub fn requires_authorization(&self) -> bool {
        matches!(
            self,
            BotCommand::Set
                | BotCommand::Add(_)
                | BotCommand::Remove(_)
                | BotCommand::Chat(_)
                | BotCommand::Jina(_)
        )
    }
}

/// Split a comma- or newline-separated word list.
pub fn split_words(text: &str) -> Vec<String> {
    text.split([',', '\n', '，'])
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

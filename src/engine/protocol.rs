//! Line-based text protocol spoken by the engine, modelled after UCI.

#[derive(Debug, PartialEq)]
pub(super) enum Command {
    IsReady,
    SetPosition {
        /// `None` stands for `startpos`.
        board: Option<String>,
        moves: Vec<String>,
    },
    Go {
        iterations: Option<usize>,
    },
    Policy,
    Play {
        square: String,
    },
    Display,
    Moves,
    Stats,
    Quit,
    Unknown(String),
}

fn parse_go(parts: &[&str]) -> Command {
    let mut iterations = None;
    let mut i = 1;
    while i < parts.len() {
        if parts[i] == "iterations" && i + 1 < parts.len() {
            iterations = parts[i + 1].parse().ok();
            i += 2;
        } else {
            i += 1;
        }
    }
    Command::Go { iterations }
}

fn parse_setposition(parts: &[&str]) -> Command {
    let moves_index = parts.iter().position(|&x| x == "moves");
    let description = &parts[1..moves_index.unwrap_or(parts.len())];
    let board = match description {
        [] | ["startpos"] => None,
        // Rows may be separated by spaces.
        cells => Some(cells.concat()),
    };
    let moves = if let Some(moves_index) = moves_index {
        parts[moves_index + 1..]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    } else {
        vec![]
    };
    Command::SetPosition { board, moves }
}

impl Command {
    pub(super) fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            return Self::Unknown(input.to_string());
        }

        match parts[0] {
            "isready" => Self::IsReady,
            "position" => parse_setposition(&parts),
            "go" => parse_go(&parts),
            "policy" => Self::Policy,
            "play" if parts.len() == 2 => Self::Play {
                square: parts[1].to_string(),
            },
            "d" => Self::Display,
            "moves" => Self::Moves,
            "stats" => Self::Stats,
            "quit" => Self::Quit,
            _ => Self::Unknown(input.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_isready() {
        assert_eq!(Command::parse("isready"), Command::IsReady);
    }

    #[test]
    fn parse_position() {
        assert_eq!(
            Command::parse("position startpos moves 4 0"),
            Command::SetPosition {
                board: None,
                moves: vec!["4".to_string(), "0".to_string()]
            }
        );
        assert_eq!(
            Command::parse("position XX.OO...."),
            Command::SetPosition {
                board: Some("XX.OO....".to_string()),
                moves: vec![]
            }
        );
        assert_eq!(
            Command::parse("position XX. OO. ... moves 2"),
            Command::SetPosition {
                board: Some("XX.OO....".to_string()),
                moves: vec!["2".to_string()]
            }
        );
    }

    #[test]
    fn parse_go() {
        assert_eq!(Command::parse("go"), Command::Go { iterations: None });
        assert_eq!(
            Command::parse("go iterations 500"),
            Command::Go {
                iterations: Some(500)
            }
        );
        assert_eq!(
            Command::parse("go iterations many"),
            Command::Go { iterations: None }
        );
    }

    #[test]
    fn parse_play() {
        assert_eq!(
            Command::parse("play 4"),
            Command::Play {
                square: "4".to_string()
            }
        );
        assert_eq!(
            Command::parse("play"),
            Command::Unknown("play".to_string())
        );
    }

    #[test]
    fn parse_simple() {
        assert_eq!(Command::parse("policy"), Command::Policy);
        assert_eq!(Command::parse("d"), Command::Display);
        assert_eq!(Command::parse("moves"), Command::Moves);
        assert_eq!(Command::parse("stats"), Command::Stats);
        assert_eq!(Command::parse("quit"), Command::Quit);
    }

    #[test]
    fn unknown() {
        assert_eq!(
            Command::parse("unknown command\n"),
            Command::Unknown("unknown command".to_string())
        );
    }
}

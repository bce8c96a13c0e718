#[derive(Debug, Clone, PartialEq, Eq)]
/// Error type for one line of the text protocol.
pub enum MalformedRequest {
    Empty,
    NotUtf8,
    UnknownCommand {
        command: String,
    },
    WrongArgumentCount {
        command: &'static str,
        expected: usize,
        actual: usize,
    },
    InvalidCoordinate {
        text: String,
    },
    InvalidPlayerId {
        player: String,
    },
}

impl std::error::Error for MalformedRequest {}

impl std::fmt::Display for MalformedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedRequest::Empty => write!(f, "empty request"),
            MalformedRequest::NotUtf8 => write!(f, "request is not valid UTF-8"),
            MalformedRequest::UnknownCommand { command } => {
                write!(f, "unknown command '{}'", command)
            }
            MalformedRequest::WrongArgumentCount {
                command,
                expected,
                actual,
            } => write!(
                f,
                "'{}' takes {} argument(s), got {}",
                command, expected, actual
            ),
            MalformedRequest::InvalidCoordinate { text } => {
                write!(f, "'{}' is not a coordinate", text)
            }
            MalformedRequest::InvalidPlayerId { player } => write!(
                f,
                "'{}' is not a valid player id, use letters, digits and underscores",
                player
            ),
        }
    }
}

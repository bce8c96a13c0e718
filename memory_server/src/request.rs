use memory::Request;

use crate::MalformedRequest;

pub(crate) fn is_valid_player_id(player: &str) -> bool {
    !player.is_empty() && player.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn expect_args(
    command: &'static str,
    args: &[&str],
    expected: usize,
) -> Result<(), MalformedRequest> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(MalformedRequest::WrongArgumentCount {
            command,
            expected,
            actual: args.len(),
        })
    }
}

fn parse_coordinate(text: &str) -> Result<usize, MalformedRequest> {
    text.parse()
        .map_err(|_| MalformedRequest::InvalidCoordinate {
            text: String::from(text),
        })
}

/// Parses one line of the text protocol, see [`Request`].
///
/// Commands are case-sensitive and separated from their arguments by
/// whitespace.
pub fn parse_request(line: &str) -> Result<Request, MalformedRequest> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or(MalformedRequest::Empty)?;
    let args: Vec<&str> = words.collect();
    match command {
        "hello" => {
            expect_args("hello", &args, 1)?;
            if !is_valid_player_id(args[0]) {
                return Err(MalformedRequest::InvalidPlayerId {
                    player: String::from(args[0]),
                });
            }
            Ok(Request::Hello {
                player: String::from(args[0]),
            })
        }
        "look" => expect_args("look", &args, 0).map(|()| Request::Look),
        "flip" => {
            expect_args("flip", &args, 2)?;
            Ok(Request::Flip {
                column: parse_coordinate(args[0])?,
                row: parse_coordinate(args[1])?,
            })
        }
        "watch" => expect_args("watch", &args, 0).map(|()| Request::Watch),
        "state" => expect_args("state", &args, 0).map(|()| Request::State),
        "quit" => expect_args("quit", &args, 0).map(|()| Request::Quit),
        _ => Err(MalformedRequest::UnknownCommand {
            command: String::from(command),
        }),
    }
}

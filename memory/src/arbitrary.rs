use quickcheck::{Arbitrary, Gen};

use crate::Board;

/// A small board and a sequence of moves by a few players.
#[derive(Clone, Debug)]
pub struct FlipScript {
    pub width: usize,
    pub height: usize,
    // Row-major, `None` is an empty space
    pub cells: Vec<Option<String>>,
    pub players: Vec<String>,
    // (player, row, col), possibly off the board
    pub flips: Vec<(String, usize, usize)>,
}

impl FlipScript {
    pub fn board(&self) -> Board {
        let board = Board::new(self.width, self.height, self.cells.clone()).unwrap();
        for player in &self.players {
            board.register_player(player);
        }
        board
    }
}

impl Arbitrary for FlipScript {
    fn arbitrary(g: &mut Gen) -> Self {
        let width = usize::from(u8::arbitrary(g) % 4) + 1;
        let height = usize::from(u8::arbitrary(g) % 4) + 1;
        // Few labels, so that matches actually happen
        let cells = (0..width * height)
            .map(|_| {
                let n = u8::arbitrary(g) % 4;
                (n > 0).then(|| ((b'A' + n) as char).to_string())
            })
            .collect();
        let players: Vec<String> = (0..usize::from(u8::arbitrary(g) % 3) + 1)
            .map(|i| format!("p{}", i))
            .collect();
        let num_flips = usize::from(u8::arbitrary(g) % 40);
        let flips = (0..num_flips)
            .map(|_| {
                let player = g.choose(&players).unwrap().clone();
                // One past the edge now and then
                let row = usize::from(u8::arbitrary(g)) % (height + 2);
                let col = usize::from(u8::arbitrary(g)) % (width + 2);
                (player, row, col)
            })
            .collect();
        FlipScript {
            width,
            height,
            cells,
            players,
            flips,
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let script = self.clone();
        Box::new(self.flips.shrink().map(move |flips| FlipScript {
            flips,
            ..script.clone()
        }))
    }
}

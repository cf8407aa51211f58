use wordtiles::{
    game::{PlayMoveRequest, PlayResult, TilePlacement},
    rack::{VirtualRack, VirtualTile},
    AppError,
};

use super::setup::TestSetup;

// ============================================================================
// Move Construction
// ============================================================================

/// Builds the request a client would send: its copy of the rack with the
/// placed tiles sealed, plus where each of them goes
pub struct MoveBuilder {
    user_id: String,
    tiles: Vec<VirtualTile>,
    placements: Vec<TilePlacement>,
}

impl MoveBuilder {
    pub fn new(user_id: &str, rack: &VirtualRack) -> Self {
        Self {
            user_id: user_id.to_string(),
            tiles: rack.tiles.clone(),
            placements: vec![],
        }
    }

    pub fn place(mut self, tile_number: u8, row: usize, column: usize) -> Self {
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.number == tile_number) {
            tile.sealed = true;
        }
        self.placements.push(TilePlacement {
            tile_number,
            row,
            column,
        });
        self
    }

    /// Overwrites the letter the client claims to hold in a slot
    pub fn claim_letter(mut self, tile_number: u8, letter: char) -> Self {
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.number == tile_number) {
            tile.letter = letter;
        }
        self
    }

    pub fn build(self) -> PlayMoveRequest {
        PlayMoveRequest {
            user_id: self.user_id,
            rack: self.tiles,
            placements: self.placements,
        }
    }
}

/// Places the lowest-numbered tiles of the rack on the given cells, in order
pub fn forge_move(user_id: &str, rack: &VirtualRack, cells: &[(usize, usize)]) -> PlayMoveRequest {
    rack.tiles
        .iter()
        .zip(cells)
        .fold(MoveBuilder::new(user_id, rack), |builder, (tile, (row, column))| {
            builder.place(tile.number, *row, *column)
        })
        .build()
}

/// The player holding the turn plays their first tiles on `cells`
pub async fn play_on(setup: &TestSetup, cells: &[(usize, usize)]) -> Result<PlayResult, AppError> {
    let game = setup.game().await;
    let user = setup.current_user().await;
    let rack = setup.rack_of(game.current_player_number).await;
    setup
        .service
        .play_move(&setup.game_id, forge_move(&user, &rack, cells))
        .await
}

/// Two-letter opening word across the centre of a 15x15 board
pub async fn play_opening(setup: &TestSetup) -> Result<PlayResult, AppError> {
    play_on(setup, &[(7, 7), (7, 8)]).await
}

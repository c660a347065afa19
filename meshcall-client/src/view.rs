use crate::negotiation::RemoteStream;
use meshcall_core::PeerId;

#[derive(Debug, Clone, PartialEq)]
pub enum TileState {
    /// Session exists but no media yet.
    Loading,
    Live(RemoteStream),
}

/// Rendering surface for one remote participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub peer_id: PeerId,
    pub label: String,
    pub state: TileState,
}

/// Remote video tiles in the order participants appeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoGrid {
    tiles: Vec<Tile>,
}

impl VideoGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loading tile for `peer_id` unless one exists.
    pub fn add_placeholder(&mut self, peer_id: PeerId) -> bool {
        if self.tile(&peer_id).is_some() {
            return false;
        }
        self.tiles.push(Tile {
            peer_id,
            label: format!("User {}", peer_id.short()),
            state: TileState::Loading,
        });
        true
    }

    /// Show `stream` on the participant's tile, replacing whatever was there.
    pub fn attach_stream(&mut self, peer_id: PeerId, stream: RemoteStream) {
        self.add_placeholder(peer_id);
        if let Some(tile) = self.tiles.iter_mut().find(|t| t.peer_id == peer_id) {
            tile.state = TileState::Live(stream);
        }
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> bool {
        let before = self.tiles.len();
        self.tiles.retain(|t| &t.peer_id != peer_id);
        self.tiles.len() != before
    }

    pub fn tile(&self, peer_id: &PeerId) -> Option<&Tile> {
        self.tiles.iter().find(|t| &t.peer_id == peer_id)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Remote participants plus the local user.
    pub fn participant_count(&self) -> usize {
        self.tiles.len() + 1
    }
}

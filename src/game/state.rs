//! Match State Definitions
//!
//! Client-side model of a match as the server reports it.
//! The server's JSON uses its own field names (`_id`, `user1`, `user2`);
//! the `*Record` types mirror that layout and convert into the model types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Player identifier as issued by the server.
///
/// Stored trimmed, so equality is the normalized text comparison used for
/// role resolution.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Create from any textual identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Get the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is blank.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Match identifier as issued by the server.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Create from the server's identifier text.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ROLE, MOVE, OUTCOME
// =============================================================================

/// Which seat a player occupies within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creator of the match.
    Player1,
    /// Player who joined the match.
    Player2,
}

impl Role {
    /// The other seat.
    pub fn opponent(self) -> Role {
        match self {
            Role::Player1 => Role::Player2,
            Role::Player2 => Role::Player1,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player1 => f.write_str("player1"),
            Role::Player2 => f.write_str("player2"),
        }
    }
}

/// A rock-paper-scissors move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    /// Beats scissors.
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissors,
}

impl Move {
    /// All moves, in display order.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Check if this move beats another.
    #[inline]
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Paper, Move::Rock) | (Move::Scissors, Move::Paper)
        )
    }

    /// Resolve a turn from both seats' moves.
    pub fn resolve(move1: Move, move2: Move) -> Outcome {
        if move1.beats(move2) {
            Outcome::Won(Role::Player1)
        } else if move2.beats(move1) {
            Outcome::Won(Role::Player2)
        } else {
            Outcome::Draw
        }
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown move name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown move '{0}' (expected rock, paper or scissors)")]
pub struct ParseMoveError(String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            _ => Err(ParseMoveError(s.to_string())),
        }
    }
}

/// Result of a single turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// One seat won the turn.
    Won(Role),
    /// Both played the same move.
    Draw,
}

/// Result of a finished match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WinnerRecord", into = "WinnerRecord")]
pub enum Winner {
    /// The identified player won.
    Player(PlayerId),
    /// Nobody won.
    Draw,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Player(id) => write!(f, "{}", id),
            Winner::Draw => f.write_str("draw"),
        }
    }
}

// =============================================================================
// MATCH
// =============================================================================

/// A participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    /// Server identifier.
    pub id: PlayerId,
    /// Display name (empty when the server sent a bare reference).
    pub username: String,
}

impl Player {
    /// Create a player.
    pub fn new(id: impl AsRef<str>, username: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            username: username.into(),
        }
    }

    /// Name to show, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            self.id.as_str()
        } else {
            &self.username
        }
    }
}

/// One round of simultaneous moves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Turn {
    /// Position within the match (0-based).
    pub index: usize,
    /// Player 1's move, once recorded.
    pub move1: Option<Move>,
    /// Player 2's move, once recorded.
    pub move2: Option<Move>,
    /// Set by the server once both moves are present.
    pub winner: Option<Outcome>,
}

impl Turn {
    /// Create an empty turn.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Move recorded for a seat.
    pub fn move_of(&self, role: Role) -> Option<Move> {
        match role {
            Role::Player1 => self.move1,
            Role::Player2 => self.move2,
        }
    }

    /// Whether the server has resolved this turn.
    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }
}

/// Match lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Moves are still being played.
    InProgress,
    /// Terminal.
    Finished,
}

/// Authoritative match snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MatchRecord", into = "MatchRecord")]
pub struct Match {
    /// Match identifier.
    pub id: MatchId,
    /// Creator.
    pub player1: Player,
    /// Opponent, once joined.
    pub player2: Option<Player>,
    /// Turns in index order.
    pub turns: Vec<Turn>,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Winner (only meaningful when finished).
    pub winner: Option<Winner>,
}

impl Match {
    /// Create a fresh match waiting for an opponent.
    pub fn new(id: impl Into<String>, player1: Player) -> Self {
        Self {
            id: MatchId::new(id),
            player1,
            player2: None,
            turns: Vec::new(),
            status: MatchStatus::InProgress,
            winner: None,
        }
    }

    /// Check if the match is over.
    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// Final result. A finished match without a winner is a draw.
    pub fn outcome(&self) -> Option<Winner> {
        if !self.is_finished() {
            return None;
        }
        Some(self.winner.clone().unwrap_or(Winner::Draw))
    }

    /// Player seated in a role.
    pub fn player(&self, role: Role) -> Option<&Player> {
        match role {
            Role::Player1 => Some(&self.player1),
            Role::Player2 => self.player2.as_ref(),
        }
    }

    /// Seat occupied by an identity, if any.
    pub fn role_of(&self, id: &PlayerId) -> Option<Role> {
        if id.is_empty() {
            return None;
        }
        if self.player1.id == *id {
            Some(Role::Player1)
        } else if self.player2.as_ref().is_some_and(|p| p.id == *id) {
            Some(Role::Player2)
        } else {
            None
        }
    }

    /// Get a turn by index.
    pub fn turn(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    /// Index of the turn currently being played, as far as this snapshot shows.
    ///
    /// The server appends a turn when its first move arrives, so a resolved
    /// last turn means the next index is live.
    pub fn live_turn_index(&self) -> usize {
        match self.turns.last() {
            Some(turn) if turn.is_complete() => turn.index + 1,
            Some(turn) => turn.index,
            None => 0,
        }
    }

    /// Resolve a winner reference to a seat.
    pub fn winner_role(&self, winner: &Winner) -> Option<Role> {
        match winner {
            Winner::Player(id) => self.role_of(id),
            Winner::Draw => None,
        }
    }
}

// =============================================================================
// WIRE RECORDS
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PlayerObject {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    username: String,
}

/// Player slot: populated document or bare reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum PlayerRecord {
    Populated(PlayerObject),
    Reference(String),
}

impl From<PlayerRecord> for Player {
    fn from(record: PlayerRecord) -> Self {
        match record {
            PlayerRecord::Populated(p) => Player::new(p.id, p.username),
            PlayerRecord::Reference(id) => Player::new(id, String::new()),
        }
    }
}

impl From<Player> for PlayerRecord {
    fn from(player: Player) -> Self {
        PlayerRecord::Populated(PlayerObject {
            id: player.id.into(),
            username: player.username,
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
enum TurnWinnerRecord {
    #[serde(rename = "user1", alias = "player1")]
    User1,
    #[serde(rename = "user2", alias = "player2")]
    User2,
    #[serde(rename = "draw")]
    Draw,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct TurnRecord {
    #[serde(default, alias = "move1", skip_serializing_if = "Option::is_none")]
    user1: Option<Move>,
    #[serde(default, alias = "move2", skip_serializing_if = "Option::is_none")]
    user2: Option<Move>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    winner: Option<TurnWinnerRecord>,
}

/// Match winner: `"draw"`, a player id, or a player document.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WinnerRecord {
    Text(String),
    Populated(PlayerObject),
}

impl From<WinnerRecord> for Winner {
    fn from(record: WinnerRecord) -> Self {
        match record {
            WinnerRecord::Text(text) if text.trim().eq_ignore_ascii_case("draw") => Winner::Draw,
            WinnerRecord::Text(id) => Winner::Player(PlayerId::new(id)),
            WinnerRecord::Populated(p) => Winner::Player(PlayerId::new(p.id)),
        }
    }
}

impl From<Winner> for WinnerRecord {
    fn from(winner: Winner) -> Self {
        match winner {
            Winner::Player(id) => WinnerRecord::Text(id.into()),
            Winner::Draw => WinnerRecord::Text("draw".to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MatchRecord {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(alias = "player1")]
    user1: PlayerRecord,
    #[serde(default, alias = "player2")]
    user2: Option<PlayerRecord>,
    #[serde(default)]
    turns: Vec<TurnRecord>,
    #[serde(default)]
    winner: Option<WinnerRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<MatchStatus>,
}

impl From<MatchRecord> for Match {
    fn from(record: MatchRecord) -> Self {
        let winner = record.winner.map(Winner::from);
        // Servers without an explicit status mark completion with a winner.
        let status = record.status.unwrap_or(if winner.is_some() {
            MatchStatus::Finished
        } else {
            MatchStatus::InProgress
        });

        let turns = record
            .turns
            .into_iter()
            .enumerate()
            .map(|(index, t)| Turn {
                index,
                move1: t.user1,
                move2: t.user2,
                winner: t.winner.map(|w| match w {
                    TurnWinnerRecord::User1 => Outcome::Won(Role::Player1),
                    TurnWinnerRecord::User2 => Outcome::Won(Role::Player2),
                    TurnWinnerRecord::Draw => Outcome::Draw,
                }),
            })
            .collect();

        Match {
            id: MatchId::new(record.id),
            player1: record.user1.into(),
            player2: record.user2.map(Player::from),
            turns,
            status,
            winner,
        }
    }
}

impl From<Match> for MatchRecord {
    fn from(m: Match) -> Self {
        MatchRecord {
            id: m.id.0,
            user1: m.player1.into(),
            user2: m.player2.map(PlayerRecord::from),
            turns: m
                .turns
                .into_iter()
                .map(|t| TurnRecord {
                    user1: t.move1,
                    user2: t.move2,
                    winner: t.winner.map(|w| match w {
                        Outcome::Won(Role::Player1) => TurnWinnerRecord::User1,
                        Outcome::Won(Role::Player2) => TurnWinnerRecord::User2,
                        Outcome::Draw => TurnWinnerRecord::Draw,
                    }),
                })
                .collect(),
            winner: m.winner.map(WinnerRecord::from),
            status: Some(m.status),
        }
    }
}

use riposte::prelude::*;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Card values
// ---------------------------------------------------------------------------

/// Every card a deck may contain, with its strength in a clash.
const CARD_VALUES: &[(&str, u8)] = &[
    ("pawn", 1),
    ("dagger", 2),
    ("sabre", 3),
    ("rapier", 4),
    ("estoc", 5),
    ("claymore", 6),
    ("halberd", 7),
    ("zweihander", 8),
];

const MAX_DECK: usize = 12;
const HAND_SIZE: usize = 3;

fn card_value(card: &str) -> Option<u8> {
    CARD_VALUES
        .iter()
        .find(|(name, _)| *name == card)
        .map(|(_, value)| *value)
}

// ---------------------------------------------------------------------------
// Game types
// ---------------------------------------------------------------------------

/// One side of the table: the cards in hand and the face-down pile.
/// Both are invisible to the opponent; only their counts ever leave
/// the server for the other seat.
struct Side {
    hand: Vec<String>,
    // Stored reversed so pop() draws in deck-manifest order.
    pile: Vec<String>,
}

impl Side {
    fn from_deck(deck: &[String]) -> Self {
        let mut pile: Vec<String> = deck.iter().rev().cloned().collect();
        let mut hand = Vec::with_capacity(HAND_SIZE);
        for _ in 0..HAND_SIZE {
            match pile.pop() {
                Some(card) => hand.push(card),
                None => break,
            }
        }
        Side { hand, pile }
    }
}

struct DuelGame {
    sides: [Side; 2],
    committed: [Option<String>; 2],
    score: [u8; 2],
    over: bool,
}

#[derive(Clone, Serialize, Deserialize)]
enum DuelCommand {
    /// Commit the card at `index` in your hand for this round.
    Play { index: usize },
    /// Give up; the opponent wins.
    Concede,
}

/// Full-information record of what the engine did. Never serialized;
/// each seat receives only its projection.
enum DuelAction {
    Committed { by: Slot, card: String },
    Resolved { cards: [String; 2], winner: Option<Slot> },
    Drew { by: Slot, card: String },
    Conceded { by: Slot },
    Finished { winner: Option<Slot>, score: [u8; 2] },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum DuelEvent {
    YouCommitted { card: String },
    TheyCommitted,
    RoundResolved {
        your_card: String,
        their_card: String,
        /// `None` means the round was a tie.
        you_won: Option<bool>,
    },
    YouDrew { card: String },
    TheyDrew,
    TheyConceded,
    GameOver {
        you_won: Option<bool>,
        your_score: u8,
        their_score: u8,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct DuelView {
    seat: u8,
    your_hand: Vec<String>,
    your_pile: usize,
    their_hand: usize,
    their_pile: usize,
    your_committed: Option<String>,
    they_committed: bool,
    your_score: u8,
    their_score: u8,
    over: bool,
}

// ---------------------------------------------------------------------------
// Game logic
// ---------------------------------------------------------------------------

impl DuelGame {
    /// Settles a round once both cards are down. Appends the reveal,
    /// the replacement draws, and the end of the game if a hand ran dry.
    fn resolve_round(&mut self, out: &mut Vec<DuelAction>) {
        let one = self.committed[0].take().unwrap_or_default();
        let two = self.committed[1].take().unwrap_or_default();

        // Factory validation guarantees every card has a value.
        let value_one = card_value(&one).unwrap_or(0);
        let value_two = card_value(&two).unwrap_or(0);
        let winner = match value_one.cmp(&value_two) {
            std::cmp::Ordering::Greater => Some(Slot::One),
            std::cmp::Ordering::Less => Some(Slot::Two),
            std::cmp::Ordering::Equal => None,
        };
        if let Some(w) = winner {
            self.score[w.index()] += 1;
        }
        out.push(DuelAction::Resolved {
            cards: [one, two],
            winner,
        });

        for slot in Slot::BOTH {
            if let Some(card) = self.sides[slot.index()].pile.pop() {
                self.sides[slot.index()].hand.push(card.clone());
                out.push(DuelAction::Drew { by: slot, card });
            }
        }

        // A seat with no cards left cannot answer another round.
        if self.sides.iter().any(|side| side.hand.is_empty()) {
            self.finish(None, out);
        }
    }

    fn finish(&mut self, conceded_to: Option<Slot>, out: &mut Vec<DuelAction>) {
        self.over = true;
        let winner = conceded_to.or_else(|| match self.score[0].cmp(&self.score[1]) {
            std::cmp::Ordering::Greater => Some(Slot::One),
            std::cmp::Ordering::Less => Some(Slot::Two),
            std::cmp::Ordering::Equal => None,
        });
        out.push(DuelAction::Finished {
            winner,
            score: self.score,
        });
    }
}

impl EngineSession for DuelGame {
    type Command = DuelCommand;
    type Action = DuelAction;
    type Notice = DuelEvent;
    type View = DuelView;

    fn apply(
        &mut self,
        slot: Slot,
        command: DuelCommand,
    ) -> Result<Vec<DuelAction>, SessionError> {
        if self.over {
            return Err(SessionError::EngineApply("the duel is over".into()));
        }

        match command {
            DuelCommand::Play { index } => {
                let side = &mut self.sides[slot.index()];
                if self.committed[slot.index()].is_some() {
                    return Err(SessionError::EngineApply(
                        "already committed a card this round".into(),
                    ));
                }
                if index >= side.hand.len() {
                    return Err(SessionError::EngineApply(format!(
                        "no card at index {index}"
                    )));
                }

                let card = side.hand.remove(index);
                self.committed[slot.index()] = Some(card.clone());
                let mut out = vec![DuelAction::Committed { by: slot, card }];

                if self.committed.iter().all(Option::is_some) {
                    self.resolve_round(&mut out);
                }
                Ok(out)
            }

            DuelCommand::Concede => {
                let mut out = vec![DuelAction::Conceded { by: slot }];
                self.finish(Some(slot.other()), &mut out);
                Ok(out)
            }
        }
    }

    fn project(&self, action: &DuelAction, viewer: Slot) -> Option<DuelEvent> {
        match action {
            DuelAction::Committed { by, card } => {
                if *by == viewer {
                    Some(DuelEvent::YouCommitted { card: card.clone() })
                } else {
                    Some(DuelEvent::TheyCommitted)
                }
            }
            DuelAction::Resolved { cards, winner } => Some(DuelEvent::RoundResolved {
                your_card: cards[viewer.index()].clone(),
                their_card: cards[viewer.other().index()].clone(),
                you_won: winner.map(|w| w == viewer),
            }),
            DuelAction::Drew { by, card } => {
                if *by == viewer {
                    Some(DuelEvent::YouDrew { card: card.clone() })
                } else {
                    Some(DuelEvent::TheyDrew)
                }
            }
            DuelAction::Conceded { by } => {
                if *by == viewer {
                    // The conceder gets the GameOver frame; repeating
                    // their own concession back adds nothing.
                    None
                } else {
                    Some(DuelEvent::TheyConceded)
                }
            }
            DuelAction::Finished { winner, score } => Some(DuelEvent::GameOver {
                you_won: winner.map(|w| w == viewer),
                your_score: score[viewer.index()],
                their_score: score[viewer.other().index()],
            }),
        }
    }

    fn snapshot(&self, viewer: Slot) -> DuelView {
        let you = &self.sides[viewer.index()];
        let them = &self.sides[viewer.other().index()];
        DuelView {
            seat: viewer.as_number(),
            your_hand: you.hand.clone(),
            your_pile: you.pile.len(),
            their_hand: them.hand.len(),
            their_pile: them.pile.len(),
            your_committed: self.committed[viewer.index()].clone(),
            they_committed: self.committed[viewer.other().index()].is_some(),
            your_score: self.score[viewer.index()],
            their_score: self.score[viewer.other().index()],
            over: self.over,
        }
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

struct DuelFactory;

fn check_deck(deck: &[String], owner: &str) -> Result<(), SessionError> {
    if deck.is_empty() {
        return Err(SessionError::EngineCreation(format!(
            "{owner} deck is empty"
        )));
    }
    if deck.len() > MAX_DECK {
        return Err(SessionError::EngineCreation(format!(
            "{owner} deck has {} cards, maximum is {MAX_DECK}",
            deck.len()
        )));
    }
    for card in deck {
        if card_value(card).is_none() {
            return Err(SessionError::EngineCreation(format!(
                "unknown card {card:?} in {owner} deck"
            )));
        }
    }
    Ok(())
}

impl EngineFactory for DuelFactory {
    type Session = DuelGame;

    fn create_session(
        &self,
        requester_deck: &[String],
        acceptor_deck: &[String],
    ) -> Result<(DuelGame, SessionId), SessionError> {
        check_deck(requester_deck, "requester")?;
        check_deck(acceptor_deck, "acceptor")?;

        let game = DuelGame {
            sides: [Side::from_deck(requester_deck), Side::from_deck(acceptor_deck)],
            committed: [None, None],
            score: [0, 0],
            over: false,
        };
        Ok((game, SessionId::random()))
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("starting card-duel server on 0.0.0.0:8080");

    let server = RiposteServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build(DuelFactory, AcceptAll)
        .await?;

    server.run().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

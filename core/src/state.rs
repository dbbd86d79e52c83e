use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - NotStarted -> Running
/// - Running <-> Paused
/// - Running | Paused -> Won | Lose
/// - Lose -> Running (restart)
/// - any -> NotStarted (reset)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Initial state, main menu is up
    NotStarted,
    /// Board is live and the clock is ticking
    Running,
    /// In-game menu is up, the clock is frozen
    Paused,
    /// Game ended and player won
    Won,
    /// Game ended and player lost
    Lose,
}

impl GameState {
    pub const fn is_initial(self) -> bool {
        matches!(self, Self::NotStarted)
    }

    /// Indicates the game has ended and only a reset leaves this state
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Won | Self::Lose)
    }

    pub const fn can_transition_to(self, next: GameState) -> bool {
        use GameState::*;
        match (self, next) {
            (_, NotStarted) => true,
            (NotStarted, Running) => true,
            (Running, Paused) => true,
            (Paused, Running) => true,
            (Running | Paused, Won | Lose) => true,
            (Lose, Running) => true,
            _ => false,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// The three notification channels of the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    StateChanged,
    MainMenu,
    InGameMenu,
}

impl Channel {
    pub const COUNT: usize = 3;

    const fn slot(self) -> usize {
        match self {
            Self::StateChanged => 0,
            Self::MainMenu => 1,
            Self::InGameMenu => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub old: GameState,
    pub new: GameState,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MainMenuAction {
    #[serde(rename = "smallGridButton")]
    SmallGrid,
    #[serde(rename = "mediumGridButton")]
    MediumGrid,
    #[serde(rename = "largeGridButton")]
    LargeGrid,
}

impl MainMenuAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SmallGrid => "smallGridButton",
            Self::MediumGrid => "mediumGridButton",
            Self::LargeGrid => "largeGridButton",
        }
    }

    pub const fn preset(self) -> BoardPreset {
        match self {
            Self::SmallGrid => BoardPreset::Small,
            Self::MediumGrid => BoardPreset::Medium,
            Self::LargeGrid => BoardPreset::Large,
        }
    }
}

impl FromStr for MainMenuAction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        [Self::SmallGrid, Self::MediumGrid, Self::LargeGrid]
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| GameError::UnknownAction(s.into()))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InGameMenuAction {
    #[serde(rename = "restartButton")]
    Restart,
    #[serde(rename = "homeButton")]
    Home,
}

impl InGameMenuAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Restart => "restartButton",
            Self::Home => "homeButton",
        }
    }
}

impl FromStr for InGameMenuAction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Restart, Self::Home]
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| GameError::UnknownAction(s.into()))
    }
}

/// A user intent coming from one of the menus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuAction {
    Main(MainMenuAction),
    InGame(InGameMenuAction),
}

impl From<MainMenuAction> for MenuAction {
    fn from(action: MainMenuAction) -> Self {
        Self::Main(action)
    }
}

impl From<InGameMenuAction> for MenuAction {
    fn from(action: InGameMenuAction) -> Self {
        Self::InGame(action)
    }
}

/// What listeners receive, one variant per channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateEvent {
    StateChanged(StateChange),
    MainMenu(MainMenuAction),
    InGameMenu(InGameMenuAction),
}

impl StateEvent {
    pub const fn channel(&self) -> Channel {
        match self {
            Self::StateChanged(_) => Channel::StateChanged,
            Self::MainMenu(_) => Channel::MainMenu,
            Self::InGameMenu(_) => Channel::InGameMenu,
        }
    }
}

impl From<MenuAction> for StateEvent {
    fn from(action: MenuAction) -> Self {
        match action {
            MenuAction::Main(action) => Self::MainMenu(action),
            MenuAction::InGame(action) => Self::InGameMenu(action),
        }
    }
}

/// Something that follows the game state without ever driving it.
pub trait StateListener {
    fn on_state_changed(&mut self, change: StateChange);
}

type Listener = Rc<dyn Fn(&StateEvent)>;

/// Current game phase plus the listeners that get told about every change of it.
///
/// Single-threaded by construction: share it with `Rc` and hand it to every consumer.
///
/// Events raised by a listener are queued and delivered after the current event has reached
/// every listener, still before the outermost call returns.
pub struct StateStore {
    state: std::cell::Cell<GameState>,
    listeners: RefCell<[Vec<Listener>; Channel::COUNT]>,
    pending: RefCell<VecDeque<StateEvent>>,
    dispatching: std::cell::Cell<bool>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            state: std::cell::Cell::new(GameState::default()),
            listeners: RefCell::new(Default::default()),
            pending: RefCell::new(VecDeque::new()),
            dispatching: std::cell::Cell::new(false),
        }
    }

    pub fn state(&self) -> GameState {
        self.state.get()
    }

    /// Overwrite the state and notify, transitions outside the table are allowed but logged.
    pub fn set_state(&self, new: GameState) -> StateChange {
        let old = self.state.replace(new);
        if !old.can_transition_to(new) {
            log::warn!("unexpected state transition {:?} -> {:?}", old, new);
        } else {
            log::debug!("state {:?} -> {:?}", old, new);
        }
        let change = StateChange { old, new };
        self.dispatch(StateEvent::StateChanged(change));
        change
    }

    /// Like [`StateStore::set_state`] but refuses transitions outside the table.
    pub fn transition(&self, new: GameState) -> Result<StateChange> {
        let old = self.state();
        if !old.can_transition_to(new) {
            return Err(GameError::InvalidTransition { from: old, to: new });
        }
        Ok(self.set_state(new))
    }

    pub fn listen(&self, channel: Channel, listener: impl Fn(&StateEvent) + 'static) {
        self.listeners.borrow_mut()[channel.slot()].push(Rc::new(listener));
    }

    pub fn on_state_changed(&self, listener: impl Fn(StateChange) + 'static) {
        self.listen(Channel::StateChanged, move |event| {
            if let StateEvent::StateChanged(change) = *event {
                listener(change);
            }
        });
    }

    pub fn on_main_menu(&self, listener: impl Fn(MainMenuAction) + 'static) {
        self.listen(Channel::MainMenu, move |event| {
            if let StateEvent::MainMenu(action) = *event {
                listener(action);
            }
        });
    }

    pub fn on_in_game_menu(&self, listener: impl Fn(InGameMenuAction) + 'static) {
        self.listen(Channel::InGameMenu, move |event| {
            if let StateEvent::InGameMenu(action) = *event {
                listener(action);
            }
        });
    }

    /// Register a subscriber that is only held weakly, it stops hearing once dropped.
    pub fn subscribe<L: StateListener + 'static>(&self, subscriber: &Rc<RefCell<L>>) {
        let subscriber: Weak<RefCell<L>> = Rc::downgrade(subscriber);
        self.on_state_changed(move |change| {
            let Some(subscriber) = subscriber.upgrade() else {
                log::trace!("skipping dropped subscriber");
                return;
            };
            match subscriber.try_borrow_mut() {
                Ok(mut subscriber) => subscriber.on_state_changed(change),
                Err(_) => log::warn!("subscriber busy, missed {:?}", change),
            }
        });
    }

    /// Broadcast a menu intent to the listeners of its channel.
    pub fn fire(&self, action: impl Into<MenuAction>) {
        let event = StateEvent::from(action.into());
        log::debug!("fire {:?}", event);
        self.dispatch(event);
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners.borrow()[channel.slot()].len()
    }

    fn dispatch(&self, event: StateEvent) {
        self.pending.borrow_mut().push_back(event);
        if self.dispatching.replace(true) {
            log::trace!("queued {:?}", event);
            return;
        }
        loop {
            let Some(event) = self.pending.borrow_mut().pop_front() else {
                break;
            };
            // snapshot so listeners may register or fire while being called
            let listeners = self.listeners.borrow()[event.channel().slot()].clone();
            for listener in listeners {
                listener(&event);
            }
        }
        self.dispatching.set(false);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let listeners = self.listeners.borrow();
        f.debug_struct("StateStore")
            .field("state", &self.state.get())
            .field("pending", &self.pending.borrow().len())
            .field("listeners", &listeners.iter().map(Vec::len).collect::<Vec<_>>())
            .finish()
    }
}

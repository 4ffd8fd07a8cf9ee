use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// map of keyboard characters to the chip8's sixteen-key pad, using the
/// left-hand side of a qwerty keyboard:
///
/// ```text
///   1 2 3 4         1 2 3 C
///   q w e r   --->  4 5 6 D
///   a s d f         7 8 9 E
///   z x c v         A 0 B F
/// ```
pub const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// one physical key transition, as the host input device reported it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEdge {
    pub key: char,
    pub pressed: bool,
}

/// everything one poll of an input device produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Polled {
    pub edges: Vec<KeyEdge>,
    pub quit: bool,
}

/// Translates physical keys into keypad symbols. The table is injected so
/// nothing downstream depends on any particular input-event representation,
/// and `translate` is a pure lookup: same key in, same answer out.
pub struct KeyMap {
    map: HashMap<char, u8>,
}

impl KeyMap {
    /// the conventional qwerty layout
    pub fn conventional() -> Self {
        Self::from_table(&CHIP8_CONVENTIONAL_KEYMAP)
    }

    pub fn from_table(table: &[(char, u8)]) -> Self {
        KeyMap {
            map: table.iter().copied().collect(),
        }
    }

    /// a key with no mapping yields None. that's a key to ignore, not an
    /// error
    pub fn translate(&self, key: char) -> Option<u8> {
        self.map.get(&key).copied()
    }
}

/// reads physical key transitions
pub trait Input {
    /// drain every key transition since the previous poll, without blocking
    fn poll(&mut self) -> Result<Polled, io::Error>;
}

/// Keyboard input from a crossterm terminal. Terminals report presses only,
/// never releases, so each press is paired with a synthesized release on
/// the following poll; auto-repeat shows up as further pairs. All edges go
/// out verbatim, no debouncing. Esc asks the shell to quit.
///
/// Raw mode is on for as long as this exists.
pub struct TermInput {
    held: Vec<char>,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput { held: Vec::new() })
    }

    /// drain whatever the terminal has queued up into plain key presses
    fn drain_events(&mut self) -> Result<(Vec<char>, bool), io::Error> {
        let mut presses = Vec::new();
        let mut quit = false;
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Char(key) => presses.push(key),
                    KeyCode::Esc => quit = true,
                    code => log::debug!("ignoring key event {:?}", code),
                },
                other => log::debug!("ignoring event {:?}", other),
            }
        }
        Ok((presses, quit))
    }

    /// release everything from the previous poll, then press this poll's
    /// keys, which become the next poll's releases
    fn pair_presses(&mut self, presses: Vec<char>, quit: bool) -> Polled {
        let mut edges = Vec::new();
        for key in self.held.drain(..) {
            edges.push(KeyEdge {
                key,
                pressed: false,
            });
        }
        for &key in &presses {
            edges.push(KeyEdge { key, pressed: true });
        }
        self.held = presses;
        Polled { edges, quit }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll(&mut self) -> Result<Polled, io::Error> {
        let (presses, quit) = self.drain_events()?;
        Ok(self.pair_presses(presses, quit))
    }
}

/// dummy Input implementation for testing: replays one scripted batch per
/// poll, then goes quiet
pub struct DummyInput {
    script: VecDeque<Polled>,
}

impl DummyInput {
    pub fn new(script: Vec<Polled>) -> Self {
        DummyInput {
            script: script.into(),
        }
    }

    /// an input that never produces anything
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

impl Input for DummyInput {
    fn poll(&mut self) -> Result<Polled, io::Error> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

//! Host shell for a CHIP-8-style virtual machine core.
//!
//! ## Design
//!
//! * the instruction interpreter is somebody else's problem: the shell
//!   drives anything implementing `interpreter::Interpreter` and contains
//!   no opcode, timer or sound logic of its own
//! * one session object (`runtime::Runtime`) owns the core and its
//!   devices; no globals anywhere
//! * each frame is one core step plus one full repaint, paced at a fixed
//!   refresh rate, so emulation speed rides on the frame rate
//! * no frame may step until a program image has been handed to the core,
//!   and that hand-over happens exactly once; until then the scheduler
//!   just re-arms (the wait is user-paced)
//! * the framebuffer is borrowed back from the core every single frame --
//!   cores are free to move or rewrite it between steps
//! * display and input sit behind traits so terminals, windows and test
//!   doubles all plug in the same way; the in-tree implementations are a
//!   TUI canvas and crossterm key events
//! * keyboard layout is an injected table, defaulting to the conventional
//!   1234/qwer/asdf/zxcv layout
//!
//! Model
//!
//! ```text
//! main
//!  |-- core (TestCardCore here; bring your own), surface, input, keymap
//!  `-- Runtime(core, surface, input, keymap, config)
//!       |-- supply_rom(bytes)
//!       `-- run
//!            |   // per frame:
//!            |-- poll input -> translate -> core.set_key(key, edge)
//!            |-- load pending rom once, else idle
//!            |-- core.step(now_ms)
//!            `-- repaint from a fresh framebuffer view
//! ```

pub mod display;
pub mod input;
pub mod interpreter;
pub mod runtime;

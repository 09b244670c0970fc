//! Keyboard input: key identities, the ordered event channel and raw
//! terminal capture.
//!
//! ```text
//! ┌──────────────┐  HostEvent   ┌──────────────┐  push   ┌──────────────┐
//! │ Input Thread │ ───────────▶ │ Session Loop │ ──────▶ │ InputChannel │
//! └──────────────┘              └──────────────┘         └──────────────┘
//!                                      │ poll                  ▲   │ drain
//!                                      ▼                       │   ▼
//!                               ┌──────────────┐   push        │ ┌────────┐
//!                               │  Sequencer   │ ──────────────┘ │ Module │
//!                               └──────────────┘                 └────────┘
//! ```

mod capture;
mod channel;
mod key;

pub use capture::{convert_event, convert_key_code, InputActor, KeyTranslator};
pub use channel::InputChannel;
pub use key::{KeyCode, KeyEvent, KeyParseError, MatrixPosition};

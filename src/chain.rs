//! Command model: immutable byte payloads with repeat counts, composable
//! command chains, and the lazy flattened stream they expand into.
//!
//! A [`Command`] is a raw payload sent `repeat` times. A [`CommandChain`]
//! groups commands and sub-chains into an ordered, repeatable tree. Expanding
//! either yields the **command stream**: a flat, depth-first, left-to-right
//! sequence of byte payloads. Expansion is lazy and restartable — the tree is
//! never mutated and a fresh stream can be taken from it at any time.

/// A raw byte payload together with how many times it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    payload: Vec<u8>,
    repeat: u32,
}

impl Command {
    /// Build a command sent exactly once.
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            repeat: 1,
        }
    }

    /// Build a command sent `repeat` times.
    ///
    /// A zero repeat is clamped up to 1 so the `repeat >= 1` invariant holds
    /// by construction.
    #[must_use]
    pub fn with_repeat(payload: impl Into<Vec<u8>>, repeat: u32) -> Self {
        Self {
            payload: payload.into(),
            repeat: repeat.max(1),
        }
    }

    /// The raw bytes transmitted per repetition.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// How many times the payload is sent.
    #[must_use]
    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Expand into the flat payload sequence (`repeat` copies of the payload).
    #[must_use]
    pub fn stream(&self) -> CommandStream<'_> {
        CommandStream {
            pending: Some((self.payload.as_slice(), self.repeat)),
            stack: Vec::new(),
        }
    }
}

/// One node of a command tree: either a leaf command or a nested chain.
///
/// This is a closed sum type, so a chain can only ever hold commands and
/// chains — there is no runtime "unsupported element" case to defend against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainElement {
    /// A leaf command.
    Single(Command),
    /// A nested chain, expanded depth-first in place.
    Group(CommandChain),
}

impl ChainElement {
    /// Expand this element into its flat payload sequence.
    #[must_use]
    pub fn stream(&self) -> CommandStream<'_> {
        match self {
            Self::Single(cmd) => cmd.stream(),
            Self::Group(chain) => chain.stream(),
        }
    }
}

impl From<Command> for ChainElement {
    fn from(cmd: Command) -> Self {
        Self::Single(cmd)
    }
}

impl From<CommandChain> for ChainElement {
    fn from(chain: CommandChain) -> Self {
        Self::Group(chain)
    }
}

/// An ordered, repeatable group of commands and sub-chains.
///
/// Chains form strictly acyclic trees: elements are owned values, so a chain
/// cannot contain itself and expansion always terminates. An empty chain is
/// legal and expands to nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChain {
    elements: Vec<ChainElement>,
    repeat: u32,
}

impl CommandChain {
    /// Build a chain replayed exactly once.
    #[must_use]
    pub fn new(elements: Vec<ChainElement>) -> Self {
        Self { elements, repeat: 1 }
    }

    /// Build a chain whose full child sequence is replayed `repeat` times.
    ///
    /// A zero repeat is clamped up to 1, as for [`Command::with_repeat`].
    #[must_use]
    pub fn with_repeat(elements: Vec<ChainElement>, repeat: u32) -> Self {
        Self {
            elements,
            repeat: repeat.max(1),
        }
    }

    /// The child elements, in replay order.
    #[must_use]
    pub fn elements(&self) -> &[ChainElement] {
        &self.elements
    }

    /// How many times the child sequence is replayed.
    #[must_use]
    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Expand into the flat payload sequence: `repeat` repetitions of each
    /// child's expansion, depth-first, left-to-right.
    #[must_use]
    pub fn stream(&self) -> CommandStream<'_> {
        let mut stack = Vec::new();
        if !self.elements.is_empty() {
            stack.push(Frame {
                elements: &self.elements,
                index: 0,
                remaining: self.repeat,
            });
        }
        CommandStream {
            pending: None,
            stack,
        }
    }
}

/// Expand a slice of top-level elements in order, as one combined stream.
#[must_use]
pub fn stream_all(elements: &[ChainElement]) -> CommandStream<'_> {
    let mut stack = Vec::new();
    if !elements.is_empty() {
        stack.push(Frame {
            elements,
            index: 0,
            remaining: 1,
        });
    }
    CommandStream {
        pending: None,
        stack,
    }
}

/// One in-progress chain repetition during traversal.
#[derive(Debug)]
struct Frame<'a> {
    elements: &'a [ChainElement],
    index: usize,
    remaining: u32,
}

/// Lazy iterator over the flattened payload sequence of a command tree.
///
/// Traversal keeps an explicit frame stack instead of recursing, so deeply
/// nested trees cannot overflow the call stack. The borrowed tree is left
/// untouched; taking a new stream restarts expansion from the top.
#[derive(Debug)]
pub struct CommandStream<'a> {
    pending: Option<(&'a [u8], u32)>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for CommandStream<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((payload, left)) = &mut self.pending {
                if *left > 0 {
                    *left -= 1;
                    return Some(payload);
                }
                self.pending = None;
            }

            let frame = self.stack.last_mut()?;
            if frame.index == frame.elements.len() {
                frame.remaining -= 1;
                if frame.remaining == 0 {
                    self.stack.pop();
                } else {
                    frame.index = 0;
                }
                continue;
            }

            let element = &frame.elements[frame.index];
            frame.index += 1;
            match element {
                ChainElement::Single(cmd) => {
                    self.pending = Some((cmd.payload(), cmd.repeat()));
                }
                ChainElement::Group(chain) => {
                    if !chain.elements.is_empty() {
                        self.stack.push(Frame {
                            elements: &chain.elements,
                            index: 0,
                            remaining: chain.repeat,
                        });
                    }
                }
            }
        }
    }
}

// ── Built-in replay sequence ─────────────────────────────────────────────────

// Calibration data for the stock target. The step count and the two patched
// bytes were measured against the shipped binary; treat them as opaque.
const WALK_STEPS: u32 = 0x18 + 2 + (4 * 3) + 1 - 4;
const STAGE_PATCH: u8 = 0x7f;
const FINAL_PATCH: u8 = 0xf4;

/// One calibrated walk: step east, climb, patch one byte, step once more.
fn patch_walk(patch: u8, repeat: u32) -> CommandChain {
    CommandChain::with_repeat(
        vec![
            Command::with_repeat(b"d", WALK_STEPS).into(),
            Command::with_repeat(b"w", 4).into(),
            Command::new([b'l', patch]).into(),
            Command::new(b"w").into(),
        ],
        repeat,
    )
}

/// The built-in pre-command sequence replayed after connecting when the
/// operator supplies none: four staged walks, then one final walk with a
/// different patch byte.
#[must_use]
pub fn default_pre_commands() -> Vec<ChainElement> {
    vec![
        patch_walk(STAGE_PATCH, 4).into(),
        patch_walk(FINAL_PATCH, 1).into(),
    ]
}
